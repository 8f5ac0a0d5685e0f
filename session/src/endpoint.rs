//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! The process-wide connection registry and its entry points.

use crate::error::{Result, SessionError};
use crate::pipeline::Pipeline;
use bytes::Bytes;
use mudlink_telnet::{ConnectionId, ExtensionRegistry, TelnetConfig, TelnetSession};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Outbound byte sink provided by the transport collaborator.
///
/// The engine never opens, closes, or reads sockets; it hands finished wire
/// bytes to this trait and the transport does the writing (and decides
/// connection teardown on I/O failure).
pub trait Transport {
    /// Writes bytes to the connection's socket.
    fn send_bytes(&mut self, connection: ConnectionId, bytes: &[u8]) -> std::io::Result<()>;
}

/// The façade the server process talks to: one pipeline per connection,
/// sharing a process-lifetime extension registry.
///
/// The transport layer must serialize calls for a single connection;
/// different connections are independent and may be driven in parallel from
/// separate threads by wrapping each pipeline's owner, not this map.
pub struct Endpoint {
    extensions: Arc<ExtensionRegistry>,
    config: TelnetConfig,
    connections: HashMap<ConnectionId, Pipeline>,
}

impl Endpoint {
    /// Creates an endpoint over a fully-populated extension registry.
    pub fn new(extensions: ExtensionRegistry) -> Self {
        Self {
            extensions: Arc::new(extensions),
            config: TelnetConfig::default(),
            connections: HashMap::new(),
        }
    }

    /// Replaces the engine configuration used for new connections.
    pub fn with_config(mut self, config: TelnetConfig) -> Self {
        self.config = config;
        self
    }

    /// Creates the pipeline for a newly accepted connection.
    pub fn attach(&mut self, id: ConnectionId) -> Result<()> {
        if self.connections.contains_key(&id) {
            return Err(SessionError::AlreadyAttached(id));
        }
        let session = TelnetSession::new(id, self.config.clone(), Arc::clone(&self.extensions));
        self.connections.insert(id, Pipeline::new(session));
        info!(connection = %id, "connection attached");
        Ok(())
    }

    /// Drops the pipeline for a closed connection.
    pub fn detach(&mut self, id: ConnectionId) -> Result<()> {
        match self.connections.remove(&id) {
            Some(_) => {
                info!(connection = %id, "connection detached");
                Ok(())
            }
            None => Err(SessionError::ConnectionNotFound(id)),
        }
    }

    /// Number of attached connections.
    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Feeds bytes read from the socket through the connection's pipeline
    /// and returns the clean application text.
    pub fn process_input(&mut self, id: ConnectionId, bytes: &[u8]) -> Result<Bytes> {
        let pipeline = self.pipeline_mut(id)?;
        Ok(pipeline.process_input(Bytes::copy_from_slice(bytes)))
    }

    /// Turns game text (plus any queued protocol traffic) into the bytes to
    /// write to the socket.
    pub fn prepare_output(&mut self, id: ConnectionId, text: &str) -> Result<Bytes> {
        let pipeline = self.pipeline_mut(id)?;
        Ok(pipeline.prepare_output(Bytes::copy_from_slice(text.as_bytes())))
    }

    /// Prepares output and pushes it straight into the transport.
    pub fn flush_output(
        &mut self,
        id: ConnectionId,
        text: &str,
        transport: &mut dyn Transport,
    ) -> Result<()> {
        let wire = self.prepare_output(id, text)?;
        if wire.is_empty() {
            return Ok(());
        }
        debug!(connection = %id, len = wire.len(), "flushing output");
        transport.send_bytes(id, &wire)?;
        Ok(())
    }

    /// Starts (or cancels) engine-initiated negotiation for this side
    /// performing an option, e.g. offering GMCP at connect time.
    pub fn request_local_option(
        &mut self,
        id: ConnectionId,
        option: u8,
        enable: bool,
    ) -> Result<()> {
        let pipeline = self.pipeline_mut(id)?;
        pipeline.telnet_mut().request_local_option(option, enable);
        Ok(())
    }

    /// Queues a GMCP message for the connection; it leaves with the next
    /// output flush.
    pub fn send_gmcp(
        &mut self,
        id: ConnectionId,
        topic: &str,
        payload: Option<&str>,
    ) -> Result<()> {
        let pipeline = self.pipeline_mut(id)?;
        pipeline.telnet_mut().send_gmcp(topic, payload)?;
        Ok(())
    }

    /// The pipeline for a connection, for layering extra handlers.
    pub fn pipeline_mut(&mut self, id: ConnectionId) -> Result<&mut Pipeline> {
        self.connections
            .get_mut(&id)
            .ok_or(SessionError::ConnectionNotFound(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_detach_lifecycle() {
        let mut endpoint = Endpoint::new(ExtensionRegistry::new());
        let id = ConnectionId::new(1);
        endpoint.attach(id).unwrap();
        assert_eq!(endpoint.connection_count(), 1);
        assert!(matches!(
            endpoint.attach(id),
            Err(SessionError::AlreadyAttached(_))
        ));
        endpoint.detach(id).unwrap();
        assert!(matches!(
            endpoint.detach(id),
            Err(SessionError::ConnectionNotFound(_))
        ));
    }

    #[test]
    fn test_unknown_connection_is_an_error() {
        let mut endpoint = Endpoint::new(ExtensionRegistry::new());
        assert!(matches!(
            endpoint.process_input(ConnectionId::new(9), b"x"),
            Err(SessionError::ConnectionNotFound(_))
        ));
    }

    #[test]
    fn test_flush_output_reaches_transport() {
        struct Capture(Vec<(ConnectionId, Vec<u8>)>);
        impl Transport for Capture {
            fn send_bytes(
                &mut self,
                connection: ConnectionId,
                bytes: &[u8],
            ) -> std::io::Result<()> {
                self.0.push((connection, bytes.to_vec()));
                Ok(())
            }
        }

        let mut endpoint = Endpoint::new(ExtensionRegistry::new())
            .with_config(TelnetConfig::default().with_go_ahead_marker(false));
        let id = ConnectionId::new(3);
        endpoint.attach(id).unwrap();

        let mut transport = Capture(Vec::new());
        endpoint.flush_output(id, "hello", &mut transport).unwrap();
        assert_eq!(transport.0.as_slice(), &[(id, b"hello".to_vec())]);

        // Nothing to send, nothing written.
        endpoint.flush_output(id, "", &mut transport).unwrap();
        assert_eq!(transport.0.len(), 1);
    }
}
