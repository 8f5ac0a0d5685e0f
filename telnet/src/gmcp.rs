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

//! GMCP (Generic Mud Communication Protocol) messaging extension.
//!
//! GMCP carries `topic [payload]` application messages over a single
//! negotiated option (201), where the payload is a UTF-8 JSON document.
//! This module frames and splits those messages; it never decodes the JSON.
//! Decoding belongs to whoever receives the [`GmcpMessage`], which is how the
//! external JSON codec stays a collaborator rather than a dependency.
//!
//! # Examples
//!
//! ```text
//! Core.Hello {"client": "TinTin++", "version": "2.02.0"}
//! Char.Vitals {"hp": 100, "maxhp": 120}
//! Core.Ping
//! ```

use crate::consts;
use crate::extension::TelnetExtension;
use crate::result::{TelnetError, TelnetResult};
use crate::types::ConnectionId;
use bytes::BytesMut;
use std::fmt;
use std::sync::Arc;
use tracing::warn;

///
/// A single GMCP message: a dotted topic plus an optional raw JSON payload.
///
/// The topic and payload are separated on the wire by a single space; a
/// message without a payload is just the topic.
///
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct GmcpMessage {
    topic: String,
    payload: Option<String>,
}

impl GmcpMessage {
    /// Creates a message, validating the topic.
    ///
    /// # Errors
    ///
    /// Returns [`TelnetError::EmptyTopic`] for an empty topic and
    /// [`TelnetError::MalformedTopic`] for one containing a space, which
    /// would shift the payload boundary on the wire.
    pub fn new<S: Into<String>, D: Into<String>>(
        topic: S,
        payload: Option<D>,
    ) -> TelnetResult<Self> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(TelnetError::EmptyTopic);
        }
        if topic.contains(' ') {
            return Err(TelnetError::MalformedTopic(topic));
        }
        Ok(Self {
            topic,
            payload: payload.map(Into::into),
        })
    }

    /// Creates a payload-free message (command only).
    pub fn command<S: Into<String>>(topic: S) -> TelnetResult<Self> {
        Self::new::<S, String>(topic, None)
    }

    /// Splits a received subnegotiation payload into topic and payload.
    ///
    /// Bytes before the first space form the topic (or the whole buffer when
    /// there is no space); the rest, if any, is the payload, left undecoded.
    ///
    /// # Errors
    ///
    /// Returns [`TelnetError::PayloadNotUtf8`] for non-UTF-8 input and
    /// [`TelnetError::EmptyTopic`] when nothing precedes the first space.
    pub fn parse(bytes: &[u8]) -> TelnetResult<Self> {
        let text = std::str::from_utf8(bytes).map_err(|_| TelnetError::PayloadNotUtf8)?;
        match text.find(' ') {
            Some(space) => Self::new(&text[..space], Some(&text[space + 1..])),
            None => Self::new::<&str, &str>(text, None),
        }
    }

    /// The dotted topic (e.g. `Core.Hello`, `Char.Vitals`).
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The raw JSON payload, if present.
    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }

    /// The `topic [SP payload]` subnegotiation payload bytes.
    pub fn encode(&self) -> BytesMut {
        let mut bytes = BytesMut::with_capacity(self.encoded_len());
        bytes.extend_from_slice(self.topic.as_bytes());
        if let Some(ref payload) = self.payload {
            bytes.extend_from_slice(b" ");
            bytes.extend_from_slice(payload.as_bytes());
        }
        bytes
    }

    /// The encoded payload length in bytes.
    pub fn encoded_len(&self) -> usize {
        match self.payload {
            Some(ref payload) => self.topic.len() + 1 + payload.len(),
            None => self.topic.len(),
        }
    }
}

impl fmt::Display for GmcpMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.topic)?;
        if let Some(ref payload) = self.payload {
            write!(f, " {}", payload)?;
        }
        Ok(())
    }
}

/// Receiver for inbound GMCP messages.
///
/// The handler gets the message with its payload still raw; running it
/// through the JSON codec (and keeping any per-connection state, keyed by
/// the [`ConnectionId`]) is the handler's business.
pub trait GmcpHandler: Send + Sync {
    /// A GMCP message arrived on the connection.
    fn on_message(&self, connection: ConnectionId, message: GmcpMessage);
}

/// The GMCP extension descriptor: engine-initiated only (this side offers
/// WILL; a peer-initiated WILL for the option is refused).
pub struct Gmcp {
    handler: Arc<dyn GmcpHandler>,
}

impl Gmcp {
    /// Creates the descriptor, delivering inbound messages to `handler`.
    pub fn new(handler: Arc<dyn GmcpHandler>) -> Self {
        Self { handler }
    }
}

impl TelnetExtension for Gmcp {
    fn option_code(&self) -> u8 {
        consts::option::GMCP
    }

    fn offer_local(&self) -> bool {
        true
    }

    fn accept_remote(&self) -> bool {
        false
    }

    fn on_subnegotiation(&self, connection: ConnectionId, payload: &[u8]) {
        match GmcpMessage::parse(payload) {
            Ok(message) => self.handler.on_message(connection, message),
            Err(error) => {
                warn!(%connection, %error, "dropping malformed GMCP payload");
            }
        }
    }
}
