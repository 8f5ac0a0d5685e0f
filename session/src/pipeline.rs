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

//! The per-connection protocol handler chain.
//!
//! Raw socket bytes flow through the wire-side handlers and then the telnet
//! stage on input; buffered game text flows the other way on output. New
//! handlers (line editing, compression) are layered by pushing another
//! [`ProtocolHandler`] onto the chain; the engine never changes for it.

use bytes::Bytes;
use mudlink_telnet::TelnetSession;
use tracing::trace;

/// One stage of the connection pipeline.
pub trait ProtocolHandler: Send {
    /// Transforms bytes flowing toward the game layer.
    fn handle_input(&mut self, input: Bytes) -> Bytes;

    /// Transforms bytes flowing toward the socket.
    fn handle_output(&mut self, output: Bytes) -> Bytes;

    /// This stage's own output was committed for transmission.
    fn on_transmitted(&mut self, _sent: &[u8]) {}
}

/// The telnet engine as a pipeline stage.
pub struct TelnetStage {
    session: TelnetSession,
}

impl TelnetStage {
    /// Wraps a session into a stage.
    pub fn new(session: TelnetSession) -> Self {
        Self { session }
    }

    /// The engine underneath, for negotiation and messaging calls.
    pub fn session_mut(&mut self) -> &mut TelnetSession {
        &mut self.session
    }
}

impl ProtocolHandler for TelnetStage {
    fn handle_input(&mut self, input: Bytes) -> Bytes {
        self.session.receive(&input)
    }

    fn handle_output(&mut self, output: Bytes) -> Bytes {
        self.session.transmit(&output)
    }

    fn on_transmitted(&mut self, _sent: &[u8]) {
        // transmit() already reconciled its own bytes.
    }
}

/// The ordered handler chain for one connection.
///
/// The telnet stage is always present and sits closest to the game layer;
/// wire-side handlers (stored closest-to-socket first) run before it on
/// input and after it on output.
pub struct Pipeline {
    wire: Vec<Box<dyn ProtocolHandler>>,
    telnet: TelnetStage,
}

impl Pipeline {
    /// Builds a pipeline around the connection's engine.
    pub fn new(session: TelnetSession) -> Self {
        Self {
            wire: Vec::new(),
            telnet: TelnetStage::new(session),
        }
    }

    /// Adds a wire-side handler between the socket and the existing chain.
    pub fn push_wire_handler(&mut self, handler: Box<dyn ProtocolHandler>) {
        self.wire.push(handler);
    }

    /// The telnet engine for this connection.
    pub fn telnet_mut(&mut self) -> &mut TelnetSession {
        self.telnet.session_mut()
    }

    /// Runs raw socket bytes up the chain and returns the clean text the
    /// game layer should see.
    pub fn process_input(&mut self, raw: Bytes) -> Bytes {
        let mut buffer = raw;
        for handler in &mut self.wire {
            buffer = handler.handle_input(buffer);
        }
        let clean = self.telnet.handle_input(buffer);
        trace!(len = clean.len(), "pipeline input processed");
        clean
    }

    /// Runs game text down the chain and returns the bytes to put on the
    /// socket. Each stage sees its own produced bytes committed.
    pub fn prepare_output(&mut self, text: Bytes) -> Bytes {
        let mut buffer = self.telnet.handle_output(text);
        self.telnet.on_transmitted(&buffer);
        for handler in self.wire.iter_mut().rev() {
            buffer = handler.handle_output(buffer);
            handler.on_transmitted(&buffer);
        }
        trace!(len = buffer.len(), "pipeline output prepared");
        buffer
    }
}
