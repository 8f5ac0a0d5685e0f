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

use crate::config::TelnetConfig;
use crate::consts;
use crate::cursor::{ByteCursor, NegotiationCommand, ProtocolEvent};
use crate::extension::ExtensionRegistry;
use crate::gmcp::GmcpMessage;
use crate::negotiation::{Intent, NegotiationTable, Side};
use crate::result::TelnetResult;
use crate::types::ConnectionId;
use bytes::{BufMut, Bytes, BytesMut};
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// One queued outbound item: a cancellable negotiation command, or an opaque
/// pre-framed byte sequence from an extension.
#[derive(Debug)]
enum OutboundItem {
    Command(NegotiationCommand, u8),
    Frame(Bytes),
}

/// The protocol engine for a single connection.
///
/// A session owns one parse cursor per direction, the negotiation table, and
/// the queue of protocol bytes awaiting the next transmission. It performs no
/// I/O of its own: [`receive`](Self::receive) is handed bytes already read
/// from the socket, [`transmit`](Self::transmit) returns the bytes to write.
/// The transport layer must serialize calls for one connection; separate
/// connections are fully independent.
pub struct TelnetSession {
    id: ConnectionId,
    config: TelnetConfig,
    extensions: Arc<ExtensionRegistry>,
    input: ByteCursor,
    output: ByteCursor,
    table: NegotiationTable,
    outbound: Vec<OutboundItem>,
}

impl TelnetSession {
    /// Creates the session for a connection.
    pub fn new(id: ConnectionId, config: TelnetConfig, extensions: Arc<ExtensionRegistry>) -> Self {
        let max_subnegotiation = config.max_subnegotiation;
        Self {
            id,
            config,
            extensions,
            input: ByteCursor::new(max_subnegotiation),
            output: ByteCursor::new(max_subnegotiation),
            table: NegotiationTable::default(),
            outbound: Vec::new(),
        }
    }

    /// The connection this session belongs to.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Consumes raw bytes read from the peer and returns the application
    /// text with every protocol sequence stripped out.
    ///
    /// Negotiation replies and extension callbacks happen as a side effect;
    /// replies are queued and leave with the next [`transmit`](Self::transmit).
    pub fn receive(&mut self, raw: &[u8]) -> Bytes {
        let mut events = Vec::new();
        let mut clean = BytesMut::with_capacity(raw.len());
        self.input.advance(raw, &mut events, &mut clean);
        for event in events {
            match event {
                ProtocolEvent::Negotiate { command, option } => {
                    self.negotiate(command, option);
                }
                ProtocolEvent::Subnegotiation { option, payload } => {
                    self.subnegotiate(option, &payload);
                }
            }
        }
        clean.freeze()
    }

    /// Builds the wire bytes for an application-text write: queued protocol
    /// traffic first, then the IAC-escaped text, then a Go-Ahead marker while
    /// the local Suppress-Go-Ahead option is off. The produced bytes are run
    /// back through [`reconcile`](Self::reconcile) before being returned.
    pub fn transmit(&mut self, text: &[u8]) -> Bytes {
        if text.is_empty() && self.outbound.is_empty() {
            return Bytes::new();
        }
        let mut wire = BytesMut::with_capacity(text.len() + 8);
        for item in self.outbound.drain(..) {
            match item {
                OutboundItem::Command(command, option) => {
                    wire.put_u8(consts::IAC);
                    wire.put_u8(command.byte());
                    wire.put_u8(option);
                }
                OutboundItem::Frame(frame) => {
                    wire.extend_from_slice(&frame);
                }
            }
        }
        for &byte in text {
            if byte == consts::IAC {
                wire.put_u8(consts::IAC);
            }
            wire.put_u8(byte);
        }
        if self.config.go_ahead_marker && !self.table.local_enabled(consts::option::SGA) {
            wire.put_u8(consts::IAC);
            wire.put_u8(consts::GA);
        }
        let wire = wire.freeze();
        self.reconcile(&wire);
        wire
    }

    /// Re-parses bytes that were actually transmitted, recording any
    /// negotiation commands they carried so the table matches the wire.
    ///
    /// These are our own outgoing commands, not the peer's: nothing here
    /// emits replies or dispatches extensions.
    pub fn reconcile(&mut self, sent: &[u8]) {
        let mut events = Vec::new();
        let mut scratch = BytesMut::new();
        self.output.advance(sent, &mut events, &mut scratch);
        for event in events {
            if let ProtocolEvent::Negotiate { command, option } = event {
                self.table.entry(option).record_sent(command);
            }
        }
    }

    /// Starts (or cancels) negotiation for this side performing an option.
    ///
    /// Enabling an option with no registered extension, or one its extension
    /// does not allow locally, is logged and ignored. A disable issued while
    /// the matching enable is still queued unsent withdraws it without
    /// putting anything on the wire.
    pub fn request_local_option(&mut self, option: u8, enable: bool) {
        if enable && !self.permitted(option, Side::Local) {
            warn!(connection = %self.id, option, "cannot offer unregistered option");
            return;
        }
        let entry = self.table.entry(option);
        let intent = if enable {
            entry.request_local_enable()
        } else {
            entry.request_local_disable()
        };
        self.apply_intent(Side::Local, option, enable, intent);
    }

    /// Starts (or cancels) negotiation for the peer performing an option.
    pub fn request_remote_option(&mut self, option: u8, enable: bool) {
        if enable && !self.permitted(option, Side::Remote) {
            warn!(connection = %self.id, option, "cannot request unregistered option");
            return;
        }
        let entry = self.table.entry(option);
        let intent = if enable {
            entry.request_remote_enable()
        } else {
            entry.request_remote_disable()
        };
        self.apply_intent(Side::Remote, option, enable, intent);
    }

    /// Queues a complete `IAC SB option payload IAC SE` frame, escaping IAC
    /// bytes inside the payload. Used by extensions; the negotiation table is
    /// not consulted.
    pub fn send_subnegotiation(&mut self, option: u8, payload: &[u8]) {
        let mut frame = BytesMut::with_capacity(payload.len() + 5);
        frame.put_u8(consts::IAC);
        frame.put_u8(consts::SB);
        frame.put_u8(option);
        for &byte in payload {
            if byte == consts::IAC {
                frame.put_u8(consts::IAC);
            }
            frame.put_u8(byte);
        }
        frame.put_u8(consts::IAC);
        frame.put_u8(consts::SE);
        self.outbound.push(OutboundItem::Frame(frame.freeze()));
    }

    /// Queues a GMCP message for the peer.
    ///
    /// # Errors
    ///
    /// Fails when the topic is empty or contains a space; nothing is queued.
    pub fn send_gmcp(&mut self, topic: &str, payload: Option<&str>) -> TelnetResult<()> {
        let message = GmcpMessage::new(topic, payload)?;
        self.send_subnegotiation(consts::option::GMCP, &message.encode());
        trace!(connection = %self.id, topic, "queued GMCP message");
        Ok(())
    }

    /// True once we have agreed to perform the option.
    pub fn is_enabled_local(&self, option: u8) -> bool {
        self.table.local_enabled(option)
    }

    /// True once the peer has agreed to perform the option.
    pub fn is_enabled_remote(&self, option: u8) -> bool {
        self.table.remote_enabled(option)
    }

    /// Number of options negotiation has touched on this connection.
    pub fn option_count(&self) -> usize {
        self.table.len()
    }

    /// Number of queued outbound items awaiting the next transmission.
    pub fn pending_outbound(&self) -> usize {
        self.outbound.len()
    }

    fn permitted(&self, option: u8, side: Side) -> bool {
        self.extensions.lookup(option).is_some_and(|e| match side {
            Side::Local => e.offer_local(),
            Side::Remote => e.accept_remote(),
        })
    }

    fn negotiate(&mut self, command: NegotiationCommand, option: u8) {
        let side = match command {
            NegotiationCommand::Do | NegotiationCommand::Dont => Side::Local,
            NegotiationCommand::Will | NegotiationCommand::Wont => Side::Remote,
        };
        let permitted = self.permitted(option, side);
        let entry = self.table.entry(option);
        let was_enabled = entry.side(side).enabled();
        let reply = match command {
            NegotiationCommand::Do => entry.recv_do(permitted),
            NegotiationCommand::Dont => entry.recv_dont(),
            NegotiationCommand::Will => entry.recv_will(permitted),
            NegotiationCommand::Wont => entry.recv_wont(),
        };
        let now_enabled = entry.side(side).enabled();
        if let Some(reply) = reply {
            trace!(connection = %self.id, option, %command, %reply, "queueing negotiation reply");
            self.outbound.push(OutboundItem::Command(reply, option));
        }
        if now_enabled != was_enabled {
            debug!(
                connection = %self.id,
                option,
                %side,
                enabled = now_enabled,
                "option negotiation settled"
            );
            if let Some(extension) = self.extensions.lookup(option) {
                extension.on_negotiated(self.id, side, now_enabled);
            }
        }
    }

    fn subnegotiate(&mut self, option: u8, payload: &[u8]) {
        match self.extensions.lookup(option) {
            Some(extension) => extension.on_subnegotiation(self.id, payload),
            None => {
                warn!(
                    connection = %self.id,
                    option,
                    len = payload.len(),
                    "dropping subnegotiation for unregistered option"
                );
            }
        }
    }

    fn apply_intent(&mut self, side: Side, option: u8, enable: bool, intent: Intent) {
        match intent {
            Intent::Send(command) => {
                trace!(connection = %self.id, option, %command, "queueing negotiation request");
                self.outbound.push(OutboundItem::Command(command, option));
            }
            Intent::Revoke(command) => {
                let cancelled = self.remove_queued(command, option);
                self.table
                    .entry(option)
                    .apply_revoke(side, enable, cancelled);
                if cancelled {
                    trace!(connection = %self.id, option, %command, "withdrew queued negotiation");
                }
            }
            Intent::Nothing => {}
        }
    }

    fn remove_queued(&mut self, command: NegotiationCommand, option: u8) -> bool {
        let position = self.outbound.iter().position(|item| {
            matches!(item, OutboundItem::Command(c, o) if *c == command && *o == option)
        });
        match position {
            Some(index) => {
                self.outbound.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> TelnetSession {
        TelnetSession::new(
            ConnectionId::new(1),
            TelnetConfig::default().with_go_ahead_marker(false),
            Arc::new(ExtensionRegistry::new()),
        )
    }

    #[test]
    fn test_receive_plain_text() {
        let mut session = session();
        let clean = session.receive(b"look north\r\n");
        assert_eq!(&clean[..], b"look north\r\n");
        assert_eq!(session.option_count(), 0);
        assert_eq!(session.pending_outbound(), 0);
    }

    #[test]
    fn test_peer_do_sga_accepted() {
        let mut session = session();
        let clean = session.receive(&[consts::IAC, consts::DO, consts::option::SGA]);
        assert!(clean.is_empty());
        assert!(session.is_enabled_local(consts::option::SGA));
        let wire = session.transmit(b"");
        assert_eq!(&wire[..], &[consts::IAC, consts::WILL, consts::option::SGA]);
    }

    #[test]
    fn test_peer_will_unknown_option_refused() {
        let mut session = session();
        session.receive(&[consts::IAC, consts::WILL, 31]);
        assert!(!session.is_enabled_remote(31));
        let wire = session.transmit(b"");
        assert_eq!(&wire[..], &[consts::IAC, consts::DONT, 31]);
    }

    #[test]
    fn test_transmit_escapes_iac_in_text() {
        let mut session = session();
        let wire = session.transmit(&[b'a', 0xFF, b'b']);
        assert_eq!(&wire[..], &[b'a', 0xFF, 0xFF, b'b']);
    }

    #[test]
    fn test_transmit_appends_go_ahead_until_sga() {
        let mut session = TelnetSession::new(
            ConnectionId::new(2),
            TelnetConfig::default(),
            Arc::new(ExtensionRegistry::new()),
        );
        let wire = session.transmit(b"> ");
        assert_eq!(&wire[..], &[b'>', b' ', consts::IAC, consts::GA]);

        session.receive(&[consts::IAC, consts::DO, consts::option::SGA]);
        let wire = session.transmit(b"> ");
        assert_eq!(
            &wire[..],
            &[
                consts::IAC,
                consts::WILL,
                consts::option::SGA,
                b'>',
                b' ',
            ]
        );
    }

    #[test]
    fn test_enable_then_disable_cancels_cleanly() {
        let mut session = session();
        session.request_local_option(consts::option::SGA, true);
        session.request_local_option(consts::option::SGA, false);
        assert_eq!(session.pending_outbound(), 0);
        assert!(session.transmit(b"").is_empty());
        // The entry fell back to No: a fresh DO is answered WILL, not
        // swallowed as the confirmation of an in-flight request.
        session.receive(&[consts::IAC, consts::DO, consts::option::SGA]);
        let wire = session.transmit(b"");
        assert_eq!(&wire[..], &[consts::IAC, consts::WILL, consts::option::SGA]);
    }

    #[test]
    fn test_enable_twice_sends_one_will() {
        let mut session = session();
        session.request_local_option(consts::option::SGA, true);
        session.request_local_option(consts::option::SGA, true);
        let wire = session.transmit(b"");
        assert_eq!(&wire[..], &[consts::IAC, consts::WILL, consts::option::SGA]);
        assert_eq!(session.pending_outbound(), 0);
        // And nothing further once the request is on the wire.
        session.request_local_option(consts::option::SGA, true);
        assert!(session.transmit(b"").is_empty());
    }

    #[test]
    fn test_request_unregistered_option_ignored() {
        let mut session = session();
        session.request_local_option(42, true);
        assert_eq!(session.pending_outbound(), 0);
        assert_eq!(session.option_count(), 0);
    }

    #[test]
    fn test_disable_after_wire_defers_reversal() {
        let mut session = session();
        session.request_local_option(consts::option::SGA, true);
        let wire = session.transmit(b"");
        assert_eq!(&wire[..], &[consts::IAC, consts::WILL, consts::option::SGA]);
        // Too late to withdraw: the reversal waits for the peer's answer.
        session.request_local_option(consts::option::SGA, false);
        assert!(session.transmit(b"").is_empty());
        session.receive(&[consts::IAC, consts::DO, consts::option::SGA]);
        let wire = session.transmit(b"");
        assert_eq!(&wire[..], &[consts::IAC, consts::WONT, consts::option::SGA]);
        assert!(!session.is_enabled_local(consts::option::SGA));
    }

    #[test]
    fn test_reconcile_records_handwritten_commands() {
        let mut session = session();
        session.reconcile(&[consts::IAC, consts::WILL, consts::option::SGA]);
        // WantYes now outstanding: the peer's DO confirms silently.
        session.receive(&[consts::IAC, consts::DO, consts::option::SGA]);
        assert!(session.is_enabled_local(consts::option::SGA));
        assert_eq!(session.pending_outbound(), 0);
    }

    #[test]
    fn test_send_gmcp_rejects_bad_topics() {
        let mut session = session();
        assert!(session.send_gmcp("", None).is_err());
        assert!(session.send_gmcp("Core Hello", None).is_err());
        assert_eq!(session.pending_outbound(), 0);
    }
}
