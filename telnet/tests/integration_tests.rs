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

//! Integration tests for the protocol engine: whole conversations, the GMCP
//! round trip, and malformed-input recovery.

use mudlink_telnet::{
    ConnectionId, ExtensionRegistry, Gmcp, GmcpHandler, GmcpMessage, Side, TelnetConfig,
    TelnetExtension, TelnetSession, consts,
};
use std::sync::{Arc, Mutex};
use tracing_test::traced_test;

const IAC: u8 = consts::IAC;
const GMCP: u8 = consts::option::GMCP;

#[derive(Default)]
struct Recorder {
    messages: Mutex<Vec<(ConnectionId, GmcpMessage)>>,
    negotiated: Mutex<Vec<(ConnectionId, Side, bool)>>,
}

impl GmcpHandler for Recorder {
    fn on_message(&self, connection: ConnectionId, message: GmcpMessage) {
        self.messages.lock().unwrap().push((connection, message));
    }
}

struct NotifyingGmcp {
    inner: Gmcp,
    recorder: Arc<Recorder>,
}

impl TelnetExtension for NotifyingGmcp {
    fn option_code(&self) -> u8 {
        self.inner.option_code()
    }

    fn offer_local(&self) -> bool {
        self.inner.offer_local()
    }

    fn accept_remote(&self) -> bool {
        self.inner.accept_remote()
    }

    fn on_negotiated(&self, connection: ConnectionId, side: Side, enabled: bool) {
        self.recorder
            .negotiated
            .lock()
            .unwrap()
            .push((connection, side, enabled));
    }

    fn on_subnegotiation(&self, connection: ConnectionId, payload: &[u8]) {
        self.inner.on_subnegotiation(connection, payload);
    }
}

fn gmcp_session(id: u64) -> (TelnetSession, Arc<Recorder>) {
    let recorder = Arc::new(Recorder::default());
    let mut registry = ExtensionRegistry::new();
    registry
        .register(Arc::new(NotifyingGmcp {
            inner: Gmcp::new(recorder.clone()),
            recorder: recorder.clone(),
        }))
        .unwrap();
    let session = TelnetSession::new(
        ConnectionId::new(id),
        TelnetConfig::default().with_go_ahead_marker(false),
        Arc::new(registry),
    );
    (session, recorder)
}

#[test]
fn gmcp_round_trip() {
    let (mut session, recorder) = gmcp_session(7);

    session.send_gmcp("Core.Hello", None).unwrap();
    let wire = session.transmit(b"");
    assert_eq!(
        &wire[..],
        &[
            255, 250, 201, b'C', b'o', b'r', b'e', b'.', b'H', b'e', b'l', b'l', b'o', 255, 240,
        ]
    );

    // Loop the exact frame back in: one message, same topic, no payload.
    let clean = session.receive(&wire);
    assert!(clean.is_empty());
    let messages = recorder.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].0, ConnectionId::new(7));
    assert_eq!(messages[0].1.topic(), "Core.Hello");
    assert_eq!(messages[0].1.payload(), None);
}

#[test]
fn gmcp_negotiation_lifecycle() {
    let (mut session, recorder) = gmcp_session(3);

    // Connection setup: offer GMCP.
    session.request_local_option(GMCP, true);
    let wire = session.transmit(b"");
    assert_eq!(&wire[..], &[IAC, consts::WILL, GMCP]);
    assert!(!session.is_enabled_local(GMCP));

    // Client accepts; the extension hears about it.
    session.receive(&[IAC, consts::DO, GMCP]);
    assert!(session.is_enabled_local(GMCP));
    assert_eq!(
        recorder.negotiated.lock().unwrap().as_slice(),
        &[(ConnectionId::new(3), Side::Local, true)]
    );
    assert_eq!(session.pending_outbound(), 0);

    // A client offering WILL GMCP is refused: the option is engine-initiated.
    session.receive(&[IAC, consts::WILL, GMCP]);
    let wire = session.transmit(b"");
    assert_eq!(&wire[..], &[IAC, consts::DONT, GMCP]);
    assert!(!session.is_enabled_remote(GMCP));
}

#[test]
fn gmcp_payload_reaches_handler_with_text_around_it() {
    let (mut session, recorder) = gmcp_session(4);
    let mut input = Vec::new();
    input.extend_from_slice(b"before ");
    input.extend_from_slice(&[IAC, consts::SB, GMCP]);
    input.extend_from_slice(b"Comm.Channel.Text {\"text\":\"hi\"}");
    input.extend_from_slice(&[IAC, consts::SE]);
    input.extend_from_slice(b" after");

    let clean = session.receive(&input);
    assert_eq!(&clean[..], b"before  after");
    let messages = recorder.messages.lock().unwrap();
    assert_eq!(messages[0].1.topic(), "Comm.Channel.Text");
    assert_eq!(messages[0].1.payload(), Some("{\"text\":\"hi\"}"));
}

#[test]
fn transmitted_gmcp_frames_leave_negotiation_untouched() {
    let (mut session, _) = gmcp_session(5);
    session.request_local_option(GMCP, true);
    session.transmit(b"");
    session.send_gmcp("Room.Info", Some("{\"num\":1234}")).unwrap();
    session.transmit(b"status line\r\n");
    // The frame passed through reconcile without inventing table state.
    assert_eq!(session.option_count(), 1);
    assert!(!session.is_enabled_local(GMCP));
}

#[traced_test]
#[test]
fn malformed_sequences_are_logged_and_dropped() {
    let (mut session, recorder) = gmcp_session(6);

    // 0x80 is not a command byte.
    let clean = session.receive(&[b'a', IAC, 0x80, b'b']);
    assert_eq!(&clean[..], b"ab");
    assert!(logs_contain("unknown command"));

    // Negotiation with option byte 255.
    let clean = session.receive(&[IAC, consts::DO, IAC, b'c']);
    assert_eq!(&clean[..], b"c");
    assert!(logs_contain("option byte 255"));

    // Subnegotiation for an option nobody registered.
    let clean = session.receive(&[IAC, consts::SB, 99, 1, 2, 3, IAC, consts::SE]);
    assert!(clean.is_empty());
    assert!(logs_contain("unregistered option"));

    // GMCP payload with an empty topic.
    let clean = session.receive(&[IAC, consts::SB, GMCP, b' ', b'x', IAC, consts::SE]);
    assert!(clean.is_empty());
    assert!(logs_contain("malformed GMCP payload"));
    assert!(recorder.messages.lock().unwrap().is_empty());

    // The session keeps working afterwards.
    let clean = session.receive(b"still here");
    assert_eq!(&clean[..], b"still here");
}

#[traced_test]
#[test]
fn oversized_subnegotiation_recovers() {
    let recorder = Arc::new(Recorder::default());
    let mut registry = ExtensionRegistry::new();
    registry
        .register(Arc::new(Gmcp::new(recorder.clone())))
        .unwrap();
    let mut session = TelnetSession::new(
        ConnectionId::new(8),
        TelnetConfig::default()
            .with_go_ahead_marker(false)
            .with_max_subnegotiation(8),
        Arc::new(registry),
    );

    let mut input = vec![IAC, consts::SB, GMCP];
    input.extend_from_slice(b"Way.Too.Long.Topic");
    input.extend_from_slice(&[IAC, consts::SE]);
    session.receive(&input);
    assert!(logs_contain("exceeded buffer limit"));
    assert!(recorder.messages.lock().unwrap().is_empty());

    // A well-formed frame afterwards still gets through.
    let mut input = vec![IAC, consts::SB, GMCP];
    input.extend_from_slice(b"Core.Pi");
    input.extend_from_slice(&[IAC, consts::SE]);
    session.receive(&input);
    assert_eq!(recorder.messages.lock().unwrap()[0].1.topic(), "Core.Pi");
}

#[test]
fn two_sessions_talk_to_each_other() {
    let (mut server, _) = gmcp_session(1);
    let recorder = Arc::new(Recorder::default());
    // The "client" accepts a remote GMCP offer.
    struct AcceptingGmcp(Gmcp);
    impl TelnetExtension for AcceptingGmcp {
        fn option_code(&self) -> u8 {
            self.0.option_code()
        }
        fn accept_remote(&self) -> bool {
            true
        }
        fn on_subnegotiation(&self, connection: ConnectionId, payload: &[u8]) {
            self.0.on_subnegotiation(connection, payload);
        }
    }
    let mut client_registry = ExtensionRegistry::new();
    client_registry
        .register(Arc::new(AcceptingGmcp(Gmcp::new(recorder.clone()))))
        .unwrap();
    let mut client = TelnetSession::new(
        ConnectionId::new(2),
        TelnetConfig::default().with_go_ahead_marker(false),
        Arc::new(client_registry),
    );

    // Server offers GMCP; client answers DO.
    server.request_local_option(GMCP, true);
    let to_client = server.transmit(b"Welcome!\r\n");
    let shown = client.receive(&to_client);
    assert_eq!(&shown[..], b"Welcome!\r\n");
    let to_server = client.transmit(b"");
    assert_eq!(&to_server[..], &[IAC, consts::DO, GMCP]);
    server.receive(&to_server);
    assert!(server.is_enabled_local(GMCP));
    assert!(client.is_enabled_remote(GMCP));

    // Server pushes a vitals message; the client's handler sees it.
    server
        .send_gmcp("Char.Vitals", Some("{\"hp\":100,\"maxhp\":120}"))
        .unwrap();
    let to_client = server.transmit(b"");
    assert!(client.receive(&to_client).is_empty());
    let messages = recorder.messages.lock().unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].1.topic(), "Char.Vitals");
    assert_eq!(messages[0].1.payload(), Some("{\"hp\":100,\"maxhp\":120}"));
}
