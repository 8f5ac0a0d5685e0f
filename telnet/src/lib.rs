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

//! # Mudlink Telnet Protocol Engine
//!
//! This crate implements the Telnet (RFC 854/855) side of a text-game
//! network server: a byte-stream negotiation state machine with stream
//! compaction and a pluggable extension mechanism.
//!
//! ## Core Components
//!
//! ### [`TelnetSession`]
//!
//! The per-connection engine. [`TelnetSession::receive`] consumes raw bytes
//! from the socket and returns the application text with every protocol
//! sequence stripped; negotiation replies are queued as a side effect.
//! [`TelnetSession::transmit`] turns application text into wire bytes,
//! carrying the queued protocol traffic, escaping IAC, and appending a
//! Go-Ahead marker while Suppress-Go-Ahead is off. The session performs no
//! I/O and never blocks; reading and writing sockets is the transport
//! layer's job.
//!
//! ### [`ByteCursor`]
//!
//! The streaming parser underneath `receive`. An arbitrary split of the byte
//! stream across deliveries is fine: a sequence cut off mid-delivery is
//! retained inside the cursor and resumed on the next call.
//!
//! ### [`NegotiationTable`]
//!
//! Per-option negotiation state following the Q-method (RFC 1143), one
//! lazily-created [`NegotiationEntry`] per option code, each with
//! independent `local` and `remote` triads. The tie-breaking rules prevent
//! negotiation loops even when both sides change their minds mid-flight.
//!
//! ### [`ExtensionRegistry`] and [`TelnetExtension`]
//!
//! Options mean nothing to the engine itself. A [`TelnetExtension`]
//! registered at process start supplies the meaning: whether each direction
//! may be negotiated, and what to do when negotiation settles or a
//! subnegotiation payload arrives. Unsolicited negotiation for an
//! unregistered option is refused.
//!
//! ### GMCP
//!
//! The [`gmcp`] module provides the one built-in messaging extension:
//! `topic [JSON]` out-of-band messages over option 201. The JSON payload is
//! carried untouched; decoding it belongs to the caller's JSON codec.
//!
//! ## Usage Example
//!
//! ```rust
//! use mudlink_telnet::{
//!     ConnectionId, ExtensionRegistry, TelnetConfig, TelnetSession,
//! };
//! use std::sync::Arc;
//!
//! let extensions = Arc::new(ExtensionRegistry::new());
//! let mut session = TelnetSession::new(
//!     ConnectionId::new(1),
//!     TelnetConfig::default(),
//!     extensions,
//! );
//!
//! // IAC DO SGA followed by a command line.
//! let clean = session.receive(&[255, 253, 3, b'l', b'o', b'o', b'k']);
//! assert_eq!(&clean[..], b"look");
//!
//! // The WILL reply leaves with the next write.
//! let wire = session.transmit(b"You are standing in a tavern.\r\n");
//! assert_eq!(&wire[..3], &[255, 251, 3]);
//! ```
//!
//! ## Error Handling
//!
//! Malformed protocol input never fails the connection: unknown commands,
//! an option byte of 255, and oversized subnegotiations are logged through
//! [`tracing`] and dropped. [`TelnetError`] covers caller mistakes only.
//!
//! ## Thread Safety
//!
//! A `TelnetSession` is not shared: the transport must serialize input
//! processing and output flushing per connection. The
//! [`ExtensionRegistry`], populated before the first connection, is
//! thereafter read-only and shared via `Arc`.

#![warn(
    clippy::cargo,
    missing_docs,
    clippy::pedantic,
    future_incompatible,
    rust_2018_idioms
)]
#![allow(
    clippy::option_if_let_else,
    clippy::module_name_repetitions,
    clippy::missing_errors_doc
)]

pub mod consts;
mod config;
mod cursor;
mod engine;
mod extension;
pub mod gmcp;
mod negotiation;
mod result;
mod types;

pub use self::config::TelnetConfig;
pub use self::cursor::{ByteCursor, NegotiationCommand, ProtocolEvent};
pub use self::engine::TelnetSession;
pub use self::extension::{ExtensionRegistry, TelnetExtension};
pub use self::gmcp::{Gmcp, GmcpHandler, GmcpMessage};
pub use self::negotiation::{NegotiationEntry, NegotiationTable, QValue, QueueState, Side, Triad};
pub use self::result::{TelnetError, TelnetResult};
pub use self::types::ConnectionId;
