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

//! # Mudlink Connection Layer
//!
//! Glue between a game server's transport loop and the
//! [`mudlink-telnet`](mudlink_telnet) protocol engine: an ordered
//! [`ProtocolHandler`] chain per connection and an [`Endpoint`] registry
//! mapping connection IDs to their pipelines.
//!
//! The transport collaborator reads sockets and calls
//! [`Endpoint::process_input`]; the game layer writes through
//! [`Endpoint::prepare_output`] or [`Endpoint::flush_output`]. Everything in
//! between — negotiation replies, stream compaction, GMCP frames — happens
//! inside the pipeline without either side seeing protocol bytes.
//!
//! ## Usage Example
//!
//! ```rust
//! use mudlink_session::{Endpoint, ConnectionId};
//! use mudlink_telnet::{ExtensionRegistry, Gmcp, GmcpHandler, GmcpMessage, consts};
//! use std::sync::Arc;
//!
//! struct Sink;
//! impl GmcpHandler for Sink {
//!     fn on_message(&self, _connection: ConnectionId, _message: GmcpMessage) {}
//! }
//!
//! # fn main() -> Result<(), mudlink_session::SessionError> {
//! let mut registry = ExtensionRegistry::new();
//! registry.register(Arc::new(Gmcp::new(Arc::new(Sink))))?;
//!
//! let mut endpoint = Endpoint::new(registry);
//! let id = ConnectionId::new(1);
//! endpoint.attach(id)?;
//!
//! // Offer GMCP at connect time; the WILL rides the next output flush.
//! endpoint.request_local_option(id, consts::option::GMCP, true)?;
//!
//! let clean = endpoint.process_input(id, b"say hello\r\n")?;
//! assert_eq!(&clean[..], b"say hello\r\n");
//! # Ok(())
//! # }
//! ```

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

mod endpoint;
mod error;
mod pipeline;

pub use self::endpoint::{Endpoint, Transport};
pub use self::error::{Result, SessionError};
pub use self::pipeline::{Pipeline, ProtocolHandler, TelnetStage};

pub use mudlink_telnet::ConnectionId;
