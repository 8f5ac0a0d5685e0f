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

//! Negotiable-option extensions and their registry.
//!
//! The engine knows how to negotiate options and collect subnegotiation
//! payloads, but not what any option *means*. Each meaning is supplied by a
//! [`TelnetExtension`] registered once at process start; the engine consults
//! the registry to decide whether to accept negotiation for an option and to
//! deliver payloads and completed negotiations. Extensions are shared across
//! every connection; per-connection state belongs in the extension's own
//! store keyed by [`ConnectionId`].

use crate::consts;
use crate::negotiation::Side;
use crate::result::{TelnetError, TelnetResult};
use crate::types::ConnectionId;
use std::collections::HashMap;
use std::sync::Arc;

/// A negotiable option's behavior, plugged into the engine.
pub trait TelnetExtension: Send + Sync {
    /// The option code this extension negotiates. Never 255.
    fn option_code(&self) -> u8;

    /// Whether this side may perform the option (answer DO with WILL, or
    /// offer WILL itself).
    fn offer_local(&self) -> bool {
        false
    }

    /// Whether the peer may perform the option (its WILL is answered DO).
    fn accept_remote(&self) -> bool {
        false
    }

    /// A negotiation for this option settled; `enabled` is the new agreed
    /// state for the given side.
    fn on_negotiated(&self, _connection: ConnectionId, _side: Side, _enabled: bool) {}

    /// A subnegotiation payload for this option arrived, IAC-unescaped.
    fn on_subnegotiation(&self, _connection: ConnectionId, _payload: &[u8]) {}
}

/// Built-in Suppress-Go-Ahead descriptor (option 3).
///
/// SGA carries no subnegotiation and needs no callbacks; registering it
/// merely permits the negotiation, which the engine then reads back when
/// deciding whether to append the Go-Ahead marker.
struct SuppressGoAhead;

impl TelnetExtension for SuppressGoAhead {
    fn option_code(&self) -> u8 {
        consts::option::SGA
    }

    fn offer_local(&self) -> bool {
        true
    }

    fn accept_remote(&self) -> bool {
        true
    }
}

/// Process-lifetime mapping from option code to extension.
///
/// Populated before any connection is accepted and read-only afterwards,
/// which is what lets every connection share it behind a plain `Arc`.
pub struct ExtensionRegistry {
    extensions: HashMap<u8, Arc<dyn TelnetExtension>>,
}

impl ExtensionRegistry {
    /// Creates a registry seeded with the built-in Suppress-Go-Ahead
    /// descriptor.
    pub fn new() -> Self {
        let mut extensions: HashMap<u8, Arc<dyn TelnetExtension>> = HashMap::new();
        extensions.insert(consts::option::SGA, Arc::new(SuppressGoAhead));
        Self { extensions }
    }

    /// Registers an extension for its option code.
    ///
    /// # Errors
    ///
    /// Returns [`TelnetError::ReservedOptionCode`] for option code 255 and
    /// [`TelnetError::DuplicateExtension`] when the code is already taken.
    pub fn register(&mut self, extension: Arc<dyn TelnetExtension>) -> TelnetResult<()> {
        let code = extension.option_code();
        if code == consts::IAC {
            return Err(TelnetError::ReservedOptionCode(code));
        }
        if self.extensions.contains_key(&code) {
            return Err(TelnetError::DuplicateExtension(code));
        }
        self.extensions.insert(code, extension);
        Ok(())
    }

    /// The extension registered for the option code, if any.
    pub fn lookup(&self, option: u8) -> Option<&Arc<dyn TelnetExtension>> {
        self.extensions.get(&option)
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
