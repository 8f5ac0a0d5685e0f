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

//! Engine configuration.

/// Tunables for a [`TelnetSession`](crate::TelnetSession).
///
/// # Examples
///
/// ```
/// use mudlink_telnet::TelnetConfig;
///
/// let config = TelnetConfig::default()
///     .with_max_subnegotiation(4096)
///     .with_go_ahead_marker(false);
/// ```
#[derive(Debug, Clone)]
pub struct TelnetConfig {
    /// Maximum number of payload bytes buffered for a single subnegotiation.
    /// A sequence growing past this is discarded and the parser resets.
    pub max_subnegotiation: usize,

    /// Append `IAC GA` after transmitted output while the local
    /// Suppress-Go-Ahead option is not enabled (half-duplex prompting).
    pub go_ahead_marker: bool,
}

impl Default for TelnetConfig {
    fn default() -> Self {
        Self {
            max_subnegotiation: 16 * 1024,
            go_ahead_marker: true,
        }
    }
}

impl TelnetConfig {
    /// Set the maximum buffered subnegotiation payload length.
    pub fn with_max_subnegotiation(mut self, limit: usize) -> Self {
        self.max_subnegotiation = limit;
        self
    }

    /// Enable or disable the trailing Go-Ahead marker.
    pub fn with_go_ahead_marker(mut self, enabled: bool) -> Self {
        self.go_ahead_marker = enabled;
        self
    }
}
