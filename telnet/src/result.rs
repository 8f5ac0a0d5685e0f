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

//! Error types for the telnet protocol engine.
//!
//! Recoverable protocol syntax errors (unknown command bytes, an option byte
//! of 255, oversized subnegotiations) never surface here; they are logged and
//! locally recovered so the connection keeps running. `TelnetError` is
//! reserved for caller mistakes detected at the API boundary.

use thiserror::Error;

/// Result type for engine operations.
pub type TelnetResult<T> = std::result::Result<T, TelnetError>;

/// Telnet engine error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TelnetError {
    /// An extension is already registered for this option code.
    #[error("option {0} already has a registered extension")]
    DuplicateExtension(u8),

    /// Option code 255 is the command introducer and can never be negotiated.
    #[error("option code {0} is reserved for the command introducer")]
    ReservedOptionCode(u8),

    /// A GMCP message requires a non-empty topic.
    #[error("GMCP topic is empty")]
    EmptyTopic,

    /// The GMCP topic would corrupt the `topic SP payload` framing.
    #[error("GMCP topic {0:?} contains a space")]
    MalformedTopic(String),

    /// A GMCP subnegotiation payload was not valid UTF-8.
    #[error("GMCP payload is not valid UTF-8")]
    PayloadNotUtf8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TelnetError::DuplicateExtension(201);
        assert_eq!(
            err.to_string(),
            "option 201 already has a registered extension"
        );

        let err = TelnetError::ReservedOptionCode(255);
        assert_eq!(
            err.to_string(),
            "option code 255 is reserved for the command introducer"
        );

        let err = TelnetError::MalformedTopic("Core Hello".to_string());
        assert_eq!(err.to_string(), "GMCP topic \"Core Hello\" contains a space");
    }
}
