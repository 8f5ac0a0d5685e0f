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

//! Error types for the connection layer.

use mudlink_telnet::{ConnectionId, TelnetError};
use thiserror::Error;

/// Result type for connection-layer operations.
pub type Result<T> = std::result::Result<T, SessionError>;

/// Connection-layer error types.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Protocol error from the engine layer.
    #[error("protocol error: {0}")]
    Protocol(#[from] TelnetError),

    /// I/O error from the transport collaborator.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection with the given ID was not found.
    #[error("connection {0} not found")]
    ConnectionNotFound(ConnectionId),

    /// A pipeline already exists for the given connection ID.
    #[error("connection {0} already attached")]
    AlreadyAttached(ConnectionId),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::ConnectionNotFound(ConnectionId::new(42));
        assert_eq!(err.to_string(), "connection conn-42 not found");

        let err = SessionError::Protocol(TelnetError::EmptyTopic);
        assert_eq!(err.to_string(), "protocol error: GMCP topic is empty");
    }
}
