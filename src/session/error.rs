// Copyright 2025 Lablup Inc. and Jeongkyu Shin
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use thiserror::Error;

/// Errors raised by a transport while starting or supervising a session
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session process could not be created
    #[error("failed to start session for {username}@{address}: {source}")]
    Launch {
        username: String,
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// A pipe that should have been captured was not available
    #[error("session for {address} has no {stream} pipe")]
    MissingPipe {
        address: String,
        stream: &'static str,
    },

    /// Waiting for the session process failed
    #[error("failed to wait for session on {address}: {source}")]
    Wait {
        address: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SessionError::Launch {
            username: "root".to_string(),
            address: "web1".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        };
        assert_eq!(
            err.to_string(),
            "failed to start session for root@web1: no such file"
        );

        let err = SessionError::MissingPipe {
            address: "web1".to_string(),
            stream: "stderr",
        };
        assert_eq!(err.to_string(), "session for web1 has no stderr pipe");
    }
}
