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

//! Error types for host list loading

use thiserror::Error;

/// Errors that can occur while reading a host list
#[derive(Debug, Error)]
pub enum HostListError {
    /// Host file does not exist
    #[error("host list not found: {path}")]
    FileNotFound { path: String },

    /// Host file exists but could not be read
    #[error("failed to read host list '{path}': {reason}")]
    FileReadError { path: String, reason: String },

    /// Reading from the underlying stream failed part way through
    #[error("failed to read host list from {source_name}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = HostListError::FileNotFound {
            path: "/tmp/missing".to_string(),
        };
        assert_eq!(err.to_string(), "host list not found: /tmp/missing");

        let err = HostListError::FileReadError {
            path: "hosts.txt".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to read host list 'hosts.txt': permission denied"
        );
    }
}
