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

//! Remote session boundary.
//!
//! A [`RemoteSession`] is one in-flight remote command: two readable byte
//! streams and a completion future. The executor never looks behind this
//! boundary; anything able to produce a session implements [`Transport`].

mod error;
pub mod ssh;

pub use error::SessionError;
pub use ssh::{SshTransport, StrictHostKeyChecking};

use futures::future::BoxFuture;
use std::fmt;
use tokio::io::AsyncRead;

/// Readable half of a session output stream
pub type SessionReader = Box<dyn AsyncRead + Send + Unpin>;

/// How a session process ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExit {
    code: Option<i32>,
}

impl SessionExit {
    pub fn new(code: Option<i32>) -> Self {
        Self { code }
    }

    /// Exit code, `None` when the process was terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

impl fmt::Display for SessionExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => write!(f, "terminated by signal"),
        }
    }
}

/// Future resolving once the session process has exited
pub struct SessionCompletion(BoxFuture<'static, Result<SessionExit, SessionError>>);

impl SessionCompletion {
    pub fn new(future: BoxFuture<'static, Result<SessionExit, SessionError>>) -> Self {
        Self(future)
    }

    /// Block until the session process exits.
    pub async fn wait(self) -> Result<SessionExit, SessionError> {
        self.0.await
    }
}

/// One host's in-flight remote execution
pub struct RemoteSession {
    stdout: SessionReader,
    stderr: SessionReader,
    completion: SessionCompletion,
}

impl RemoteSession {
    pub fn new(stdout: SessionReader, stderr: SessionReader, completion: SessionCompletion) -> Self {
        Self {
            stdout,
            stderr,
            completion,
        }
    }

    /// Split the session into its stdout reader, stderr reader and completion.
    pub fn into_parts(self) -> (SessionReader, SessionReader, SessionCompletion) {
        (self.stdout, self.stderr, self.completion)
    }
}

/// Something that can start a remote command on a host.
///
/// `command` is handed to the remote side verbatim.
pub trait Transport: Send + Sync {
    fn launch(
        &self,
        username: &str,
        address: &str,
        command: &str,
    ) -> Result<RemoteSession, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;

    #[test]
    fn test_session_exit() {
        assert!(SessionExit::new(Some(0)).success());
        assert!(!SessionExit::new(Some(2)).success());
        assert!(!SessionExit::new(None).success());
        assert_eq!(SessionExit::new(Some(2)).to_string(), "exit code 2");
        assert_eq!(SessionExit::new(None).to_string(), "terminated by signal");
    }

    #[tokio::test]
    async fn test_session_into_parts() {
        let session = RemoteSession::new(
            Box::new(std::io::Cursor::new(b"out\n".to_vec())),
            Box::new(std::io::Cursor::new(b"err\n".to_vec())),
            SessionCompletion::new(Box::pin(async { Ok(SessionExit::new(Some(0))) })),
        );

        let (mut stdout, mut stderr, completion) = session.into_parts();
        let mut out = String::new();
        stdout.read_to_string(&mut out).await.unwrap();
        let mut err = String::new();
        stderr.read_to_string(&mut err).await.unwrap();

        assert_eq!(out, "out\n");
        assert_eq!(err, "err\n");
        assert!(completion.wait().await.unwrap().success());
    }
}
