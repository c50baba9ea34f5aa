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

//! Transport backed by the system `ssh` client.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Stdio;
use std::str::FromStr;
use tokio::process::Command;

use super::{RemoteSession, SessionCompletion, SessionError, SessionExit, Transport};

/// Default client program
pub const DEFAULT_SSH_PROGRAM: &str = "ssh";

/// Mode for host key checking, passed through as `-o StrictHostKeyChecking=`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrictHostKeyChecking {
    /// Always verify host keys (fail on unknown/changed)
    #[default]
    Yes,
    /// Never verify host keys (accept all)
    No,
    /// Verify known hosts, add new ones automatically (TOFU)
    AcceptNew,
}

impl StrictHostKeyChecking {
    /// Value understood by OpenSSH's `StrictHostKeyChecking` option.
    pub fn as_ssh_value(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::AcceptNew => "accept-new",
        }
    }
}

impl fmt::Display for StrictHostKeyChecking {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ssh_value())
    }
}

impl FromStr for StrictHostKeyChecking {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "yes" | "true" => Ok(Self::Yes),
            "no" | "false" => Ok(Self::No),
            "accept-new" | "tofu" => Ok(Self::AcceptNew),
            other => Err(format!(
                "invalid host key checking mode '{other}' (expected yes, no or accept-new)"
            )),
        }
    }
}

/// Launches one `ssh` process per session.
///
/// Authentication is non-interactive: password, GSSAPI and host-based
/// authentication are disabled so a host that would prompt fails fast
/// instead of stalling the whole group.
#[derive(Debug, Clone)]
pub struct SshTransport {
    program: String,
    strict_mode: StrictHostKeyChecking,
    extra_options: Vec<String>,
}

impl SshTransport {
    pub fn new(strict_mode: StrictHostKeyChecking) -> Self {
        Self {
            program: DEFAULT_SSH_PROGRAM.to_string(),
            strict_mode,
            extra_options: Vec::new(),
        }
    }

    /// Use a different client binary (for example a wrapper script).
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Additional `-o key=value` options appended after the built-in ones.
    pub fn with_options(mut self, options: Vec<String>) -> Self {
        self.extra_options = options;
        self
    }

    /// Arguments passed to the client for one session.
    pub fn args(&self, username: &str, address: &str, command: &str) -> Vec<String> {
        let mut args = vec![
            "-A".to_string(),
            "-o".to_string(),
            "PasswordAuthentication=no".to_string(),
            "-o".to_string(),
            format!("StrictHostKeyChecking={}", self.strict_mode.as_ssh_value()),
            "-o".to_string(),
            "GSSAPIAuthentication=no".to_string(),
            "-o".to_string(),
            "HostbasedAuthentication=no".to_string(),
        ];
        for option in &self.extra_options {
            args.push("-o".to_string());
            args.push(option.clone());
        }
        args.push("-l".to_string());
        args.push(username.to_string());
        args.push(address.to_string());
        args.push(command.to_string());
        args
    }
}

impl Transport for SshTransport {
    fn launch(
        &self,
        username: &str,
        address: &str,
        command: &str,
    ) -> Result<RemoteSession, SessionError> {
        let mut cmd = Command::new(&self.program);
        cmd.args(self.args(username, address, command))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!("Launching {} for {}@{}", self.program, username, address);

        let mut child = cmd.spawn().map_err(|source| SessionError::Launch {
            username: username.to_string(),
            address: address.to_string(),
            source,
        })?;

        let stdout = child.stdout.take().ok_or_else(|| SessionError::MissingPipe {
            address: address.to_string(),
            stream: "stdout",
        })?;
        let stderr = child.stderr.take().ok_or_else(|| SessionError::MissingPipe {
            address: address.to_string(),
            stream: "stderr",
        })?;

        let address = address.to_string();
        let completion = SessionCompletion::new(Box::pin(async move {
            let status = child
                .wait()
                .await
                .map_err(|source| SessionError::Wait { address, source })?;
            Ok(SessionExit::new(status.code()))
        }));

        Ok(RemoteSession::new(
            Box::new(stdout),
            Box::new(stderr),
            completion,
        ))
    }
}
