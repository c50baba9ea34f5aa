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

//! Per-host record kept for the lifetime of a run.

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

use crate::console::StreamKind;

/// One spawned session and its output statistics.
///
/// Line counters are only written by the host's own drainers. They are
/// read for the summary once the group has fully drained.
#[derive(Debug)]
pub struct RemoteHost {
    index: usize,
    username: String,
    address: String,
    stdout_lines: AtomicUsize,
    stderr_lines: AtomicUsize,
    failure: OnceLock<String>,
}

impl RemoteHost {
    pub fn new(index: usize, username: &str, address: &str) -> Self {
        Self {
            index,
            username: username.to_string(),
            address: address.to_string(),
            stdout_lines: AtomicUsize::new(0),
            stderr_lines: AtomicUsize::new(0),
            failure: OnceLock::new(),
        }
    }

    /// Position in spawn order.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn stdout_lines(&self) -> usize {
        self.stdout_lines.load(Ordering::Acquire)
    }

    pub fn stderr_lines(&self) -> usize {
        self.stderr_lines.load(Ordering::Acquire)
    }

    pub(crate) fn record_line(&self, stream: StreamKind) {
        let counter = match stream {
            StreamKind::Stdout => &self.stdout_lines,
            StreamKind::Stderr => &self.stderr_lines,
        };
        counter.fetch_add(1, Ordering::AcqRel);
    }

    /// Mark the host as failed. Only the first reason is kept.
    pub(crate) fn mark_failed(&self, reason: String) {
        if self.failure.set(reason).is_err() {
            tracing::trace!("{} already marked as failed", self.address);
        }
    }

    pub fn failure(&self) -> Option<&str> {
        self.failure.get().map(String::as_str)
    }
}

impl fmt::Display for RemoteHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.username, self.address)
    }
}
