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

//! Host list loading
//!
//! A host list is a line-oriented text source with one address per line.
//! Blank lines and lines starting with `#` (after leading whitespace) are
//! skipped, every other line is trimmed and kept in order. Duplicates are
//! kept: each occurrence becomes its own session.
//!
//! ```text
//! # web tier
//! web1.example.com
//! web2.example.com
//!
//! 10.0.0.12
//! ```

mod error;

pub use error::HostListError;

use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

/// Maximum file size for host files (100 MB)
const MAX_HOSTFILE_SIZE: u64 = 100 * 1024 * 1024;

/// Where the host list is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostSource {
    /// Read addresses from standard input
    Stdin,
    /// Read addresses from a file
    File(PathBuf),
}

impl HostSource {
    /// `None` and `-` both mean standard input.
    pub fn from_arg(arg: Option<&Path>) -> Self {
        match arg {
            Some(path) if path != Path::new("-") => HostSource::File(path.to_path_buf()),
            _ => HostSource::Stdin,
        }
    }

    fn display_name(&self) -> String {
        match self {
            HostSource::Stdin => "standard input".to_string(),
            HostSource::File(path) => path.display().to_string(),
        }
    }
}

/// Ordered list of host addresses plus the alignment width
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostList {
    hosts: Vec<String>,
    width: usize,
}

impl HostList {
    /// Build a host list from already trimmed addresses.
    pub fn new(hosts: Vec<String>) -> Self {
        let width = hosts.iter().map(|h| h.chars().count()).max().unwrap_or(0);
        Self { hosts, width }
    }

    /// Load the host list from the given source.
    pub fn load(source: &HostSource) -> Result<Self, HostListError> {
        match source {
            HostSource::Stdin => {
                let stdin = std::io::stdin();
                Self::parse(stdin.lock(), "standard input")
            }
            HostSource::File(path) => Self::from_file(path),
        }
    }

    /// Load the host list from a file.
    pub fn from_file(path: &Path) -> Result<Self, HostListError> {
        let metadata = std::fs::metadata(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                HostListError::FileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                HostListError::FileReadError {
                    path: path.display().to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        if metadata.is_dir() {
            return Err(HostListError::FileReadError {
                path: path.display().to_string(),
                reason: "is a directory".to_string(),
            });
        }

        if metadata.len() > MAX_HOSTFILE_SIZE {
            return Err(HostListError::FileReadError {
                path: path.display().to_string(),
                reason: format!(
                    "file size {} bytes exceeds maximum allowed size of {} bytes",
                    metadata.len(),
                    MAX_HOSTFILE_SIZE
                ),
            });
        }

        let file = std::fs::File::open(path).map_err(|e| HostListError::FileReadError {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;

        Self::parse(
            BufReader::new(file),
            &HostSource::File(path.to_path_buf()).display_name(),
        )
    }

    /// Parse a host list from any buffered reader.
    pub fn parse<R: BufRead>(reader: R, source_name: &str) -> Result<Self, HostListError> {
        let mut hosts = Vec::new();

        for line in reader.lines() {
            let line = line.map_err(|source| HostListError::Io {
                source_name: source_name.to_string(),
                source,
            })?;
            let entry = line.trim();
            if entry.is_empty() || entry.starts_with('#') {
                continue;
            }
            hosts.push(entry.to_string());
        }

        tracing::debug!("Read {} hosts from {}", hosts.len(), source_name);
        Ok(Self::new(hosts))
    }

    /// Addresses in file order.
    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }

    /// Length of the longest address, used to right-align output.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.hosts.iter().map(String::as_str)
    }
}
