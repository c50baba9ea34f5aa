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

//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::hostlist::HostSource;
use crate::session::StrictHostKeyChecking;

/// Login user when neither the command line nor the config file name one.
pub const DEFAULT_USER: &str = "root";

/// Delay between two session spawns in milliseconds.
pub const DEFAULT_DELAY_MS: u64 = 10;

/// Maximum number of parallel sessions.
pub const DEFAULT_PROCS: usize = 500;

/// Contents of the YAML configuration file.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
}

/// Default values for command line options.
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct Defaults {
    pub user: Option<String>,
    /// Spawn delay in milliseconds.
    pub delay: Option<u64>,
    pub procs: Option<usize>,
    pub strict: Option<StrictHostKeyChecking>,
    /// ssh client binary, `ssh` when unset.
    pub ssh_program: Option<String>,
    /// Extra `-o` options given to every session.
    #[serde(default)]
    pub ssh_options: Vec<String>,
    pub log_file: Option<String>,
}

/// Settings of one run, resolved once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub username: String,
    pub command: String,
    pub host_source: HostSource,
    pub delay: Duration,
    /// Requested cap, clamped to the host count by the execution group.
    pub max_parallel: usize,
    pub strict_mode: StrictHostKeyChecking,
    pub ssh_program: String,
    pub ssh_options: Vec<String>,
    pub log_file: Option<PathBuf>,
}
