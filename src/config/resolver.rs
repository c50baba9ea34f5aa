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

//! Merging command line options with the configuration file.

use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::Cli;
use crate::hostlist::HostSource;
use crate::session::ssh::DEFAULT_SSH_PROGRAM;

use super::types::{Config, RunConfig, DEFAULT_DELAY_MS, DEFAULT_PROCS, DEFAULT_USER};
use super::utils::expand_tilde;

impl RunConfig {
    /// Resolve the settings of a run.
    ///
    /// Command line flags take precedence over the config file, which takes
    /// precedence over built-in defaults. `ssh_options` from both sources are
    /// combined, config file first.
    pub fn resolve(cli: &Cli, config: &Config) -> Result<Self> {
        let command = cli.get_command();
        if command.trim().is_empty() {
            anyhow::bail!(
                "No command specified. Please provide a command to execute.\nExample: gssh -f hosts.txt uptime"
            );
        }

        let defaults = &config.defaults;

        let username = cli
            .user
            .clone()
            .or_else(|| defaults.user.clone())
            .unwrap_or_else(|| DEFAULT_USER.to_string());

        let delay_ms = cli.delay.or(defaults.delay).unwrap_or(DEFAULT_DELAY_MS);

        let max_parallel = match cli.procs {
            Some(procs) => usize::try_from(procs).unwrap_or(usize::MAX),
            None => defaults.procs.unwrap_or(DEFAULT_PROCS),
        };
        if max_parallel == 0 {
            anyhow::bail!("Maximum parallel sessions must be at least 1");
        }

        let mut ssh_options = defaults.ssh_options.clone();
        ssh_options.extend(cli.ssh_options.iter().cloned());

        let log_file = cli.logfile.clone().or_else(|| {
            defaults
                .log_file
                .as_ref()
                .map(|path| expand_tilde(&PathBuf::from(path)))
        });

        Ok(Self {
            username,
            command,
            host_source: HostSource::from_arg(cli.file.as_deref()),
            delay: Duration::from_millis(delay_ms),
            max_parallel,
            strict_mode: cli.strict.or(defaults.strict).unwrap_or_default(),
            ssh_program: defaults
                .ssh_program
                .clone()
                .unwrap_or_else(|| DEFAULT_SSH_PROGRAM.to_string()),
            ssh_options,
            log_file,
        })
    }
}
