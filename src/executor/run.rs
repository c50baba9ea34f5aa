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

//! Top-level spawn loop.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::group::{clamp_max_active, ExecutionGroup};
use super::stats::RunStats;
use crate::config::RunConfig;
use crate::console::Console;
use crate::hostlist::HostList;
use crate::session::Transport;

/// Outcome of a finished run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Hosts processed (equal to the host list length)
    pub total: usize,
    pub complete: usize,
    /// Effective concurrency cap
    pub max_active: usize,
    pub peak_active: usize,
    pub stats: RunStats,
    /// `(address, reason)` of hosts whose output could not be fully read
    pub failed: Vec<(String, String)>,
    /// Set when the log file stopped receiving output
    pub log_failure: Option<String>,
    pub elapsed: Duration,
}

impl RunSummary {
    /// Summary text printed after the run.
    pub fn report_lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("  Done. {} hosts processed.", self.total),
            format!(
                "  stdout: {} hosts, {} lines",
                self.stats.stdout_hosts, self.stats.stdout_lines
            ),
            format!(
                "  stderr: {} hosts, {} lines",
                self.stats.stderr_hosts, self.stats.stderr_lines
            ),
            format!(
                "  output: {} hosts, {} lines",
                self.stats.output_hosts, self.stats.output_lines
            ),
        ];

        if !self.failed.is_empty() {
            lines.push(format!(
                "  failed: {} hosts with unreadable output",
                self.failed.len()
            ));
            for (address, reason) in &self.failed {
                lines.push(format!("    {address}: {reason}"));
            }
        }

        if let Some(reason) = &self.log_failure {
            lines.push(format!("  log incomplete: {reason}"));
        }

        lines
    }
}

/// Run `config.command` on every host of `hosts`.
///
/// Hosts are spawned in list order, `config.delay` apart, with at most the
/// clamped cap active at once. Returns after every session has been drained
/// and joined. Failing to start a session aborts the run with an error.
pub async fn run_group(
    config: &RunConfig,
    hosts: &HostList,
    transport: Arc<dyn Transport>,
    console: Arc<Console>,
) -> Result<RunSummary> {
    let started = Instant::now();

    if hosts.is_empty() {
        tracing::info!("Host list is empty, nothing to run");
        return Ok(RunSummary {
            elapsed: started.elapsed(),
            ..RunSummary::default()
        });
    }

    let group = Arc::new(ExecutionGroup::new(
        hosts.len(),
        config.max_parallel,
        hosts.width(),
        transport,
        Arc::clone(&console),
    ));
    let cap = group.max_active();

    tracing::info!(
        "Running '{}' on {} hosts as {}, {} at a time",
        config.command,
        hosts.len(),
        config.username,
        cap
    );

    for (i, address) in hosts.iter().enumerate() {
        group
            .spawn(&config.username, address, &config.command)
            .await?;
        group.update_progress();

        if i + 1 < hosts.len() {
            if !config.delay.is_zero() {
                tokio::time::sleep(config.delay).await;
            }
            group.wait(cap).await;
        }
    }

    group.wait(0).await;
    group.clear_progress();
    console.flush().context("Failed to flush output")?;

    let servers = group.servers();
    let stats = RunStats::collect(servers.iter().map(|host| host.as_ref()));
    let failed = servers
        .iter()
        .filter_map(|host| {
            host.failure()
                .map(|reason| (host.address().to_string(), reason.to_string()))
        })
        .collect();

    Ok(RunSummary {
        total: group.total(),
        complete: group.complete(),
        max_active: cap,
        peak_active: group.peak_active(),
        stats,
        failed,
        log_failure: console.log_failure(),
        elapsed: started.elapsed(),
    })
}

/// Effective number of parallel sessions for a host list of `total` entries.
pub fn effective_parallelism(config: &RunConfig, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    clamp_max_active(config.max_parallel, total)
}
