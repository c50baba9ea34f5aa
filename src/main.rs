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

use anyhow::{Context, Result};
use clap::Parser;
use std::io::IsTerminal;
use std::sync::Arc;
use std::time::Duration;

use gssh::{
    cli::Cli,
    config::{Config, RunConfig},
    console::{Console, ConsoleOptions, LogSink},
    executor::{effective_parallelism, run_group},
    hostlist::{HostList, HostSource},
    session::SshTransport,
    utils::init_logging,
};

/// Format a Duration into a human-readable string
fn format_duration(duration: Duration) -> String {
    let total_seconds = duration.as_secs_f64();

    if total_seconds < 1.0 {
        format!("{:.1} ms", duration.as_secs_f64() * 1000.0)
    } else if total_seconds < 60.0 {
        format!("{total_seconds:.2} s")
    } else {
        let minutes = duration.as_secs() / 60;
        let seconds = duration.as_secs() % 60;
        if seconds == 0 {
            format!("{minutes}m")
        } else {
            format!("{minutes}m {seconds}s")
        }
    }
}

fn load_hosts(source: &HostSource) -> Result<HostList> {
    if *source == HostSource::Stdin && std::io::stdin().is_terminal() {
        anyhow::bail!(
            "No host list given. Use --file <path> or pipe the host list on standard input.\nExample: gssh -f hosts.txt uptime"
        );
    }
    HostList::load(source).context("Failed to load host list")
}

fn print_banner(console: &Console, config: &RunConfig, hosts: &HostList) -> Result<()> {
    let lines = [
        format!("gssh - group ssh, ver. {}", env!("CARGO_PKG_VERSION")),
        String::new(),
        format!("  [*] read ({}) hosts from the list", hosts.len()),
        format!(
            "  [*] executing '{}' as user '{}'",
            config.command, config.username
        ),
        format!(
            "  [*] spawning {} parallel ssh sessions",
            effective_parallelism(config, hosts.len())
        ),
        String::new(),
    ];
    for line in &lines {
        console.println(line)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load_with_priority(cli.config.as_deref()).await?;
    let run_config = RunConfig::resolve(&cli, &config)?;
    tracing::debug!("Resolved run configuration: {:?}", run_config);

    let hosts = load_hosts(&run_config.host_source)?;

    let log = run_config
        .log_file
        .as_deref()
        .map(LogSink::create)
        .transpose()?;

    let console = Arc::new(Console::stdout(ConsoleOptions::detect(), log));
    print_banner(&console, &run_config, &hosts)?;

    let transport = Arc::new(
        SshTransport::new(run_config.strict_mode)
            .with_program(run_config.ssh_program.clone())
            .with_options(run_config.ssh_options.clone()),
    );

    let summary = run_group(&run_config, &hosts, transport, Arc::clone(&console)).await?;

    console.println("")?;
    for line in summary.report_lines() {
        console.println(&line)?;
    }
    console.flush()?;

    tracing::info!(
        "Finished {} hosts in {} (peak {} parallel sessions)",
        summary.total,
        format_duration(summary.elapsed),
        summary.peak_active
    );

    Ok(())
}
