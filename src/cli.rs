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

use clap::Parser;
use std::path::PathBuf;

use crate::session::StrictHostKeyChecking;

#[derive(Parser, Debug)]
#[command(
    name = "gssh",
    version,
    about = "Group SSH - run one command on many hosts in parallel",
    long_about = "gssh runs a single command on every host of a host list over ssh.\nAt most --procs sessions run at the same time. Output of all hosts is interleaved\nline by line, labeled with the host address, stdout and stderr marked with\ndifferent colors, while a progress line tracks completed hosts.",
    after_help = "EXAMPLES:\n  Run on every host in a file:   gssh -f hosts.txt uptime\n  Read hosts from stdin:         cat hosts.txt | gssh -l deploy 'df -h /'\n  Limit parallel sessions:       gssh -f hosts.txt -p 20 -d 50 'apt-get -y update'\n  Keep a copy of the output:     gssh -f hosts.txt --logfile run.log 'uname -r'\n\nHost list format: one address per line, blank lines and lines starting with '#' are ignored."
)]
pub struct Cli {
    #[arg(
        short = 'l',
        long,
        help = "Login username for ssh sessions [default: root]"
    )]
    pub user: Option<String>,

    #[arg(
        short = 'f',
        long,
        help = "File with the list of hosts, '-' or omitted reads standard input"
    )]
    pub file: Option<PathBuf>,

    #[arg(
        short = 'd',
        long,
        help = "Delay between session spawns in milliseconds [default: 10]"
    )]
    pub delay: Option<u64>,

    #[arg(
        short = 'p',
        long,
        value_parser = clap::value_parser!(u64).range(1..),
        help = "Maximum number of parallel ssh sessions [default: 500]"
    )]
    pub procs: Option<u64>,

    #[arg(
        long,
        help = "Host key checking mode (yes/no/accept-new) [default: yes]"
    )]
    pub strict: Option<StrictHostKeyChecking>,

    #[arg(
        short = 'L',
        long,
        help = "Save remote output (without colors) in the specified file"
    )]
    pub logfile: Option<PathBuf>,

    #[arg(
        short = 'o',
        long = "ssh-option",
        help = "Extra ssh option in key=value form, may be repeated\nExample: -o ConnectTimeout=5"
    )]
    pub ssh_options: Vec<String>,

    #[arg(
        long,
        help = "Configuration file path [default: ~/.config/gssh/config.yaml]"
    )]
    pub config: Option<PathBuf>,

    #[arg(
        short = 'v',
        long,
        action = clap::ArgAction::Count,
        help = "Increase verbosity (-v, -vv, -vvv)"
    )]
    pub verbose: u8,

    #[arg(trailing_var_arg = true, help = "Command to execute on remote hosts")]
    pub command_args: Vec<String>,
}

impl Cli {
    /// Command words joined into the string passed to the remote shell.
    pub fn get_command(&self) -> String {
        self.command_args.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_command_line() {
        let cli = Cli::try_parse_from([
            "gssh",
            "-l",
            "deploy",
            "-f",
            "hosts.txt",
            "-d",
            "50",
            "-p",
            "20",
            "--strict",
            "accept-new",
            "--logfile",
            "run.log",
            "-o",
            "ConnectTimeout=5",
            "-o",
            "BatchMode=yes",
            "-vv",
            "uptime",
        ])
        .unwrap();

        assert_eq!(cli.user.as_deref(), Some("deploy"));
        assert_eq!(cli.file, Some(PathBuf::from("hosts.txt")));
        assert_eq!(cli.delay, Some(50));
        assert_eq!(cli.procs, Some(20));
        assert_eq!(cli.strict, Some(StrictHostKeyChecking::AcceptNew));
        assert_eq!(cli.logfile, Some(PathBuf::from("run.log")));
        assert_eq!(cli.ssh_options, vec!["ConnectTimeout=5", "BatchMode=yes"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.get_command(), "uptime");
    }

    #[test]
    fn test_command_words_are_joined() {
        let cli = Cli::try_parse_from(["gssh", "-f", "h", "df", "-h", "/"]).unwrap();
        assert_eq!(cli.get_command(), "df -h /");
    }

    #[test]
    fn test_missing_command_is_empty() {
        let cli = Cli::try_parse_from(["gssh", "-f", "hosts.txt"]).unwrap();
        assert!(cli.get_command().is_empty());
    }

    #[test]
    fn test_zero_procs_rejected() {
        assert!(Cli::try_parse_from(["gssh", "-p", "0", "uptime"]).is_err());
    }

    #[test]
    fn test_invalid_strict_mode_rejected() {
        assert!(Cli::try_parse_from(["gssh", "--strict", "maybe", "uptime"]).is_err());
    }
}
