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

//! Output statistics aggregated over all hosts after a run.

use super::host::RemoteHost;

/// Host and line totals per output category
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunStats {
    pub stdout_hosts: usize,
    pub stdout_lines: usize,
    pub stderr_hosts: usize,
    pub stderr_lines: usize,
    /// Hosts that wrote to either stream
    pub output_hosts: usize,
    pub output_lines: usize,
}

impl RunStats {
    /// Walk the host records once. Call only after the group has drained.
    pub fn collect<'a, I>(hosts: I) -> Self
    where
        I: IntoIterator<Item = &'a RemoteHost>,
    {
        let mut stats = Self::default();

        for host in hosts {
            let stdout = host.stdout_lines();
            let stderr = host.stderr_lines();

            if stdout > 0 {
                stats.stdout_hosts += 1;
                stats.stdout_lines += stdout;
            }
            if stderr > 0 {
                stats.stderr_hosts += 1;
                stats.stderr_lines += stderr;
            }
            if stdout > 0 || stderr > 0 {
                stats.output_hosts += 1;
                stats.output_lines += stdout + stderr;
            }
        }

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::StreamKind;

    fn host_with(index: usize, stdout: usize, stderr: usize) -> RemoteHost {
        let host = RemoteHost::new(index, "root", &format!("host{index}"));
        for _ in 0..stdout {
            host.record_line(StreamKind::Stdout);
        }
        for _ in 0..stderr {
            host.record_line(StreamKind::Stderr);
        }
        host
    }

    #[test]
    fn test_collect_mixed_hosts() {
        let hosts = [
            host_with(0, 3, 0),
            host_with(1, 0, 2),
            host_with(2, 1, 1),
            host_with(3, 0, 0),
        ];
        let stats = RunStats::collect(hosts.iter());

        assert_eq!(
            stats,
            RunStats {
                stdout_hosts: 2,
                stdout_lines: 4,
                stderr_hosts: 2,
                stderr_lines: 3,
                output_hosts: 3,
                output_lines: 7,
            }
        );
        assert_eq!(stats.output_lines, stats.stdout_lines + stats.stderr_lines);
        assert!(stats.output_hosts <= stats.stdout_hosts + stats.stderr_hosts);
    }

    #[test]
    fn test_collect_no_hosts() {
        let stats = RunStats::collect(std::iter::empty());
        assert_eq!(stats, RunStats::default());
    }

    #[test]
    fn test_disjoint_hosts_sum_exactly() {
        let hosts = [host_with(0, 1, 0), host_with(1, 0, 1)];
        let stats = RunStats::collect(hosts.iter());
        assert_eq!(stats.output_hosts, stats.stdout_hosts + stats.stderr_hosts);
    }
}
