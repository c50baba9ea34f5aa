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

//! Host-labeled output line formatting.

use owo_colors::OwoColorize;
use std::fmt;

/// Which output stream of a session a line came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
        }
    }

    fn arrow(&self, colors: bool) -> String {
        if !colors {
            return "->".to_string();
        }
        match self {
            StreamKind::Stdout => "->".green().bold().to_string(),
            StreamKind::Stderr => "->".red().bold().to_string(),
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format one output line as `<padding><address> -> <line>`.
///
/// Addresses are right-aligned to `width + 1` columns so that the arrows of
/// all hosts line up, `width` being the longest address in the host list.
pub fn format_output_line(
    address: &str,
    width: usize,
    stream: StreamKind,
    line: &str,
    colors: bool,
) -> String {
    let column = width + 1;
    format!("{address:>column$} {} {line}", stream.arrow(colors))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_line_is_right_aligned() {
        assert_eq!(
            format_output_line("a", 3, StreamKind::Stdout, "ok", false),
            "   a -> ok"
        );
        assert_eq!(
            format_output_line("ccc", 3, StreamKind::Stderr, "boom", false),
            " ccc -> boom"
        );
    }

    #[test]
    fn test_colored_arrows_differ_per_stream() {
        let out = format_output_line("a", 1, StreamKind::Stdout, "x", true);
        let err = format_output_line("a", 1, StreamKind::Stderr, "x", true);
        assert_ne!(out, err);
        assert!(out.starts_with(" a "));
        assert!(out.ends_with(" x"));
        assert!(out.contains("\x1b["));
    }

    #[test]
    fn test_stream_kind_display() {
        assert_eq!(StreamKind::Stdout.to_string(), "stdout");
        assert_eq!(StreamKind::Stderr.to_string(), "stderr");
    }
}
