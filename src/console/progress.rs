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

//! Completion indicator shown on the last terminal line.

use std::fmt;

/// Minimum number of columns blanked when the progress line is cleared.
pub const PROGRESS_CLEAR_WIDTH: usize = 27;

/// Snapshot of group completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Progress {
    pub complete: usize,
    pub total: usize,
}

impl Progress {
    pub fn new(complete: usize, total: usize) -> Self {
        Self { complete, total }
    }

    /// Completion percentage. An empty group reports 0 without dividing.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.complete as f64 * 100.0 / self.total as f64
    }
}

impl fmt::Display for Progress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {:.2}% complete",
            self.complete,
            self.total,
            self.percent()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_display() {
        assert_eq!(Progress::new(1, 3).to_string(), "[1/3] 33.33% complete");
        assert_eq!(Progress::new(3, 3).to_string(), "[3/3] 100.00% complete");
        assert_eq!(Progress::new(0, 8).to_string(), "[0/8] 0.00% complete");
    }

    #[test]
    fn test_progress_empty_group() {
        let progress = Progress::new(0, 0);
        assert_eq!(progress.percent(), 0.0);
        assert_eq!(progress.to_string(), "[0/0] 0.00% complete");
    }
}
