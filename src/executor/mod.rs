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

//! Parallel execution of one command across a host list.

mod drainer;
mod group;
mod host;
mod run;
mod stats;

// Re-export public types
pub use drainer::OutputDrainer;
pub use group::{clamp_max_active, ExecutionGroup};
pub use host::RemoteHost;
pub use run::{effective_parallelism, run_group, RunSummary};
pub use stats::RunStats;
