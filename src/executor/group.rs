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

//! Concurrency-controlled execution group.
//!
//! The group owns the run counters and the host registry. Counter state lives
//! behind one mutex and is only reachable through the methods below; console
//! writes go through the [`Console`] mutex. When both are needed the counter
//! lock is taken first.
//!
//! The concurrency cap is enforced by a semaphore: [`ExecutionGroup::spawn`]
//! waits for a free slot and the slot is released when the session has been
//! fully drained and joined. [`ExecutionGroup::wait`] observes the active
//! count through a watch channel instead of polling it.

use anyhow::{Context, Result};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{watch, OwnedSemaphorePermit, Semaphore};

use super::drainer::OutputDrainer;
use super::host::RemoteHost;
use crate::console::{Console, Progress, StreamKind};
use crate::session::{RemoteSession, Transport};

#[derive(Debug, Default)]
struct GroupState {
    /// Sessions spawned but not yet drained and joined
    active: usize,
    complete: usize,
    /// Spawn slots handed out, including sessions still being launched
    reserved: usize,
    peak_active: usize,
    servers: Vec<Arc<RemoteHost>>,
}

/// Runs one remote session per host with a bounded number active at once.
pub struct ExecutionGroup {
    total: usize,
    max_active: usize,
    width: usize,
    state: Mutex<GroupState>,
    active_tx: watch::Sender<usize>,
    slots: Arc<Semaphore>,
    transport: Arc<dyn Transport>,
    console: Arc<Console>,
}

impl ExecutionGroup {
    /// Create a group for `total` hosts.
    ///
    /// The cap is clamped to `total`: allowing more sessions than hosts is
    /// meaningless. A cap of zero is raised to one so the group can progress.
    pub fn new(
        total: usize,
        max_active: usize,
        width: usize,
        transport: Arc<dyn Transport>,
        console: Arc<Console>,
    ) -> Self {
        let max_active = clamp_max_active(max_active, total);
        let (active_tx, _) = watch::channel(0);

        Self {
            total,
            max_active,
            width,
            state: Mutex::new(GroupState::default()),
            active_tx,
            slots: Arc::new(Semaphore::new(max_active)),
            transport,
            console,
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, GroupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn total(&self) -> usize {
        self.total
    }

    /// Effective concurrency cap after clamping.
    pub fn max_active(&self) -> usize {
        self.max_active
    }

    pub fn active(&self) -> usize {
        self.lock_state().active
    }

    pub fn complete(&self) -> usize {
        self.lock_state().complete
    }

    /// Highest number of simultaneously active sessions seen so far.
    pub fn peak_active(&self) -> usize {
        self.lock_state().peak_active
    }

    pub fn progress(&self) -> Progress {
        Progress::new(self.lock_state().complete, self.total)
    }

    /// Hosts in spawn order.
    pub fn servers(&self) -> Vec<Arc<RemoteHost>> {
        self.lock_state().servers.clone()
    }

    /// Start a session on `address` and drain it in the background.
    ///
    /// Waits for a free slot when the cap is reached, then returns as soon
    /// as the session is running. Failing to start the session is an error;
    /// everything that happens afterwards is recorded on the returned host.
    pub async fn spawn(
        self: &Arc<Self>,
        username: &str,
        address: &str,
        command: &str,
    ) -> Result<Arc<RemoteHost>> {
        let permit = Arc::clone(&self.slots)
            .acquire_owned()
            .await
            .context("Concurrency gate closed")?;

        {
            let mut state = self.lock_state();
            if state.reserved >= self.total {
                anyhow::bail!(
                    "Cannot spawn {address}: all {} sessions of the group are already spawned",
                    self.total
                );
            }
            state.reserved += 1;
        }

        let session = match self.transport.launch(username, address, command) {
            Ok(session) => session,
            Err(e) => {
                self.lock_state().reserved -= 1;
                return Err(e).with_context(|| format!("Failed to start session on {address}"));
            }
        };

        let host = {
            let mut state = self.lock_state();
            let host = Arc::new(RemoteHost::new(state.servers.len(), username, address));
            state.servers.push(Arc::clone(&host));
            state.active += 1;
            state.peak_active = state.peak_active.max(state.active);
            self.active_tx.send_replace(state.active);
            host
        };

        tracing::debug!("Spawned session #{} on {}", host.index(), host);

        let group = Arc::clone(self);
        let supervised = Arc::clone(&host);
        tokio::spawn(async move {
            group.supervise(supervised, session, permit).await;
        });

        Ok(host)
    }

    /// Drain both output streams, join the session, then release its slot.
    async fn supervise(
        &self,
        host: Arc<RemoteHost>,
        session: RemoteSession,
        _permit: OwnedSemaphorePermit,
    ) {
        let (stdout, stderr, completion) = session.into_parts();

        let (stdout_result, stderr_result) = tokio::join!(
            OutputDrainer::new(&host, StreamKind::Stdout, &self.console, self.width)
                .drain(stdout, || self.progress()),
            OutputDrainer::new(&host, StreamKind::Stderr, &self.console, self.width)
                .drain(stderr, || self.progress()),
        );

        for (stream, result) in [
            (StreamKind::Stdout, stdout_result),
            (StreamKind::Stderr, stderr_result),
        ] {
            if let Err(e) = result {
                tracing::warn!("Reading {} of {} failed: {}", stream, host.address(), e);
                host.mark_failed(format!("{stream} stream: {e}"));
            }
        }

        match completion.wait().await {
            Ok(exit) => tracing::debug!("Session on {} finished with {}", host.address(), exit),
            Err(e) => {
                tracing::warn!("{e}");
                host.mark_failed(e.to_string());
            }
        }

        self.finish();
    }

    /// Mark one session complete and redraw progress.
    fn finish(&self) {
        let mut state = self.lock_state();
        state.active = state.active.saturating_sub(1);
        state.complete += 1;

        // Drawn before waiters are woken so the final redraw cannot land
        // after the caller has cleared the progress line.
        self.console
            .update_progress(Progress::new(state.complete, self.total));

        self.active_tx.send_replace(state.active);
    }

    /// Block until no session is active or fewer than `n` are.
    ///
    /// `wait(0)` is the drain barrier: it returns once every spawned session
    /// has been drained and joined.
    pub async fn wait(&self, n: usize) {
        let mut rx = self.active_tx.subscribe();
        if rx
            .wait_for(|&active| active == 0 || active < n)
            .await
            .is_err()
        {
            tracing::debug!("Active session counter closed while waiting");
        }
    }

    /// Redraw the progress line with the current counters.
    pub fn update_progress(&self) {
        let state = self.lock_state();
        self.console
            .update_progress(Progress::new(state.complete, self.total))
    }

    pub fn clear_progress(&self) {
        self.console.clear_progress()
    }
}

/// Effective cap: never more than the host count.
pub fn clamp_max_active(requested: usize, total: usize) -> usize {
    requested.min(total).max(1)
}
