//! Per-session run state. One pipeline run at a time.

use octovault_core::{VaultError, VaultResult};
use std::fmt;
use std::sync::Mutex;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    Running,
    Succeeded,
    Failed,
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PipelineState::Idle => "idle",
            PipelineState::Running => "running",
            PipelineState::Succeeded => "succeeded",
            PipelineState::Failed => "failed",
        })
    }
}

/// Tracks whether a run is in flight.
///
/// `begin` refuses a second concurrent run with [`VaultError::Busy`]. The
/// returned guard marks the run failed unless [`RunGuard::succeed`] is called,
/// so an early `?` return still leaves the session in a terminal state.
#[derive(Debug, Default)]
pub struct Session {
    state: Mutex<PipelineState>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> PipelineState {
        match self.state.lock() {
            Ok(state) => *state,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }

    pub fn begin(&self) -> VaultResult<RunGuard<'_>> {
        let mut state = self
            .state
            .lock()
            .map_err(|_| VaultError::Other(anyhow::anyhow!("session lock poisoned")))?;
        if *state == PipelineState::Running {
            return Err(VaultError::Busy);
        }
        *state = PipelineState::Running;
        Ok(RunGuard {
            session: self,
            done: false,
        })
    }

    fn set(&self, next: PipelineState) {
        match self.state.lock() {
            Ok(mut state) => *state = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }
}

/// Held for the duration of one run
#[must_use]
pub struct RunGuard<'a> {
    session: &'a Session,
    done: bool,
}

impl RunGuard<'_> {
    pub fn succeed(mut self) {
        self.done = true;
        self.session.set(PipelineState::Succeeded);
    }
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if !self.done {
            self.session.set(PipelineState::Failed);
        }
    }
}
