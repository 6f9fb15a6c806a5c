//! Scene-clock scheduled tasks
//!
//! Power-up expiry and brick flash resets run against the simulation clock,
//! not wall time. Tasks fire in deadline order (ties by scheduling order)
//! when the clock is advanced. Targets may be gone by then; whoever runs a
//! fired action must check liveness first.

use serde::{Deserialize, Serialize};

use super::state::{EntityId, PowerUpKind};

/// Cancel token for a scheduled task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TaskHandle(u64);

/// What to do when a task comes due
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduledAction {
    /// Remove a power-up effect from a paddle
    ExpirePowerUp { paddle: EntityId, kind: PowerUpKind },
    /// Return a damaged brick to its normal color
    ClearBrickFlash { brick: EntityId },
}

/// A pending task
#[derive(Debug, Clone)]
pub struct ScheduledTask {
    pub handle: TaskHandle,
    pub deadline_ms: u64,
    pub action: ScheduledAction,
}

#[derive(Debug, Clone, Default)]
pub struct Scheduler {
    now_ms: u64,
    next_handle: u64,
    tasks: Vec<ScheduledTask>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current scene time (ms)
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_pending(&self, handle: TaskHandle) -> bool {
        self.tasks.iter().any(|t| t.handle == handle)
    }

    /// Queue an action `delay_ms` from now
    pub fn schedule(&mut self, delay_ms: u64, action: ScheduledAction) -> TaskHandle {
        let handle = TaskHandle(self.next_handle);
        self.next_handle += 1;
        self.tasks.push(ScheduledTask {
            handle,
            deadline_ms: self.now_ms.saturating_add(delay_ms),
            action,
        });
        handle
    }

    /// Drop a pending task. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.handle != handle);
        self.tasks.len() != before
    }

    /// Advance the clock and return every task now due, oldest deadline first
    pub fn advance(&mut self, dt_ms: u64) -> Vec<ScheduledTask> {
        self.now_ms = self.now_ms.saturating_add(dt_ms);
        let now = self.now_ms;

        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.tasks.drain(..).partition(|t| t.deadline_ms <= now);
        self.tasks = pending;

        due.sort_by_key(|t| (t.deadline_ms, t.handle));
        due
    }
}
