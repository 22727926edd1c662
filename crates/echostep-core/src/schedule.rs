use serde::{Deserialize, Serialize};

use crate::entity::EntityId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(u64);

/// A payload waiting for `remaining` seconds of simulation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeferredTask<T> {
    pub id: TaskId,
    /// Entity the task belongs to; cancelled together with it.
    pub owner: Option<EntityId>,
    pub remaining: f32,
    pub payload: T,
}

/// Cancellable deferred tasks driven by simulation time, not wall-clock timers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scheduler<T> {
    tasks: Vec<DeferredTask<T>>,
    next_id: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            tasks: Vec::new(),
            next_id: 0,
        }
    }

    pub fn schedule(&mut self, delay: f32, owner: Option<EntityId>, payload: T) -> TaskId {
        let id = TaskId(self.next_id);
        self.next_id += 1;
        self.tasks.push(DeferredTask {
            id,
            owner,
            remaining: delay.max(0.0),
            payload,
        });
        id
    }

    pub fn cancel(&mut self, id: TaskId) -> bool {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.id != id);
        self.tasks.len() != before
    }

    /// Cancel every task owned by `owner`. Returns how many were dropped.
    pub fn cancel_owner(&mut self, owner: EntityId) -> usize {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.owner != Some(owner));
        before - self.tasks.len()
    }

    pub fn clear(&mut self) {
        self.tasks.clear();
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn is_pending(&self, id: TaskId) -> bool {
        self.tasks.iter().any(|t| t.id == id)
    }

    /// Count down every task by `dt` and return the payloads that came due,
    /// in the order they were scheduled.
    pub fn advance(&mut self, dt: f32) -> Vec<T> {
        let dt = if dt.is_finite() { dt.max(0.0) } else { 0.0 };
        for task in &mut self.tasks {
            task.remaining -= dt;
        }

        let mut due = Vec::new();
        let mut pending = Vec::with_capacity(self.tasks.len());
        for task in self.tasks.drain(..) {
            if task.remaining <= 0.0 {
                due.push(task.payload);
            } else {
                pending.push(task);
            }
        }
        self.tasks = pending;
        due
    }
}
