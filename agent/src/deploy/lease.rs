//! Per-task leases
//!
//! At most one publish run per task id may be in flight in this process.
//! A second request for the same task is rejected, not queued.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use tracing::debug;

use crate::errors::PagesmithError;

/// Registry of task ids with an active run
#[derive(Debug, Clone, Default)]
pub struct TaskLeases {
    active: Arc<Mutex<HashSet<String>>>,
}

impl TaskLeases {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the task, failing with [`PagesmithError::LeaseConflict`] if
    /// another run holds it
    pub fn try_acquire(&self, task_id: &str) -> Result<TaskLease, PagesmithError> {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if !active.insert(task_id.to_string()) {
            return Err(PagesmithError::LeaseConflict(task_id.to_string()));
        }
        debug!("Lease acquired for task {}", task_id);
        Ok(TaskLease {
            task_id: task_id.to_string(),
            active: self.active.clone(),
        })
    }

    pub fn is_held(&self, task_id: &str) -> bool {
        self.active
            .lock()
            .map(|active| active.contains(task_id))
            .unwrap_or(false)
    }
}

/// Held while a run is in flight; released on drop
#[derive(Debug)]
pub struct TaskLease {
    task_id: String,
    active: Arc<Mutex<HashSet<String>>>,
}

impl TaskLease {
    pub fn task_id(&self) -> &str {
        &self.task_id
    }
}

impl Drop for TaskLease {
    fn drop(&mut self) {
        let mut active = self
            .active
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        active.remove(&self.task_id);
        debug!("Lease released for task {}", self.task_id);
    }
}
