//! Append-only log of failures seen by the router, the dispatcher and the agents.
//!
//! Each entry records when the failure happened and which agent it belongs to
//! (`"orchestrator"` for routing-level failures). The log is bounded: once `capacity` entries
//! are held, the oldest entry is dropped for every new one. Recording never fails.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::error::Error;
use std::sync::{Mutex, MutexGuard};

/// Agent name used for failures that happen while routing, before any agent is involved.
pub const ORCHESTRATOR: &str = "orchestrator";

/// Default number of retained entries.
pub const DEFAULT_CAPACITY: usize = 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoggedError {
    pub timestamp: DateTime<Utc>,
    pub agent: String,
    pub error: String,
}

#[derive(Debug)]
pub struct ErrorRegistry {
    entries: Mutex<VecDeque<LoggedError>>,
    capacity: usize,
}

impl Default for ErrorRegistry {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }
}

impl ErrorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A log retaining at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Mutex::new(VecDeque::with_capacity(capacity.min(64))),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<LoggedError>> {
        // a panic elsewhere must not stop failures from being recorded
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record `error` against `agent`.
    pub fn add_error(&self, agent: &str, error: &dyn Error) {
        self.add_message(agent, error.to_string());
    }

    /// Record a failure described only by a message.
    pub fn add_message(&self, agent: &str, message: impl Into<String>) {
        let entry = LoggedError {
            timestamp: Utc::now(),
            agent: agent.to_string(),
            error: message.into(),
        };
        log::error!("[ErrorRegistry] [{}] {}", entry.agent, entry.error);

        let mut entries = self.lock();
        if entries.len() == self.capacity {
            entries.pop_front();
        }
        entries.push_back(entry);
    }

    /// Every retained entry, oldest first.
    pub fn errors(&self) -> Vec<LoggedError> {
        self.lock().iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
