//! Agent domain model.
//!
//! An agent is a bound role: an identifier, an ordered set of permitted
//! capability names, and a bounded conversation history. Agents are created
//! at startup and live for the process; history grows per invocation and is
//! persisted through the session store.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::task::ResultStatus;

/// Default iteration cap for the agent's capability loop.
pub const DEFAULT_ITERATION_CAP: usize = 20;

/// Default bounded length of the in-memory history buffer.
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Static definition of an agent role.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentSpec {
    /// Stable identifier, e.g. `statistics`.
    pub id: String,
    /// Role description. Opaque to the engine; surfaces in logs and reports.
    pub role: String,
    /// Ordered set of capability names this agent may invoke. A scripted
    /// call outside this set is rejected, never silently skipped.
    pub permitted: Vec<String>,
    /// Maximum capability invocations per task.
    pub iteration_cap: usize,
    /// Bounded length of the conversation history buffer.
    pub history_limit: usize,
}

impl AgentSpec {
    pub fn new(id: impl Into<String>, role: impl Into<String>, permitted: Vec<String>) -> Self {
        Self {
            id: id.into(),
            role: role.into(),
            permitted,
            iteration_cap: DEFAULT_ITERATION_CAP,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }

    pub fn with_iteration_cap(mut self, cap: usize) -> Self {
        self.iteration_cap = cap;
        self
    }

    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    /// Whether the agent may invoke the named capability.
    pub fn permits(&self, capability: &str) -> bool {
        self.permitted.iter().any(|c| c == capability)
    }
}

/// One prior task/result pair in an agent's conversation history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// First line of the task instruction.
    pub task: String,
    pub status: ResultStatus,
    pub summary: String,
    pub recorded_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(task: impl Into<String>, status: ResultStatus, summary: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            status,
            summary: summary.into(),
            recorded_at: Utc::now(),
        }
    }
}

/// Bounded in-memory history buffer for one agent.
#[derive(Debug, Clone, Default)]
pub struct HistoryBuffer {
    entries: VecDeque<HistoryEntry>,
    limit: usize,
}

impl HistoryBuffer {
    pub fn new(limit: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(limit),
            limit,
        }
    }

    /// Append an entry, evicting the oldest when the buffer is full.
    pub fn push(&mut self, entry: HistoryEntry) {
        if self.limit == 0 {
            return;
        }
        while self.entries.len() >= self.limit {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    /// Replace the buffer contents with entries loaded from the session
    /// store, keeping only the newest `limit`.
    pub fn load(&mut self, entries: Vec<HistoryEntry>) {
        self.entries.clear();
        for entry in entries {
            self.push(entry);
        }
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permits() {
        let agent = AgentSpec::new(
            "statistics",
            "Statistical analysis",
            vec!["table.describe".to_string(), "table.correlate".to_string()],
        );
        assert!(agent.permits("table.describe"));
        assert!(!agent.permits("chart.render"));
    }

    #[test]
    fn test_history_buffer_evicts_oldest() {
        let mut buf = HistoryBuffer::new(2);
        buf.push(HistoryEntry::new("a", ResultStatus::Success, ""));
        buf.push(HistoryEntry::new("b", ResultStatus::Success, ""));
        buf.push(HistoryEntry::new("c", ResultStatus::Failure, ""));

        assert_eq!(buf.len(), 2);
        let tasks: Vec<_> = buf.entries().map(|e| e.task.as_str()).collect();
        assert_eq!(tasks, vec!["b", "c"]);
    }

    #[test]
    fn test_history_buffer_load_truncates() {
        let mut buf = HistoryBuffer::new(2);
        buf.load(vec![
            HistoryEntry::new("a", ResultStatus::Success, ""),
            HistoryEntry::new("b", ResultStatus::Success, ""),
            HistoryEntry::new("c", ResultStatus::Success, ""),
        ]);
        let tasks: Vec<_> = buf.entries().map(|e| e.task.as_str()).collect();
        assert_eq!(tasks, vec!["b", "c"]);
    }

    #[test]
    fn test_zero_limit_buffer_stays_empty() {
        let mut buf = HistoryBuffer::new(0);
        buf.push(HistoryEntry::new("a", ResultStatus::Success, ""));
        assert!(buf.is_empty());
    }
}
