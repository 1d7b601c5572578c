// App log store seam

use crate::Result;
use parking_lot::RwLock;
use std::time::SystemTime;

pub trait LogStore: Send + Sync {
    /// Log lines recorded strictly after `since`, oldest first
    fn logs_since(&self, since: SystemTime) -> Result<Vec<String>>;
}

/// Log store kept in memory
#[derive(Default)]
pub struct MemoryLogStore {
    lines: RwLock<Vec<(SystemTime, String)>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self, at: SystemTime, line: impl Into<String>) {
        self.lines.write().push((at, line.into()));
    }

    pub fn len(&self) -> usize {
        self.lines.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.read().is_empty()
    }
}

impl LogStore for MemoryLogStore {
    fn logs_since(&self, since: SystemTime) -> Result<Vec<String>> {
        let mut matching: Vec<(SystemTime, String)> = self
            .lines
            .read()
            .iter()
            .filter(|(at, _)| *at > since)
            .cloned()
            .collect();
        matching.sort_by_key(|(at, _)| *at);
        Ok(matching.into_iter().map(|(_, line)| line).collect())
    }
}
