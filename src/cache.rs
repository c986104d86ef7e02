//! Session cache: one explanation per processing mode.
//!
//! Owned by exactly one orchestrator and dropped with it. Never persisted,
//! never shared between requests. Cleared wholesale on refresh.

use crate::llm::provider::ProcessingMode;
use std::collections::HashMap;

#[derive(Debug, Default, Clone)]
pub struct SessionCache {
    entries: HashMap<ProcessingMode, String>,
}

impl SessionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, mode: ProcessingMode) -> Option<&str> {
        self.entries.get(&mode).map(String::as_str)
    }

    pub fn insert(&mut self, mode: ProcessingMode, markdown: String) {
        self.entries.insert(mode, markdown);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
