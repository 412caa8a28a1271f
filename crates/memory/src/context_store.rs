//! In-memory context store — the rolling record an agent reads before it
//! answers and appends to afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::trace;

/// A single recorded unit of context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextEntry {
    /// Position in arrival order, starting at 0
    pub sequence: u64,

    /// The recorded text, stored as-is (may be empty)
    pub text: String,

    /// Who recorded it (e.g., "user" or an agent name)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,

    /// When it was recorded
    pub recorded_at: DateTime<Utc>,
}

/// Ordered, append-only store of context entries.
///
/// Thread-safe via `RwLock`: appends are serialized, and a snapshot read sees
/// each entry either whole or not at all. Nothing is ever evicted; use
/// [`recent`](Self::recent) to read a bounded window.
pub struct ContextMemoryManager {
    entries: RwLock<Vec<ContextEntry>>,
}

impl ContextMemoryManager {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    // Entries are only ever pushed whole, so a writer that panicked cannot
    // leave a half-written entry behind; a poisoned lock is safe to reuse.
    fn read(&self) -> RwLockReadGuard<'_, Vec<ContextEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<ContextEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `context` at the end of the record.
    pub fn add_context(&self, context: impl Into<String>) {
        self.push(context.into(), None);
    }

    /// Append `context`, tagging the entry with who recorded it.
    pub fn add_context_from(&self, source: impl Into<String>, context: impl Into<String>) {
        self.push(context.into(), Some(source.into()));
    }

    fn push(&self, text: String, source: Option<String>) {
        let mut entries = self.write();
        let sequence = entries.len() as u64;
        trace!(sequence, source = ?source, "Recording context entry");
        entries.push(ContextEntry {
            sequence,
            text,
            source,
            recorded_at: Utc::now(),
        });
    }

    /// Snapshot of all context strings, oldest first.
    pub fn get_contexts(&self) -> Vec<String> {
        self.read().iter().map(|e| e.text.clone()).collect()
    }

    /// Snapshot of the full entries, oldest first.
    pub fn entries(&self) -> Vec<ContextEntry> {
        self.read().clone()
    }

    /// Snapshot of the last `n` context strings, oldest first.
    pub fn recent(&self, n: usize) -> Vec<String> {
        let entries = self.read();
        let start = entries.len().saturating_sub(n);
        entries[start..].iter().map(|e| e.text.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl Default for ContextMemoryManager {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContextMemoryManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextMemoryManager")
            .field("entries", &self.len())
            .finish()
    }
}
