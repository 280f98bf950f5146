//! Staged byte-level edits.
//!
//! Each shifting pass over the project file costs O(file length), so edits
//! are collected here and applied in one pass per direction.

use std::collections::{BTreeMap, BTreeSet};

/// Pending inserts and deletes not yet applied to the file
#[derive(Debug, Default)]
pub struct Backlog {
    /// Bytes to insert, keyed by their position in the file after insertion
    inserts: BTreeMap<u64, u8>,
    /// Positions to delete, in the file as it currently is
    deletes: BTreeSet<u64>,
}

impl Backlog {
    /// Create an empty backlog
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage `bytes` to appear starting at `pos` once inserts are flushed
    pub fn stage_insert(&mut self, pos: u64, bytes: &[u8]) {
        for (i, &byte) in bytes.iter().enumerate() {
            self.inserts.insert(pos + i as u64, byte);
        }
    }

    /// Stage `len` bytes starting at `pos` for deletion
    pub fn stage_delete(&mut self, pos: u64, len: u64) {
        self.deletes.extend(pos..pos + len);
    }

    /// Take all pending inserts, leaving none staged
    pub fn take_inserts(&mut self) -> BTreeMap<u64, u8> {
        std::mem::take(&mut self.inserts)
    }

    /// Take all pending deletes, leaving none staged
    pub fn take_deletes(&mut self) -> BTreeSet<u64> {
        std::mem::take(&mut self.deletes)
    }

    pub fn pending_inserts(&self) -> usize {
        self.inserts.len()
    }

    pub fn pending_deletes(&self) -> usize {
        self.deletes.len()
    }

    /// Check if nothing is staged
    pub fn is_empty(&self) -> bool {
        self.inserts.is_empty() && self.deletes.is_empty()
    }

    /// Drop everything staged
    pub fn clear(&mut self) {
        self.inserts.clear();
        self.deletes.clear();
    }
}
