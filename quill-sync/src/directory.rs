//! In-memory mirror of the remote document list.
//!
//! Entries are unique by id and kept newest-first. The cache is kept in step
//! with engine-driven mutations so the listing never needs a full refetch
//! after a save, create or delete.

use quill_types::{DirectoryEntry, DocId, EntryPatch};

#[derive(Debug, Clone, Default)]
pub struct Directory {
    entries: Vec<DirectoryEntry>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every entry. Later duplicates of an id are dropped.
    pub fn load(&mut self, entries: Vec<DirectoryEntry>) {
        self.entries.clear();
        for entry in entries {
            if !self.contains(&entry.id) {
                self.entries.push(entry);
            }
        }
    }

    /// Prepend `entry`. An existing entry with the same id is replaced.
    pub fn insert(&mut self, entry: DirectoryEntry) {
        self.entries.retain(|e| e.id != entry.id);
        self.entries.insert(0, entry);
    }

    pub fn remove(&mut self, id: &DocId) -> Option<DirectoryEntry> {
        let pos = self.entries.iter().position(|e| &e.id == id)?;
        Some(self.entries.remove(pos))
    }

    /// Merge `patch` into the entry for `id`. Unknown ids are ignored.
    pub fn patch(&mut self, id: &DocId, patch: &EntryPatch) -> bool {
        match self.entries.iter_mut().find(|e| &e.id == id) {
            Some(entry) => {
                patch.apply_to(entry);
                true
            }
            None => false,
        }
    }

    pub fn get(&self, id: &DocId) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn contains(&self, id: &DocId) -> bool {
        self.get(id).is_some()
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
