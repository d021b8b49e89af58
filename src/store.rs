//! In-memory record store.

use crate::record::{ChemicalRecord, Field};

/// Direction a selected row moves in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    Up,
    Down,
}

/// Ordered sequence of records, owned by a single controller.
///
/// Ids handed out by [`RecordStore::next_id`] come from a monotonic counter
/// that is re-seeded above the largest id on every load, so a delete followed
/// by an add never produces a duplicate.
#[derive(Debug, Clone, Default)]
pub struct RecordStore {
    records: Vec<ChemicalRecord>,
    next_id: u64,
}

impl RecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Builds a store from an already-loaded sequence.
    #[must_use]
    pub fn from_records(records: Vec<ChemicalRecord>) -> Self {
        let mut store = Self::new();
        store.replace_all(records);
        store
    }

    #[must_use]
    pub fn records(&self) -> &[ChemicalRecord] {
        &self.records
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&ChemicalRecord> {
        self.records.get(index)
    }

    /// The id the next created record will get.
    #[must_use]
    pub const fn next_id(&self) -> u64 {
        self.next_id
    }

    /// Replaces the whole sequence.
    pub fn replace_all(&mut self, records: Vec<ChemicalRecord>) {
        let max_id = records.iter().map(|r| r.id).max().unwrap_or(0);
        self.next_id = self.next_id.max(max_id.saturating_add(1));
        self.records = records;
    }

    /// Appends a record and advances the id counter past its id.
    pub fn push(&mut self, record: ChemicalRecord) {
        self.next_id = self.next_id.max(record.id.saturating_add(1));
        self.records.push(record);
    }

    /// Replaces the record with the same id in place.
    ///
    /// Returns `false` if no record has that id.
    pub fn replace_by_id(&mut self, record: ChemicalRecord) -> bool {
        match self.records.iter_mut().find(|r| r.id == record.id) {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Removes every record whose index is in `indices`, keeping the relative
    /// order of the rest. Returns how many were removed.
    pub fn remove_indices(&mut self, indices: &[usize]) -> usize {
        let before = self.records.len();
        let mut index = 0;
        self.records.retain(|_| {
            let keep = !indices.contains(&index);
            index += 1;
            keep
        });
        before - self.records.len()
    }

    /// Swaps the record at `index` with its neighbour. Returns the record's
    /// new index, or `None` at the boundary or for an out-of-range index.
    pub fn move_record(&mut self, index: usize, direction: MoveDirection) -> Option<usize> {
        if index >= self.records.len() {
            return None;
        }
        let target = match direction {
            MoveDirection::Up => index.checked_sub(1)?,
            MoveDirection::Down => Some(index + 1).filter(|&i| i < self.records.len())?,
        };
        self.records.swap(index, target);
        Some(target)
    }

    /// Reorders the full sequence by `field`.
    pub fn sort_by(&mut self, field: Field, descending: bool) {
        self.records.sort_by(|a, b| {
            let ordering = a.value(field).compare(&b.value(field));
            if descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}
