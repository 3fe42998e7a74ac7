//! Audit Trail
//!
//! Append-only, in-memory log of every transition record the engine has
//! produced. Records are sequenced on append and never mutated afterwards.
//! Retention is the caller's concern: `drain` hands the records over.

use crate::transition::TransitionRecord;

/// Ordered, append-only transition log.
#[derive(Debug, Clone, Default)]
pub struct AuditTrail {
    records: Vec<TransitionRecord>,
    next_seq: u64,
}

impl AuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a batch at the end, assigning sequence numbers.
    ///
    /// Returns the sequenced copies in batch order.
    pub fn append(&mut self, batch: Vec<TransitionRecord>) -> Vec<TransitionRecord> {
        let mut appended = Vec::with_capacity(batch.len());
        for mut record in batch {
            self.next_seq += 1;
            record.seq = self.next_seq;
            appended.push(record.clone());
            self.records.push(record);
        }
        appended
    }

    pub fn records(&self) -> &[TransitionRecord] {
        &self.records
    }

    /// Remove and return every record. Sequence numbers keep increasing.
    pub fn drain(&mut self) -> Vec<TransitionRecord> {
        std::mem::take(&mut self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
