use ostinato_ports::midi::Note;
use ostinato_ports::types::{Ms, Shared};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Bucket width used when no caller-chosen width applies, e.g. when a store
/// is built from a plain note list.
pub const DEFAULT_BUCKET_WIDTH_MS: Ms = 16.0;

/// Reconstructed starts closer than this to the requested position count as
/// a match when deleting. Guards against float rounding, not inexact edits.
const DELETE_EPSILON_MS: Ms = 1.0;

#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    #[error("note duration must be positive, got {0} ms")]
    InvalidDuration(Ms),
}

/// One note within a bucket, `offset_ms` from the bucket's start.
#[derive(Clone, Debug)]
pub struct NoteEntry {
    pub note: Shared<Note>,
    pub offset_ms: Ms,
}

/// Bucketed temporal index over the notes of one region.
///
/// Buckets are `bucket_width_ms` wide and sparse: a bucket exists only while
/// it holds at least one note, so memory tracks note count rather than
/// region length. A note's absolute start is
/// `bucket_index * bucket_width_ms + offset_ms`.
///
/// Not safe for concurrent mutation; a store is owned by one editor task.
/// Transactional edits clone the store first and keep both copies as the
/// undo/redo pair.
#[derive(Clone, Debug)]
pub struct NoteStore {
    bucket_width_ms: Ms,
    total_duration_ms: Ms,
    buckets: BTreeMap<u64, Vec<NoteEntry>>,
}

impl NoteStore {
    pub fn new(bucket_width_ms: Ms, total_duration_ms: Ms) -> Self {
        assert!(bucket_width_ms > 0.0, "bucket width must be positive");
        Self {
            bucket_width_ms,
            total_duration_ms: total_duration_ms.max(0.0),
            buckets: BTreeMap::new(),
        }
    }

    /// Build a store from plain (note, start) pairs, growing the duration to
    /// cover every note.
    pub fn from_notes<I>(bucket_width_ms: Ms, notes: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = (Note, Ms)>,
    {
        let mut store = Self::new(bucket_width_ms, 0.0);
        for (note, start_ms) in notes {
            store.put_note(Arc::new(note), start_ms)?;
        }
        Ok(store)
    }

    pub fn bucket_width_ms(&self) -> Ms {
        self.bucket_width_ms
    }

    pub fn total_duration_ms(&self) -> Ms {
        self.total_duration_ms
    }

    /// The region length is caller-owned: resizing a region sets it
    /// directly, and may shrink it below the last note's end mid-edit.
    pub fn set_total_duration(&mut self, ms: Ms) {
        self.total_duration_ms = ms.max(0.0);
    }

    /// Grow the duration so it covers at least `end_ms`.
    pub fn grow_to(&mut self, end_ms: Ms) {
        if end_ms > self.total_duration_ms {
            self.total_duration_ms = end_ms;
        }
    }

    pub fn note_count(&self) -> usize {
        self.buckets.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn bucket_index(&self, start_ms: Ms) -> u64 {
        (start_ms.max(0.0) / self.bucket_width_ms).floor() as u64
    }

    /// Insert a note starting at `start_ms`, growing the total duration to
    /// cover its end. Overlapping notes are accepted; resolving overlaps is
    /// the editing layer's job.
    pub fn put_note(&mut self, note: Shared<Note>, start_ms: Ms) -> Result<(), StoreError> {
        if !(note.duration_ms > 0.0) {
            return Err(StoreError::InvalidDuration(note.duration_ms));
        }
        let index = self.bucket_index(start_ms);
        let offset_ms = start_ms - index as Ms * self.bucket_width_ms;
        let end_ms = start_ms + note.duration_ms;
        self.buckets
            .entry(index)
            .or_default()
            .push(NoteEntry { note, offset_ms });
        self.grow_to(end_ms);
        Ok(())
    }

    /// Remove the first entry holding exactly this note (same `Arc`) whose
    /// reconstructed start lies within 1 ms of `start_ms`. Returns whether
    /// an entry was removed.
    pub fn delete_note(&mut self, note: &Shared<Note>, start_ms: Ms) -> bool {
        let index = self.bucket_index(start_ms);
        let base_ms = index as Ms * self.bucket_width_ms;
        let bucket = match self.buckets.get_mut(&index) {
            Some(bucket) => bucket,
            None => return false,
        };
        let found = bucket.iter().position(|entry| {
            Arc::ptr_eq(&entry.note, note)
                && (base_ms + entry.offset_ms - start_ms).abs() < DELETE_EPSILON_MS
        });
        match found {
            Some(at) => {
                bucket.remove(at);
                if bucket.is_empty() {
                    self.buckets.remove(&index);
                }
                true
            }
            None => false,
        }
    }

    /// Visit every note in bucket order, insertion order within a bucket.
    pub fn for_each_note<F>(&self, mut f: F)
    where
        F: FnMut(&Shared<Note>, Ms),
    {
        for (index, bucket) in &self.buckets {
            let base_ms = *index as Ms * self.bucket_width_ms;
            for entry in bucket {
                f(&entry.note, base_ms + entry.offset_ms);
            }
        }
    }

    /// Direct bucket access for callers that splice entries manually.
    pub fn instant_at(&self, index: u64) -> Option<&[NoteEntry]> {
        self.buckets.get(&index).map(Vec::as_slice)
    }

    pub fn instant_at_mut(&mut self, index: u64) -> Option<&mut Vec<NoteEntry>> {
        self.buckets.get_mut(&index)
    }

    pub fn instants_mut(&mut self) -> impl Iterator<Item = (u64, &mut Vec<NoteEntry>)> {
        self.buckets.iter_mut().map(|(index, bucket)| (*index, bucket))
    }

    /// Move every note by `delta_ms`, used when a region's start moves and
    /// its notes must keep their absolute timeline position. Starts are
    /// clamped at 0; the total duration is left to the caller.
    pub fn shift_offsets(&mut self, delta_ms: Ms) {
        let buckets = std::mem::take(&mut self.buckets);
        for (index, bucket) in buckets {
            let base_ms = index as Ms * self.bucket_width_ms;
            for entry in bucket {
                let start_ms = (base_ms + entry.offset_ms + delta_ms).max(0.0);
                let new_index = self.bucket_index(start_ms);
                let offset_ms = start_ms - new_index as Ms * self.bucket_width_ms;
                self.buckets.entry(new_index).or_default().push(NoteEntry {
                    note: entry.note,
                    offset_ms,
                });
            }
        }
    }
}
