use crate::store::{NoteStore, DEFAULT_BUCKET_WIDTH_MS};
use ostinato_ports::midi::Note;
use ostinato_ports::types::{Ms, Velocity01};
use std::collections::HashMap;
use std::sync::Arc;

struct OpenNote {
    start_ms: Ms,
    velocity: Velocity01,
}

/// Pairs a stream of timestamped note-on/note-off events into complete,
/// duration-bearing notes collected in a [`NoteStore`]. Used during import;
/// consumes events in time order and has no side effects beyond the store
/// it returns.
pub struct NoteAccumulator {
    store: NoteStore,
    open: HashMap<(u8, u8), OpenNote>,
    last_time_ms: Ms,
}

impl NoteAccumulator {
    pub fn new(bucket_width_ms: Ms) -> Self {
        Self {
            store: NoteStore::new(bucket_width_ms, 0.0),
            open: HashMap::new(),
            last_time_ms: 0.0,
        }
    }

    /// Open a note. A note already open for the same pitch and channel is
    /// closed at `time_ms` first, so a retrigger yields two back-to-back
    /// notes rather than one merged one.
    pub fn note_on(&mut self, pitch: u8, channel: u8, velocity: Velocity01, time_ms: Ms) {
        self.note_off(pitch, channel, time_ms);
        self.open
            .insert((pitch, channel), OpenNote { start_ms: time_ms, velocity });
    }

    /// Close the open note for this pitch and channel. A note-off with no
    /// matching note-on is a no-op.
    pub fn note_off(&mut self, pitch: u8, channel: u8, time_ms: Ms) {
        self.last_time_ms = self.last_time_ms.max(time_ms);
        if let Some(open) = self.open.remove(&(pitch, channel)) {
            self.close(pitch, channel, open, time_ms);
        }
    }

    /// Finish the stream: notes still open end at the last observed event
    /// time. Returns the completed store with its duration grown to cover
    /// that time.
    pub fn build(mut self) -> NoteStore {
        let last_time_ms = self.last_time_ms;
        let open = std::mem::take(&mut self.open);
        for ((pitch, channel), note) in open {
            self.close(pitch, channel, note, last_time_ms);
        }
        let mut store = self.store;
        store.grow_to(last_time_ms);
        store
    }

    fn close(&mut self, pitch: u8, channel: u8, open: OpenNote, end_ms: Ms) {
        let duration_ms = end_ms - open.start_ms;
        if duration_ms <= 0.0 {
            // zero-length pair, nothing to keep
            return;
        }
        let note = Note::new(pitch, open.velocity, channel, duration_ms);
        let _ = self.store.put_note(Arc::new(note), open.start_ms);
    }
}

impl Default for NoteAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_BUCKET_WIDTH_MS)
    }
}
