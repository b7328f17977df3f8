use crate::model::Track;
use ostinato_ports::midi::{meta, status};
use ostinato_ports::types::Ms;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(thiserror::Error, Debug)]
pub enum MidiExportError {
    #[error("io error: {0}")]
    Io(String),
}

/// Tick resolution and tempo used when writing a file. Import produces its
/// own tempo from the stream; export takes both from the caller.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ExportSettings {
    pub ppq: u16,
    pub bpm: f64,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            ppq: 480,
            bpm: 120.0,
        }
    }
}

/// Encode a value as an SMF variable-length quantity, most significant
/// seven bits first.
pub fn encode_vlq(value: u32) -> Vec<u8> {
    let mut bytes = vec![(value & 0x7F) as u8];
    let mut rest = value >> 7;
    while rest != 0 {
        bytes.insert(0, (rest & 0x7F) as u8 | 0x80);
        rest >>= 7;
    }
    bytes
}

pub fn export_midi_path(
    tracks: &[Track],
    settings: &ExportSettings,
    path: &Path,
) -> Result<(), MidiExportError> {
    let data = export_midi_bytes(tracks, settings);
    std::fs::write(path, data).map_err(|e| MidiExportError::Io(e.to_string()))
}

/// Write a format 1 SMF: one tempo track, then one track per input track
/// with every note event on channel 0.
pub fn export_midi_bytes(tracks: &[Track], settings: &ExportSettings) -> Vec<u8> {
    let mut file = Vec::new();
    file.extend_from_slice(b"MThd");
    push_u32(&mut file, 6);
    push_u16(&mut file, 1); // format 1, multi-track
    push_u16(&mut file, tracks.len() as u16 + 1); // tempo track + note tracks
    push_u16(&mut file, settings.ppq);

    write_track_chunk(&mut file, &tempo_track_bytes(settings.bpm));
    for track in tracks {
        write_track_chunk(&mut file, &note_track_bytes(track, settings));
    }
    file
}

struct NoteEvent {
    time_ms: Ms,
    pitch: u8,
    velocity: u8,
    on: bool,
}

/// Note-offs sort before note-ons at the same timestamp; pitch breaks the
/// remaining ties.
fn note_event_rank(event: &NoteEvent) -> (u8, u8) {
    (u8::from(event.on), event.pitch)
}

fn note_track_bytes(track: &Track, settings: &ExportSettings) -> Vec<u8> {
    let mut events = Vec::new();
    for region in &track.regions {
        region.notes.for_each_note(|note, start_ms| {
            let abs_start_ms = region.start_ms + start_ms;
            events.push(NoteEvent {
                time_ms: abs_start_ms,
                pitch: note.pitch,
                velocity: (note.velocity.get() * 127.0).round() as u8,
                on: true,
            });
            events.push(NoteEvent {
                time_ms: abs_start_ms + note.duration_ms,
                pitch: note.pitch,
                velocity: 0,
                on: false,
            });
        });
    }
    events.sort_by(|a, b| {
        a.time_ms
            .total_cmp(&b.time_ms)
            .then_with(|| note_event_rank(a).cmp(&note_event_rank(b)))
    });

    let mut bytes = vec![0x00, status::META, meta::TRACK_NAME];
    bytes.extend_from_slice(&encode_vlq(track.name.len() as u32));
    bytes.extend_from_slice(track.name.as_bytes());

    let mut last_tick: i64 = 0;
    for event in &events {
        let tick = ms_to_ticks(event.time_ms, settings);
        // Rounding can land an event a tick before its predecessor.
        let delta = (tick - last_tick).max(0) as u32;
        last_tick = tick;
        bytes.extend_from_slice(&encode_vlq(delta));
        let status_byte = if event.on {
            status::NOTE_ON
        } else {
            status::NOTE_OFF
        };
        bytes.push(status_byte); // forced channel 0
        bytes.push(event.pitch & 0x7F);
        bytes.push(event.velocity & 0x7F);
    }

    bytes.extend_from_slice(&[0x00, status::META, meta::END_OF_TRACK, 0x00]);
    bytes
}

fn tempo_track_bytes(bpm: f64) -> Vec<u8> {
    let us_per_quarter = (60_000_000.0 / bpm).round() as u32;
    let mut bytes = vec![0x00, status::META, meta::SET_TEMPO, 0x03];
    bytes.extend_from_slice(&us_per_quarter.to_be_bytes()[1..]);
    bytes.extend_from_slice(&[0x00, status::META, meta::END_OF_TRACK, 0x00]);
    bytes
}

fn write_track_chunk(file: &mut Vec<u8>, payload: &[u8]) {
    file.extend_from_slice(b"MTrk");
    push_u32(file, payload.len() as u32);
    file.extend_from_slice(payload);
}

fn ms_to_ticks(ms: Ms, settings: &ExportSettings) -> i64 {
    (ms * settings.bpm * f64::from(settings.ppq) / 60_000.0).round() as i64
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_be_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_be_bytes());
}
