use crate::accumulator::NoteAccumulator;
use crate::model::ImportedTrack;
use crate::reader::{ByteReader, ReadError};
use log::{debug, warn};
use ostinato_ports::midi::{meta, status};
use ostinato_ports::types::{Ms, Velocity01};
use std::path::Path;

/// Microseconds per quarter note at 120 BPM, the SMF default tempo.
const DEFAULT_TEMPO_US: f64 = 500_000.0;

#[derive(thiserror::Error, Debug)]
pub enum MidiImportError {
    #[error("io error: {0}")]
    Io(String),
    #[error("invalid midi file: {0}")]
    InvalidFormat(String),
    #[error(transparent)]
    Read(#[from] ReadError),
}

pub fn import_midi_path(path: &Path) -> Result<Vec<ImportedTrack>, MidiImportError> {
    let data = std::fs::read(path).map_err(|e| MidiImportError::Io(e.to_string()))?;
    import_midi_bytes(&data)
}

/// Parse a Standard MIDI File and return one entry per track that contains
/// notes; tracks carrying only meta or controller data are dropped. The
/// parse is all-or-nothing: any format or bounds error aborts the whole
/// decode and nothing partial is returned.
pub fn import_midi_bytes(data: &[u8]) -> Result<Vec<ImportedTrack>, MidiImportError> {
    let mut reader = ByteReader::new(data);

    let magic = reader.read_string(4)?;
    if magic != "MThd" {
        return Err(MidiImportError::InvalidFormat(format!(
            "bad header magic {magic:?}"
        )));
    }
    let header_len = reader.read_u32()?;
    if header_len < 6 {
        return Err(MidiImportError::InvalidFormat(format!(
            "header length {header_len} < 6"
        )));
    }
    let _format = reader.read_u16()?;
    let track_count = reader.read_u16()?;
    let division = reader.read_u16()?;
    if header_len > 6 {
        reader.read_bytes(header_len as usize - 6)?;
    }

    // SMPTE (frame-based) division is unsupported: decoding proceeds with
    // ticks-per-quarter math over the raw division value, which skews
    // timing for such files.
    if division & 0x8000 != 0 {
        warn!("SMPTE time division 0x{division:04X}; note timing will be approximate");
    }
    let ticks_per_quarter = Ms::from(division.max(1));

    let mut tracks = Vec::new();
    for track_number in 0..track_count {
        if let Some(track) = import_track(&mut reader, track_number, ticks_per_quarter)? {
            tracks.push(track);
        }
    }
    debug!("imported {} of {track_count} tracks", tracks.len());
    Ok(tracks)
}

fn import_track(
    reader: &mut ByteReader<'_>,
    track_number: u16,
    ticks_per_quarter: Ms,
) -> Result<Option<ImportedTrack>, MidiImportError> {
    let magic = reader.read_string(4)?;
    if magic != "MTrk" {
        return Err(MidiImportError::InvalidFormat(format!(
            "bad track magic {magic:?}"
        )));
    }
    let track_len = reader.read_u32()?;
    let end = reader.pos() + track_len as usize;

    let mut name = format!("Track {}", track_number + 1);
    let mut accumulator = NoteAccumulator::default();

    // Per-track decoder state; imports running on other buffers share none
    // of it.
    let mut tempo_us = DEFAULT_TEMPO_US;
    let mut running_status: u8 = 0;
    let mut now_ms: Ms = 0.0;

    while reader.pos() < end {
        let delta_ticks = reader.read_var_uint()?;
        // A tempo change applies to the deltas after it, never
        // retroactively.
        now_ms += Ms::from(delta_ticks) / ticks_per_quarter * tempo_us / 1000.0;

        let byte = reader.read_u8()?;
        let status = if byte & 0x80 == 0 {
            // Data byte in status position: running status. Step back so
            // the byte is re-read as event data.
            reader.seek(reader.pos() - 1);
            running_status
        } else {
            running_status = byte;
            byte
        };

        match status & 0xF0 {
            status::NOTE_OFF => {
                let pitch = reader.read_u8()?;
                let _velocity = reader.read_u8()?;
                accumulator.note_off(pitch & 0x7F, status & 0x0F, now_ms);
            }
            status::NOTE_ON => {
                let pitch = reader.read_u8()?;
                let velocity = reader.read_u8()?;
                let channel = status & 0x0F;
                if velocity == 0 {
                    // Velocity-0 note-on is the SMF alias for note-off.
                    accumulator.note_off(pitch & 0x7F, channel, now_ms);
                } else {
                    let velocity = Velocity01::new(f32::from(velocity) / 127.0);
                    accumulator.note_on(pitch & 0x7F, channel, velocity, now_ms);
                }
            }
            status::POLY_PRESSURE | status::CONTROL_CHANGE | status::PITCH_BEND => {
                reader.read_bytes(2)?;
            }
            status::PROGRAM_CHANGE | status::CHANNEL_PRESSURE => {
                reader.read_u8()?;
            }
            _ => match status {
                status::SYSEX | status::SYSEX_ESCAPE => {
                    let len = reader.read_var_uint()?;
                    reader.read_bytes(len as usize)?;
                }
                status::META => {
                    let meta_type = reader.read_u8()?;
                    let len = reader.read_var_uint()? as usize;
                    match meta_type {
                        meta::TRACK_NAME => name = reader.read_string(len)?,
                        meta::SET_TEMPO => {
                            tempo_us = f64::from(reader.read_u24()?);
                            if len > 3 {
                                reader.read_bytes(len - 3)?;
                            }
                        }
                        // End-of-track carries no payload; the loop ends at
                        // the chunk boundary.
                        meta::END_OF_TRACK => {}
                        _ => {
                            reader.read_bytes(len)?;
                        }
                    }
                }
                _ => {}
            },
        }
    }

    let store = accumulator.build();
    if store.is_empty() {
        return Ok(None);
    }
    Ok(Some(ImportedTrack { name, notes: store }))
}
