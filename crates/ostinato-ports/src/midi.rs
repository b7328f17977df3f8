use crate::types::{Ms, Velocity01};
use serde::{Deserialize, Serialize};

/// SMF channel-voice status bytes (upper nibble) and system status bytes.
pub mod status {
    pub const NOTE_OFF: u8 = 0x80;
    pub const NOTE_ON: u8 = 0x90;
    pub const POLY_PRESSURE: u8 = 0xA0;
    pub const CONTROL_CHANGE: u8 = 0xB0;
    pub const PROGRAM_CHANGE: u8 = 0xC0;
    pub const CHANNEL_PRESSURE: u8 = 0xD0;
    pub const PITCH_BEND: u8 = 0xE0;
    pub const SYSEX: u8 = 0xF0;
    pub const SYSEX_ESCAPE: u8 = 0xF7;
    pub const META: u8 = 0xFF;
}

/// SMF meta event types the importer gives meaning to.
pub mod meta {
    pub const TRACK_NAME: u8 = 0x03;
    pub const END_OF_TRACK: u8 = 0x2F;
    pub const SET_TEMPO: u8 = 0x51;
}

/// A single note. Immutable once created: edits replace the note rather
/// than mutate it in place.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub pitch: u8, // 0..=127
    pub velocity: Velocity01,
    pub channel: u8,     // 0..=15
    pub duration_ms: Ms, // > 0
}

impl Note {
    pub fn new(pitch: u8, velocity: Velocity01, channel: u8, duration_ms: Ms) -> Self {
        Self {
            pitch: pitch & 0x7F,
            velocity,
            channel: channel & 0x0F,
            duration_ms,
        }
    }
}
