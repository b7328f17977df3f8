use ostinato_domain_midi::{
    export_midi_bytes, export_midi_path, import_midi_bytes, import_midi_path, ExportSettings,
    Region, Track,
};
use pretty_assertions::assert_eq;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_midi_path(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    std::env::temp_dir().join(format!("ostinato-{name}-{nanos}.mid"))
}

/// ppq 480, 120 BPM tempo track, one named track with a quarter note.
fn reference_file() -> Vec<u8> {
    let mut tempo_track = vec![0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20];
    tempo_track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut note_track = vec![0x00, 0xFF, 0x03, 0x04];
    note_track.extend_from_slice(b"Lead");
    note_track.extend_from_slice(&[0x00, 0x90, 60, 100]);
    note_track.extend_from_slice(&[0x83, 0x60, 0x80, 60, 0]);
    note_track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut data = Vec::new();
    data.extend_from_slice(b"MThd");
    data.extend_from_slice(&6u32.to_be_bytes());
    data.extend_from_slice(&1u16.to_be_bytes());
    data.extend_from_slice(&2u16.to_be_bytes());
    data.extend_from_slice(&480u16.to_be_bytes());
    for track in [tempo_track, note_track] {
        data.extend_from_slice(b"MTrk");
        data.extend_from_slice(&(track.len() as u32).to_be_bytes());
        data.extend_from_slice(&track);
    }
    data
}

fn as_track(imported: &ostinato_domain_midi::ImportedTrack) -> Track {
    Track {
        name: imported.name.clone(),
        regions: vec![Region {
            start_ms: 0.0,
            notes: imported.notes.clone(),
        }],
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|window| window == needle)
}

#[test]
fn quarter_note_file_decodes_to_one_500ms_note() {
    let tracks = import_midi_bytes(&reference_file()).expect("import should succeed");

    // The tempo track has no notes and is dropped.
    assert_eq!(tracks.len(), 1);
    assert_eq!(tracks[0].name, "Lead");

    let mut notes = Vec::new();
    tracks[0]
        .notes
        .for_each_note(|note, start_ms| notes.push((note.pitch, start_ms, note.duration_ms)));
    assert_eq!(notes.len(), 1);
    let (pitch, start_ms, duration_ms) = notes[0];
    assert_eq!(pitch, 60);
    assert_eq!(start_ms, 0.0);
    assert!((duration_ms - 500.0).abs() < 1e-9);
}

#[test]
fn re_encoding_reproduces_the_source_deltas() {
    let tracks = import_midi_bytes(&reference_file()).expect("import should succeed");
    let data = export_midi_bytes(&[as_track(&tracks[0])], &ExportSettings::default());

    // Note-on at delta 0, note-off 480 ticks later, velocity preserved.
    assert!(contains(&data, &[0x00, 0x90, 60, 100, 0x83, 0x60, 0x80, 60, 0]));
}

#[test]
fn encode_decode_encode_is_idempotent() {
    let tracks = import_midi_bytes(&reference_file()).expect("first import should succeed");
    let settings = ExportSettings::default();

    let first = export_midi_bytes(&[as_track(&tracks[0])], &settings);
    let reimported = import_midi_bytes(&first).expect("second import should succeed");
    assert_eq!(reimported.len(), 1);
    let second = export_midi_bytes(&[as_track(&reimported[0])], &settings);

    // The name survives the trip, so the files match byte for byte.
    assert_eq!(first, second);
}

#[test]
fn simultaneous_off_and_on_are_ordered_off_first() {
    // Two back-to-back notes on the same pitch: the first one's note-off
    // and the second one's note-on land on the same tick.
    let mut track = vec![0x00, 0x90, 60, 100];
    track.extend_from_slice(&[0x83, 0x60, 0x80, 60, 0]);
    track.extend_from_slice(&[0x00, 0x90, 60, 100]);
    track.extend_from_slice(&[0x83, 0x60, 0x80, 60, 0]);
    track.extend_from_slice(&[0x00, 0xFF, 0x2F, 0x00]);

    let mut data = Vec::new();
    data.extend_from_slice(b"MThd");
    data.extend_from_slice(&6u32.to_be_bytes());
    data.extend_from_slice(&1u16.to_be_bytes());
    data.extend_from_slice(&1u16.to_be_bytes());
    data.extend_from_slice(&480u16.to_be_bytes());
    data.extend_from_slice(b"MTrk");
    data.extend_from_slice(&(track.len() as u32).to_be_bytes());
    data.extend_from_slice(&track);

    let tracks = import_midi_bytes(&data).expect("import should succeed");
    let exported = export_midi_bytes(&[as_track(&tracks[0])], &ExportSettings::default());

    // At tick 480 the off must precede the on.
    assert!(contains(&exported, &[0x83, 0x60, 0x80, 60, 0, 0x00, 0x90, 60, 100]));
}

#[test]
fn file_round_trip_through_disk() {
    let path = temp_midi_path("roundtrip");

    let tracks = import_midi_bytes(&reference_file()).expect("import should succeed");
    export_midi_path(&[as_track(&tracks[0])], &ExportSettings::default(), &path)
        .expect("export should succeed");

    let loaded = import_midi_path(&path).expect("import should succeed");
    assert_eq!(loaded.len(), 1);
    assert_eq!(loaded[0].name, "Lead");
    assert_eq!(loaded[0].notes.note_count(), 1);

    let _ = std::fs::remove_file(&path);
}
