use ostinato_domain_midi::{encode_vlq, ByteReader, ReadError};
use pretty_assertions::assert_eq;

#[test]
fn vlq_round_trip() {
    let values = [
        0u32,
        1,
        0x40,
        0x7F,
        0x80,
        0x2000,
        0x3FFF,
        0x4000,
        0x1F_FFFF,
        0x20_0000,
        0x0FFF_FFFF,
    ];
    for value in values {
        let encoded = encode_vlq(value);
        let mut reader = ByteReader::new(&encoded);
        let decoded = reader.read_var_uint().expect("decode should succeed");
        assert_eq!(decoded, value);
        assert!(reader.is_at_end());
    }
}

#[test]
fn vlq_known_encodings() {
    assert_eq!(encode_vlq(0), vec![0x00]);
    assert_eq!(encode_vlq(0x40), vec![0x40]);
    assert_eq!(encode_vlq(0x80), vec![0x81, 0x00]);
    assert_eq!(encode_vlq(0x0FFF_FFFF), vec![0xFF, 0xFF, 0xFF, 0x7F]);
}

#[test]
fn vlq_wider_than_32_bits_is_rejected() {
    let data = [0xFF, 0xFF, 0xFF, 0xFF, 0x7F];
    let mut reader = ByteReader::new(&data);
    let err = reader.read_var_uint().expect_err("decode should fail");
    assert_eq!(err, ReadError::VarIntOverflow { offset: 0 });
}

#[test]
fn reads_are_big_endian() {
    let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A];
    let mut reader = ByteReader::new(&data);
    assert_eq!(reader.read_u8().expect("u8"), 0x01);
    assert_eq!(reader.read_u16().expect("u16"), 0x0203);
    assert_eq!(reader.read_u24().expect("u24"), 0x04_0506);
    assert_eq!(reader.read_u32().expect("u32"), 0x0708_090A);
    assert!(reader.is_at_end());
}

#[test]
fn read_bytes_returns_a_view() {
    let data = [0x41, 0x42, 0x43, 0x44];
    let mut reader = ByteReader::new(&data);
    let view = reader.read_bytes(2).expect("read_bytes");
    assert_eq!(view, &data[..2]);
    assert_eq!(reader.pos(), 2);
    assert_eq!(reader.read_string(2).expect("read_string"), "CD");
}

#[test]
fn out_of_range_reads_fail() {
    let data = [0x01, 0x02];
    let mut reader = ByteReader::new(&data);
    let err = reader.read_u32().expect_err("read past end should fail");
    assert_eq!(err, ReadError::TruncatedBuffer { offset: 0 });

    // A failed read leaves the cursor where it was.
    assert_eq!(reader.pos(), 0);
    assert_eq!(reader.read_u16().expect("u16"), 0x0102);
    assert!(reader.read_u8().is_err());
}

#[test]
fn seek_allows_one_byte_rewind() {
    let data = [0x90, 0x3C, 0x64];
    let mut reader = ByteReader::new(&data);
    let status = reader.read_u8().expect("status");
    assert_eq!(status, 0x90);
    let lookahead = reader.read_u8().expect("lookahead");
    assert_eq!(lookahead, 0x3C);
    reader.seek(reader.pos() - 1);
    assert_eq!(reader.read_u8().expect("re-read"), 0x3C);
}
