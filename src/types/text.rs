//! Fixed-width text slots.
//!
//! Every string in a project file lives in a slot of known width, encoded as
//! UTF-16LE. Short values are zero-padded; long values are cut at exactly
//! `width` bytes, which can split a surrogate pair. The decoder turns such an
//! orphaned half into U+FFFD.

/// Encode `value` into a slot of exactly `width` bytes
pub fn encode_text(value: &str, width: usize) -> Vec<u8> {
    let mut buf = Vec::with_capacity(width);
    for unit in value.encode_utf16() {
        if buf.len() >= width {
            break;
        }
        buf.extend_from_slice(&unit.to_le_bytes());
    }
    buf.resize(width, 0);
    buf
}

/// Decode a slot, dropping trailing zero padding
pub fn decode_text(bytes: &[u8]) -> String {
    let mut units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]))
        .collect();

    while units.last() == Some(&0) {
        units.pop();
    }

    char::decode_utf16(units)
        .map(|r| r.unwrap_or(char::REPLACEMENT_CHARACTER))
        .collect()
}
