//! Uppercase hex rendering for binary log payloads.

const NIBBLES: &[u8; 16] = b"0123456789ABCDEF";

/// Encodes `src` as uppercase hex with no separators.
///
/// The returned string holds exactly `2 * src.len()` characters. Capacity is
/// reserved for two extra bytes so the caller can push a CRLF terminator
/// without reallocating. An empty input yields an empty string.
pub fn encode_upper(src: &[u8]) -> String {
    let mut out = String::with_capacity(src.len() * 2 + 2);
    for &byte in src {
        out.push(NIBBLES[(byte >> 4) as usize] as char);
        out.push(NIBBLES[(byte & 0xF) as usize] as char);
    }
    out
}
