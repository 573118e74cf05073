//! Hex codec for I2C payloads.
//!
//! Wire format: two ASCII hex digits per byte, most-significant nibble
//! first.  Encoding always emits lowercase; decoding accepts either case.
//!
//! ```text
//!  bytes  [0x50, 0xDE, 0xAD]
//!  hex    "50" "de" "ad"
//! ```
//!
//! Decoding consumes exactly two characters per byte, so a trailing odd
//! character is ignored.  Anything that is not a hex digit is rejected.

use crate::error::HexError;

const HEX_DIGITS: &[u8; 16] = b"0123456789abcdef";

/// Encode `bytes` as lowercase hex.
pub fn encode(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX_DIGITS[(b >> 4) as usize] as char);
        out.push(HEX_DIGITS[(b & 0x0f) as usize] as char);
    }
    out
}

/// Number of whole bytes `hex` decodes to.
pub fn decoded_len(hex: &str) -> usize {
    hex.len() / 2
}

/// Decode the byte starting at byte index `offset` (character `2 * offset`).
pub fn decode_byte(hex: &str, offset: usize) -> Result<u8, HexError> {
    let raw = hex.as_bytes();
    let pos = offset * 2;
    if pos + 1 >= raw.len() {
        return Err(HexError::OutOfRange { offset });
    }
    let hi = nibble(raw[pos]).ok_or(HexError::InvalidDigit { position: pos })?;
    let lo = nibble(raw[pos + 1]).ok_or(HexError::InvalidDigit { position: pos + 1 })?;
    Ok((hi << 4) | lo)
}

/// Decode every whole byte in `hex`.
pub fn decode(hex: &str) -> Result<Vec<u8>, HexError> {
    (0..decoded_len(hex)).map(|i| decode_byte(hex, i)).collect()
}

fn nibble(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}
