//! Fuzz target: `hex::decode`
//!
//! Arbitrary strings must either decode to `len / 2` bytes or be
//! rejected, and a successful decode must re-encode to the lowercased
//! even-length prefix of the input.
//!
//! cargo fuzz run fuzz_hex_decode

#![no_main]

use hwbridge::hex;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(s) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(bytes) = hex::decode(s) {
        assert_eq!(bytes.len(), s.len() / 2);
        let prefix = &s[..bytes.len() * 2];
        assert_eq!(hex::encode(&bytes), prefix.to_ascii_lowercase());
    }
});
