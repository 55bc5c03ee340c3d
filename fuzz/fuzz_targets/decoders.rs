//! Fuzz target for the byte decoders and number parsers.
//!
//! Feeds arbitrary input to hex, Base64 and percent decoding and to the
//! integer and float parsers. None of them may panic, and anything that
//! decodes must re-encode to input that decodes to the same bytes.
//!
//! # Running
//! ```bash
//! cargo +nightly fuzz run fuzz_decoders
//! ```

#![no_main]

use iocore::bytes::{Base64Options, Bytes};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Some((&selector, input)) = data.split_first() else {
        return;
    };

    if let Ok(decoded) = Bytes::from_hex(input) {
        let again = Bytes::from_hex(decoded.to_hex()).expect("hex re-decodes");
        assert_eq!(again, decoded);
    }

    let opts = match selector & 3 {
        0 => Base64Options::STANDARD,
        1 => Base64Options::URL_SAFE,
        2 => Base64Options::OMIT_TRAILING_EQUALS,
        _ => Base64Options::URL_SAFE | Base64Options::OMIT_TRAILING_EQUALS,
    };
    if let Ok(decoded) = Bytes::from_base64(input, opts) {
        let again = Bytes::from_base64(decoded.to_base64(opts), opts).expect("base64 re-decodes");
        assert_eq!(again, decoded);
    }

    let decoded = Bytes::from_percent_encoding(input, b'%');
    assert!(decoded.len() <= input.len());

    let text = Bytes::copy_from_slice(input);
    let base = u32::from(selector % 37);
    let _ = text.to_int::<i64>(base);
    let _ = text.to_int::<u8>(base);
    let _ = text.to_f64();
});
