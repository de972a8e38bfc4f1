#![no_main]

use libfuzzer_sys::fuzz_target;
use spark_verify::{decode_signature, public_key_from_pem};

fuzz_target!(|data: &[u8]| {
    let _ = public_key_from_pem(data);
    if let Ok(text) = std::str::from_utf8(data) {
        let _ = decode_signature(text);
    }
});
