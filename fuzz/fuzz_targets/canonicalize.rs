#![no_main]

use libfuzzer_sys::fuzz_target;
use spark_verify::{canonicalize_request, SignedHeaders};

// Input layout: header lines "name:value" up to the first empty line, then the body.
fuzz_target!(|data: &[u8]| {
    let text = String::from_utf8_lossy(data);
    let (head, body) = text.split_once("\n\n").unwrap_or((&*text, ""));

    let pairs: Vec<(String, String)> = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(name, value)| (name.to_string(), value.to_string()))
        .collect();

    let forward: SignedHeaders = pairs.iter().cloned().collect();
    let reverse: SignedHeaders = pairs.iter().rev().cloned().collect();

    let a = canonicalize_request(&forward, body.as_bytes());
    let b = canonicalize_request(&reverse, body.as_bytes());
    assert_eq!(a.as_bytes(), b.as_bytes());
});
