//! Fuzz target for canonicalization.
//!
//! A successful result must be stable: canonicalizing it again returns it
//! unchanged.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sg_validate::Canonicalizer;

fuzz_target!(|data: &str| {
    for canon in [Canonicalizer::new(), Canonicalizer::web()] {
        if let Ok(once) = canon.canonicalize(data) {
            let twice = canon
                .canonicalize(&once)
                .expect("canonical output must canonicalize");
            assert_eq!(once, twice);
        }
    }
});
