//! Fuzz target for JSON redaction.
//!
//! The copying and in-place walks must agree on arbitrary documents.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sg_redact::Redactor;

fuzz_target!(|data: &[u8]| {
    let Ok(tree) = serde_json::from_slice::<serde_json::Value>(data) else {
        return;
    };
    let redactor = Redactor::default();
    let copied = redactor.redact(&tree);
    let mut in_place = tree;
    redactor.redact_in_place(&mut in_place);
    assert_eq!(copied, in_place);
});
