//! Fuzz target for rules.json parsing and compilation.
//!
//! Parsing and compiling arbitrary rules should return errors, never panic.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sg_validate::{RulesConfig, Validator};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(config) = RulesConfig::from_json(text) {
        let _ = Validator::from_config(&config);
    }
});
