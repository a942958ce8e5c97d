//! Fuzz target for redirect validation.
//!
//! Arbitrary targets must never panic, and an accepted target must be
//! accepted again.

#![no_main]

use libfuzzer_sys::fuzz_target;
use sg_validate::{Origin, RedirectPolicy, RuleRegistry, Validator};

fuzz_target!(|data: &str| {
    let Some(origin) = Origin::parse("https://app.example.org") else {
        return;
    };
    let validator =
        Validator::new(RuleRegistry::new()).with_redirect_policy(RedirectPolicy::new(origin));
    if let Ok(Some(accepted)) = validator.validate_redirect("fuzz", data, false) {
        assert!(validator.is_valid_redirect("fuzz", &accepted, false));
    }
});
