//! Validation engine.
//!
//! The [`Validator`] judges raw input against a [`PatternRule`] in a fixed
//! order and stops at the first failure:
//!
//! 1. empty or blank input
//! 2. length of the raw input, in characters
//! 3. canonicalization
//! 4. whitelist, every pattern must match the canonical value
//! 5. blacklist, no pattern may match the canonical value
//!
//! Accepted values are returned in canonical form. Rejections carry a
//! public message for the caller and an audit message with the raw input;
//! the engine itself only logs labels, type names and rejection kinds.

use crate::canonicalize::Canonicalizer;
use crate::error::Result;
use crate::redirect::RedirectPolicy;
use crate::registry::{RuleRegistry, RulesConfig};
use crate::rejection::{LengthBound, Rejection, RejectionKind, Validated};
use crate::rule::PatternRule;
use std::path::Path;
use std::sync::Arc;

/// True for empty or whitespace-only input.
pub(crate) fn is_blank(input: &str) -> bool {
    input.trim().is_empty()
}

/// Keep only ASCII letters and digits.
pub fn sanitize_alphanumeric(input: &str) -> String {
    input.chars().filter(char::is_ascii_alphanumeric).collect()
}

/// Stateless input validator over an immutable rule registry.
#[derive(Debug, Clone)]
pub struct Validator {
    registry: Arc<RuleRegistry>,
    canonicalizer: Canonicalizer,
    redirect: RedirectPolicy,
}

impl Validator {
    pub fn new(registry: RuleRegistry) -> Self {
        Self::from_shared(Arc::new(registry))
    }

    /// Build over a registry shared with other validators.
    pub fn from_shared(registry: Arc<RuleRegistry>) -> Self {
        Self {
            registry,
            canonicalizer: Canonicalizer::default(),
            redirect: RedirectPolicy::default(),
        }
    }

    /// Compile a rules file's types and redirect section.
    pub fn from_config(config: &RulesConfig) -> Result<Self> {
        let registry = RuleRegistry::from_config(config)?;
        let redirect = match &config.redirect {
            Some(r) => RedirectPolicy::from_config(r)?,
            None => RedirectPolicy::default(),
        };
        Ok(Self::new(registry).with_redirect_policy(redirect))
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_config(&RulesConfig::load(path)?)
    }

    pub fn with_canonicalizer(mut self, canonicalizer: Canonicalizer) -> Self {
        self.canonicalizer = canonicalizer;
        self
    }

    pub fn with_redirect_policy(mut self, policy: RedirectPolicy) -> Self {
        self.redirect = policy;
        self
    }

    pub fn registry(&self) -> &RuleRegistry {
        &self.registry
    }

    pub fn canonicalizer(&self) -> &Canonicalizer {
        &self.canonicalizer
    }

    pub fn redirect_policy(&self) -> &RedirectPolicy {
        &self.redirect
    }

    /// Validate `input` against `rule`.
    ///
    /// An empty string stands for a missing value. It yields `Ok(None)` when
    /// `allow_null` is set and [`RejectionKind::EmptyInput`] otherwise.
    pub fn validate(
        &self,
        context: &str,
        input: &str,
        rule: &PatternRule,
        allow_null: bool,
    ) -> Validated<String> {
        let type_name = rule.type_name();

        if is_blank(input) {
            if allow_null {
                return Ok(None);
            }
            return Err(self.rejected(Rejection::new(
                RejectionKind::EmptyInput,
                context,
                format!("{context}: Input required."),
                format!("Input required: context={context}, type={type_name}, input={input}"),
            )));
        }

        self.check_length(context, input, rule)?;

        let canonical = if rule.canonicalize() {
            self.canonicalizer.canonicalize(input).map_err(|e| {
                self.rejected(Rejection::new(
                    RejectionKind::AmbiguousEncoding,
                    context,
                    format!("{context}: Invalid input. Encoding problem detected."),
                    format!(
                        "Error canonicalizing user input: {e}: context={context}, type={type_name}, input={input}"
                    ),
                ))
            })?
        } else {
            tracing::warn!(context, type_name, "input validation excludes canonicalization");
            input.to_string()
        };

        let orig = if canonical == input {
            String::new()
        } else {
            format!(", orig={input}")
        };

        for pattern in rule.whitelist() {
            if !pattern.matches(&canonical) {
                let max_note = if rule.has_max_length() {
                    format!(" with a maximum length of {}", rule.max_length())
                } else {
                    String::new()
                };
                return Err(self.rejected(Rejection::new(
                    RejectionKind::WhitelistViolation {
                        pattern: pattern.as_str().to_string(),
                    },
                    context,
                    format!(
                        "{context}: Invalid input. Please conform to regex {}{max_note}",
                        pattern.as_str()
                    ),
                    format!(
                        "Invalid input: context={context}, type({type_name})={}, input={canonical}{orig}",
                        pattern.as_str()
                    ),
                )));
            }
        }

        for pattern in rule.blacklist() {
            if pattern.matches(&canonical) {
                return Err(self.rejected(Rejection::new(
                    RejectionKind::BlacklistViolation {
                        pattern: pattern.as_str().to_string(),
                    },
                    context,
                    format!(
                        "{context}: Invalid input. Dangerous input matching {} detected.",
                        pattern.as_str()
                    ),
                    format!(
                        "Dangerous input: context={context}, type({type_name})={}, input={canonical}{orig}",
                        pattern.as_str()
                    ),
                )));
            }
        }

        Ok(Some(canonical))
    }

    fn check_length(
        &self,
        context: &str,
        input: &str,
        rule: &PatternRule,
    ) -> std::result::Result<(), Rejection> {
        let type_name = rule.type_name();
        let len = input.chars().count();

        if len < rule.min_length() {
            let min = rule.min_length();
            let delta = min - len;
            return Err(self.rejected(Rejection::new(
                RejectionKind::LengthViolation {
                    bound: LengthBound::Min,
                    limit: min,
                    delta,
                },
                context,
                format!("{context}: Invalid input. The minimum length of {min} characters was not met."),
                format!(
                    "Input does not meet the minimum length of {min} by {delta} characters: context={context}, type={type_name}, input={input}"
                ),
            )));
        }

        if len > rule.max_length() {
            let max = rule.max_length();
            let delta = len - max;
            return Err(self.rejected(Rejection::new(
                RejectionKind::LengthViolation {
                    bound: LengthBound::Max,
                    limit: max,
                    delta,
                },
                context,
                format!("{context}: Invalid input. The maximum length of {max} characters was exceeded."),
                format!(
                    "Input exceeds maximum allowed length of {max} by {delta} characters: context={context}, type={type_name}, input={input}"
                ),
            )));
        }

        Ok(())
    }

    /// Validate `input` against the registered type `type_name`, with the
    /// given maximum length and canonicalization switched on.
    pub fn get_valid_input(
        &self,
        context: &str,
        input: &str,
        type_name: &str,
        max_length: usize,
        allow_null: bool,
    ) -> Validated<String> {
        let Some(template) = self.registry.get(type_name) else {
            return Err(self.rejected(Rejection::new(
                RejectionKind::UnknownType {
                    type_name: type_name.to_string(),
                },
                context,
                format!("{context}: Invalid input. Validation is not configured for this field."),
                format!("Unknown validation type [{type_name}] is not registered: context={context}"),
            )));
        };

        let rule = template.with_max_length(max_length).with_canonicalize(true);
        self.validate(context, input, &rule, allow_null)
    }

    /// True if [`get_valid_input`](Self::get_valid_input) accepts the input.
    pub fn is_valid_input(
        &self,
        context: &str,
        input: &str,
        type_name: &str,
        max_length: usize,
        allow_null: bool,
    ) -> bool {
        self.get_valid_input(context, input, type_name, max_length, allow_null)
            .is_ok()
    }

    /// Log a rejection without its raw input and hand it back.
    pub(crate) fn rejected(&self, rejection: Rejection) -> Rejection {
        if rejection.requires_operator_attention() {
            tracing::warn!(
                context = rejection.context(),
                kind = %rejection.kind(),
                code = rejection.kind().code(),
                "input rejected, check deployment"
            );
        } else {
            tracing::debug!(
                context = rejection.context(),
                kind = %rejection.kind(),
                code = rejection.kind().code(),
                "input rejected"
            );
        }
        rejection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule() -> PatternRule {
        PatternRule::builder("SafeString")
            .whitelist("[A-Za-z0-9 <>%]*")
            .blacklist(".*<b>.*")
            .min_length(2)
            .max_length(10)
            .build()
            .unwrap()
    }

    fn validator() -> Validator {
        let mut registry = RuleRegistry::new();
        registry.register(rule()).unwrap();
        Validator::new(registry)
    }

    #[test]
    fn test_accepts_and_returns_canonical() {
        let v = validator();
        assert_eq!(
            v.validate("f", "a%20b", &rule(), false).unwrap().as_deref(),
            Some("a b")
        );
    }

    #[test]
    fn test_empty_and_blank() {
        let v = validator();
        assert_eq!(v.validate("f", "", &rule(), true).unwrap(), None);
        assert_eq!(v.validate("f", "   ", &rule(), true).unwrap(), None);

        let err = v.validate("f", " \t", &rule(), false).unwrap_err();
        assert_eq!(err.kind(), &RejectionKind::EmptyInput);
        assert_eq!(err.public_message(), "f: Input required.");
    }

    #[test]
    fn test_length_bounds_inclusive() {
        let v = validator();
        assert!(v.validate("f", "ab", &rule(), false).is_ok());
        assert!(v.validate("f", "abcdefghij", &rule(), false).is_ok());

        let err = v.validate("f", "abcdefghijk", &rule(), false).unwrap_err();
        assert_eq!(
            err.kind(),
            &RejectionKind::LengthViolation {
                bound: LengthBound::Max,
                limit: 10,
                delta: 1
            }
        );

        let err = v.validate("f", "a", &rule(), false).unwrap_err();
        assert_eq!(
            err.kind(),
            &RejectionKind::LengthViolation {
                bound: LengthBound::Min,
                limit: 2,
                delta: 1
            }
        );
    }

    #[test]
    fn test_length_measured_on_raw_input() {
        let v = validator();
        // 11 raw characters, 9 once decoded
        let err = v.validate("f", "abc%20defgh", &rule(), false).unwrap_err();
        assert!(matches!(err.kind(), RejectionKind::LengthViolation { .. }));
    }

    #[test]
    fn test_length_counts_characters() {
        let rule = PatternRule::builder("Any")
            .whitelist(".*")
            .max_length(4)
            .build()
            .unwrap();
        let v = validator();
        assert!(v.validate("f", "éééé", &rule, false).is_ok());
    }

    #[test]
    fn test_double_encoding_is_ambiguous() {
        let v = validator();
        let err = v.validate("f", "%253C", &rule(), false).unwrap_err();
        assert_eq!(err.kind(), &RejectionKind::AmbiguousEncoding);
    }

    #[test]
    fn test_whitelist_checks_canonical_value() {
        let v = validator();
        // raw form matches the whitelist, decoded form does not
        let err = v.validate("f", "a%26b", &rule(), false).unwrap_err();
        assert!(matches!(err.kind(), RejectionKind::WhitelistViolation { .. }));
        assert!(err.audit_message().contains("input=a&b"));
        assert!(err.audit_message().contains("orig=a%26b"));
        assert!(err.public_message().contains("with a maximum length of 10"));
    }

    #[test]
    fn test_blacklist_checks_canonical_value() {
        let v = validator();
        let err = v.validate("f", "%3Cb%3E", &rule(), false).unwrap_err();
        assert!(matches!(err.kind(), RejectionKind::BlacklistViolation { .. }));
        assert!(!err.public_message().contains("%3C"));
    }

    #[test]
    fn test_canonicalize_off_keeps_raw() {
        let v = validator();
        let raw = rule().with_canonicalize(false);
        assert_eq!(
            v.validate("f", "a%20b", &raw, false).unwrap().as_deref(),
            Some("a%20b")
        );
    }

    #[test]
    fn test_unknown_type() {
        let v = validator();
        let err = v
            .get_valid_input("f", "abc", "Email", 100, false)
            .unwrap_err();
        assert_eq!(
            err.kind(),
            &RejectionKind::UnknownType {
                type_name: "Email".into()
            }
        );
        assert!(err.requires_operator_attention());
        assert!(!err.public_message().contains("Email"));
    }

    #[test]
    fn test_get_valid_input_overrides_max_and_forces_canonicalize() {
        let mut registry = RuleRegistry::new();
        registry
            .register(
                PatternRule::builder("Loose")
                    .whitelist("[a-z ]*")
                    .canonicalize(false)
                    .build()
                    .unwrap(),
            )
            .unwrap();
        let v = Validator::new(registry);
        assert_eq!(
            v.get_valid_input("f", "a%20b", "Loose", 5, false).unwrap().as_deref(),
            Some("a b")
        );
        assert!(!v.is_valid_input("f", "abcdef", "Loose", 5, false));
        assert!(v.is_valid_input("f", "", "Loose", 5, true));
    }

    #[test]
    fn test_sanitize_alphanumeric() {
        assert_eq!(sanitize_alphanumeric("a-b_c 1!2é"), "abc12");
        assert_eq!(sanitize_alphanumeric(""), "");
    }
}
