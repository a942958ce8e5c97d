//! Pattern rules: accept/reject criteria for one semantic input type.
//!
//! Patterns are compiled once, anchored to the whole input, and shared
//! between every rule derived from the same definition.

use crate::error::{ConfigError, Result};
use regex::{Regex, RegexBuilder};
use std::sync::Arc;

/// Maximum allowed length for a pattern string.
pub const MAX_PATTERN_LENGTH: usize = 4096;

/// Compiled size limit per pattern.
const MAX_COMPILED_SIZE_BYTES: usize = 10 * (1 << 20);

/// A whitelist or blacklist pattern, compiled for full-string matching.
#[derive(Debug, Clone)]
pub struct CompiledPattern {
    source: String,
    regex: Regex,
}

impl CompiledPattern {
    /// Compile `pattern` so that it only matches the entire input.
    pub fn compile(type_name: &str, pattern: &str) -> Result<Self> {
        if pattern.len() > MAX_PATTERN_LENGTH {
            return Err(ConfigError::PatternTooLong {
                type_name: type_name.to_string(),
                len: pattern.len(),
                max: MAX_PATTERN_LENGTH,
            });
        }

        let anchored = format!(r"\A(?:{pattern})\z");
        let regex = RegexBuilder::new(&anchored)
            .size_limit(MAX_COMPILED_SIZE_BYTES)
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                type_name: type_name.to_string(),
                pattern: pattern.to_string(),
                source,
            })?;

        Ok(Self {
            source: pattern.to_string(),
            regex,
        })
    }

    /// The pattern as written in configuration.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// True if the whole of `input` matches.
    pub fn matches(&self, input: &str) -> bool {
        self.regex.is_match(input)
    }
}

/// Immutable validation rule for a single input type.
#[derive(Debug, Clone)]
pub struct PatternRule {
    type_name: String,
    whitelist: Arc<[CompiledPattern]>,
    blacklist: Arc<[CompiledPattern]>,
    min_length: usize,
    max_length: usize,
    canonicalize: bool,
}

impl PatternRule {
    pub fn builder(type_name: impl Into<String>) -> PatternRuleBuilder {
        PatternRuleBuilder::new(type_name)
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn whitelist(&self) -> &[CompiledPattern] {
        &self.whitelist
    }

    pub fn blacklist(&self) -> &[CompiledPattern] {
        &self.blacklist
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    /// True if the maximum length is bounded.
    pub fn has_max_length(&self) -> bool {
        self.max_length != usize::MAX
    }

    pub fn canonicalize(&self) -> bool {
        self.canonicalize
    }

    /// Derive a rule with a different maximum length, sharing the compiled
    /// patterns. `min_length` is lowered to `max_length` if it would exceed it.
    pub fn with_max_length(&self, max_length: usize) -> PatternRule {
        PatternRule {
            min_length: self.min_length.min(max_length),
            max_length,
            ..self.clone()
        }
    }

    /// Derive a rule with canonicalization switched on or off.
    pub fn with_canonicalize(&self, canonicalize: bool) -> PatternRule {
        PatternRule {
            canonicalize,
            ..self.clone()
        }
    }
}

/// Builder for [`PatternRule`]. All validation happens in [`build`](Self::build).
#[derive(Debug, Clone)]
pub struct PatternRuleBuilder {
    type_name: String,
    whitelist: Vec<String>,
    blacklist: Vec<String>,
    min_length: usize,
    max_length: usize,
    canonicalize: bool,
}

impl PatternRuleBuilder {
    fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            whitelist: Vec::new(),
            blacklist: Vec::new(),
            min_length: 0,
            max_length: usize::MAX,
            canonicalize: true,
        }
    }

    pub fn whitelist(mut self, pattern: impl Into<String>) -> Self {
        self.whitelist.push(pattern.into());
        self
    }

    pub fn blacklist(mut self, pattern: impl Into<String>) -> Self {
        self.blacklist.push(pattern.into());
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = min_length;
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }

    pub fn canonicalize(mut self, canonicalize: bool) -> Self {
        self.canonicalize = canonicalize;
        self
    }

    /// Compile all patterns and check the rule is usable.
    ///
    /// A rule without a whitelist pattern is rejected: it would otherwise
    /// accept every input.
    pub fn build(self) -> Result<PatternRule> {
        if self.whitelist.is_empty() {
            return Err(ConfigError::EmptyWhitelist {
                type_name: self.type_name,
            });
        }
        if self.min_length > self.max_length {
            return Err(ConfigError::InvalidLengthBounds {
                type_name: self.type_name,
                min: self.min_length,
                max: self.max_length,
            });
        }

        let whitelist = self
            .whitelist
            .iter()
            .map(|p| CompiledPattern::compile(&self.type_name, p))
            .collect::<Result<Vec<_>>>()?;
        let blacklist = self
            .blacklist
            .iter()
            .map(|p| CompiledPattern::compile(&self.type_name, p))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!(
            type_name = %self.type_name,
            whitelist = whitelist.len(),
            blacklist = blacklist.len(),
            "compiled validation rule"
        );

        Ok(PatternRule {
            type_name: self.type_name,
            whitelist: whitelist.into(),
            blacklist: blacklist.into(),
            min_length: self.min_length,
            max_length: self.max_length,
            canonicalize: self.canonicalize,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_match_required() {
        let p = CompiledPattern::compile("Alpha", "[a-z]+").unwrap();
        assert!(p.matches("abc"));
        assert!(!p.matches("abc123"));
        assert!(!p.matches("123abc"));
    }

    #[test]
    fn test_explicit_anchors_still_work() {
        let p = CompiledPattern::compile("Alpha", "^[a-z]+$").unwrap();
        assert!(p.matches("abc"));
        assert!(!p.matches("abc123"));
    }

    #[test]
    fn test_alternation_is_anchored_as_a_whole() {
        // without the group, `\A` would bind to `a` only
        let p = CompiledPattern::compile("AorB", "a|b").unwrap();
        assert!(p.matches("b"));
        assert!(!p.matches("xb"));
        assert!(!p.matches("ax"));
    }

    #[test]
    fn test_trailing_newline_does_not_slip_through() {
        let p = CompiledPattern::compile("Alpha", "^[a-z]+$").unwrap();
        assert!(!p.matches("abc\n"));
    }

    #[test]
    fn test_empty_whitelist_fails_at_build() {
        let err = PatternRule::builder("Nothing").build().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyWhitelist { .. }));
    }

    #[test]
    fn test_invalid_regex_fails_at_build() {
        let err = PatternRule::builder("Broken")
            .whitelist("[a-z")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));

        let err = PatternRule::builder("BrokenBlack")
            .whitelist(".*")
            .blacklist("(unclosed")
            .build()
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { .. }));
    }

    #[test]
    fn test_inverted_bounds_fail_at_build() {
        let err = PatternRule::builder("Bounds")
            .whitelist(".*")
            .min_length(10)
            .max_length(5)
            .build()
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidLengthBounds { min: 10, max: 5, .. }
        ));
    }

    #[test]
    fn test_oversized_pattern_rejected() {
        let huge = "a".repeat(MAX_PATTERN_LENGTH + 1);
        let err = CompiledPattern::compile("Huge", &huge).unwrap_err();
        assert!(matches!(err, ConfigError::PatternTooLong { .. }));
    }

    #[test]
    fn test_with_max_length_shares_patterns() {
        let rule = PatternRule::builder("Name")
            .whitelist("[a-z]+")
            .min_length(3)
            .build()
            .unwrap();
        let derived = rule.with_max_length(2);
        assert_eq!(derived.max_length(), 2);
        assert_eq!(derived.min_length(), 2);
        assert!(Arc::ptr_eq(&rule.whitelist, &derived.whitelist));
        assert!(!rule.has_max_length());
        assert!(derived.has_max_length());
    }
}
