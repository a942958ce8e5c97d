//! Rejection taxonomy for untrusted input.
//!
//! Every rejection carries two messages:
//! - a **public** message that is safe to show to the end user, and
//! - an **audit** message with the raw offending input, for internal logs only.
//!
//! `Display` renders the public message only. The audit message must be
//! fetched explicitly with [`Rejection::audit_message`] and routed to an
//! audit sink by the caller.

use std::fmt;
use thiserror::Error;

/// Outcome of a validation call.
///
/// `Ok(Some(v))` is an accepted canonical value, `Ok(None)` is an accepted
/// empty input (only when the caller allowed null), `Err` is a rejection.
pub type Validated<T> = std::result::Result<Option<T>, Rejection>;

/// Which length bound an input violated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LengthBound {
    Min,
    Max,
}

impl fmt::Display for LengthBound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LengthBound::Min => write!(f, "minimum"),
            LengthBound::Max => write!(f, "maximum"),
        }
    }
}

/// Why an input was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectionKind {
    /// Input was null or blank and null was not allowed.
    EmptyInput,
    /// Raw input is outside `[min_length, max_length]`.
    LengthViolation {
        bound: LengthBound,
        limit: usize,
        /// Distance in characters from the violated bound.
        delta: usize,
    },
    /// Input is multiply encoded, mixes encodings, or decodes to garbage.
    AmbiguousEncoding,
    /// Canonical input does not fully match a whitelist pattern.
    WhitelistViolation { pattern: String },
    /// Canonical input matches a blacklist pattern.
    BlacklistViolation { pattern: String },
    /// The requested type is not in the rule registry.
    UnknownType { type_name: String },
    DirectoryNotFound,
    NotADirectory,
    ParentNotFound,
    ParentNotADirectory,
    NotContainedInParent,
    /// Canonical path differs from the literal input.
    CanonicalMismatch,
    /// Unexpected filesystem failure, wrapped.
    IoFailure,
    /// Redirect target uses a scheme other than http/https.
    DisallowedScheme,
    /// Redirect target contains CR, LF or another control character.
    HeaderInjection,
    /// Redirect target points at an origin that is not whitelisted.
    CrossOriginRedirect,
    /// Redirect target is not an absolute http(s) URL.
    MalformedUrl,
}

impl RejectionKind {
    /// Stable snake_case name, used in structured output.
    pub fn name(&self) -> &'static str {
        match self {
            RejectionKind::EmptyInput => "empty_input",
            RejectionKind::LengthViolation { .. } => "length_violation",
            RejectionKind::AmbiguousEncoding => "ambiguous_encoding",
            RejectionKind::WhitelistViolation { .. } => "whitelist_violation",
            RejectionKind::BlacklistViolation { .. } => "blacklist_violation",
            RejectionKind::UnknownType { .. } => "unknown_type",
            RejectionKind::DirectoryNotFound => "directory_not_found",
            RejectionKind::NotADirectory => "not_a_directory",
            RejectionKind::ParentNotFound => "parent_not_found",
            RejectionKind::ParentNotADirectory => "parent_not_a_directory",
            RejectionKind::NotContainedInParent => "not_contained_in_parent",
            RejectionKind::CanonicalMismatch => "canonical_mismatch",
            RejectionKind::IoFailure => "io_failure",
            RejectionKind::DisallowedScheme => "disallowed_scheme",
            RejectionKind::HeaderInjection => "header_injection",
            RejectionKind::CrossOriginRedirect => "cross_origin_redirect",
            RejectionKind::MalformedUrl => "malformed_url",
        }
    }

    /// Stable numeric code for structured reporting.
    pub fn code(&self) -> u32 {
        match self {
            RejectionKind::EmptyInput => 100,
            RejectionKind::LengthViolation { .. } => 101,
            RejectionKind::AmbiguousEncoding => 102,
            RejectionKind::WhitelistViolation { .. } => 103,
            RejectionKind::BlacklistViolation { .. } => 104,
            RejectionKind::UnknownType { .. } => 110,
            RejectionKind::DirectoryNotFound => 120,
            RejectionKind::NotADirectory => 121,
            RejectionKind::ParentNotFound => 122,
            RejectionKind::ParentNotADirectory => 123,
            RejectionKind::NotContainedInParent => 124,
            RejectionKind::CanonicalMismatch => 125,
            RejectionKind::IoFailure => 130,
            RejectionKind::DisallowedScheme => 140,
            RejectionKind::HeaderInjection => 141,
            RejectionKind::CrossOriginRedirect => 142,
            RejectionKind::MalformedUrl => 143,
        }
    }

    /// Kinds that indicate a misdeployment or environment fault rather than
    /// bad user input. These should reach operators, not just the audit log.
    pub fn requires_operator_attention(&self) -> bool {
        matches!(
            self,
            RejectionKind::UnknownType { .. } | RejectionKind::IoFailure
        )
    }
}

impl fmt::Display for RejectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A typed rejection of untrusted input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{public_message}")]
pub struct Rejection {
    kind: RejectionKind,
    context: String,
    public_message: String,
    audit_message: String,
}

impl Rejection {
    pub fn new(
        kind: RejectionKind,
        context: impl Into<String>,
        public_message: impl Into<String>,
        audit_message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            context: context.into(),
            public_message: public_message.into(),
            audit_message: audit_message.into(),
        }
    }

    pub fn kind(&self) -> &RejectionKind {
        &self.kind
    }

    /// The caller-supplied label of the field being validated.
    pub fn context(&self) -> &str {
        &self.context
    }

    /// Message that is safe to return to an untrusted caller.
    pub fn public_message(&self) -> &str {
        &self.public_message
    }

    /// Detailed message including the raw input. Internal logging only.
    pub fn audit_message(&self) -> &str {
        &self.audit_message
    }

    pub fn requires_operator_attention(&self) -> bool {
        self.kind.requires_operator_attention()
    }
}
