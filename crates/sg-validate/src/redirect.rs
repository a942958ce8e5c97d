//! Redirect target validation.
//!
//! A redirect target is accepted only if it is an absolute `http`/`https`
//! URL whose origin is the application's own origin or one explicitly
//! allowed in configuration. Anything that could split a response header,
//! hide the real host behind userinfo, or leave the host implicit is refused.

use crate::engine::{is_blank, Validator};
use crate::error::{ConfigError, Result};
use crate::rejection::{LengthBound, Rejection, RejectionKind, Validated};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest redirect target accepted, in characters.
pub const MAX_REDIRECT_LENGTH: usize = 2048;

static RE_SCHEME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*):").unwrap());

static RE_ABSOLUTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([A-Za-z][A-Za-z0-9+.\-]*)://([^/?#]*)(?:[/?#].*)?$").unwrap());

static RE_HOST_PORT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^((?:[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)(?:\.[A-Za-z0-9](?:[A-Za-z0-9\-]*[A-Za-z0-9])?)*\.?",
        r"|\[[0-9A-Fa-f:.]+\])(?::([0-9]{1,5}))?$"
    ))
    .unwrap()
});

/// Redirect section of the rules file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectConfig {
    /// The application's own origin, e.g. `https://app.example.org`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub self_origin: Option<String>,

    /// Other origins redirects may point at.
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

/// Scheme, host and effective port of a URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: String,
    host: String,
    port: u16,
}

impl Origin {
    /// Parse an origin string such as `https://example.org:8443`.
    ///
    /// A trailing `/` is tolerated; any other path, query, or userinfo is not.
    pub fn parse(s: &str) -> Option<Origin> {
        let s = s.strip_suffix('/').unwrap_or(s);
        let caps = RE_ABSOLUTE.captures(s)?;
        let authority = caps.get(2)?;
        if authority.end() != s.len() {
            return None;
        }
        origin_from_parts(caps.get(1)?.as_str(), authority.as_str()).ok()
    }

    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if Some(self.port) == default_port(&self.scheme) {
            write!(f, "{}://{}", self.scheme, self.host)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

fn default_port(scheme: &str) -> Option<u16> {
    match scheme {
        "http" => Some(80),
        "https" => Some(443),
        _ => None,
    }
}

/// Why a URL could not be reduced to an origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OriginError {
    Scheme,
    Malformed,
}

fn origin_from_parts(scheme: &str, authority: &str) -> std::result::Result<Origin, OriginError> {
    let scheme = scheme.to_ascii_lowercase();
    let port_default = default_port(&scheme).ok_or(OriginError::Scheme)?;

    // userinfo can disguise the real host: https://trusted.com@evil.com
    if authority.contains('@') {
        return Err(OriginError::Malformed);
    }
    let caps = RE_HOST_PORT
        .captures(authority)
        .ok_or(OriginError::Malformed)?;
    let host = caps
        .get(1)
        .map(|m| m.as_str().trim_end_matches('.').to_ascii_lowercase())
        .ok_or(OriginError::Malformed)?;
    if host.is_empty() {
        return Err(OriginError::Malformed);
    }
    let port = match caps.get(2) {
        Some(p) => p
            .as_str()
            .parse::<u16>()
            .ok()
            .filter(|&port| port != 0)
            .ok_or(OriginError::Malformed)?,
        None => port_default,
    };

    Ok(Origin { scheme, host, port })
}

/// Origins a redirect may target. The default policy permits none.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedirectPolicy {
    self_origin: Option<Origin>,
    allowed: Vec<Origin>,
}

impl RedirectPolicy {
    pub fn new(self_origin: Origin) -> Self {
        Self {
            self_origin: Some(self_origin),
            allowed: Vec::new(),
        }
    }

    pub fn allow_origin(mut self, origin: Origin) -> Self {
        self.allowed.push(origin);
        self
    }

    pub fn from_config(config: &RedirectConfig) -> Result<Self> {
        let parse = |s: &String| Origin::parse(s).ok_or_else(|| ConfigError::InvalidOrigin(s.clone()));
        Ok(Self {
            self_origin: config.self_origin.as_ref().map(parse).transpose()?,
            allowed: config.allowed_origins.iter().map(parse).collect::<Result<_>>()?,
        })
    }

    pub fn self_origin(&self) -> Option<&Origin> {
        self.self_origin.as_ref()
    }

    pub fn allowed_origins(&self) -> &[Origin] {
        &self.allowed
    }

    /// Exact comparison of scheme, host and effective port.
    pub fn permits(&self, origin: &Origin) -> bool {
        self.self_origin.as_ref() == Some(origin) || self.allowed.contains(origin)
    }
}

impl Validator {
    /// Validate a redirect target against the configured [`RedirectPolicy`].
    ///
    /// Returns the canonical URL on success.
    pub fn validate_redirect(&self, context: &str, input: &str, allow_null: bool) -> Validated<String> {
        if is_blank(input) {
            if allow_null {
                return Ok(None);
            }
            return Err(self.rejected(Rejection::new(
                RejectionKind::EmptyInput,
                context,
                format!("{context}: Redirect target required."),
                format!("Redirect target required: context={context}, input={input}"),
            )));
        }

        let len = input.chars().count();
        if len > MAX_REDIRECT_LENGTH {
            return Err(self.rejected(Rejection::new(
                RejectionKind::LengthViolation {
                    bound: LengthBound::Max,
                    limit: MAX_REDIRECT_LENGTH,
                    delta: len - MAX_REDIRECT_LENGTH,
                },
                context,
                format!(
                    "{context}: Invalid redirect. The maximum length of {MAX_REDIRECT_LENGTH} characters was exceeded."
                ),
                format!(
                    "Redirect exceeds maximum allowed length of {MAX_REDIRECT_LENGTH} by {} characters: context={context}, input={input}",
                    len - MAX_REDIRECT_LENGTH
                ),
            )));
        }

        let canonical = match self.canonicalizer().canonicalize(input) {
            Ok(c) => c,
            Err(e) => {
                return Err(self.rejected(Rejection::new(
                    RejectionKind::AmbiguousEncoding,
                    context,
                    format!("{context}: Invalid redirect. Encoding problem detected."),
                    format!("Error canonicalizing redirect: {e}: context={context}, input={input}"),
                )))
            }
        };

        let reject = |kind: RejectionKind, public: &str, audit: &str| {
            let orig = if canonical == input {
                String::new()
            } else {
                format!(", orig={input}")
            };
            self.rejected(Rejection::new(
                kind,
                context,
                format!("{context}: Invalid redirect. {public}"),
                format!("{audit}: context={context}, input={canonical}{orig}"),
            ))
        };

        if canonical.chars().any(char::is_control) {
            return Err(reject(
                RejectionKind::HeaderInjection,
                "Control characters are not allowed.",
                "Redirect contains control characters",
            ));
        }

        let Some(scheme) = RE_SCHEME.captures(&canonical).and_then(|c| c.get(1)) else {
            return Err(reject(
                RejectionKind::MalformedUrl,
                "An absolute URL is required.",
                "Redirect is not an absolute URL",
            ));
        };
        if default_port(&scheme.as_str().to_ascii_lowercase()).is_none() {
            return Err(reject(
                RejectionKind::DisallowedScheme,
                "Only http and https targets are allowed.",
                "Redirect uses a disallowed scheme",
            ));
        }

        let Some(caps) = RE_ABSOLUTE.captures(&canonical) else {
            return Err(reject(
                RejectionKind::MalformedUrl,
                "An absolute URL is required.",
                "Redirect is not an absolute URL",
            ));
        };
        let authority = caps.get(2).map_or("", |m| m.as_str());
        let origin = match origin_from_parts(scheme.as_str(), authority) {
            Ok(o) => o,
            Err(OriginError::Scheme) => {
                return Err(reject(
                    RejectionKind::DisallowedScheme,
                    "Only http and https targets are allowed.",
                    "Redirect uses a disallowed scheme",
                ))
            }
            Err(OriginError::Malformed) => {
                return Err(reject(
                    RejectionKind::MalformedUrl,
                    "The target host could not be determined.",
                    "Redirect has a malformed authority",
                ))
            }
        };

        if !self.redirect_policy().permits(&origin) {
            return Err(reject(
                RejectionKind::CrossOriginRedirect,
                "Redirects to other sites are not allowed.",
                &format!("Cross-origin redirect to {origin}"),
            ));
        }

        Ok(Some(canonical))
    }

    /// True if [`validate_redirect`](Self::validate_redirect) accepts the input.
    pub fn is_valid_redirect(&self, context: &str, input: &str, allow_null: bool) -> bool {
        self.validate_redirect(context, input, allow_null).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::RuleRegistry;

    fn validator() -> Validator {
        let policy = RedirectPolicy::new(Origin::parse("https://app.example.org").unwrap())
            .allow_origin(Origin::parse("https://login.example.org:8443").unwrap());
        Validator::new(RuleRegistry::new()).with_redirect_policy(policy)
    }

    fn kind(input: &str) -> RejectionKind {
        validator()
            .validate_redirect("next", input, false)
            .unwrap_err()
            .kind()
            .clone()
    }

    #[test]
    fn test_origin_parse() {
        let o = Origin::parse("HTTPS://App.Example.org/").unwrap();
        assert_eq!(o.scheme(), "https");
        assert_eq!(o.host(), "app.example.org");
        assert_eq!(o.port(), 443);
        assert_eq!(o.to_string(), "https://app.example.org");

        assert_eq!(
            Origin::parse("http://localhost:8080").unwrap().to_string(),
            "http://localhost:8080"
        );
        assert!(Origin::parse("https://example.org/path").is_none());
        assert!(Origin::parse("ftp://example.org").is_none());
        assert!(Origin::parse("example.org").is_none());
    }

    #[test]
    fn test_same_origin_accepted() {
        let v = validator();
        assert_eq!(
            v.validate_redirect("next", "https://app.example.org/home?x=1", false)
                .unwrap()
                .as_deref(),
            Some("https://app.example.org/home?x=1")
        );
        assert!(v.is_valid_redirect("next", "https://APP.example.org:443/", false));
        assert!(v.is_valid_redirect("next", "https://login.example.org:8443/sso", false));
    }

    #[test]
    fn test_canonical_value_returned() {
        let v = validator();
        assert_eq!(
            v.validate_redirect("next", "https://app.example.org/a%20b", false)
                .unwrap()
                .as_deref(),
            Some("https://app.example.org/a b")
        );
    }

    #[test]
    fn test_empty() {
        let v = validator();
        assert_eq!(v.validate_redirect("next", "", true).unwrap(), None);
        assert_eq!(kind("  "), RejectionKind::EmptyInput);
    }

    #[test]
    fn test_disallowed_schemes() {
        assert_eq!(kind("javascript:alert(1)"), RejectionKind::DisallowedScheme);
        assert_eq!(kind("data:text/html,<script>"), RejectionKind::DisallowedScheme);
        assert_eq!(kind("JaVaScRiPt:alert(1)"), RejectionKind::DisallowedScheme);
        assert_eq!(kind("ftp://app.example.org/"), RejectionKind::DisallowedScheme);
    }

    #[test]
    fn test_header_injection() {
        assert_eq!(
            kind("https://app.example.org/\r\nSet-Cookie: a=b"),
            RejectionKind::HeaderInjection
        );
        assert_eq!(
            kind("https://app.example.org/%0d%0aSet-Cookie:%20a=b"),
            RejectionKind::HeaderInjection
        );
        assert_eq!(kind("https://app.example.org/%00"), RejectionKind::HeaderInjection);
    }

    #[test]
    fn test_relative_and_protocol_relative() {
        assert_eq!(kind("/local/path"), RejectionKind::MalformedUrl);
        assert_eq!(kind("//evil.com/"), RejectionKind::MalformedUrl);
        assert_eq!(kind("https:evil.com"), RejectionKind::MalformedUrl);
        assert_eq!(kind("https:/evil.com"), RejectionKind::MalformedUrl);
        assert_eq!(kind("not a url"), RejectionKind::MalformedUrl);
    }

    #[test]
    fn test_cross_origin() {
        assert_eq!(kind("https://evil.com/"), RejectionKind::CrossOriginRedirect);
        assert_eq!(
            kind("https://app.example.org.attacker.com/"),
            RejectionKind::CrossOriginRedirect
        );
        // scheme and port are part of the origin
        assert_eq!(kind("http://app.example.org/"), RejectionKind::CrossOriginRedirect);
        assert_eq!(kind("https://app.example.org:8443/"), RejectionKind::CrossOriginRedirect);
        assert_eq!(kind("https://login.example.org/"), RejectionKind::CrossOriginRedirect);
    }

    #[test]
    fn test_userinfo_and_backslash_tricks() {
        assert_eq!(kind("https://app.example.org@evil.com/"), RejectionKind::MalformedUrl);
        assert_eq!(kind("https://app.example.org\\@evil.com/"), RejectionKind::MalformedUrl);
        assert_eq!(kind("https://evil.com\\.app.example.org/"), RejectionKind::MalformedUrl);
        assert_eq!(kind("https://:443/"), RejectionKind::MalformedUrl);
        assert_eq!(kind("https://app.example.org:99999/"), RejectionKind::MalformedUrl);
    }

    #[test]
    fn test_empty_labels_and_port_zero() {
        assert_eq!(kind("https://app..example.org/"), RejectionKind::MalformedUrl);
        assert_eq!(kind("https://.app.example.org/"), RejectionKind::MalformedUrl);
        assert_eq!(kind("https://app.example.org..:443/"), RejectionKind::MalformedUrl);
        assert_eq!(kind("https://app.example.org:0/"), RejectionKind::MalformedUrl);
        assert!(Origin::parse("https://a..b").is_none());
        assert!(Origin::parse("http://localhost:0").is_none());
        // a single trailing dot is still the same host
        assert!(validator().is_valid_redirect("next", "https://app.example.org./x", false));
    }

    #[test]
    fn test_double_encoding() {
        assert_eq!(kind("https://app.example.org/%250d%250a"), RejectionKind::AmbiguousEncoding);
    }

    #[test]
    fn test_too_long() {
        let long = format!("https://app.example.org/{}", "a".repeat(MAX_REDIRECT_LENGTH));
        assert!(matches!(
            kind(&long),
            RejectionKind::LengthViolation { bound: LengthBound::Max, .. }
        ));
    }

    #[test]
    fn test_default_policy_denies_everything() {
        let v = Validator::new(RuleRegistry::new());
        let err = v
            .validate_redirect("next", "https://app.example.org/", false)
            .unwrap_err();
        assert_eq!(err.kind(), &RejectionKind::CrossOriginRedirect);
    }

    #[test]
    fn test_policy_from_config() {
        let config = RedirectConfig {
            self_origin: Some("https://app.example.org".into()),
            allowed_origins: vec!["https://cdn.example.org".into()],
        };
        let policy = RedirectPolicy::from_config(&config).unwrap();
        assert!(policy.permits(&Origin::parse("https://cdn.example.org").unwrap()));

        let bad = RedirectConfig {
            self_origin: Some("not-an-origin".into()),
            allowed_origins: vec![],
        };
        assert!(matches!(
            RedirectPolicy::from_config(&bad),
            Err(ConfigError::InvalidOrigin(_))
        ));
    }

    #[test]
    fn test_public_message_hides_target() {
        let err = validator()
            .validate_redirect("next", "https://evil.com/steal", false)
            .unwrap_err();
        assert!(!err.public_message().contains("evil.com"));
        assert!(err.audit_message().contains("evil.com"));
    }
}
