//! Canonicalization of untrusted input.
//!
//! Reduces an input to a single unambiguous representation before it is
//! judged. Each configured codec decodes exactly one layer. If a second pass
//! of any codec still changes the value, the input was encoded more than
//! once; if more than one codec had to decode, the input mixes encodings.
//! Both are treated as attacks and rejected instead of silently returning a
//! value the caller did not expect.
//!
//! A successful result is a fixed point of every codec, so
//! `canonicalize(canonicalize(x)) == canonicalize(x)`.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Current canonicalization version. Changes when codec behavior changes.
pub const CANONICALIZATION_VERSION: &str = "1.0.0";

/// Why canonicalization refused an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum EncodingError {
    #[error("multiple {codec} encoding detected")]
    Multiple { codec: &'static str },

    #[error("mixed encoding detected ({first} and {second})")]
    Mixed {
        first: &'static str,
        second: &'static str,
    },

    #[error("{codec} decoding produced malformed output")]
    Malformed { codec: &'static str },
}

/// A single encoding scheme that can be peeled off one layer at a time.
pub trait Codec: Send + Sync + fmt::Debug {
    /// Short name used in diagnostics.
    fn name(&self) -> &'static str;

    /// Decode one layer. Text that is not an escape sequence is kept as-is.
    fn decode(&self, input: &str) -> Result<String, EncodingError>;
}

/// `%XX` percent (URL) encoding. `+` is left alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct PercentCodec;

impl Codec for PercentCodec {
    fn name(&self) -> &'static str {
        "percent"
    }

    fn decode(&self, input: &str) -> Result<String, EncodingError> {
        if !input.contains('%') {
            return Ok(input.to_string());
        }

        let bytes = input.as_bytes();
        let mut out = Vec::with_capacity(bytes.len());
        let mut i = 0;
        while i < bytes.len() {
            if bytes[i] == b'%' && i + 2 < bytes.len() {
                if let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2])) {
                    out.push((hi << 4) | lo);
                    i += 3;
                    continue;
                }
            }
            out.push(bytes[i]);
            i += 1;
        }

        String::from_utf8(out).map_err(|_| EncodingError::Malformed {
            codec: self.name(),
        })
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

static RE_HTML_ENTITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(?:#([0-9]{1,7})|#[xX]([0-9a-fA-F]{1,6})|(amp|lt|gt|quot|apos));").unwrap()
});

/// HTML character references: decimal, hex, and the five XML named entities.
#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlEntityCodec;

impl Codec for HtmlEntityCodec {
    fn name(&self) -> &'static str {
        "html_entity"
    }

    fn decode(&self, input: &str) -> Result<String, EncodingError> {
        if !input.contains('&') {
            return Ok(input.to_string());
        }

        let malformed = EncodingError::Malformed {
            codec: self.name(),
        };
        let mut out = String::with_capacity(input.len());
        let mut last = 0;
        for caps in RE_HTML_ENTITY.captures_iter(input) {
            let Some(whole) = caps.get(0) else { continue };
            out.push_str(&input[last..whole.start()]);

            let decoded = if let Some(dec) = caps.get(1) {
                dec.as_str()
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(malformed)?
            } else if let Some(hex) = caps.get(2) {
                u32::from_str_radix(hex.as_str(), 16)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or(malformed)?
            } else {
                match caps.get(3).map(|m| m.as_str()) {
                    Some("amp") => '&',
                    Some("lt") => '<',
                    Some("gt") => '>',
                    Some("quot") => '"',
                    Some("apos") => '\'',
                    _ => return Err(malformed),
                }
            };
            out.push(decoded);
            last = whole.end();
        }
        out.push_str(&input[last..]);
        Ok(out)
    }
}

/// Canonicalizer over an ordered list of codecs.
#[derive(Debug, Clone)]
pub struct Canonicalizer {
    codecs: Vec<Arc<dyn Codec>>,
}

impl Canonicalizer {
    /// Percent encoding only.
    pub fn new() -> Self {
        Self::with_codecs(vec![Arc::new(PercentCodec)])
    }

    /// Percent encoding plus HTML character references.
    pub fn web() -> Self {
        Self::with_codecs(vec![Arc::new(PercentCodec), Arc::new(HtmlEntityCodec)])
    }

    pub fn with_codecs(codecs: Vec<Arc<dyn Codec>>) -> Self {
        Self { codecs }
    }

    /// Names of the configured codecs, in application order.
    pub fn codec_names(&self) -> Vec<&'static str> {
        self.codecs.iter().map(|c| c.name()).collect()
    }

    /// Decode one layer per codec and verify the result is stable.
    pub fn canonicalize(&self, input: &str) -> Result<String, EncodingError> {
        let mut current = input.to_string();
        let mut decoded_by: Option<&'static str> = None;

        for codec in &self.codecs {
            let decoded = codec.decode(&current)?;
            if decoded != current {
                if let Some(first) = decoded_by {
                    return Err(EncodingError::Mixed {
                        first,
                        second: codec.name(),
                    });
                }
                decoded_by = Some(codec.name());
                current = decoded;
            }
        }

        // The canonical form must be a fixed point of every codec.
        for codec in &self.codecs {
            if codec.decode(&current)? != current {
                return Err(match decoded_by {
                    Some(first) if first != codec.name() => EncodingError::Mixed {
                        first,
                        second: codec.name(),
                    },
                    _ => EncodingError::Multiple {
                        codec: codec.name(),
                    },
                });
            }
        }

        Ok(current)
    }
}

impl Default for Canonicalizer {
    fn default() -> Self {
        Self::new()
    }
}
