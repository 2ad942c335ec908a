//! Byte signatures with wildcard positions (AOB patterns)

use super::error::{SigError, SigResult};
use std::fmt;
use std::str::FromStr;

/// An ordered byte pattern where each position is either a literal
/// byte or a wildcard matching any byte.
///
/// Built from textual form such as `"48 8B ?? ?? 89"` (`?` and `??`
/// both denote a wildcard). A signature must contain at least one
/// literal byte; an all-wildcard pattern matches everywhere and is
/// rejected as degenerate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    tokens: Vec<Option<u8>>,
}

impl Signature {
    /// Creates an exact signature from raw bytes (no wildcards)
    pub fn exact(bytes: &[u8]) -> SigResult<Self> {
        Signature::from_tokens(bytes.iter().map(|&b| Some(b)).collect())
    }

    /// Creates a signature from a contiguous hex string such as "48aB90"
    pub fn from_hex(s: &str) -> SigResult<Self> {
        let bytes = hex::decode(s.trim())
            .map_err(|e| SigError::signature_parse(s, e.to_string()))?;
        Signature::exact(&bytes)
    }

    /// Creates a signature from pre-built tokens
    pub fn from_tokens(tokens: Vec<Option<u8>>) -> SigResult<Self> {
        if tokens.is_empty() {
            return Err(SigError::signature_parse("", "empty signature"));
        }
        if tokens.iter().all(|t| t.is_none()) {
            return Err(SigError::signature_parse(
                Signature { tokens }.to_string(),
                "signature has no literal bytes",
            ));
        }
        Ok(Signature { tokens })
    }

    /// Number of byte positions the signature covers
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    /// Signatures are never empty, kept for API completeness
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The token sequence
    pub fn tokens(&self) -> &[Option<u8>] {
        &self.tokens
    }

    /// Matches the signature against the start of `window`.
    /// Returns false when the window is shorter than the signature.
    pub fn matches(&self, window: &[u8]) -> bool {
        if window.len() < self.tokens.len() {
            return false;
        }
        self.tokens
            .iter()
            .zip(window)
            .all(|(token, byte)| token.map_or(true, |t| t == *byte))
    }
}

impl FromStr for Signature {
    type Err = SigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().is_empty() {
            return Err(SigError::signature_parse(s, "empty signature"));
        }

        let mut tokens = Vec::new();
        for part in s.split_whitespace() {
            if part == "?" || part == "??" {
                tokens.push(None);
            } else {
                if part.len() != 2 {
                    return Err(SigError::signature_parse(
                        s,
                        format!("token '{part}' must be 2 hex digits or a wildcard"),
                    ));
                }
                let byte = u8::from_str_radix(part, 16).map_err(|_| {
                    SigError::signature_parse(s, format!("invalid hex byte '{part}'"))
                })?;
                tokens.push(Some(byte));
            }
        }

        Signature::from_tokens(tokens)
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, token) in self.tokens.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            match token {
                Some(b) => write!(f, "{b:02X}")?,
                None => f.write_str("??")?,
            }
        }
        Ok(())
    }
}
