//! Continuation token codec.
//!
//! Tokens are opaque to clients: a versioned JSON envelope carrying the
//! backend cursor state and the fingerprint of the request that produced
//! it, base64-encoded with a URL-safe alphabet so tokens can be embedded
//! in link hrefs. Encoding is deterministic; the same cursor and
//! fingerprint always produce the same token.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::document::CursorState;

/// Current token envelope version.
pub const TOKEN_VERSION: u32 = 1;

/// Errors decoding a continuation token.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum TokenError {
    /// The token is not valid base64 or does not contain a token envelope.
    #[error("Malformed token: {0}")]
    MalformedToken(String),

    /// The token was produced by an incompatible codec version.
    #[error("Unsupported token version {found} (expected {expected})")]
    UnsupportedTokenVersion { found: u32, expected: u32 },
}

#[derive(Debug, Serialize, Deserialize)]
struct TokenEnvelope {
    v: u32,
    cursor: CursorState,
    fp: String,
}

/// Encode a cursor state and request fingerprint into an opaque token.
pub fn encode(cursor: &CursorState, fingerprint: &str) -> String {
    let envelope = serde_json::json!({
        "v": TOKEN_VERSION,
        "cursor": cursor,
        "fp": fingerprint,
    });
    URL_SAFE_NO_PAD.encode(envelope.to_string())
}

/// Decode a token back into its cursor state and request fingerprint.
pub fn decode(token: &str) -> Result<(CursorState, String), TokenError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| TokenError::MalformedToken(e.to_string()))?;
    let envelope: TokenEnvelope =
        serde_json::from_slice(&bytes).map_err(|e| TokenError::MalformedToken(e.to_string()))?;
    if envelope.v != TOKEN_VERSION {
        return Err(TokenError::UnsupportedTokenVersion {
            found: envelope.v,
            expected: TOKEN_VERSION,
        });
    }
    Ok((envelope.cursor, envelope.fp))
}
