//! Badge tokens: the text payload printed as a barcode on a member's badge.
//!
//! Two layouts are understood:
//!
//! - **fixed width** (`GYM0042` + `20261019093012` + `9f3ac01e`): prefix, a
//!   zero-padded four digit client id, a local timestamp and eight random hex
//!   characters. Client ids are capped at 9999.
//! - **delimited** (`GYM-42-20261019093012-<22 base62 chars>`): the same
//!   fields separated by `-`, with an unbounded client id and a 128-bit
//!   random suffix.
//!
//! Both layouts start with the same prefix, so a scanner never needs to know
//! which one issued a badge: [`extract_client_id`] tells them apart by the
//! character that follows the prefix.

use std::fmt;
use std::str::FromStr;

use chrono::{Local, NaiveDateTime};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::{
    CLIENT_ID_WIDTH, DELIMITED_SUFFIX_LEN, FIXED_SUFFIX_LEN, MAX_FIXED_CLIENT_ID,
    TIMESTAMP_FORMAT, TOKEN_DELIMITER, TOKEN_MIN_LEN, TOKEN_PREFIX,
};
use crate::error::TokenError;
use crate::types::ClientId;

const BASE62: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Token layout used for newly generated badges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenScheme {
    #[default]
    Fixed,
    Delimited,
}

impl FromStr for TokenScheme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fixed" | "fixed-width" => Ok(TokenScheme::Fixed),
            "delimited" => Ok(TokenScheme::Delimited),
            other => Err(format!("unknown token scheme: {other}")),
        }
    }
}

/// An issued badge token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Token(String);

impl Token {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    pub fn client_id(&self) -> Result<ClientId, TokenError> {
        extract_client_id(&self.0)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Token {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Produces fresh tokens. Pure apart from the clock and the RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenGenerator {
    scheme: TokenScheme,
}

impl TokenGenerator {
    pub fn new(scheme: TokenScheme) -> Self {
        Self { scheme }
    }

    pub fn scheme(&self) -> TokenScheme {
        self.scheme
    }

    /// Generate a token for `client_id` stamped with the current local time.
    pub fn generate(&self, client_id: ClientId) -> Result<Token, TokenError> {
        self.generate_at(client_id, Local::now().naive_local())
    }

    /// Generate a token stamped with `now`.
    ///
    /// Uniqueness of fixed-width tokens rests on the second-resolution
    /// timestamp plus 32 random bits; two calls in the same second for the
    /// same client collide with probability 2^-32. Delimited tokens carry
    /// 122 random bits instead.
    pub fn generate_at(&self, client_id: ClientId, now: NaiveDateTime) -> Result<Token, TokenError> {
        if client_id < 1 {
            return Err(TokenError::InvalidInput(format!(
                "client id must be positive, got {client_id}"
            )));
        }

        let timestamp = now.format(TIMESTAMP_FORMAT);

        let token = match self.scheme {
            TokenScheme::Fixed => {
                if client_id > MAX_FIXED_CLIENT_ID {
                    return Err(TokenError::InvalidInput(format!(
                        "client id {client_id} does not fit the {CLIENT_ID_WIDTH}-digit field \
                         (max {MAX_FIXED_CLIENT_ID})"
                    )));
                }
                format!(
                    "{TOKEN_PREFIX}{client_id:0width$}{timestamp}{}",
                    fixed_suffix(),
                    width = CLIENT_ID_WIDTH
                )
            }
            TokenScheme::Delimited => format!(
                "{TOKEN_PREFIX}{d}{client_id}{d}{timestamp}{d}{}",
                base62(Uuid::new_v4().as_u128()),
                d = TOKEN_DELIMITER
            ),
        };

        Ok(Token(token))
    }
}

/// Structural check applied to scanned input before anything else.
pub fn is_well_formed(raw: &str) -> bool {
    let raw = raw.trim();
    raw.len() >= TOKEN_MIN_LEN && raw.starts_with(TOKEN_PREFIX)
}

/// Recover the client id embedded in a token.
///
/// Returns [`TokenError::Invalid`] when the structural check fails and
/// [`TokenError::Malformed`] when the prefix matched but the id segment is
/// not a positive integer.
pub fn extract_client_id(raw: &str) -> Result<ClientId, TokenError> {
    let raw = raw.trim();
    if !is_well_formed(raw) {
        return Err(TokenError::Invalid);
    }

    let body = &raw[TOKEN_PREFIX.len()..];
    let segment = match body.strip_prefix(TOKEN_DELIMITER) {
        Some(rest) => rest.split(TOKEN_DELIMITER).next().unwrap_or_default(),
        None => body.get(..CLIENT_ID_WIDTH).ok_or_else(|| {
            TokenError::Malformed("client id segment is not ASCII".to_string())
        })?,
    };

    parse_client_segment(segment)
}

fn parse_client_segment(segment: &str) -> Result<ClientId, TokenError> {
    if segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
        return Err(TokenError::Malformed(format!(
            "client id segment {segment:?} is not numeric"
        )));
    }

    let id: ClientId = segment
        .parse()
        .map_err(|e| TokenError::Malformed(format!("client id segment {segment:?}: {e}")))?;

    if id < 1 {
        return Err(TokenError::Malformed("client id segment is zero".to_string()));
    }
    Ok(id)
}

fn fixed_suffix() -> String {
    let mut bytes = [0u8; FIXED_SUFFIX_LEN / 2];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

// Left-padded so every suffix has the same length.
fn base62(mut value: u128) -> String {
    let mut out = [b'0'; DELIMITED_SUFFIX_LEN];
    for slot in out.iter_mut().rev() {
        *slot = BASE62[(value % 62) as usize];
        value /= 62;
    }
    out.iter().map(|&b| b as char).collect()
}
