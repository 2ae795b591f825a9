// src/identifier.rs
use std::fmt;

use rand::{distr::Alphanumeric, Rng};

use crate::error::AppError;

/// Length of freshly generated identifiers.
pub const LENGTH: usize = 6;

/// Longest identifier accepted from a request path or body.
const MAX_LENGTH: usize = 32;

/// Public, shareable identifier of a poll (the `url` column).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PollUrl(String);

impl PollUrl {
    /// Draws a new random identifier. Uniqueness is left to the store.
    pub fn generate() -> Self {
        let token = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(LENGTH)
            .map(char::from)
            .collect();
        Self(token)
    }

    /// Accepts 1 to 32 ASCII alphanumerics, which keeps lookups exact.
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        if raw.is_empty()
            || raw.len() > MAX_LENGTH
            || !raw.bytes().all(|b| b.is_ascii_alphanumeric())
        {
            return Err(AppError::InvalidIdentifier);
        }
        Ok(Self(raw.to_string()))
    }

    /// Like [`PollUrl::parse`], for a path segment: anything that cannot be
    /// an identifier (`favicon.ico`, `robots.txt`) simply has no poll.
    pub fn from_path(segment: &str) -> Result<Self, AppError> {
        Self::parse(segment).map_err(|_| AppError::PollNotFound)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PollUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
