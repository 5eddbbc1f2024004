//! Content identifiers.
//!
//! A CID is an opaque token handed out by the storage service. The only
//! structure this crate relies on is an optional trailing extension (`.wav`),
//! which is not part of the job key used by the transcoding service.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when constructing a [`ContentId`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContentIdError {
    #[error("Content identifier is empty")]
    Empty,

    #[error("Content identifier contains invalid characters: {0}")]
    InvalidCharacters(String),
}

/// Opaque, content-derived identifier of a blob in the storage service.
///
/// Deserialization goes through [`ContentId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ContentId(String);

impl ContentId {
    /// Validate and wrap a raw identifier.
    ///
    /// CIDs end up in URL paths, so whitespace, `/`, `?` and `#` are rejected.
    pub fn parse(value: impl Into<String>) -> Result<Self, ContentIdError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ContentIdError::Empty);
        }
        if trimmed
            .chars()
            .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#'))
        {
            return Err(ContentIdError::InvalidCharacters(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }

    /// The identifier with any trailing `.ext` removed.
    ///
    /// This is the key the transcoding service tracks jobs under.
    pub fn job_key(&self) -> &str {
        match self.0.rfind('.') {
            Some(idx) => &self.0[..idx],
            None => &self.0,
        }
    }

    /// The trailing extension, without the dot.
    pub fn extension(&self) -> Option<&str> {
        self.0
            .rfind('.')
            .map(|idx| &self.0[idx + 1..])
            .filter(|ext| !ext.is_empty())
    }
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ContentId {
    type Err = ContentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ContentId {
    type Error = ContentIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(value)
    }
}

impl From<ContentId> for String {
    fn from(cid: ContentId) -> Self {
        cid.0
    }
}

impl AsRef<str> for ContentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
