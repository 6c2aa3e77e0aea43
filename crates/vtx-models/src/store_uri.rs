//! `store://bucket/key` object references.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// URI scheme for object store references.
pub const STORE_SCHEME: &str = "store://";

/// Why a reference failed to parse.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreUriError {
    #[error("reference '{0}' does not start with store://")]
    MissingScheme(String),

    #[error("reference '{0}' has an empty bucket")]
    EmptyBucket(String),

    #[error("reference '{0}' has no object key")]
    MissingKey(String),
}

/// A resolved object reference: bucket plus key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreUri {
    bucket: String,
    key: String,
}

impl StoreUri {
    /// Build from parts. The key must be non-empty.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Parse `store://bucket/seg/seg...`.
    ///
    /// The bucket is the first path segment; the key is every remaining
    /// segment joined by `/`.
    pub fn parse(raw: &str) -> Result<Self, StoreUriError> {
        let rest = raw
            .strip_prefix(STORE_SCHEME)
            .ok_or_else(|| StoreUriError::MissingScheme(raw.to_string()))?;

        let mut segments = rest.split('/');
        let bucket = segments.next().unwrap_or_default();
        if bucket.is_empty() {
            return Err(StoreUriError::EmptyBucket(raw.to_string()));
        }

        let key = segments.collect::<Vec<_>>().join("/");
        if key.is_empty() {
            return Err(StoreUriError::MissingKey(raw.to_string()));
        }

        Ok(Self::new(bucket, key))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Same bucket, different key.
    pub fn with_key(&self, key: impl Into<String>) -> Self {
        Self::new(self.bucket.clone(), key)
    }
}

impl fmt::Display for StoreUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}/{}", STORE_SCHEME, self.bucket, self.key)
    }
}

impl FromStr for StoreUri {
    type Err = StoreUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StoreUri {
    type Error = StoreUriError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoreUri> for String {
    fn from(uri: StoreUri) -> Self {
        uri.to_string()
    }
}
