use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of one island instance.
///
/// Unique among active islands of a manager; reusable once the previous
/// holder has been unmounted. Blank ids are unrepresentable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IslandId(String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("island id must not be empty")]
pub struct EmptyIslandIdError;

impl IslandId {
    pub fn new(value: impl Into<String>) -> Result<Self, EmptyIslandIdError> {
        let value = value.into();
        if value.trim().is_empty() {
            Err(EmptyIslandIdError)
        } else {
            Ok(Self(value))
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl TryFrom<String> for IslandId {
    type Error = EmptyIslandIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for IslandId {
    type Error = EmptyIslandIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IslandId> for String {
    fn from(value: IslandId) -> Self {
        value.0
    }
}

// Lets `HashMap<IslandId, _>` be queried with a plain `&str`.
impl Borrow<str> for IslandId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for IslandId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for IslandId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
