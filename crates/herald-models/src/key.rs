use serde::{Deserialize, Serialize};

/// Stable identity for a content entity, independent of internal id churn.
///
/// Shaped as `<kind>:<source>:<value>`, e.g. `movie:imdb:tt0133093` or
/// `album:title:kid a (2000)`. Construction lives in the core resolver;
/// this type only guarantees the key is treated as an opaque, comparable
/// ledger key once built.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct LogicalKey(String);

impl LogicalKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl From<String> for LogicalKey {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}
