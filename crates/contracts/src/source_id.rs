//! Source identifiers

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// Opaque identifier of one producer/consumer pairing.
///
/// Never interpreted: two ids name the same source only when their strings are
/// byte-for-byte equal. Every payload carries one through the dispatch channel,
/// so clones share the allocation.
///
/// # Examples
/// ```
/// use contracts::SourceId;
///
/// let id = SourceId::from("agent1");
/// assert_eq!(id.as_str(), "agent1");
/// assert_ne!(id, SourceId::from("Agent1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceId(Arc<str>);

impl SourceId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// `Arc<str>` hashes like `str`, so the queue table can be probed with a &str.
impl Borrow<str> for SourceId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SourceId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<String> for SourceId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for SourceId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for SourceId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}
