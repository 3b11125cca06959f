//! Payload / Message - the unit flowing from ingestion to drain
//!
//! A `Payload` is what the ingestion side hands over; a `Message` is what
//! ends up in a source queue.

use bytes::Bytes;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::Arc;

use crate::SourceId;

/// Raw submission from an ingestion collaborator.
///
/// Transient: consumed by the dispatcher and either turned into a
/// [`Message`] or dropped.
#[derive(Debug, Clone)]
pub struct Payload {
    /// Destination source
    pub source: SourceId,
    /// Raw request body, any content (empty is legal)
    pub body: Bytes,
}

impl Payload {
    pub fn new(source: impl Into<SourceId>, body: impl Into<Bytes>) -> Self {
        Self {
            source: source.into(),
            body: body.into(),
        }
    }

    /// Convert the body into its queued textual form.
    pub fn into_message(self) -> Message {
        Message::from_bytes(&self.body)
    }
}

/// Immutable textual form of one payload body.
///
/// Bodies are decoded as UTF-8; invalid sequences become U+FFFD rather than
/// failing, so every payload yields a message.
#[derive(Clone, PartialEq, Eq)]
pub struct Message(Arc<str>);

impl Message {
    pub fn from_bytes(body: &[u8]) -> Self {
        Self(Arc::from(String::from_utf8_lossy(body)))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for Message {
    fn from(s: &str) -> Self {
        Self(Arc::from(s))
    }
}

impl From<String> for Message {
    fn from(s: String) -> Self {
        Self(Arc::from(s))
    }
}

impl PartialEq<&str> for Message {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Message({:?})", self.0)
    }
}

impl Serialize for Message {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Message {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_into_message() {
        let payload = Payload::new("agent1", Bytes::from_static(b"{\"k\":1}"));
        let message = payload.into_message();
        assert_eq!(message, "{\"k\":1}");
    }

    #[test]
    fn test_empty_body_is_a_message() {
        let message = Payload::new("agent1", Bytes::new()).into_message();
        assert!(message.is_empty());
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let message = Message::from_bytes(&[b'o', b'k', 0xff]);
        assert_eq!(message.as_str(), "ok\u{fffd}");
    }

    #[test]
    fn test_message_serializes_as_string() {
        let messages = vec![Message::from("a"), Message::from("b")];
        let json = serde_json::to_string(&messages).unwrap();
        assert_eq!(json, r#"["a","b"]"#);
    }
}
