//! Topic-prefixed wire envelope.
//!
//! Each frame is a single line of UTF-8 text:
//!
//! ```text
//! <topic> <json-body>\n
//! ```
//!
//! The topic and the body are separated by exactly one ASCII space. Topics
//! never contain whitespace and serialized JSON never contains a raw
//! newline, so a frame is always exactly one line.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain_event::DomainEvent;
use super::error::DecodeError;

const SEPARATOR: u8 = b' ';
const TERMINATOR: u8 = b'\n';

/// A validated topic tag.
///
/// Used both to label published frames and as a subscription filter. As a
/// filter, a topic matches every frame whose bytes start with it, so the
/// empty topic matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Topic(String);

/// The topic string contains whitespace.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("topic {0:?} must not contain whitespace")]
pub struct InvalidTopic(pub String);

impl Topic {
    /// Creates a topic, rejecting any ASCII whitespace.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidTopic`] if the string contains whitespace.
    pub fn new(topic: impl Into<String>) -> Result<Self, InvalidTopic> {
        let topic = topic.into();
        if topic.bytes().any(|b| b.is_ascii_whitespace()) {
            return Err(InvalidTopic(topic));
        }
        Ok(Self(topic))
    }

    /// The empty topic, which as a filter matches every frame.
    #[must_use]
    pub const fn any() -> Self {
        Self(String::new())
    }

    /// Returns the topic as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the raw frame passes this topic as a filter.
    #[must_use]
    pub fn matches(&self, frame: &[u8]) -> bool {
        frame.starts_with(self.0.as_bytes())
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Topic {
    type Err = InvalidTopic;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for Topic {
    type Error = InvalidTopic;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Topic> for String {
    fn from(topic: Topic) -> Self {
        topic.0
    }
}

/// Encodes `event` as a newline-terminated frame under `topic`.
///
/// # Errors
///
/// Returns the serializer error if the event cannot be encoded.
pub fn encode_frame(topic: &Topic, event: &DomainEvent) -> Result<Vec<u8>, serde_json::Error> {
    let body = serde_json::to_vec(event)?;
    let mut frame = Vec::with_capacity(topic.0.len() + body.len() + 2);
    frame.extend_from_slice(topic.0.as_bytes());
    frame.push(SEPARATOR);
    frame.extend_from_slice(&body);
    frame.push(TERMINATOR);
    Ok(frame)
}

/// A decoded frame: the topic it was published under and its event.
#[derive(Debug, Clone, PartialEq)]
pub struct TopicEnvelope {
    topic: Topic,
    body: DomainEvent,
}

impl TopicEnvelope {
    /// Wraps an event for publication under `topic`.
    #[must_use]
    pub const fn new(topic: Topic, body: DomainEvent) -> Self {
        Self { topic, body }
    }

    /// Returns the topic the frame was published under.
    #[must_use]
    pub const fn topic(&self) -> &Topic {
        &self.topic
    }

    /// Returns the carried event.
    #[must_use]
    pub const fn body(&self) -> &DomainEvent {
        &self.body
    }

    /// Consumes the envelope, returning the event.
    #[must_use]
    pub fn into_body(self) -> DomainEvent {
        self.body
    }

    /// Encodes the envelope as a newline-terminated frame.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if the event cannot be encoded.
    pub fn encode(&self) -> Result<Vec<u8>, serde_json::Error> {
        encode_frame(&self.topic, &self.body)
    }

    /// Decodes one frame. A trailing `\n` or `\r\n` is ignored.
    ///
    /// Never panics: any input that is not a well-formed envelope yields a
    /// [`DecodeError`].
    ///
    /// # Errors
    ///
    /// See [`DecodeError`] for the individual failure cases.
    pub fn decode(frame: &[u8]) -> Result<Self, DecodeError> {
        let frame = frame.strip_suffix(b"\n").unwrap_or(frame);
        let frame = frame.strip_suffix(b"\r").unwrap_or(frame);
        let text = std::str::from_utf8(frame)?;

        let (topic, body) = text
            .split_once(char::from(SEPARATOR))
            .ok_or(DecodeError::MissingSeparator)?;

        let value: serde_json::Value = serde_json::from_str(body)?;
        let serde_json::Value::Object(map) = value else {
            return Err(DecodeError::NotAnObject);
        };
        if !map.get("event").is_some_and(serde_json::Value::is_string) {
            return Err(DecodeError::MissingKind);
        }
        let body: DomainEvent = serde_json::from_value(serde_json::Value::Object(map))?;

        // The topic precedes the first space, so it cannot hold one; other
        // whitespace (tabs) is still rejected here.
        let topic = Topic::new(topic).map_err(|_| DecodeError::MissingSeparator)?;
        Ok(Self { topic, body })
    }
}
