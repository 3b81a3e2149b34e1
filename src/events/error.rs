//! Error types of the event feed.
//!
//! Only [`BindError`] is fatal. Every other error is isolated to a single
//! frame, event or publish call and is logged by the component that
//! observes it.

use std::net::SocketAddr;

use crate::persistence::StoreError;

/// The publisher could not acquire its listen address.
#[derive(Debug, thiserror::Error)]
#[error("failed to bind event publisher to {addr}: {source}")]
pub struct BindError {
    /// Address the publisher tried to bind.
    pub addr: SocketAddr,
    /// Underlying I/O failure.
    #[source]
    pub source: std::io::Error,
}

/// The subscriber could not reach its upstream publisher.
///
/// Retried by the receive loop with exponential backoff.
#[derive(Debug, thiserror::Error)]
#[error("failed to connect to event publisher at {upstream}: {source}")]
pub struct ConnectError {
    /// Upstream address (`host:port`).
    pub upstream: String,
    /// Underlying I/O failure.
    #[source]
    pub source: std::io::Error,
}

/// A publish call did not reach the outbound queue.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// The publisher has been closed.
    #[error("event publisher is closed")]
    Closed,

    /// The event could not be serialized.
    #[error("failed to encode event: {0}")]
    Encode(#[from] serde_json::Error),
}

/// A payload key collides with an envelope field (`event` or `timestamp`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("payload key `{0}` is reserved for the event envelope")]
pub struct ReservedKey(pub String);

/// A received frame is not a well-formed envelope.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Frame exceeded the configured maximum size.
    #[error("frame of {len} bytes exceeds the {max} byte limit")]
    FrameTooLarge {
        /// Observed frame length.
        len: usize,
        /// Configured limit.
        max: usize,
    },

    /// Frame is not valid UTF-8.
    #[error("frame is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::str::Utf8Error),

    /// No space separates the topic from the body.
    #[error("frame has no topic separator")]
    MissingSeparator,

    /// Body is not valid JSON or does not match the event shape.
    #[error("malformed event body: {0}")]
    MalformedJson(#[from] serde_json::Error),

    /// Body is valid JSON but not an object.
    #[error("event body is not a JSON object")]
    NotAnObject,

    /// Body has no string `event` field.
    #[error("event body has no `event` kind")]
    MissingKind,
}

/// A handler could not apply an event.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
    /// A required payload field is absent or empty.
    #[error("payload is missing required field `{0}`")]
    MissingField(&'static str),

    /// A payload field has the wrong type.
    #[error("payload field `{field}` must be a {expected}")]
    InvalidField {
        /// Field name.
        field: &'static str,
        /// Expected type description.
        expected: &'static str,
    },

    /// The local write failed and was rolled back.
    #[error("failed to persist event: {0}")]
    Persistence(#[from] StoreError),
}

impl DispatchError {
    /// Returns `true` for payload validation failures.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::MissingField(_) | Self::InvalidField { .. })
    }
}
