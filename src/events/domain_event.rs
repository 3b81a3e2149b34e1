//! Domain events carried over the event feed.
//!
//! A [`DomainEvent`] is created by the publishing service at the moment a
//! domain action succeeds, travels once over the wire and is discarded after
//! the subscriber has processed it. Events are never persisted.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::ReservedKey;

/// Event kind emitted after a team has been created in the team registry.
pub const TEAM_REGISTERED: &str = "TeamRegistered";

/// Payload key holding the external team identifier.
pub const TEAM_ID_FIELD: &str = "teamId";

/// Payload key holding the team name.
pub const NAME_FIELD: &str = "name";

/// Body keys owned by the envelope. A payload may not use them.
pub const RESERVED_KEYS: [&str; 2] = ["event", "timestamp"];

/// A scalar payload value.
///
/// Payloads are flat: nested objects and arrays are rejected when decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    /// JSON `null`.
    Null,
    /// JSON boolean.
    Bool(bool),
    /// Integer that fits in an `i64`.
    Integer(i64),
    /// Any other JSON number.
    Float(f64),
    /// JSON string.
    String(String),
}

impl Scalar {
    /// Returns the inner string slice if this is a [`Scalar::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// Flat payload of a [`DomainEvent`], ordered by key for stable encoding.
pub type Payload = BTreeMap<String, Scalar>;

/// An immutable domain event.
///
/// On the wire the kind is carried in the `event` field and payload entries
/// are flattened into the body next to it:
///
/// ```json
/// {"event":"TeamRegistered","timestamp":"2024-01-01T10:00:00Z","name":"Helsinki FC","teamId":"abc-123"}
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainEvent {
    #[serde(rename = "event")]
    kind: String,
    // Producers that predate timestamps are stamped on receipt.
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    payload: Payload,
}

impl DomainEvent {
    /// Creates an event of the given kind stamped with the current time.
    ///
    /// # Errors
    ///
    /// Returns [`ReservedKey`] if the payload uses a key in [`RESERVED_KEYS`].
    pub fn new(kind: impl Into<String>, payload: Payload) -> Result<Self, ReservedKey> {
        Self::at(kind, payload, Utc::now())
    }

    /// Creates an event with an explicit timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`ReservedKey`] if the payload uses a key in [`RESERVED_KEYS`].
    pub fn at(
        kind: impl Into<String>,
        payload: Payload,
        timestamp: DateTime<Utc>,
    ) -> Result<Self, ReservedKey> {
        // Flattened keys share the body with the envelope fields.
        if let Some(key) = RESERVED_KEYS.iter().find(|k| payload.contains_key(**k)) {
            return Err(ReservedKey((*key).to_string()));
        }
        Ok(Self {
            kind: kind.into(),
            timestamp,
            payload,
        })
    }

    /// Builds the `TeamRegistered` event for a freshly created team.
    #[must_use]
    pub fn team_registered(team_id: &str, name: &str) -> Self {
        let mut payload = Payload::new();
        payload.insert(TEAM_ID_FIELD.to_string(), Scalar::from(team_id));
        payload.insert(NAME_FIELD.to_string(), Scalar::from(name));
        Self {
            kind: TEAM_REGISTERED.to_string(),
            timestamp: Utc::now(),
            payload,
        }
    }

    /// Returns the event kind (e.g. `"TeamRegistered"`).
    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// Returns the flat payload.
    #[must_use]
    pub const fn payload(&self) -> &Payload {
        &self.payload
    }

    /// Returns the time the event was produced.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns a payload value by key.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Scalar> {
        self.payload.get(key)
    }

    /// Returns a payload string by key, or `None` if absent or not a string.
    #[must_use]
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Scalar::as_str)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn team_registered_carries_fields() {
        let event = DomainEvent::team_registered("abc-123", "Helsinki FC");
        assert_eq!(event.kind(), TEAM_REGISTERED);
        assert_eq!(event.get_str(TEAM_ID_FIELD), Some("abc-123"));
        assert_eq!(event.get_str(NAME_FIELD), Some("Helsinki FC"));
    }

    #[test]
    fn serializes_flat_with_event_field() {
        let event = DomainEvent::team_registered("abc-123", "Helsinki FC");
        let Ok(value) = serde_json::to_value(&event) else {
            panic!("serialization failed");
        };
        assert_eq!(value["event"], "TeamRegistered");
        assert_eq!(value["teamId"], "abc-123");
        assert_eq!(value["name"], "Helsinki FC");
        assert!(value["timestamp"].as_str().is_some_and(|t| t.ends_with('Z')));
        assert!(value.get("payload").is_none());
    }

    #[test]
    fn missing_timestamp_is_stamped() {
        let json = r#"{"event":"team.registered","teamId":"x","name":"Oulu FC"}"#;
        let Ok(event) = serde_json::from_str::<DomainEvent>(json) else {
            panic!("deserialization failed");
        };
        assert_eq!(event.kind(), "team.registered");
        assert!(event.timestamp() <= Utc::now());
    }

    #[test]
    fn scalar_variants_deserialize() {
        let json = r#"{"event":"E","a":null,"b":true,"c":7,"d":1.5,"e":"s"}"#;
        let Ok(event) = serde_json::from_str::<DomainEvent>(json) else {
            panic!("deserialization failed");
        };
        assert_eq!(event.get("a"), Some(&Scalar::Null));
        assert_eq!(event.get("b"), Some(&Scalar::Bool(true)));
        assert_eq!(event.get("c"), Some(&Scalar::Integer(7)));
        assert_eq!(event.get("d"), Some(&Scalar::Float(1.5)));
        assert_eq!(event.get_str("e"), Some("s"));
    }

    #[test]
    fn nested_payload_is_rejected() {
        let json = r#"{"event":"E","nested":{"k":1}}"#;
        assert!(serde_json::from_str::<DomainEvent>(json).is_err());
    }

    #[test]
    fn get_str_ignores_non_strings() {
        let mut payload = Payload::new();
        payload.insert("n".to_string(), Scalar::from(3_i64));
        let Ok(event) = DomainEvent::new("E", payload) else {
            panic!("payload has no reserved keys");
        };
        assert_eq!(event.get_str("n"), None);
        assert_eq!(event.get("n").map(ToString::to_string), Some("3".to_string()));
    }

    #[test]
    fn envelope_keys_are_rejected_in_payload() {
        for key in RESERVED_KEYS {
            let mut payload = Payload::new();
            payload.insert(TEAM_ID_FIELD.to_string(), Scalar::from("abc-123"));
            payload.insert(key.to_string(), Scalar::from("Spoofed"));
            let Err(err) = DomainEvent::new(TEAM_REGISTERED, payload) else {
                panic!("`{key}` accepted as a payload key");
            };
            assert_eq!(err, ReservedKey(key.to_string()));
        }
    }

    #[test]
    fn decoded_payload_never_holds_envelope_keys() {
        let json = r#"{"event":"E","timestamp":"2024-01-01T10:00:00Z","teamId":"x"}"#;
        let Ok(event) = serde_json::from_str::<DomainEvent>(json) else {
            panic!("deserialization failed");
        };
        assert!(RESERVED_KEYS.iter().all(|k| event.get(k).is_none()));
        assert_eq!(event.payload().len(), 1);
    }
}
