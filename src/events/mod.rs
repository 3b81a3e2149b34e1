//! Event layer: wire envelope, publisher, subscriber and dispatch.
//!
//! The team registry owns a [`Publisher`] and announces every committed
//! registration as a `TeamRegistered` event. The tournament registry runs a
//! [`Subscriber`] under a [`SubscriberLifecycle`], which decodes frames and
//! hands them to a [`Dispatcher`]. Delivery is fire-and-forget and
//! at-most-once.

pub mod dispatch;
pub mod domain_event;
pub mod envelope;
pub mod error;
pub mod lifecycle;
pub mod publisher;
pub mod subscriber;
pub mod team_registered;

pub use dispatch::{DispatchOutcome, Dispatcher, EventHandler};
pub use domain_event::{DomainEvent, Payload, Scalar, TEAM_REGISTERED};
pub use envelope::{Topic, TopicEnvelope};
pub use error::{
    BindError, ConnectError, DecodeError, DispatchError, PublishError, ReservedKey,
};
pub use lifecycle::SubscriberLifecycle;
pub use publisher::Publisher;
pub use subscriber::Subscriber;
pub use team_registered::TeamRegisteredHandler;
