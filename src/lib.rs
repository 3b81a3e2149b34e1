//! # league-events
//!
//! Two small HTTP services coordinated through a TCP publish/subscribe
//! event feed.
//!
//! The **team service** registers teams and announces each committed
//! registration as a `TeamRegistered` event. The **tournament service**
//! subscribes to that feed and records every announced team against its
//! default tournament. Delivery is fire-and-forget and at-most-once: the
//! publisher never waits for subscribers and nothing is replayed.
//!
//! ## Architecture
//!
//! ```text
//! team-service                              tournament-service
//!     │                                          │
//!     ├── REST Handlers (api/)                   ├── REST Handlers (api/)
//!     ├── TeamStore (persistence/)               ├── SubscriberLifecycle (events/)
//!     └── Publisher (events/) ── TCP ─────────▶  │     └── Subscriber ─▶ Dispatcher
//!           "<topic> <json>\n"                   │           └── TeamRegisteredHandler
//!                                                └── TournamentStore (persistence/)
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod error;
pub mod events;
pub mod persistence;
pub mod shutdown;
pub mod telemetry;
