//! # Shared Bus - Ledger Event Channel
//!
//! Typed events from the ledger writer to any number of subscribers.
//!
//! ```text
//! ┌──────────────┐   publish()   ┌──────────────┐  subscribe(filter)  ┌────────────┐
//! │ Ledger writer│ ────────────► │  Event Bus   │ ──────────────────► │ Subscriber │
//! └──────────────┘               └──────────────┘                     └────────────┘
//! ```
//!
//! The bus is owned by the ledger instance. Events are not persisted and
//! not replayed to late subscribers.

#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod events;
pub mod publisher;
pub mod subscriber;

pub use events::{EventFilter, EventTopic, LedgerEvent};
pub use publisher::{EventPublisher, InMemoryEventBus};
pub use subscriber::{EventStream, Subscription, SubscriptionError};

/// Maximum events to buffer per subscriber before the oldest are dropped.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 1000;
