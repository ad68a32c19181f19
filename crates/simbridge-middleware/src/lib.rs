//! `simbridge-middleware` – the message bus.
//!
//! Routes messages between sensor plugins and consumers without caring
//! about their meaning.
//!
//! # Modules
//!
//! - [`bus`] – topic-named publish/subscribe bus built on Tokio broadcast
//!   channels, with per-topic [`QosProfile`] and queried subscriber counts.

pub mod bus;

pub use bus::{EventBus, Publisher, QosProfile, Reliability, TopicReceiver};
