//! Topic-named publish/subscribe bus.
//!
//! Every topic is backed by its own [`tokio::sync::broadcast`] channel so a
//! slow subscriber never blocks the publisher or its peers.  The channel
//! capacity is the topic's [`QosProfile::depth`]: once a subscriber falls
//! more than `depth` messages behind, the oldest messages are dropped for
//! it and the next `recv` reports the lag.  Publishers therefore always
//! deliver the latest value and never queue beyond the configured depth.
//!
//! Subscriber presence is *queried*, not pushed: a publisher asks
//! [`Publisher::subscription_count`] whenever it needs to decide whether
//! producing a message is worth the cost.
//!
//! # Example
//!
//! ```rust
//! use simbridge_middleware::{EventBus, QosProfile};
//! use simbridge_types::{Header, Image, Message};
//!
//! let bus = EventBus::new();
//! let publisher = bus.create_publisher("/camera", QosProfile::sensor_data().reliable());
//! assert_eq!(publisher.subscription_count(), 0);
//!
//! let mut rx = bus.subscribe("/camera");
//! assert_eq!(publisher.subscription_count(), 1);
//!
//! let delivered = publisher.publish(Message::Image(Image {
//!     header: Header::new("camera"),
//!     ..Image::default()
//! }));
//! assert_eq!(delivered, 1);
//! assert!(rx.try_recv().is_ok());
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use simbridge_types::Message;
use tokio::sync::broadcast;
use tracing::{debug, trace, warn};

/// History depth used when a topic is first touched by a subscriber rather
/// than a publisher.
const DEFAULT_DEPTH: usize = 10;

/// Depth of the sensor-data QoS preset.
const SENSOR_DATA_DEPTH: usize = 5;

// ────────────────────────────────────────────────────────────────────────────
// Quality of service
// ────────────────────────────────────────────────────────────────────────────

/// Delivery guarantee requested by a publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reliability {
    Reliable,
    BestEffort,
}

/// Delivery and queuing behaviour of a topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QosProfile {
    pub reliability: Reliability,
    /// Number of messages kept for each subscriber before the oldest ones
    /// are dropped.
    pub depth: usize,
}

impl QosProfile {
    /// Preset for high-rate sensor streams: best effort, shallow history.
    pub fn sensor_data() -> Self {
        Self {
            reliability: Reliability::BestEffort,
            depth: SENSOR_DATA_DEPTH,
        }
    }

    /// Same profile with reliable delivery.
    pub fn reliable(mut self) -> Self {
        self.reliability = Reliability::Reliable;
        self
    }
}

impl Default for QosProfile {
    fn default() -> Self {
        Self {
            reliability: Reliability::Reliable,
            depth: DEFAULT_DEPTH,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// EventBus
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug)]
struct TopicChannel {
    sender: broadcast::Sender<Message>,
    qos: QosProfile,
}

impl TopicChannel {
    fn new(qos: QosProfile) -> Self {
        // broadcast::channel panics on a zero capacity.
        let (sender, _) = broadcast::channel(qos.depth.max(1));
        Self { sender, qos }
    }
}

/// Shared bus.  Clone it cheaply – all clones share the same topic table.
#[derive(Clone, Debug, Default)]
pub struct EventBus {
    topics: Arc<Mutex<HashMap<String, TopicChannel>>>,
}

impl EventBus {
    /// Create an empty bus.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a publisher on `topic`.
    ///
    /// The first participant to touch a topic fixes its QoS; a publisher
    /// created on a topic that already exists joins the existing channel.
    pub fn create_publisher(&self, topic: impl Into<String>, qos: QosProfile) -> Publisher {
        let topic = topic.into();
        let mut topics = self.lock();
        let channel = topics.entry(topic.clone()).or_insert_with(|| {
            debug!(topic = %topic, depth = qos.depth, reliability = ?qos.reliability, "topic created");
            TopicChannel::new(qos)
        });
        if channel.qos != qos {
            warn!(
                topic = %topic,
                requested = ?qos,
                existing = ?channel.qos,
                "publisher QoS differs from existing topic; keeping existing"
            );
        }
        Publisher {
            topic,
            qos: channel.qos,
            sender: channel.sender.clone(),
        }
    }

    /// Subscribe to `topic`, creating it with the default QoS if no
    /// publisher exists yet.
    ///
    /// Dropping the returned receiver removes the subscription.
    pub fn subscribe(&self, topic: &str) -> TopicReceiver {
        let mut topics = self.lock();
        let channel = topics
            .entry(topic.to_string())
            .or_insert_with(|| TopicChannel::new(QosProfile::default()));
        TopicReceiver {
            topic: topic.to_string(),
            receiver: channel.sender.subscribe(),
        }
    }

    /// Number of live subscriptions on `topic` (zero for unknown topics).
    pub fn subscription_count(&self, topic: &str) -> usize {
        self.lock()
            .get(topic)
            .map_or(0, |c| c.sender.receiver_count())
    }

    /// Names of every known topic, sorted.
    pub fn topics(&self) -> Vec<String> {
        let mut names: Vec<String> = self.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, TopicChannel>> {
        self.topics.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Publisher
// ────────────────────────────────────────────────────────────────────────────

/// Write handle for one topic.
#[derive(Debug, Clone)]
pub struct Publisher {
    topic: String,
    qos: QosProfile,
    sender: broadcast::Sender<Message>,
}

impl Publisher {
    /// Publish `message` to every current subscriber.
    ///
    /// Returns the number of subscribers that were handed the message.
    /// Zero subscribers is a normal condition: the message is dropped.
    pub fn publish(&self, message: Message) -> usize {
        match self.sender.send(message) {
            Ok(n) => {
                trace!(topic = %self.topic, receivers = n, "published");
                n
            }
            Err(broadcast::error::SendError(_)) => {
                trace!(topic = %self.topic, "published with no subscribers");
                0
            }
        }
    }

    /// Number of live subscriptions on this publisher's topic.
    pub fn subscription_count(&self) -> usize {
        self.sender.receiver_count()
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn qos(&self) -> QosProfile {
        self.qos
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Receiver
// ────────────────────────────────────────────────────────────────────────────

/// Subscription to a single topic.
///
/// Obtained via [`EventBus::subscribe`].
#[derive(Debug)]
pub struct TopicReceiver {
    topic: String,
    receiver: broadcast::Receiver<Message>,
}

impl TopicReceiver {
    /// Wait for the next message on this topic.
    ///
    /// Returns:
    /// * `Ok(message)` – a successfully received message.
    /// * `Err(broadcast::error::RecvError::Lagged(n))` – the subscriber fell
    ///   behind and `n` messages were dropped.  The next call resumes at
    ///   the oldest retained message.
    /// * `Err(broadcast::error::RecvError::Closed)` – every publisher is gone.
    pub async fn recv(&mut self) -> Result<Message, broadcast::error::RecvError> {
        self.receiver.recv().await
    }

    /// Non-blocking variant of [`recv`][Self::recv].
    pub fn try_recv(&mut self) -> Result<Message, broadcast::error::TryRecvError> {
        self.receiver.try_recv()
    }

    /// The topic this receiver is bound to.
    pub fn topic(&self) -> &str {
        &self.topic
    }
}
