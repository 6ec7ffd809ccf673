// Layer 1: Standard library imports
use std::collections::HashMap;
use std::time::Duration;

// Layer 2: Third-party crate imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

// Layer 3: Internal module imports
use super::types::{Payload, Priority};
use crate::util::{ActorId, MessageId};

/// A message record.
///
/// Immutable after enqueue with one exception: the `delivered` flag is
/// flipped when a worker hands the message to the receiving behavior.
/// Construction goes through [`Message::new`] plus the `with_*` builder
/// methods.
///
/// # Example
/// ```rust
/// use arbor_rt::message::{Message, Payload, Priority};
/// use arbor_rt::util::{ActorId, MessageId};
///
/// let msg = Message::new(MessageId::from_raw(1), 7, ActorId::SYSTEM, ActorId::from_raw(2))
///     .with_payload(Payload::from("hello"))
///     .with_priority(Priority::High)
///     .with_correlation_id("req-42");
///
/// assert_eq!(msg.message_type, 7);
/// assert_eq!(msg.priority, Priority::High);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique message id issued by the owning system.
    pub id: MessageId,

    /// 32-bit type tag; the discriminant clients route and match on.
    #[serde(rename = "type")]
    pub message_type: u32,

    /// Sending actor; `ActorId::SYSTEM` for runtime-originated messages.
    pub sender: ActorId,

    /// Receiving actor.
    pub receiver: ActorId,

    /// Tagged payload.
    pub payload: Payload,

    /// Mailbox ordering priority.
    pub priority: Priority,

    /// Creation timestamp.
    pub timestamp: DateTime<Utc>,

    /// Optional time-to-live; expired messages may be dropped at dequeue.
    pub ttl: Option<Duration>,

    /// Optional absolute deadline; informational.
    pub deadline: Option<DateTime<Utc>>,

    /// Free-form headers, mutable only inside the dispatch pipeline.
    pub headers: HashMap<String, Value>,

    /// Optional reply target for request/response patterns.
    pub reply_to: Option<ActorId>,

    /// Opaque correlation id grouping related trace events.
    pub correlation_id: Option<String>,

    /// Whether the message should survive restarts of the receiver.
    pub persistent: bool,

    /// Set once a worker has handed the message to the behavior.
    pub delivered: bool,
}

impl Message {
    /// Create a message with defaults: Normal priority, empty headers,
    /// no TTL, no deadline.
    pub fn new(id: MessageId, message_type: u32, sender: ActorId, receiver: ActorId) -> Self {
        Self {
            id,
            message_type,
            sender,
            receiver,
            payload: Payload::None,
            priority: Priority::Normal,
            timestamp: Utc::now(),
            ttl: None,
            deadline: None,
            headers: HashMap::new(),
            reply_to: None,
            correlation_id: None,
            persistent: false,
            delivered: false,
        }
    }

    /// Builder method: set the payload.
    pub fn with_payload(mut self, payload: Payload) -> Self {
        self.payload = payload;
        self
    }

    /// Builder method: set the priority.
    pub fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Builder method: set the time-to-live.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Builder method: set an absolute deadline.
    pub fn with_deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Builder method: set the reply target.
    pub fn with_reply_to(mut self, reply_to: ActorId) -> Self {
        self.reply_to = Some(reply_to);
        self
    }

    /// Builder method: set the correlation id.
    pub fn with_correlation_id(mut self, id: impl Into<String>) -> Self {
        self.correlation_id = Some(id.into());
        self
    }

    /// Builder method: set a header.
    pub fn with_header(mut self, key: impl Into<String>, value: Value) -> Self {
        self.headers.insert(key.into(), value);
        self
    }

    /// Builder method: mark the message persistent.
    pub fn persistent(mut self) -> Self {
        self.persistent = true;
        self
    }

    /// Whether the TTL has elapsed relative to `now`.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        match self.ttl {
            Some(ttl) => now
                .signed_duration_since(self.timestamp)
                .to_std()
                .map(|age| age > ttl)
                .unwrap_or(false),
            None => false,
        }
    }

    /// Whether the TTL has elapsed.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn msg() -> Message {
        Message::new(
            MessageId::from_raw(1),
            42,
            ActorId::SYSTEM,
            ActorId::from_raw(5),
        )
    }

    #[test]
    fn test_message_defaults() {
        let m = msg();
        assert_eq!(m.priority, Priority::Normal);
        assert_eq!(m.payload, Payload::None);
        assert!(m.headers.is_empty());
        assert!(m.ttl.is_none());
        assert!(m.deadline.is_none());
        assert!(!m.persistent);
        assert!(!m.delivered);
    }

    #[test]
    fn test_builder_chaining() {
        let m = msg()
            .with_payload(Payload::from("x"))
            .with_priority(Priority::Critical)
            .with_reply_to(ActorId::from_raw(9))
            .with_correlation_id("corr-1")
            .with_header("tagged", Value::Bool(true))
            .persistent();

        assert_eq!(m.payload.as_text(), Some("x"));
        assert_eq!(m.priority, Priority::Critical);
        assert_eq!(m.reply_to, Some(ActorId::from_raw(9)));
        assert_eq!(m.correlation_id.as_deref(), Some("corr-1"));
        assert_eq!(m.headers.get("tagged"), Some(&Value::Bool(true)));
        assert!(m.persistent);
    }

    #[test]
    fn test_no_ttl_never_expires() {
        let mut m = msg();
        m.timestamp = Utc::now() - chrono::Duration::hours(10);
        assert!(!m.is_expired());
    }

    #[test]
    fn test_ttl_expiration() {
        let mut m = msg().with_ttl(Duration::from_secs(1));
        m.timestamp = Utc::now() - chrono::Duration::seconds(5);
        assert!(m.is_expired());

        let fresh = msg().with_ttl(Duration::from_secs(60));
        assert!(!fresh.is_expired());
    }

    #[test]
    fn test_serde_type_tag_rename() {
        let m = msg();
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"type\":42"));
    }
}
