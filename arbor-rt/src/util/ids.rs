// Layer 1: Standard library imports
use std::fmt::{self, Display};
use std::sync::atomic::{AtomicU64, Ordering};

// Layer 2: Third-party crate imports
use serde::{Deserialize, Serialize};

// Layer 3: Internal module imports
// (none)

macro_rules! runtime_id {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        ///
        /// Ids are monotonically increasing 64-bit integers issued by the
        /// owning system's [`IdGenerator`]. The value `0` is reserved for
        /// "system/none" and is never issued to a real entity. Ids are not
        /// recycled within a process lifetime.
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            /// The reserved "system/none" identity.
            pub const SYSTEM: Self = Self(0);

            /// Wrap a raw id value.
            pub const fn from_raw(raw: u64) -> Self {
                Self(raw)
            }

            /// Get the raw id value.
            pub const fn as_u64(&self) -> u64 {
                self.0
            }

            /// Whether this is the reserved system/none id.
            pub const fn is_system(&self) -> bool {
                self.0 == 0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

runtime_id! {
    /// Unique identifier for actors.
    ActorId
}

runtime_id! {
    /// Unique identifier for messages.
    MessageId
}

runtime_id! {
    /// Unique identifier for supervisors.
    SupervisorId
}

runtime_id! {
    /// Unique identifier for mailboxes.
    MailboxId
}

runtime_id! {
    /// Unique identifier for actor groups.
    GroupId
}

/// Monotonic id source owned by a single [`crate::system::ActorSystem`].
///
/// Counters are instance-scoped rather than process-global so multiple
/// systems can coexist in one process and tests see deterministic ids.
/// Every counter starts at 1; `0` always means "system/none".
#[derive(Debug)]
pub struct IdGenerator {
    actors: AtomicU64,
    messages: AtomicU64,
    supervisors: AtomicU64,
    mailboxes: AtomicU64,
    groups: AtomicU64,
}

impl IdGenerator {
    /// Create a generator with all counters at their initial value.
    pub fn new() -> Self {
        Self {
            actors: AtomicU64::new(1),
            messages: AtomicU64::new(1),
            supervisors: AtomicU64::new(1),
            mailboxes: AtomicU64::new(1),
            groups: AtomicU64::new(1),
        }
    }

    /// Issue the next actor id.
    pub fn next_actor(&self) -> ActorId {
        ActorId(self.actors.fetch_add(1, Ordering::Relaxed))
    }

    /// Issue the next message id.
    pub fn next_message(&self) -> MessageId {
        MessageId(self.messages.fetch_add(1, Ordering::Relaxed))
    }

    /// Issue the next supervisor id.
    pub fn next_supervisor(&self) -> SupervisorId {
        SupervisorId(self.supervisors.fetch_add(1, Ordering::Relaxed))
    }

    /// Issue the next mailbox id.
    pub fn next_mailbox(&self) -> MailboxId {
        MailboxId(self.mailboxes.fetch_add(1, Ordering::Relaxed))
    }

    /// Issue the next group id.
    pub fn next_group(&self) -> GroupId {
        GroupId(self.groups.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let ids = IdGenerator::new();
        let a1 = ids.next_actor();
        let a2 = ids.next_actor();
        let a3 = ids.next_actor();

        assert!(a1 < a2);
        assert!(a2 < a3);
    }

    #[test]
    fn test_counters_are_independent() {
        let ids = IdGenerator::new();
        let a = ids.next_actor();
        let m = ids.next_message();
        let s = ids.next_supervisor();

        // Each counter starts fresh at 1.
        assert_eq!(a.as_u64(), 1);
        assert_eq!(m.as_u64(), 1);
        assert_eq!(s.as_u64(), 1);
    }

    #[test]
    fn test_zero_is_reserved() {
        let ids = IdGenerator::new();
        assert!(ActorId::SYSTEM.is_system());
        assert_eq!(ActorId::SYSTEM.as_u64(), 0);

        // Issued ids are never the reserved value.
        for _ in 0..100 {
            assert!(!ids.next_actor().is_system());
        }
    }

    #[test]
    fn test_generators_are_instance_scoped() {
        let gen1 = IdGenerator::new();
        let gen2 = IdGenerator::new();

        let _ = gen1.next_actor();
        let _ = gen1.next_actor();

        // A second system's counters are unaffected by the first.
        assert_eq!(gen2.next_actor().as_u64(), 1);
    }

    #[test]
    fn test_id_display() {
        let id = ActorId::from_raw(42);
        assert_eq!(format!("{id}"), "42");
    }

    #[test]
    #[allow(clippy::unwrap_used)]
    fn test_id_serde_transparent() {
        let id = MailboxId::from_raw(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");

        let back: MailboxId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_group_and_mailbox_ids() {
        let ids = IdGenerator::new();
        assert_eq!(ids.next_group().as_u64(), 1);
        assert_eq!(ids.next_group().as_u64(), 2);
        assert_eq!(ids.next_mailbox().as_u64(), 1);
    }
}
