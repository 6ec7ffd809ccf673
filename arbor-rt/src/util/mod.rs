//! Utility types and helpers for the actor runtime

pub mod ids;
pub mod serde_helpers;

pub use ids::{ActorId, GroupId, IdGenerator, MailboxId, MessageId, SupervisorId};
pub use serde_helpers::duration_serde;
