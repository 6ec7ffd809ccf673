//! Remote transport hook.
//!
//! The runtime treats remote delivery as opaque: a `node:name` qualified
//! send delegates to whatever transport is attached. No transport ships
//! with the runtime.

// Layer 1: Standard library imports
// (none)

// Layer 2: Third-party crate imports
use async_trait::async_trait;

// Layer 3: Internal module imports
use super::errors::SystemError;
use crate::message::Payload;
use crate::util::ActorId;

/// Remote delivery interface.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Forward a message to `name` on `node`.
    async fn forward(
        &self,
        node: &str,
        name: &str,
        sender: ActorId,
        message_type: u32,
        payload: Payload,
    ) -> Result<(), SystemError>;
}
