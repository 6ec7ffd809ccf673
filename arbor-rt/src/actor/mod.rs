//! Actors: the behavior seam, lifecycle state machine, per-actor
//! context, and the cell the system arena owns.

pub mod behavior;
pub mod cell;
pub mod context;
pub mod lifecycle;

pub use behavior::{Behavior, BehaviorError};
pub use cell::{ActorCell, ActorError, ActorStats, ActorStatsSnapshot};
pub use context::Context;
pub use lifecycle::ActorState;
