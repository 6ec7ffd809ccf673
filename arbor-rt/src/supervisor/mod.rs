//! Supervision: restart windows, strategy dispatch, and the supervisor
//! nodes the system arena owns.

pub mod node;
pub mod types;
pub mod window;

pub use node::{ChildAction, FailurePlan, Supervisor};
pub use types::{SupervisionStrategy, SupervisorConfig, SupervisorType};
pub use window::RestartWindow;
