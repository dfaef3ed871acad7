pub mod control;
pub mod presence;

pub use control::ControlCommand;
pub use presence::{PresenceState, PresenceStatus};
