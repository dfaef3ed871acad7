//! DeviceDetector service: responsibility and boundaries
//!
//! This module answers one question: is the configured keyboard currently
//! enumerated by the OS. It MUST NOT decide anything about monitor inputs;
//! the presence poller owns all state and switching decisions.

mod detector;
mod dry_run;
mod evdev_scan;
mod identifier;
mod sysfs;
mod r#trait;

pub use self::identifier::KeyboardId;
pub use self::r#trait::{create_presence_detector, PresenceDetector};
