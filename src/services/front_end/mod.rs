//! Front-end: tray icon or headless logging.
//!
//! Front-ends never touch presence state directly. They read the status the
//! poller publishes and send it `ControlCommand`s.

mod headless;
mod tray;
mod r#trait;

pub use self::r#trait::{create_front_end, FrontEnd, FrontEndContext};
