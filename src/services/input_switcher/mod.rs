//! InputSwitcher service: runs the external display-control tool that sets
//! the monitor's input source (VCP 0x60). Retries are bounded; failures are
//! reported in the outcome and logged, never raised.

mod command;
mod dry_run;
mod switcher;
mod r#trait;

pub use self::r#trait::{create_input_switcher, InputSwitcher, SwitchOutcome};
