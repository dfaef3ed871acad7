pub mod device_detector;
pub mod front_end;
pub mod input_switcher;
pub mod presence_poller;
pub mod settings_form;

pub use device_detector::create_presence_detector;
pub use front_end::{create_front_end, FrontEndContext};
pub use input_switcher::create_input_switcher;
pub use presence_poller::{PollerTiming, PresencePoller};
pub use settings_form::PromptForm;
