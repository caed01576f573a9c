mod driver;
mod engine;
pub mod rotation;
mod settings;

pub use driver::TimerDriver;
pub use engine::{TimerEngine, TimerState, TimerStatus};
pub use rotation::{next_type, SessionType};
pub use settings::{SettingsProvider, SharedSettings, TimerSettings};
