pub mod config;
pub mod state;
pub mod summary;
pub mod trial;
pub use config::{CONFIG_FILE, ScreenText, StudyConfig, load_config, load_or_default};
pub use state::{StudyEvent, StudyStateMachine};
pub use summary::SessionSummary;
pub use trial::{Trial, TrialDurations, TrialTimestamps};
