pub mod phase;
pub mod response;
pub mod screen;
pub mod stimulus;
pub mod trial;

pub use phase::{Phase, StudyPhase};
pub use response::{Category, KeyPress, ResponseKey};
pub use screen::Screen;
pub use stimulus::TrialDescriptor;
pub use trial::{ResultSink, TrialResult, TrialState};
