pub mod abort;
pub mod timer;

pub use abort::AbortToken;
pub use timer::{FrameStats, HighPrecisionTimer, ManualTimer, Timer};
