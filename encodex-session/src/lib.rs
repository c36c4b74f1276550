pub mod conditions;
pub mod error;
pub mod intake;
pub mod output;

pub use conditions::{load_conditions, resolve_seed, select_trials};
pub use error::SessionError;
pub use intake::{SessionInfo, ensure_fresh, prompt_session_info};
pub use output::{OUTPUT_COLUMNS, OutputStore, read_results};
