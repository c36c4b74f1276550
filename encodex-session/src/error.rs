use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("data for this session already exists: {}", path.display())]
    OutputExists { path: PathBuf },

    #[error("{field} is required")]
    MissingInput { field: &'static str },

    #[error("{field} {value:?} cannot be used in a file name")]
    InvalidInput { field: &'static str, value: String },

    #[error("condition list {} has no rows", path.display())]
    EmptyConditions { path: PathBuf },

    #[error("requested {requested} trials but the condition list only has {available}")]
    TooFewConditions { requested: usize, available: usize },

    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),
}

impl SessionError {
    /// Intake was left blank or cancelled; the run ends quietly.
    pub fn is_cancelled_intake(&self) -> bool {
        matches!(
            self,
            SessionError::MissingInput { .. } | SessionError::InvalidInput { .. }
        )
    }
}
