use crate::error::SessionError;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

/// Participant identity collected before anything touches the disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub subject_id: String,
    pub session: String,
}

impl SessionInfo {
    pub fn new(subject_id: &str, session: &str) -> Result<Self, SessionError> {
        Ok(Self {
            subject_id: validate_field("Subject ID", subject_id)?,
            session: validate_field("Session Number", session)?,
        })
    }

    /// `<dir>/sub<ID>_sess<N>_<suffix>.csv`
    pub fn output_path(&self, dir: &Path, suffix: &str) -> PathBuf {
        dir.join(format!(
            "sub{}_sess{}_{}.csv",
            self.subject_id, self.session, suffix
        ))
    }
}

fn validate_field(field: &'static str, raw: &str) -> Result<String, SessionError> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(SessionError::MissingInput { field });
    }
    if value.contains(['/', '\\']) || value.contains("..") {
        return Err(SessionError::InvalidInput {
            field,
            value: value.to_string(),
        });
    }
    Ok(value.to_string())
}

/// Fails when a previous run already wrote this session's data.
pub fn ensure_fresh(path: &Path) -> Result<(), SessionError> {
    if path.exists() {
        return Err(SessionError::OutputExists {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

/// Asks for subject ID and session number. A closed input stream counts as cancel.
pub fn prompt_session_info<R: BufRead, W: Write>(
    mut input: R,
    mut output: W,
) -> Result<SessionInfo, SessionError> {
    let subject = ask(&mut input, &mut output, "Subject ID")?;
    let subject = validate_field("Subject ID", &subject)?;
    let session = ask(&mut input, &mut output, "Session Number")?;
    SessionInfo::new(&subject, &session)
}

fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    field: &'static str,
) -> Result<String, SessionError> {
    write!(output, "{}: ", field)?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(SessionError::MissingInput { field });
    }
    Ok(line)
}
