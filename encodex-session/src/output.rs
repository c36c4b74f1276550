use crate::error::SessionError;
use encodex_core::{ResultSink, TrialResult};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const OUTPUT_COLUMNS: [&str; 6] = [
    "trial",
    "image",
    "degredation",
    "response",
    "rt",
    "indoor/outdoor",
];

/// Append-only session CSV. Every row is written in one call and synced before returning.
#[derive(Debug)]
pub struct OutputStore {
    path: PathBuf,
    file: File,
    rows: usize,
}

impl OutputStore {
    /// Creates the file with its header. Never opens an existing file.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SessionError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let mut file = OpenOptions::new()
            .append(true)
            .create_new(true)
            .open(path)
            .map_err(|e| match e.kind() {
                io::ErrorKind::AlreadyExists => SessionError::OutputExists {
                    path: path.to_path_buf(),
                },
                _ => SessionError::Io(e),
            })?;

        let mut header = csv::Writer::from_writer(Vec::new());
        header.write_record(OUTPUT_COLUMNS)?;
        let bytes = header.into_inner().map_err(|e| e.into_error())?;
        file.write_all(&bytes)?;
        file.sync_data()?;

        log::info!("Created session output {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data rows written so far, header excluded
    pub fn rows(&self) -> usize {
        self.rows
    }
}

impl ResultSink for OutputStore {
    fn append(&mut self, result: &TrialResult) -> io::Result<()> {
        let mut row = csv::WriterBuilder::new()
            .has_headers(false)
            .from_writer(Vec::with_capacity(128));
        row.serialize(result)?;
        let bytes = row.into_inner().map_err(|e| e.into_error())?;

        self.file.write_all(&bytes)?;
        self.file.sync_data()?;
        self.rows += 1;
        log::debug!("Trial {} written to {}", result.trial, self.path.display());
        Ok(())
    }
}

/// Reads a session file back, header included in the check.
pub fn read_results(path: impl AsRef<Path>) -> Result<Vec<TrialResult>, SessionError> {
    let mut rdr = csv::Reader::from_path(path)?;
    let headers = rdr.headers()?.clone();
    if headers.iter().ne(OUTPUT_COLUMNS.iter().copied()) {
        return Err(SessionError::Csv(csv::Error::from(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("unexpected header {:?}", headers),
        ))));
    }
    Ok(rdr.deserialize().collect::<Result<Vec<TrialResult>, _>>()?)
}
