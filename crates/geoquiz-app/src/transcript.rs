use geoquiz_engine::TurnRecord;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Appends one JSON line per answered question.
pub struct TranscriptWriter {
    writer: BufWriter<File>,
    path: PathBuf,
    rows: usize,
}

impl TranscriptWriter {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, TranscriptError> {
        let path = path.as_ref().to_path_buf();
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        let file = File::create(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            rows: 0,
        })
    }

    /// Write and flush a row so an aborted game keeps its history.
    pub fn record(&mut self, record: &TurnRecord) -> Result<(), TranscriptError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        self.rows += 1;
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[derive(Debug, Error)]
pub enum TranscriptError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}
