//! Raw session transcript.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::LogError;

/// Append-only record of everything read from a session.
#[derive(Debug)]
pub struct Transcript {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Transcript {
    /// Create (truncating) a transcript file.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self, LogError> {
        let path = path.into();
        match File::create(&path) {
            Ok(file) => Ok(Self {
                path,
                writer: BufWriter::new(file),
            }),
            Err(source) => Err(LogError::Unavailable { path, source }),
        }
    }

    /// Append raw bytes and flush them to disk.
    pub fn record(&mut self, data: &[u8]) -> Result<(), LogError> {
        self.writer
            .write_all(data)
            .and_then(|()| self.writer.flush())
            .map_err(|source| LogError::Unavailable {
                path: self.path.clone(),
                source,
            })
    }

    /// Flush and close the file.
    pub fn finish(mut self) -> Result<(), LogError> {
        self.writer.flush().map_err(|source| LogError::Unavailable {
            path: self.path.clone(),
            source,
        })
    }

    /// Path of the transcript file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}
