//! Session logging: raw transcripts and per-command output files.
//!
//! All files for one run share a timestamp so they sort together:
//!
//! ```text
//! ~/logs/sw1_2024-05-01-0930.txt                           # transcript
//! ~/logs/sw1_show_version_pipe_inc_EOS_2024-05-01-0930.txt  # command output
//! ```

mod transcript;

pub use transcript::Transcript;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::error::LogError;

/// Timestamp format used in log file names.
pub const STAMP_FORMAT: &str = "%Y-%m-%d-%H%M";

/// Where the log files of one run go and how they are named.
#[derive(Debug, Clone)]
pub struct LogLayout {
    dir: PathBuf,
    stamp: String,
}

impl LogLayout {
    /// Create a layout for `dir`, stamping names with `started`.
    pub fn new<Tz: TimeZone>(dir: impl Into<PathBuf>, started: &DateTime<Tz>) -> Self
    where
        Tz::Offset: std::fmt::Display,
    {
        Self {
            dir: dir.into(),
            stamp: started.format(STAMP_FORMAT).to_string(),
        }
    }

    /// `~/logs`, or `./logs` when no home directory is known.
    pub fn default_dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("logs")
    }

    /// Log directory.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run timestamp as it appears in file names.
    pub fn stamp(&self) -> &str {
        &self.stamp
    }

    /// Path of the transcript for `host`.
    pub fn transcript_path(&self, host: &str) -> PathBuf {
        self.dir.join(format!("{}_{}.txt", host, self.stamp))
    }

    /// Path of a named output file for `host`.
    pub fn output_path(&self, host: &str, name: &str) -> PathBuf {
        self.dir.join(format!("{}_{}_{}.txt", host, name, self.stamp))
    }

    /// Create the log directory and any missing parents.
    pub fn ensure_dir(&self) -> Result<(), LogError> {
        fs::create_dir_all(&self.dir).map_err(|source| LogError::Unavailable {
            path: self.dir.clone(),
            source,
        })
    }

    /// Open (truncating) the transcript for `host`.
    pub fn open_transcript(&self, host: &str) -> Result<Transcript, LogError> {
        self.ensure_dir()?;
        Transcript::create(self.transcript_path(host))
    }

    /// Write `output` followed by a newline to the named output file.
    pub fn write_output(&self, host: &str, name: &str, output: &str) -> Result<PathBuf, LogError> {
        self.ensure_dir()?;
        let path = self.output_path(host, name);
        let mut contents = String::with_capacity(output.len() + 1);
        contents.push_str(output);
        contents.push('\n');
        match fs::write(&path, contents) {
            Ok(()) => Ok(path),
            Err(source) => Err(LogError::Unavailable { path, source }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn layout(dir: &Path) -> LogLayout {
        let started = Utc.with_ymd_and_hms(2024, 5, 1, 9, 30, 12).unwrap();
        LogLayout::new(dir, &started)
    }

    #[test]
    fn test_file_names() {
        let layout = layout(Path::new("/var/log/runcli"));
        assert_eq!(layout.stamp(), "2024-05-01-0930");
        assert_eq!(
            layout.transcript_path("sw1"),
            Path::new("/var/log/runcli/sw1_2024-05-01-0930.txt")
        );
        assert_eq!(
            layout.output_path("sw1", "show_version"),
            Path::new("/var/log/runcli/sw1_show_version_2024-05-01-0930.txt")
        );
    }

    #[test]
    fn test_write_output_creates_dirs() {
        let tmp = TempDir::new().unwrap();
        let layout = layout(&tmp.path().join("nested").join("logs"));

        let path = layout.write_output("sw1", "uptime", "up 3 days").unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "up 3 days\n");
    }

    #[test]
    fn test_unwritable_dir_reports_unavailable() {
        let tmp = TempDir::new().unwrap();
        let blocker = tmp.path().join("not-a-dir");
        fs::write(&blocker, "file").unwrap();

        let layout = layout(&blocker.join("logs"));
        let err = layout.open_transcript("sw1").unwrap_err();
        assert!(matches!(err, LogError::Unavailable { .. }));
    }
}
