use anyhow::{Context, Result};
use serde_json::Value;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Append-only JSON-lines record of every inbound webhook event.
///
/// The file is opened once at startup and kept for the process lifetime.
/// Each record is one `write_all` on an `O_APPEND` handle with no lock. A
/// record the kernel takes in a single `write(2)` lands whole; a short write
/// of a very large record can interleave with a concurrent one.
pub struct EventLog {
    file: File,
    path: PathBuf,
}

impl EventLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("Failed to open event log: {}", path.display()))?;

        info!("Event log opened at: {}", path.display());
        Ok(Self {
            file,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event as a compact JSON line. Attempted exactly once.
    pub fn append(&self, event: &Value) -> Result<()> {
        let mut line = serde_json::to_vec(event).context("Failed to serialize event")?;
        line.push(b'\n');
        (&self.file)
            .write_all(&line)
            .with_context(|| format!("Failed to write to {}", self.path.display()))?;
        Ok(())
    }

    /// Flush to disk and release the handle.
    pub fn close(self) -> Result<()> {
        self.file
            .sync_all()
            .with_context(|| format!("Failed to sync {}", self.path.display()))?;
        info!("Event log closed: {}", self.path.display());
        Ok(())
    }
}
