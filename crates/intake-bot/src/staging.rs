//! Local staging of inbound files and archival of JSON replies.
//!
//! Concurrent chats share one uploads directory, so every staged name is
//! qualified by a fresh [`RequestId`].

use crate::error::Result;
use chrono::Local;
use intake_domain::RequestId;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Name used when the sender supplied none
const FALLBACK_NAME: &str = "document";

/// The uploads directory.
#[derive(Debug, Clone)]
pub struct Staging {
    dir: PathBuf,
}

impl Staging {
    /// Use `dir` for staging, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// The staging directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Staging slot for a document: `<request-id>_<original name>`.
    pub fn document(&self, id: RequestId, original_name: Option<&str>) -> StagedFile {
        let name = sanitize_file_name(original_name.unwrap_or(FALLBACK_NAME));
        StagedFile::new(self.dir.join(format!("{}_{}", id, name)))
    }

    /// Staging slot for a photo: `photo_<request-id>.jpg`.
    pub fn photo(&self, id: RequestId) -> StagedFile {
        StagedFile::new(self.dir.join(format!("photo_{}.jpg", id)))
    }
}

/// A staged file that is removed when dropped.
///
/// Removal happens whether processing succeeded, failed, or the task
/// unwound; a file that was never written is ignored.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
}

impl StagedFile {
    fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Where the file lives
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(file = %self.path.display(), "Cleaned up staged file"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(file = %self.path.display(), error = %e, "Failed to clean up staged file"),
        }
    }
}

/// Keep only the final path component and drop characters that are unsafe
/// in file names.
pub fn sanitize_file_name(name: &str) -> String {
    let last = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = last
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c => c,
        })
        .collect();
    let trimmed = cleaned.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        trimmed.to_string()
    }
}

/// Directory of archived JSON replies.
#[derive(Debug, Clone)]
pub struct Archive {
    dir: PathBuf,
}

impl Archive {
    /// Use `dir` for archives, creating it if needed.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Write `json` as `<timestamp>_<stem>_<request-id>.json`.
    ///
    /// Replies for files with the same name in the same second still land in
    /// distinct files.
    pub async fn store(&self, id: RequestId, original_name: &str, json: &str) -> Result<PathBuf> {
        let sanitized = sanitize_file_name(original_name);
        let stem = Path::new(&sanitized)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(FALLBACK_NAME);
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = self.dir.join(format!("{}_{}_{}.json", timestamp, stem, id));

        tokio::fs::write(&path, json).await?;
        debug!(file = %path.display(), "Archived reply");
        Ok(path)
    }
}
