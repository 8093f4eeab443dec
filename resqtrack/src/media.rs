// Uploaded media: timestamped file names under a static upload directory.

use crate::error::{ResqError, Result};
use chrono::NaiveDateTime;
use std::path::{Path, PathBuf};

/// URL prefix the upload directory is served under.
pub const UPLOAD_URL_PREFIX: &str = "/static/uploads";

/// `YYYYMMDD_HHMMSS_<file name>`, keeping only the final path component of
/// `original`. `None` when nothing usable is left.
pub fn stored_media_name(at: NaiveDateTime, original: &str) -> Option<String> {
    let base = original
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim()
        .trim_start_matches('.');
    let base: String = base.chars().filter(|c| !c.is_control()).collect();
    if base.is_empty() {
        return None;
    }
    Some(format!("{}_{}", at.format("%Y%m%d_%H%M%S"), base))
}

pub struct MediaStore {
    dir: PathBuf,
}

impl MediaStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        MediaStore {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` under a timestamped name and return its public URL.
    pub fn save(&self, at: NaiveDateTime, original: &str, bytes: &[u8]) -> Result<String> {
        let name = stored_media_name(at, original).ok_or_else(|| {
            ResqError::Validation(format!("Unusable upload file name: {original:?}"))
        })?;
        std::fs::create_dir_all(&self.dir)?;
        std::fs::write(self.dir.join(&name), bytes)?;
        log::info!("Stored upload {name} ({} bytes)", bytes.len());
        Ok(format!("{UPLOAD_URL_PREFIX}/{name}"))
    }

    /// Remove a file previously returned by [`MediaStore::save`]. URLs that
    /// do not point directly into the upload directory are ignored.
    pub fn discard(&self, url: &str) -> Result<()> {
        let Some(name) = url
            .strip_prefix(UPLOAD_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
        else {
            return Ok(());
        };
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Ok(());
        }

        match std::fs::remove_file(self.dir.join(name)) {
            Ok(()) => {
                log::info!("Discarded upload {name}");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
