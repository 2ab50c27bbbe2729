//! Receipt image files on local disk.
//!
//! Stored files get a fresh random name; the original file name only
//! contributes its extension. References handed to the engine have the form
//! `/uploads/<file>`.

use std::{
    io,
    path::{Path, PathBuf},
};

use uuid::Uuid;

pub const URL_PREFIX: &str = "/uploads/";

const ALLOWED_EXTENSIONS: [&str; 5] = ["jpg", "jpeg", "png", "gif", "webp"];

#[derive(Clone, Debug)]
pub struct Uploads {
    dir: PathBuf,
}

impl Uploads {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Write `bytes` and return the reference to store on the receipt.
    pub async fn save(&self, original_name: Option<&str>, bytes: &[u8]) -> io::Result<String> {
        let extension = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "image must be a jpg, png, gif or webp file",
                )
            })?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let file_name = format!("{}.{extension}", Uuid::new_v4());
        tokio::fs::write(self.dir.join(&file_name), bytes).await?;
        tracing::debug!(file = %file_name, size = bytes.len(), "image stored");
        Ok(format!("{URL_PREFIX}{file_name}"))
    }

    /// Delete the file behind a stored reference. Missing files are ignored.
    pub async fn remove(&self, reference: &str) {
        let Some(path) = reference
            .strip_prefix(URL_PREFIX)
            .and_then(|name| self.resolve(name))
        else {
            tracing::warn!(reference, "not an upload reference");
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => tracing::error!("failed to remove {}: {err}", path.display()),
        }
    }

    /// Read a stored file by name, with its content type.
    pub async fn open(&self, file_name: &str) -> io::Result<(Vec<u8>, &'static str)> {
        let path = self
            .resolve(file_name)
            .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))?;
        let bytes = tokio::fs::read(&path).await?;
        Ok((bytes, content_type(&path)))
    }

    /// Map a bare file name into the uploads directory, refusing anything that
    /// could escape it.
    fn resolve(&self, file_name: &str) -> Option<PathBuf> {
        let valid = !file_name.is_empty()
            && !file_name.starts_with('.')
            && file_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        valid.then(|| self.dir.join(file_name))
    }
}

fn content_type(path: &Path) -> &'static str {
    match path.extension().and_then(|ext| ext.to_str()) {
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "application/octet-stream",
    }
}
