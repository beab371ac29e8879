use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use axum::extract::multipart::Field;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;

use crate::error::RelayError;

/// The default directory uploads are stored in until the tool has run.
pub fn default_upload_directory() -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push("ytrelay-uploads");
    path
}

/// A temporary file holding one uploaded form part.
///
/// Call [`UploadedFile::remove`] once the tool exited. Once the tool is started the guard lives in
/// a detached task, so dropping it early only happens while the multipart body is still being read,
/// e.g. on a malformed body or a client hanging up mid upload. The file is then removed with a
/// blocking call on drop.
#[derive(Debug)]
pub struct UploadedFile {
    path: Option<PathBuf>,
}

impl UploadedFile {
    /// Streams `field` into a fresh, uniquely named file inside `dir`.
    pub async fn receive(id: u64, dir: &Path, mut field: Field<'_>) -> Result<Self, RelayError> {
        let (path, mut file) = create_unique(dir).await.map_err(RelayError::Upload)?;
        log::debug!(id, path:debug; "storing upload");
        // From here on the guard owns the file, errors below clean it up.
        let upload = UploadedFile { path: Some(path) };

        let mut size = 0;
        while let Some(chunk) = field.chunk().await? {
            size += chunk.len();
            file.write_all(&chunk).await.map_err(RelayError::Upload)?;
        }
        file.flush().await.map_err(RelayError::Upload)?;

        log::info!(id, size, file_name:debug = field.file_name(); "stored upload");
        Ok(upload)
    }

    pub fn path(&self) -> &Path {
        self.path
            .as_deref()
            .unwrap_or_else(|| unreachable!("path is only taken when consuming the upload"))
    }

    /// Deletes the file. Failures are only logged, the response is already decided.
    pub async fn remove(mut self, id: u64) {
        let Some(path) = self.path.take() else {
            return;
        };
        match tokio::fs::remove_file(&path).await {
            Ok(()) => log::debug!(id, path:debug; "removed upload"),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                log::debug!(id, path:debug; "upload already gone");
            }
            Err(e) => log::warn!(id, path:debug; "failed to remove upload: {e}"),
        }
    }
}

impl Drop for UploadedFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            log::debug!(path:debug; "removing abandoned upload");
            if let Err(e) = std::fs::remove_file(&path) {
                if e.kind() != ErrorKind::NotFound {
                    log::warn!(path:debug; "failed to remove abandoned upload: {e}");
                }
            }
        }
    }
}

/// Creates a new file with a random name, retrying on the unlikely collision.
async fn create_unique(dir: &Path) -> std::io::Result<(PathBuf, File)> {
    loop {
        let path = dir.join(format!("upload_{:016x}", fastrand::u64(..)));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((path, file)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
impl UploadedFile {
    pub(crate) async fn with_contents(dir: &Path, contents: &[u8]) -> std::io::Result<Self> {
        let (path, mut file) = create_unique(dir).await?;
        file.write_all(contents).await?;
        Ok(UploadedFile { path: Some(path) })
    }
}
