use std::ffi::OsStr;
use std::path::Path;

use axum::extract::Multipart;

use crate::error::RelayError;
use crate::upload::UploadedFile;

/// The single input of a `/download` call.
#[derive(Debug)]
pub enum Submission {
    File(UploadedFile),
    Url(String),
}

impl Submission {
    /// Reads the `file` and `url` fields of a multipart body.
    ///
    /// Only the first part of each name counts, unknown fields are skipped.
    pub async fn from_multipart(
        id: u64,
        upload_dir: &Path,
        mut multipart: Multipart,
    ) -> Result<Self, RelayError> {
        let mut file = None;
        let mut url = None;

        while let Some(field) = multipart.next_field().await? {
            let name = field.name().map(str::to_owned);
            match name.as_deref() {
                Some("file") if file.is_none() => {
                    file = Some(UploadedFile::receive(id, upload_dir, field).await?);
                }
                Some("url") if url.is_none() => {
                    url = Some(field.text().await?);
                }
                _ => log::debug!(id, field:debug = name; "ignoring form field"),
            }
        }

        Self::select(id, file, url)
    }

    /// A file wins over a url, an empty url counts as missing.
    pub fn select(
        id: u64,
        file: Option<UploadedFile>,
        url: Option<String>,
    ) -> Result<Self, RelayError> {
        match (file, url) {
            (Some(file), url) => {
                if let Some(url) = url.filter(|url| !url.is_empty()) {
                    log::info!(id, url:display = url; "got both file and url, using the file");
                }
                Ok(Submission::File(file))
            }
            (None, Some(url)) if !url.is_empty() => Ok(Submission::Url(url)),
            (None, _) => {
                log::info!(id; "no input provided");
                Err(RelayError::NoInput)
            }
        }
    }

    /// The single argument the tool is invoked with.
    pub fn argument(&self) -> &OsStr {
        match self {
            Submission::File(file) => file.path().as_os_str(),
            Submission::Url(url) => OsStr::new(url),
        }
    }

    /// Releases whatever the submission holds on disk.
    pub async fn finish(self, id: u64) {
        if let Submission::File(file) = self {
            file.remove(id).await;
        }
    }
}
