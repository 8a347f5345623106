//! Image uploads stored on local disk and served under `/uploads`.

use crate::error::UploadError;
use crate::metrics;
use marquee_core::environment::Clock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Public URL prefix for stored files.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

const ACCEPTED_TYPES: [&str; 4] = ["image/png", "image/jpeg", "image/gif", "image/webp"];

/// Reduce a client file name to a safe one: whitespace runs become `-`,
/// anything but ASCII alphanumerics, `.`, `-` and `_` is dropped.
#[must_use]
pub fn sanitize_filename(original: &str) -> String {
    let base = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let mut out = String::with_capacity(base.len());
    let mut in_space = false;
    for c in base.chars() {
        if c.is_whitespace() {
            if !in_space {
                out.push('-');
            }
            in_space = true;
            continue;
        }
        in_space = false;
        if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
            out.push(c);
        }
    }
    let out = out.trim_start_matches('.').to_string();
    if out.is_empty() { "upload".to_string() } else { out }
}

/// Writes uploads to a directory.
#[derive(Clone)]
pub struct UploadService {
    dir: PathBuf,
    max_bytes: usize,
    clock: Arc<dyn Clock>,
}

impl UploadService {
    /// Create the service.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize, clock: Arc<dyn Clock>) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
            clock,
        }
    }

    /// Directory files are written to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Per-file size limit.
    #[must_use]
    pub const fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Store one file and return its public URL.
    ///
    /// # Errors
    ///
    /// - [`UploadError::InvalidInput`] for an unsupported content type
    /// - [`UploadError::TooLarge`] above the size limit
    /// - [`UploadError::Io`] if the file cannot be written
    #[tracing::instrument(skip(self, bytes), fields(size = bytes.len()))]
    pub async fn save(&self, original_name: &str, content_type: Option<&str>, bytes: &[u8]) -> Result<String, UploadError> {
        let content_type = content_type.unwrap_or_default();
        if !ACCEPTED_TYPES.contains(&content_type) {
            return Err(UploadError::InvalidInput(format!(
                "Unsupported file type '{content_type}'; expected PNG, JPEG, GIF, or WebP"
            )));
        }
        if bytes.len() > self.max_bytes {
            return Err(UploadError::TooLarge {
                limit: self.max_bytes,
            });
        }

        let filename = format!(
            "{}-{}",
            self.clock.now().timestamp_millis(),
            sanitize_filename(original_name)
        );
        tokio::fs::create_dir_all(&self.dir).await?;
        tokio::fs::write(self.dir.join(&filename), bytes).await?;

        metrics::record_upload();
        tracing::info!(file = %filename, "Upload stored");
        Ok(format!("{UPLOADS_URL_PREFIX}/{filename}"))
    }

    /// Delete a file stored by [`Self::save`], given its public URL.
    ///
    /// URLs outside [`UPLOADS_URL_PREFIX`] or naming nested paths are ignored.
    /// Failures are logged, never returned.
    pub async fn discard(&self, url: &str) {
        let Some(name) = url
            .strip_prefix(UPLOADS_URL_PREFIX)
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|name| !name.is_empty() && sanitize_filename(name) == *name)
        else {
            tracing::warn!(url = %url, "Refusing to discard a non-upload path");
            return;
        };
        match tokio::fs::remove_file(self.dir.join(name)).await {
            Ok(()) => tracing::debug!(file = %name, "Upload discarded"),
            Err(e) => tracing::warn!(file = %name, error = %e, "Failed to discard upload"),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use marquee_testing::test_clock;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("my  summer photo.PNG"), "my-summer-photo.PNG");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("naïve café.jpg"), "nave-caf.jpg");
        assert_eq!(sanitize_filename("..."), "upload");
    }

    #[tokio::test]
    async fn stores_file_under_timestamped_name() {
        let dir = tempfile::tempdir().unwrap();
        let clock = test_clock();
        let uploads = UploadService::new(dir.path(), 1024, Arc::new(clock.clone()));

        let url = uploads.save("poster one.png", Some("image/png"), b"png-bytes").await.unwrap();

        let millis = clock.now().timestamp_millis();
        assert_eq!(url, format!("/uploads/{millis}-poster-one.png"));
        let written = std::fs::read(dir.path().join(format!("{millis}-poster-one.png"))).unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn discard_removes_only_stored_files() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadService::new(dir.path().join("files"), 1024, Arc::new(test_clock()));
        std::fs::write(dir.path().join("keep.txt"), b"outside").unwrap();

        let url = uploads.save("face.png", Some("image/png"), b"png").await.unwrap();
        uploads.discard(&url).await;
        assert_eq!(std::fs::read_dir(uploads.dir()).unwrap().count(), 0);

        // Paths that escape the upload directory are left alone
        uploads.discard("/uploads/../keep.txt").await;
        uploads.discard("/elsewhere/keep.txt").await;
        uploads.discard("/uploads/missing.png").await;
        assert!(dir.path().join("keep.txt").exists());
    }

    #[tokio::test]
    async fn rejects_wrong_type_and_oversize() {
        let dir = tempfile::tempdir().unwrap();
        let uploads = UploadService::new(dir.path(), 4, Arc::new(test_clock()));

        assert!(matches!(
            uploads.save("notes.txt", Some("text/plain"), b"hi").await,
            Err(UploadError::InvalidInput(_))
        ));
        assert!(matches!(
            uploads.save("a.png", None, b"hi").await,
            Err(UploadError::InvalidInput(_))
        ));
        assert!(matches!(
            uploads.save("big.png", Some("image/png"), b"too big").await,
            Err(UploadError::TooLarge { limit: 4 })
        ));
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
