//! Resume file storage on the local filesystem
//!
//! Files live flat under the upload root and are addressed by the relative
//! URL `/uploads/<name>`, which is also where the static file service serves
//! them from.

use std::io;
use std::path::{Component, Path, PathBuf};

use chrono::Utc;
use tokio::fs;

/// URL prefix under which stored files are served
pub const UPLOAD_URL_PREFIX: &str = "/uploads/";

const FALLBACK_FILE_NAME: &str = "resume.pdf";

/// Upload storage errors
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File not found: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// A file written to the upload root
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredUpload {
    pub file_name: String,
    pub url: String,
}

/// Local upload directory
#[derive(Debug, Clone)]
pub struct UploadStore {
    root: PathBuf,
}

impl UploadStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the upload root if it does not exist yet
    pub async fn ensure_root(&self) -> Result<(), UploadError> {
        fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    /// Write `bytes` under a unique name derived from `original_name`
    pub async fn save(&self, original_name: &str, bytes: &[u8]) -> Result<StoredUpload, UploadError> {
        let file_name = unique_file_name(original_name);

        self.ensure_root().await?;
        fs::write(self.root.join(&file_name), bytes).await?;

        tracing::debug!("Stored upload {}", file_name);

        Ok(StoredUpload {
            url: format!("{}{}", UPLOAD_URL_PREFIX, file_name),
            file_name,
        })
    }

    /// Map a stored resume URL to its path. Only `/uploads/<plain name>` resolves.
    pub fn resolve(&self, url: &str) -> Option<PathBuf> {
        let name = url.strip_prefix(UPLOAD_URL_PREFIX)?;
        if name.contains(['/', '\\']) {
            return None;
        }

        let mut components = Path::new(name).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Some(self.root.join(name)),
            _ => None,
        }
    }

    /// Delete the file behind a resume URL.
    /// A URL that does not resolve or a file absent on disk is `NotFound`.
    pub async fn remove(&self, url: &str) -> Result<(), UploadError> {
        let path = self
            .resolve(url)
            .ok_or_else(|| UploadError::NotFound(url.to_string()))?;

        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                Err(UploadError::NotFound(url.to_string()))
            }
            Err(e) => Err(UploadError::Io(e)),
        }
    }
}

/// `<unix nanos>_<8 hex chars>_<sanitized name>`
fn unique_file_name(original_name: &str) -> String {
    let nanos = Utc::now().timestamp_nanos_opt().unwrap_or_default();
    let nonce: [u8; 4] = rand::random();
    format!(
        "{}_{}_{}",
        nanos,
        hex::encode(nonce),
        sanitize_file_name(original_name)
    )
}

/// Keep the final path component and replace anything outside `[A-Za-z0-9._-]`
pub fn sanitize_file_name(original_name: &str) -> String {
    let base = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.is_empty() {
        FALLBACK_FILE_NAME.to_string()
    } else {
        sanitized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store() -> (UploadStore, TempDir) {
        let dir = TempDir::new().unwrap();
        (UploadStore::new(dir.path().join("uploads")), dir)
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("resume.pdf"), "resume.pdf");
        assert_eq!(sanitize_file_name("My Resume (1).pdf"), "My_Resume__1_.pdf");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\Users\\jane\\cv.pdf"), "cv.pdf");
        assert_eq!(sanitize_file_name("résumé.pdf"), "r_sum_.pdf");
        assert_eq!(sanitize_file_name(""), "resume.pdf");
        assert_eq!(sanitize_file_name("dir/"), "resume.pdf");
    }

    #[test]
    fn test_unique_file_name_shape() {
        let name = unique_file_name("cv.pdf");
        let parts: Vec<&str> = name.splitn(3, '_').collect();

        assert_eq!(parts.len(), 3);
        assert!(parts[0].parse::<i64>().is_ok());
        assert_eq!(parts[1].len(), 8);
        assert!(parts[1].chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(parts[2], "cv.pdf");
        assert_ne!(name, unique_file_name("cv.pdf"));
    }

    #[test]
    fn test_resolve_only_plain_names() {
        let store = UploadStore::new("/srv/uploads");

        assert_eq!(
            store.resolve("/uploads/1_abcd1234_cv.pdf"),
            Some(PathBuf::from("/srv/uploads/1_abcd1234_cv.pdf"))
        );
        assert_eq!(store.resolve(""), None);
        assert_eq!(store.resolve("/uploads/"), None);
        assert_eq!(store.resolve("/uploads/../secret"), None);
        assert_eq!(store.resolve("/uploads/.."), None);
        assert_eq!(store.resolve("/uploads/a/b.pdf"), None);
        assert_eq!(store.resolve("/uploads/a\\b.pdf"), None);
        assert_eq!(store.resolve("/other/cv.pdf"), None);
        assert_eq!(store.resolve("https://cdn.example.com/cv.pdf"), None);
    }

    #[tokio::test]
    async fn test_save_writes_file_and_returns_url() {
        let (store, _dir) = store();

        let stored = store.save("cv.pdf", b"%PDF-1.4").await.unwrap();

        assert!(stored.url.starts_with("/uploads/"));
        assert!(stored.url.ends_with("_cv.pdf"));
        let path = store.resolve(&stored.url).unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF-1.4");
    }

    #[tokio::test]
    async fn test_remove_deletes_file() {
        let (store, _dir) = store();
        let stored = store.save("cv.pdf", b"%PDF").await.unwrap();

        store.remove(&stored.url).await.unwrap();

        assert!(!store.resolve(&stored.url).unwrap().exists());
    }

    #[tokio::test]
    async fn test_remove_missing_file_is_not_found() {
        let (store, _dir) = store();
        store.ensure_root().await.unwrap();

        let result = store.remove("/uploads/never_written.pdf").await;
        assert!(matches!(result, Err(UploadError::NotFound(_))));

        let result = store.remove("/uploads/../escape.pdf").await;
        assert!(matches!(result, Err(UploadError::NotFound(_))));
    }
}
