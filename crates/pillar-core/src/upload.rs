//! PDF upload validation and the document preview file

use pillar_session::Document;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

use crate::error::{CoreError, ValidationError};

/// Leading bytes of every PDF file
pub const PDF_SIGNATURE: &[u8] = b"%PDF-";

/// Check a path before anything is read: it must exist, be a regular
/// file, carry a `.pdf` extension and fit under `limit`. Returns the size.
pub async fn validate_path(path: &Path, limit: u64) -> Result<u64, ValidationError> {
    let metadata = match tokio::fs::metadata(path).await {
        Ok(m) => m,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ValidationError::MissingFile(path.to_path_buf()))
        }
        Err(e) => return Err(ValidationError::Unreadable(e.to_string())),
    };

    if !metadata.is_file() {
        return Err(ValidationError::NotPdf(display_name(path)));
    }

    let is_pdf = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(ValidationError::NotPdf(display_name(path)));
    }

    let size = metadata.len();
    if size > limit {
        return Err(ValidationError::TooLarge { size, limit });
    }

    Ok(size)
}

/// Read the file and check its signature
pub async fn read_pdf(path: &Path) -> Result<Vec<u8>, ValidationError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| ValidationError::Unreadable(e.to_string()))?;

    if !bytes.starts_with(PDF_SIGNATURE) {
        return Err(ValidationError::NotPdf(display_name(path)));
    }

    Ok(bytes)
}

/// File name used for display and logging
pub fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Temporary copy of the uploaded PDF for external viewers.
/// The file is deleted when this value is dropped.
#[derive(Debug)]
pub struct DocumentPreview {
    file: NamedTempFile,
}

impl DocumentPreview {
    pub fn create(bytes: &[u8]) -> Result<Self, CoreError> {
        let mut file = tempfile::Builder::new()
            .prefix("pillar-preview-")
            .suffix(".pdf")
            .tempfile()?;
        file.write_all(bytes)?;
        file.flush()?;

        tracing::debug!(path = %file.path().display(), "Created document preview");
        Ok(Self { file })
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}

/// A validated upload: the document for the session plus its preview
#[derive(Debug)]
pub struct Upload {
    pub document: Document,
    pub preview: Option<DocumentPreview>,
}

impl Upload {
    /// Preview creation failures are logged and tolerated.
    pub fn from_bytes(name: impl Into<String>, bytes: &[u8]) -> Self {
        let preview = match DocumentPreview::create(bytes) {
            Ok(preview) => Some(preview),
            Err(e) => {
                tracing::warn!("Could not create document preview: {}", e);
                None
            }
        };

        Self {
            document: Document::from_bytes(name, bytes),
            preview,
        }
    }

    /// Build the upload on the blocking pool: encoding, hashing and the
    /// preview write scale with the document size.
    pub async fn prepare(name: String, bytes: Vec<u8>) -> Result<Self, CoreError> {
        tokio::task::spawn_blocking(move || Self::from_bytes(name, &bytes))
            .await
            .map_err(|e| CoreError::Io(std::io::Error::other(e)))
    }

    pub fn preview_path(&self) -> Option<PathBuf> {
        self.preview.as_ref().map(|p| p.path().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(dir: &tempfile::TempDir, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[tokio::test]
    async fn test_validate_accepts_pdf() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "paper.PDF", b"%PDF-1.7 body");
        assert_eq!(validate_path(&path, 1024).await.unwrap(), 13);
    }

    #[tokio::test]
    async fn test_validate_rejections() {
        let dir = tempfile::tempdir().unwrap();

        let missing = dir.path().join("absent.pdf");
        assert_eq!(
            validate_path(&missing, 1024).await,
            Err(ValidationError::MissingFile(missing.clone()))
        );

        let text = write_file(&dir, "notes.txt", b"%PDF-1.7");
        assert!(matches!(
            validate_path(&text, 1024).await,
            Err(ValidationError::NotPdf(name)) if name == "notes.txt"
        ));

        assert!(matches!(
            validate_path(dir.path(), 1024).await,
            Err(ValidationError::NotPdf(_))
        ));

        let big = write_file(&dir, "big.pdf", &[b'x'; 64]);
        assert_eq!(
            validate_path(&big, 10).await,
            Err(ValidationError::TooLarge { size: 64, limit: 10 })
        );
    }

    #[tokio::test]
    async fn test_read_checks_signature() {
        let dir = tempfile::tempdir().unwrap();
        let good = write_file(&dir, "good.pdf", b"%PDF-1.4\n...");
        assert_eq!(read_pdf(&good).await.unwrap(), b"%PDF-1.4\n...");

        let fake = write_file(&dir, "fake.pdf", b"<html></html>");
        assert!(matches!(
            read_pdf(&fake).await,
            Err(ValidationError::NotPdf(_))
        ));
    }

    #[tokio::test]
    async fn test_prepare_builds_document_and_preview() {
        let upload = Upload::prepare("b.pdf".to_string(), b"%PDF-1.4 prepared".to_vec())
            .await
            .unwrap();
        assert_eq!(upload.document.name(), "b.pdf");
        assert_eq!(upload.document.byte_len(), 17);
        let path = upload.preview_path().unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.4 prepared");
    }

    #[test]
    fn test_preview_removed_on_drop() {
        let upload = Upload::from_bytes("a.pdf", b"%PDF-1.7");
        let path = upload.preview_path().unwrap();
        assert!(path.exists());
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with("pillar-preview-"));
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7");
        assert_eq!(upload.document.name(), "a.pdf");

        drop(upload);
        assert!(!path.exists());
    }
}
