use std::fs;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::StorageError;

/// File kind sniffed from magic bytes.
///
/// Decides how the file is presented to the vision model: PDFs go inline as
/// a data URL, images go as an image URL part.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Png,
    Jpeg,
    Webp,
    Other,
}

impl FileKind {
    pub fn mime(&self) -> &'static str {
        match self {
            FileKind::Pdf => "application/pdf",
            FileKind::Png => "image/png",
            FileKind::Jpeg => "image/jpeg",
            FileKind::Webp => "image/webp",
            FileKind::Other => "application/octet-stream",
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, FileKind::Png | FileKind::Jpeg | FileKind::Webp)
    }
}

/// Detect file kind from magic bytes.
pub fn sniff_kind(bytes: &[u8]) -> FileKind {
    if bytes.len() >= 5 && &bytes[0..5] == b"%PDF-" {
        FileKind::Pdf
    } else if bytes.len() >= 8 && bytes[0..8] == [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A] {
        FileKind::Png
    } else if bytes.len() >= 3 && bytes[0..3] == [0xFF, 0xD8, 0xFF] {
        FileKind::Jpeg
    } else if bytes.len() >= 12 && &bytes[0..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        FileKind::Webp
    } else {
        FileKind::Other
    }
}

/// Filesystem-backed object store for the `kyc-documents` bucket.
pub struct StorageGateway {
    root: PathBuf,
}

impl StorageGateway {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Store a file under `{company_id}/{document_id}/{file_name}` and
    /// return the bucket-relative path.
    pub fn store(
        &self,
        company_id: &Uuid,
        document_id: &Uuid,
        file_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let file_name = sanitize_file_name(file_name)?;
        let relative = format!("{company_id}/{document_id}/{file_name}");
        let full = self.root.join(&relative);

        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&full, bytes)?;

        tracing::debug!(path = %relative, size = bytes.len(), "Stored object");
        Ok(relative)
    }

    /// Read an object by bucket-relative path.
    pub fn read(&self, relative_path: &str) -> Result<Vec<u8>, StorageError> {
        let full = self.resolve(relative_path)?;
        match fs::read(&full) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(relative_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Remove an object. A missing object is not an error, so cleanup
    /// paths can call this unconditionally.
    pub fn delete(&self, relative_path: &str) -> Result<(), StorageError> {
        let full = self.resolve(relative_path)?;
        match fs::remove_file(&full) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    pub fn exists(&self, relative_path: &str) -> bool {
        self.resolve(relative_path)
            .map(|p| p.is_file())
            .unwrap_or(false)
    }

    /// Resolve a relative path inside the bucket root, rejecting traversal.
    fn resolve(&self, relative_path: &str) -> Result<PathBuf, StorageError> {
        let rel = Path::new(relative_path);
        if rel.is_absolute()
            || rel
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(StorageError::InvalidPath(relative_path.to_string()));
        }
        Ok(self.root.join(rel))
    }
}

/// Strip directory components and reject empty names. The stored name must
/// survive verbatim inside a signed `/files/{path}` link, so anything
/// outside the URL-unreserved charset becomes `_`.
fn sanitize_file_name(name: &str) -> Result<String, StorageError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default().trim();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(StorageError::InvalidPath(name.to_string()));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> (StorageGateway, tempfile::TempDir) {
        let tmp = tempfile::tempdir().unwrap();
        (StorageGateway::new(tmp.path().to_path_buf()), tmp)
    }

    #[test]
    fn store_and_read_round_trip() {
        let (gw, _tmp) = gateway();
        let company = Uuid::new_v4();
        let doc = Uuid::new_v4();

        let path = gw.store(&company, &doc, "cert.pdf", b"%PDF-1.4 data").unwrap();
        assert_eq!(path, format!("{company}/{doc}/cert.pdf"));
        assert_eq!(gw.read(&path).unwrap(), b"%PDF-1.4 data");
        assert!(gw.exists(&path));
    }

    #[test]
    fn file_name_with_directories_is_stripped() {
        let (gw, _tmp) = gateway();
        let company = Uuid::new_v4();
        let doc = Uuid::new_v4();

        let path = gw
            .store(&company, &doc, "../../../etc/passwd", b"data")
            .unwrap();
        assert!(path.ends_with("/passwd"));
        assert!(!path.contains(".."));
    }

    #[test]
    fn url_hostile_characters_are_replaced() {
        let (gw, _tmp) = gateway();
        let company = Uuid::new_v4();
        let doc = Uuid::new_v4();

        let path = gw
            .store(&company, &doc, "annual report 2024?.pdf#v2", b"data")
            .unwrap();
        assert!(path.ends_with("/annual_report_2024_.pdf_v2"));
        assert!(gw.exists(&path));
    }

    #[test]
    fn delete_removes_object_and_tolerates_missing() {
        let (gw, _tmp) = gateway();
        let path = gw
            .store(&Uuid::new_v4(), &Uuid::new_v4(), "f.pdf", b"x")
            .unwrap();
        gw.delete(&path).unwrap();
        assert!(!gw.exists(&path));
        // Second delete is a no-op
        gw.delete(&path).unwrap();
    }

    #[test]
    fn read_rejects_traversal() {
        let (gw, _tmp) = gateway();
        let err = gw.read("../outside.txt").unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }

    #[test]
    fn read_missing_object_is_not_found() {
        let (gw, _tmp) = gateway();
        let err = gw.read("a/b/missing.pdf").unwrap_err();
        assert!(matches!(err, StorageError::NotFound(_)));
    }

    #[test]
    fn empty_file_name_rejected() {
        let (gw, _tmp) = gateway();
        let err = gw
            .store(&Uuid::new_v4(), &Uuid::new_v4(), "  ", b"x")
            .unwrap_err();
        assert!(matches!(err, StorageError::InvalidPath(_)));
    }

    #[test]
    fn sniff_kind_detects_formats() {
        assert_eq!(sniff_kind(b"%PDF-1.7"), FileKind::Pdf);
        assert_eq!(
            sniff_kind(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]),
            FileKind::Png
        );
        assert_eq!(sniff_kind(&[0xFF, 0xD8, 0xFF, 0xE0]), FileKind::Jpeg);
        assert_eq!(sniff_kind(b"RIFF\x00\x00\x00\x00WEBPVP8 "), FileKind::Webp);
        assert_eq!(sniff_kind(&[0x00, 0x01]), FileKind::Other);
    }

    #[test]
    fn pdf_is_not_an_image() {
        assert!(!FileKind::Pdf.is_image());
        assert!(FileKind::Jpeg.is_image());
        assert_eq!(FileKind::Pdf.mime(), "application/pdf");
    }
}
