//! Filesystem storage for uploaded employee documents.
//!
//! Records in `employee_documents` hold a path relative to the store root;
//! the store turns that into bytes on disk and back.

use async_trait::async_trait;
use bytes::Bytes;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("Stored file is missing: {0}")]
    Missing(String),

    #[error("Invalid {field}: {reason}")]
    InvalidName { field: &'static str, reason: String },

    #[error("File storage error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Write `data` at `relative_path`, replacing any existing file.
    async fn put(&self, relative_path: &str, data: Bytes) -> Result<(), FileError>;
    /// Read the file recorded at `relative_path`.
    async fn get(&self, relative_path: &str) -> Result<Bytes, FileError>;
    /// Remove one file; absent files are not an error.
    async fn remove(&self, relative_path: &str) -> Result<(), FileError>;
    /// Remove everything stored for an employee.
    async fn remove_employee(&self, employee_id: i64) -> Result<(), FileError>;
}

/// Replace anything outside `[A-Za-z0-9._-]` with `_`.
fn sanitize(field: &'static str, raw: &str) -> Result<String, FileError> {
    // Browsers may send a full client-side path as the file name.
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw).trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        return Err(FileError::InvalidName {
            field,
            reason: format!("'{}' is not a usable name", raw),
        });
    }
    Ok(cleaned)
}

fn employee_dir(employee_id: i64) -> String {
    format!("employee_{}", employee_id)
}

/// Deterministic location for an upload: `employee_{id}/{type}_{file name}`.
pub fn document_path(
    employee_id: i64,
    document_type: &str,
    file_name: &str,
) -> Result<String, FileError> {
    let document_type = sanitize("document_type", document_type)?;
    let file_name = sanitize("file_name", file_name)?;
    Ok(format!(
        "{}/{}_{}",
        employee_dir(employee_id),
        document_type,
        file_name
    ))
}

/// Document store backed by a local directory
pub struct LocalDocumentStore {
    root: PathBuf,
}

impl LocalDocumentStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Join a stored relative path onto the root, refusing anything that
    /// could escape it.
    fn resolve(&self, relative_path: &str) -> Result<PathBuf, FileError> {
        let rel = Path::new(relative_path);
        let safe = rel
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !safe || relative_path.is_empty() {
            return Err(FileError::InvalidName {
                field: "file_path",
                reason: format!("'{}' is not a relative path inside the store", relative_path),
            });
        }
        Ok(self.root.join(rel))
    }
}

#[async_trait]
impl DocumentStore for LocalDocumentStore {
    async fn put(&self, relative_path: &str, data: Bytes) -> Result<(), FileError> {
        let path = self.resolve(relative_path)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, &data).await?;

        tracing::debug!(path = %path.display(), size = data.len(), "Stored document");
        Ok(())
    }

    async fn get(&self, relative_path: &str) -> Result<Bytes, FileError> {
        let path = self.resolve(relative_path)?;
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                Err(FileError::Missing(relative_path.to_string()))
            }
            Err(e) => Err(FileError::Io(e)),
        }
    }

    async fn remove(&self, relative_path: &str) -> Result<(), FileError> {
        let path = self.resolve(relative_path)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FileError::Io(e)),
        }
    }

    async fn remove_employee(&self, employee_id: i64) -> Result<(), FileError> {
        let path = self.root.join(employee_dir(employee_id));
        match tokio::fs::remove_dir_all(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(FileError::Io(e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_document_path_is_deterministic() {
        assert_eq!(
            document_path(7, "contract", "offer letter.pdf").unwrap(),
            "employee_7/contract_offer_letter.pdf"
        );
        assert_eq!(
            document_path(7, "id/card", "C:\\Users\\me\\scan.png").unwrap(),
            "employee_7/card_scan.png"
        );
    }

    #[test]
    fn test_document_path_rejects_dot_names() {
        assert!(matches!(
            document_path(1, "contract", ".."),
            Err(FileError::InvalidName { field: "file_name", .. })
        ));
        assert!(matches!(
            document_path(1, "  ", "a.pdf"),
            Err(FileError::InvalidName { field: "document_type", .. })
        ));
    }

    #[tokio::test]
    async fn test_put_get_remove() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path());
        let rel = document_path(3, "passport", "scan.pdf").unwrap();

        store.put(&rel, Bytes::from_static(b"%PDF-1.7")).await.unwrap();
        assert!(dir.path().join("employee_3/passport_scan.pdf").exists());
        assert_eq!(store.get(&rel).await.unwrap(), Bytes::from_static(b"%PDF-1.7"));

        store.remove(&rel).await.unwrap();
        assert!(matches!(store.get(&rel).await, Err(FileError::Missing(_))));
        store.remove(&rel).await.unwrap();
    }

    #[tokio::test]
    async fn test_put_overwrites_same_path() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path());

        store.put("employee_1/cv_a.txt", Bytes::from_static(b"one")).await.unwrap();
        store.put("employee_1/cv_a.txt", Bytes::from_static(b"two")).await.unwrap();
        assert_eq!(store.get("employee_1/cv_a.txt").await.unwrap(), Bytes::from_static(b"two"));
    }

    #[tokio::test]
    async fn test_resolve_refuses_escape() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path());

        assert!(matches!(
            store.get("../etc/passwd").await,
            Err(FileError::InvalidName { .. })
        ));
        assert!(matches!(
            store.get("/etc/passwd").await,
            Err(FileError::InvalidName { .. })
        ));
    }

    #[tokio::test]
    async fn test_remove_employee_directory() {
        let dir = TempDir::new().unwrap();
        let store = LocalDocumentStore::new(dir.path());
        store.put("employee_9/cv_a.txt", Bytes::from_static(b"x")).await.unwrap();

        store.remove_employee(9).await.unwrap();
        assert!(!dir.path().join("employee_9").exists());
        store.remove_employee(9).await.unwrap();
    }
}
