use crate::{error::StoreError, stores::ObjectStore};
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Reads objects from `<root>/<bucket>/<file>`.
pub struct LocalFsStore {
    root: PathBuf,
}

impl LocalFsStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn object_path(&self, bucket: &str, file_name: &str) -> Result<PathBuf, StoreError> {
        let escapes = |part: &str| {
            Path::new(part)
                .components()
                .any(|c| !matches!(c, std::path::Component::Normal(_)))
        };
        if escapes(bucket) || escapes(file_name) {
            return Err(StoreError::PermissionDenied(format!(
                "path escapes store root: {}/{}",
                bucket, file_name
            )));
        }
        Ok(self.root.join(bucket).join(file_name))
    }
}

#[async_trait]
impl ObjectStore for LocalFsStore {
    async fn download(&self, bucket: &str, file_name: &str) -> Result<Vec<u8>, StoreError> {
        let path = self.object_path(bucket, file_name)?;
        tokio::fs::read(&path).await.map_err(|e| {
            let location = path.display().to_string();
            match e.kind() {
                ErrorKind::NotFound => StoreError::NotFound(location),
                ErrorKind::PermissionDenied => StoreError::PermissionDenied(location),
                _ => StoreError::Transient(format!("{}: {}", location, e)),
            }
        })
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "dashboard_core_{}_{}",
            name,
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(dir.join("bucket")).unwrap();
        dir
    }

    #[tokio::test]
    async fn test_reads_object_under_bucket() {
        let root = scratch_dir("read");
        std::fs::write(root.join("bucket").join("a.json"), b"[1,2]").unwrap();

        let store = LocalFsStore::new(&root);
        assert_eq!(store.download("bucket", "a.json").await.unwrap(), b"[1,2]");

        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_missing_object_is_not_found() {
        let root = scratch_dir("missing");
        let store = LocalFsStore::new(&root);
        assert!(matches!(
            store.download("bucket", "nope.json").await,
            Err(StoreError::NotFound(_))
        ));
        std::fs::remove_dir_all(root).ok();
    }

    #[tokio::test]
    async fn test_rejects_path_traversal() {
        let store = LocalFsStore::new("/tmp");
        assert!(matches!(
            store.download("bucket", "../etc/passwd").await,
            Err(StoreError::PermissionDenied(_))
        ));
    }
}
