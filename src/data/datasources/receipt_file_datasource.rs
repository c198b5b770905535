use std::path::PathBuf;

use async_trait::async_trait;

use crate::{domain::repositories::receipt_source::ReceiptSource, errors::StorageError};

/// Reads the app receipt from a file on disk.
pub struct FileReceiptSource {
    path: PathBuf,
}

impl FileReceiptSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ReceiptSource for FileReceiptSource {
    async fn load_receipt(&self) -> Result<Vec<u8>, StorageError> {
        tokio::fs::read(&self.path)
            .await
            .map_err(|source| StorageError::Io {
                path: self.path.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_receipt_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("receipt");
        std::fs::write(&path, [0x30, 0x82, 0x01]).unwrap();
        let source = FileReceiptSource::new(&path);
        assert_eq!(source.load_receipt().await.unwrap(), vec![0x30, 0x82, 0x01]);
    }

    #[tokio::test]
    async fn missing_receipt_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileReceiptSource::new(dir.path().join("missing"));
        assert!(matches!(
            source.load_receipt().await,
            Err(StorageError::Io { .. })
        ));
    }
}
