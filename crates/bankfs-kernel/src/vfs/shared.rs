//! Shareable handle over the engine.

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::config::{ConfigResult, StorageConfig};
use crate::fs::FileSystem;
use crate::storage::StorageLayout;

use super::error::VfsResult;
use super::ops::VfsOps;
use super::types::{DirEntry, FileAttr, FileType, StatFs};

/// A [`FileSystem`] behind a single reader/writer lock.
///
/// Every operation runs to completion under the lock, so callers on other
/// tasks never observe a half-linked node or a partially grown chain.
#[derive(Debug)]
pub struct BankFs {
    inner: RwLock<FileSystem>,
}

impl BankFs {
    pub fn new(layout: StorageLayout) -> Self {
        Self::from_fs(FileSystem::new(layout))
    }

    pub fn from_fs(fs: FileSystem) -> Self {
        Self {
            inner: RwLock::new(fs),
        }
    }

    pub fn from_config(config: &StorageConfig) -> ConfigResult<Self> {
        Ok(Self::from_fs(FileSystem::from_config(config)?))
    }

    /// Run `f` against the engine under the read lock.
    pub fn inspect<R>(&self, f: impl FnOnce(&FileSystem) -> R) -> R {
        f(&self.inner.read())
    }
}

#[async_trait]
impl VfsOps for BankFs {
    async fn get_attributes(&self, path: &str) -> VfsResult<FileAttr> {
        self.inner.read().get_attributes(path)
    }

    async fn list_directory(&self, path: &str) -> VfsResult<Vec<DirEntry>> {
        self.inner.read().list_directory(path)
    }

    async fn read_bytes(&self, path: &str, offset: u64, len: usize) -> VfsResult<Vec<u8>> {
        self.inner.read().read_bytes(path, offset, len)
    }

    async fn write_bytes(&self, path: &str, offset: u64, data: &[u8]) -> VfsResult<usize> {
        self.inner.write().write_bytes(path, offset, data)
    }

    async fn create_entry(&self, path: &str, kind: FileType) -> VfsResult<FileAttr> {
        self.inner.write().create_entry(path, kind)
    }

    async fn remove_entry(&self, path: &str) -> VfsResult<()> {
        self.inner.write().remove_entry(path)
    }

    async fn rename_entry(&self, from: &str, to: &str) -> VfsResult<()> {
        self.inner.write().rename_entry(from, to)
    }

    async fn truncate(&self, path: &str, size: u64) -> VfsResult<()> {
        self.inner.write().truncate(path, size)
    }

    async fn write_all(&self, path: &str, data: &[u8]) -> VfsResult<usize> {
        self.inner.write().write_all(path, data)
    }

    async fn statfs(&self) -> VfsResult<StatFs> {
        Ok(self.inner.read().statfs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vfs::VfsError;
    use std::sync::Arc;

    fn bankfs() -> BankFs {
        BankFs::new(StorageLayout::new(64 * 1024, 16 * 1024, 4 * 1024).unwrap())
    }

    #[tokio::test]
    async fn test_create_and_read() {
        let fs = bankfs();
        fs.create_entry("/test.txt", FileType::File).await.unwrap();
        fs.write_bytes("/test.txt", 0, b"hello world").await.unwrap();

        let data = fs.read_bytes("/test.txt", 0, 100).await.unwrap();
        assert_eq!(data, b"hello world");
    }

    #[tokio::test]
    async fn test_partial_read() {
        let fs = bankfs();
        fs.write_all("/test.txt", b"hello world").await.unwrap();

        let data = fs.read_bytes("/test.txt", 6, 5).await.unwrap();
        assert_eq!(data, b"world");
    }

    #[tokio::test]
    async fn test_write_all_replaces() {
        let fs = bankfs();
        fs.write_all("/f", b"a much longer first version").await.unwrap();
        fs.write_all("/f", b"short").await.unwrap();
        assert_eq!(fs.read_all("/f").await.unwrap(), b"short");
    }

    #[tokio::test]
    async fn test_exists() {
        let fs = bankfs();
        assert!(fs.exists("/").await);
        assert!(!fs.exists("/nope").await);
        fs.create_entry("/d", FileType::Directory).await.unwrap();
        assert!(fs.exists("/d").await);
    }

    #[tokio::test]
    async fn test_remove_directory_recursive() {
        let fs = bankfs();
        fs.create_entry("/a", FileType::Directory).await.unwrap();
        fs.write_all("/a/b.txt", &[9u8; 5000]).await.unwrap();
        assert_eq!(fs.statfs().await.unwrap().bfree, 14);

        fs.remove_entry("/a").await.unwrap();
        assert_eq!(
            fs.get_attributes("/a/b.txt").await,
            Err(VfsError::not_found("/a"))
        );
        assert_eq!(fs.statfs().await.unwrap().bfree, 16);
    }

    #[tokio::test]
    async fn test_inspect() {
        let fs = bankfs();
        fs.write_all("/x", b"abc").await.unwrap();
        let chunks = fs.inspect(|inner| inner.pool().used_chunks());
        assert_eq!(chunks, 1);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_write_all_same_path() {
        let fs = Arc::new(bankfs());
        for _ in 0..50 {
            let mut handles = Vec::new();
            for i in 1..=8usize {
                let fs = Arc::clone(&fs);
                handles.push(tokio::spawn(async move {
                    fs.write_all("/shared", &vec![i as u8; i * 1000]).await
                }));
            }
            for handle in handles {
                handle.await.unwrap().unwrap();
            }

            // Exactly one writer's contents, nothing interleaved or leaked.
            let data = fs.read_all("/shared").await.unwrap();
            let fill = data[0] as usize;
            assert_eq!(data, vec![fill as u8; fill * 1000]);
            let expected_chunks = (fill * 1000).div_ceil(4 * 1024) as u32;
            assert_eq!(fs.inspect(|inner| inner.pool().used_chunks()), expected_chunks);
            assert_eq!(fs.list_directory("/").await.unwrap().len(), 1);
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_get_distinct_chunks() {
        let fs = Arc::new(bankfs());
        let mut handles = Vec::new();
        for i in 0..8 {
            let fs = Arc::clone(&fs);
            handles.push(tokio::spawn(async move {
                let path = format!("/file{i}");
                fs.write_all(&path, &[i as u8; 4096]).await.unwrap();
                path
            }));
        }
        for (i, handle) in handles.into_iter().enumerate() {
            let path = handle.await.unwrap();
            assert_eq!(fs.read_all(&path).await.unwrap(), vec![i as u8; 4096]);
        }
        assert_eq!(fs.statfs().await.unwrap().bfree, 8);
        assert_eq!(fs.list_directory("/").await.unwrap().len(), 8);
    }
}
