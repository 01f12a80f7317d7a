//! VFS operations trait.
//!
//! Path-based with explicit offsets, so a mount adapter can drive it without
//! keeping handle state. Paths are absolute (`/a/b`).

use async_trait::async_trait;

use super::VfsResult;
use super::types::{DirEntry, FileAttr, FileType, StatFs};

/// Operations a mount collaborator issues against the engine.
#[async_trait]
pub trait VfsOps: Send + Sync {
    // ========================================================================
    // Reading
    // ========================================================================

    /// Get file attributes.
    async fn get_attributes(&self, path: &str) -> VfsResult<FileAttr>;

    /// Read directory entries, newest first.
    async fn list_directory(&self, path: &str) -> VfsResult<Vec<DirEntry>>;

    /// Read up to `len` bytes starting at `offset`.
    ///
    /// Returns fewer bytes if the end of file is reached.
    async fn read_bytes(&self, path: &str, offset: u64, len: usize) -> VfsResult<Vec<u8>>;

    // ========================================================================
    // Writing
    // ========================================================================

    /// Write `data` at `offset`, returning the number of bytes written.
    ///
    /// `offset` may not lie past the end of the file. A short count means
    /// storage ran out part way through.
    async fn write_bytes(&self, path: &str, offset: u64, data: &[u8]) -> VfsResult<usize>;

    /// Create an empty file or directory.
    async fn create_entry(&self, path: &str, kind: FileType) -> VfsResult<FileAttr>;

    /// Remove a file, or a directory and everything beneath it.
    async fn remove_entry(&self, path: &str) -> VfsResult<()>;

    /// Rename a file or directory, possibly into another directory.
    async fn rename_entry(&self, from: &str, to: &str) -> VfsResult<()>;

    /// Truncate or zero-extend a file to `size` bytes.
    async fn truncate(&self, path: &str, size: u64) -> VfsResult<()>;

    // ========================================================================
    // Metadata
    // ========================================================================

    /// Get filesystem statistics.
    async fn statfs(&self) -> VfsResult<StatFs>;

    // ========================================================================
    // Convenience methods (default implementations)
    // ========================================================================

    /// Check if a path exists.
    async fn exists(&self, path: &str) -> bool {
        self.get_attributes(path).await.is_ok()
    }

    /// Read entire file contents.
    async fn read_all(&self, path: &str) -> VfsResult<Vec<u8>> {
        let attr = self.get_attributes(path).await?;
        self.read_bytes(path, 0, attr.size as usize).await
    }

    /// Replace the whole file, creating it if needed.
    async fn write_all(&self, path: &str, data: &[u8]) -> VfsResult<usize> {
        if self.exists(path).await {
            self.truncate(path, 0).await?;
        } else {
            self.create_entry(path, FileType::File).await?;
        }
        self.write_bytes(path, 0, data).await
    }
}
