//! Core VFS types.
//!
//! Path-based and serializable so a mount collaborator can hand them across
//! whatever boundary it runs behind.

use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use strum::{Display, EnumString};

/// Node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(ascii_case_insensitive)]
pub enum FileType {
    /// Regular file.
    #[strum(to_string = "file", serialize = "f")]
    File,
    /// Directory.
    #[strum(to_string = "dir", serialize = "directory", serialize = "d")]
    Directory,
}

impl FileType {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        matches!(self, FileType::File)
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        matches!(self, FileType::Directory)
    }
}

/// File attributes (metadata).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileAttr {
    /// File type.
    pub kind: FileType,
    /// Size in bytes (0 for directories).
    pub size: u64,
    /// Last modification time.
    pub mtime: SystemTime,
    /// Chunks held by the file's extent chain.
    pub chunks: u64,
}

impl FileAttr {
    /// Returns true if this is a regular file.
    pub fn is_file(&self) -> bool {
        self.kind.is_file()
    }

    /// Returns true if this is a directory.
    pub fn is_dir(&self) -> bool {
        self.kind.is_dir()
    }
}

/// Directory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirEntry {
    /// Entry name (not full path).
    pub name: String,
    /// Entry type.
    pub kind: FileType,
}

impl DirEntry {
    /// Create a new directory entry.
    pub fn new(name: impl Into<String>, kind: FileType) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a file entry.
    pub fn file(name: impl Into<String>) -> Self {
        Self::new(name, FileType::File)
    }

    /// Create a directory entry.
    pub fn directory(name: impl Into<String>) -> Self {
        Self::new(name, FileType::Directory)
    }
}

/// Filesystem statistics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatFs {
    /// Total chunks.
    pub blocks: u64,
    /// Free chunks.
    pub bfree: u64,
    /// Available chunks (no reservation, same as `bfree`).
    pub bavail: u64,
    /// Live nodes, root included.
    pub files: u64,
    /// Block (chunk) size.
    pub bsize: u32,
    /// Bank size.
    pub bank_size: u64,
    /// Maximum name length.
    pub namelen: u32,
}
