//! The filesystem engine: namespace and storage pool under one owner.
//!
//! Every operation takes an absolute path and re-resolves it; there are no
//! open handles. `FileSystem` is not synchronized itself. Share it through
//! [`BankFs`](crate::vfs::BankFs), which puts the whole engine behind one lock.

use crate::config::{ConfigResult, StorageConfig};
use crate::extent::ExtentChain;
use crate::io;
use crate::namespace::{MAX_NAME_LEN, NamespaceTree, Node, NodeId, VfsPath};
use crate::storage::{StorageLayout, StoragePool};
use crate::vfs::{DirEntry, FileAttr, FileType, StatFs, VfsError, VfsResult};

/// In-memory filesystem over a chunk pool.
#[derive(Debug)]
pub struct FileSystem {
    tree: NamespaceTree,
    pool: StoragePool,
}

impl FileSystem {
    /// An empty filesystem (just `/`) over a fresh pool.
    pub fn new(layout: StorageLayout) -> Self {
        tracing::debug!(
            total_size = layout.total_size(),
            banks = layout.bank_count(),
            chunk_size = layout.chunk_size(),
            "initializing filesystem"
        );
        Self {
            tree: NamespaceTree::new(),
            pool: StoragePool::new(layout),
        }
    }

    pub fn from_config(config: &StorageConfig) -> ConfigResult<Self> {
        Ok(Self::new(config.layout()?))
    }

    pub fn pool(&self) -> &StoragePool {
        &self.pool
    }

    pub fn tree(&self) -> &NamespaceTree {
        &self.tree
    }

    // ========================================================================
    // Reading
    // ========================================================================

    /// Kind, size and modification time of the node at `path`.
    pub fn get_attributes(&self, path: &str) -> VfsResult<FileAttr> {
        let (_, node) = self.lookup(path)?;
        Ok(FileAttr {
            kind: node.kind(),
            size: node.size(),
            mtime: node.modified_at(),
            chunks: node.extents().map_or(0, |e| e.len() as u64),
        })
    }

    /// Entries of the directory at `path`, newest first.
    pub fn list_directory(&self, path: &str) -> VfsResult<Vec<DirEntry>> {
        Ok(self.entries(path)?.collect())
    }

    /// Lazy form of [`list_directory`](Self::list_directory).
    pub fn entries(&self, path: &str) -> VfsResult<impl Iterator<Item = DirEntry> + '_> {
        let (id, node) = self.lookup(path)?;
        if !node.is_dir() {
            return Err(VfsError::not_a_directory(path));
        }
        Ok(self
            .tree
            .list_children(id)
            .filter_map(|child| self.tree.get(child))
            .map(|child| DirEntry::new(child.name(), child.kind())))
    }

    /// Up to `len` bytes at `offset`; short at end of file.
    pub fn read_bytes(&self, path: &str, offset: u64, len: usize) -> VfsResult<Vec<u8>> {
        let (_, node) = self.lookup(path)?;
        let extents = node.extents().ok_or_else(|| VfsError::is_a_directory(path))?;
        io::read(extents, &self.pool, offset, len)
    }

    /// The extent chain of the file at `path`.
    pub fn extents(&self, path: &str) -> VfsResult<&ExtentChain> {
        let (_, node) = self.lookup(path)?;
        node.extents().ok_or_else(|| VfsError::is_a_directory(path))
    }

    pub fn statfs(&self) -> StatFs {
        let layout = self.pool.layout();
        StatFs {
            blocks: u64::from(self.pool.total_chunks()),
            bfree: u64::from(self.pool.free_chunks()),
            bavail: u64::from(self.pool.free_chunks()),
            files: self.tree.len() as u64,
            bsize: u32::try_from(layout.chunk_size()).unwrap_or(u32::MAX),
            bank_size: layout.bank_size() as u64,
            namelen: MAX_NAME_LEN as u32,
        }
    }

    // ========================================================================
    // Writing
    // ========================================================================

    /// Create an empty file or directory at `path`.
    pub fn create_entry(&mut self, path: &str, kind: FileType) -> VfsResult<FileAttr> {
        let parsed = VfsPath::parse(path)?;
        if parsed.is_root() {
            return Err(VfsError::already_exists("/"));
        }
        let (parent, leaf) = self.tree.resolve_parent(&parsed)?;
        self.tree
            .insert_child(parent, Node::new(leaf, kind))
            .map_err(|e| match e {
                VfsError::AlreadyExists(_) => VfsError::already_exists(parsed.to_string()),
                other => other,
            })?;
        tracing::debug!(path = %parsed, %kind, "created");
        self.get_attributes(path)
    }

    /// Remove the node at `path`; directories go with everything beneath them.
    pub fn remove_entry(&mut self, path: &str) -> VfsResult<()> {
        let parsed = VfsPath::parse(path)?;
        if parsed.is_root() {
            return Err(VfsError::invalid_path("cannot remove /"));
        }
        let (parent, leaf) = self.tree.resolve_parent(&parsed)?;
        let before = self.pool.free_chunks();
        let removed = self
            .tree
            .remove_subtree(parent, leaf, &mut self.pool)
            .map_err(|e| match e {
                VfsError::NotFound(_) => VfsError::not_found(parsed.to_string()),
                other => other,
            })?;
        tracing::debug!(
            path = %parsed,
            nodes = removed,
            chunks_freed = self.pool.free_chunks() - before,
            "removed"
        );
        Ok(())
    }

    /// Write `data` at `offset`, returning the number of bytes placed.
    pub fn write_bytes(&mut self, path: &str, offset: u64, data: &[u8]) -> VfsResult<usize> {
        let id = self.resolve(path)?;
        let node = self
            .tree
            .get_mut(id)
            .ok_or_else(|| VfsError::not_found(path))?;
        let extents = node.extents_mut().ok_or_else(|| VfsError::is_a_directory(path))?;
        let written = io::write(extents, &mut self.pool, offset, data)?;
        if written > 0 {
            node.touch();
        }
        Ok(written)
    }

    /// Shrink or zero-extend the file at `path` to `size` bytes.
    pub fn truncate(&mut self, path: &str, size: u64) -> VfsResult<()> {
        let id = self.resolve(path)?;
        let node = self
            .tree
            .get_mut(id)
            .ok_or_else(|| VfsError::not_found(path))?;
        let extents = node.extents_mut().ok_or_else(|| VfsError::is_a_directory(path))?;
        let before = extents.size();
        io::truncate(extents, &mut self.pool, size)?;
        if size != before {
            node.touch();
        }
        Ok(())
    }

    /// Replace the contents of the file at `path`, creating it if needed.
    /// Returns the number of bytes placed.
    pub fn write_all(&mut self, path: &str, data: &[u8]) -> VfsResult<usize> {
        match self.resolve(path) {
            Ok(_) => self.truncate(path, 0)?,
            Err(VfsError::NotFound(_)) => {
                self.create_entry(path, FileType::File)?;
            }
            Err(e) => return Err(e),
        }
        self.write_bytes(path, 0, data)
    }

    /// Move or rename `from` to `to`. The destination must not exist.
    pub fn rename_entry(&mut self, from: &str, to: &str) -> VfsResult<()> {
        let from_path = VfsPath::parse(from)?;
        let to_path = VfsPath::parse(to)?;
        if from_path.is_root() || to_path.is_root() {
            return Err(VfsError::invalid_path("cannot rename /"));
        }

        let node = self.tree.resolve(&from_path)?;
        if from_path == to_path {
            return Ok(());
        }
        if to_path.starts_with(&from_path) {
            return Err(VfsError::invalid_path(format!(
                "cannot move {from_path} beneath itself"
            )));
        }

        let (new_parent, new_name) = self.tree.resolve_parent(&to_path)?;
        self.tree
            .relink(node, new_parent, new_name)
            .map_err(|e| match e {
                VfsError::AlreadyExists(_) => VfsError::already_exists(to_path.to_string()),
                other => other,
            })?;
        tracing::debug!(from = %from_path, to = %to_path, "renamed");
        Ok(())
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    fn resolve(&self, path: &str) -> VfsResult<NodeId> {
        self.tree.resolve(&VfsPath::parse(path)?)
    }

    fn lookup(&self, path: &str) -> VfsResult<(NodeId, &Node)> {
        let id = self.resolve(path)?;
        let node = self.tree.get(id).ok_or_else(|| VfsError::not_found(path))?;
        Ok((id, node))
    }
}
