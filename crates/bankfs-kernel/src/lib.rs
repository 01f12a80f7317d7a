//! # bankfs-kernel
//!
//! In-memory filesystem engine over a banked, chunk-addressed storage pool.
//!
//! The engine is the fundamental primitive. It:
//! - Carves a fixed byte budget into banks and equal-sized chunks
//! - Stores file contents as ordered extent chains of those chunks
//! - Keeps the namespace as a first-child/next-sibling tree rooted at `/`
//! - Serves path-based operations through [`VfsOps`]
//!
//! Nothing is persisted; the pool lives exactly as long as the engine.

pub mod config;
pub mod extent;
pub mod fs;
pub mod io;
pub mod namespace;
pub mod storage;
pub mod vfs;

pub use config::{ConfigError, ConfigResult, StorageConfig};
pub use extent::{Extent, ExtentChain};
pub use fs::FileSystem;
pub use namespace::{NamespaceTree, NodeId, VfsPath};
pub use storage::{ChunkIndex, StorageLayout, StoragePool};
pub use vfs::{BankFs, DirEntry, FileAttr, FileType, StatFs, VfsError, VfsOps, VfsResult};
