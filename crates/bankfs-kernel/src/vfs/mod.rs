//! Path-based VFS surface.
//!
//! - [`VfsOps`] - the operations a mount collaborator calls
//! - [`BankFs`] - the engine behind one lock, implementing [`VfsOps`]
//! - [`VfsError`] - the error taxonomy, with errno and `io::Error` mappings
//!
//! ## Design Decisions
//!
//! - **Path-based, no handles**: every call re-resolves its path.
//! - **Explicit offset/size**: reads and writes carry both, so short reads
//!   and partial writes are visible to the caller.

mod error;
mod ops;
mod shared;
mod types;

pub use error::{VfsError, VfsResult};
pub use ops::VfsOps;
pub use shared::BankFs;
pub use types::{DirEntry, FileAttr, FileType, StatFs};
