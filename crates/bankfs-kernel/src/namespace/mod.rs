//! The directory hierarchy and path resolution.

mod path;
mod tree;

pub use path::{MAX_NAME_LEN, VfsPath};
pub use tree::{Children, NamespaceTree, Node, NodeBody, NodeId};
