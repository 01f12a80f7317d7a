//! Arena-backed directory tree.
//!
//! Nodes live in a slot table and refer to each other by [`NodeId`]. A
//! directory points at its newest child; children are chained through
//! `next_sibling`. Removing a subtree detaches it from its parent's chain,
//! hands every descendant's chunks back to the pool and returns the slots to
//! a free list for reuse.

use std::time::SystemTime;

use crate::extent::ExtentChain;
use crate::namespace::path::VfsPath;
use crate::storage::StoragePool;
use crate::vfs::{FileType, VfsError, VfsResult};

/// Index of a node in the tree's slot table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub const ROOT: NodeId = NodeId(0);
}

/// What a node is, and what only that kind of node carries.
#[derive(Debug, Clone)]
pub enum NodeBody {
    Directory { first_child: Option<NodeId> },
    File { extents: ExtentChain },
}

/// A file or directory.
#[derive(Debug, Clone)]
pub struct Node {
    name: String,
    parent: Option<NodeId>,
    next_sibling: Option<NodeId>,
    modified_at: SystemTime,
    body: NodeBody,
}

impl Node {
    pub fn directory(name: impl Into<String>) -> Self {
        Self::with_body(name, NodeBody::Directory { first_child: None })
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self::with_body(
            name,
            NodeBody::File {
                extents: ExtentChain::new(),
            },
        )
    }

    /// A fresh node of the given kind.
    pub fn new(name: impl Into<String>, kind: FileType) -> Self {
        match kind {
            FileType::Directory => Self::directory(name),
            FileType::File => Self::file(name),
        }
    }

    fn with_body(name: impl Into<String>, body: NodeBody) -> Self {
        Self {
            name: name.into(),
            parent: None,
            next_sibling: None,
            modified_at: SystemTime::now(),
            body,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FileType {
        match self.body {
            NodeBody::Directory { .. } => FileType::Directory,
            NodeBody::File { .. } => FileType::File,
        }
    }

    pub fn is_dir(&self) -> bool {
        matches!(self.body, NodeBody::Directory { .. })
    }

    /// File size; always 0 for directories.
    pub fn size(&self) -> u64 {
        self.extents().map_or(0, ExtentChain::size)
    }

    pub fn modified_at(&self) -> SystemTime {
        self.modified_at
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn extents(&self) -> Option<&ExtentChain> {
        match &self.body {
            NodeBody::File { extents } => Some(extents),
            NodeBody::Directory { .. } => None,
        }
    }

    pub fn extents_mut(&mut self) -> Option<&mut ExtentChain> {
        match &mut self.body {
            NodeBody::File { extents } => Some(extents),
            NodeBody::Directory { .. } => None,
        }
    }

    pub fn touch(&mut self) {
        self.modified_at = SystemTime::now();
    }

    fn first_child(&self) -> Option<NodeId> {
        match self.body {
            NodeBody::Directory { first_child } => first_child,
            NodeBody::File { .. } => None,
        }
    }

    fn set_first_child(&mut self, child: Option<NodeId>) {
        if let NodeBody::Directory { first_child } = &mut self.body {
            *first_child = child;
        }
    }
}

/// The namespace: a root directory and everything reachable from it.
#[derive(Debug)]
pub struct NamespaceTree {
    slots: Vec<Option<Node>>,
    free_slots: Vec<usize>,
    live: usize,
}

impl Default for NamespaceTree {
    fn default() -> Self {
        Self::new()
    }
}

impl NamespaceTree {
    /// A tree holding only the root directory `/`.
    pub fn new() -> Self {
        Self {
            slots: vec![Some(Node::directory("/"))],
            free_slots: Vec::new(),
            live: 1,
        }
    }

    pub fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.slots.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots.get_mut(id.0).and_then(Option::as_mut)
    }

    fn node(&self, id: NodeId) -> VfsResult<&Node> {
        self.get(id)
            .ok_or_else(|| VfsError::not_found(format!("stale node {}", id.0)))
    }

    fn node_mut(&mut self, id: NodeId) -> VfsResult<&mut Node> {
        self.get_mut(id)
            .ok_or_else(|| VfsError::not_found(format!("stale node {}", id.0)))
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// The node at `path`, walking one segment per level from the root.
    pub fn resolve(&self, path: &VfsPath<'_>) -> VfsResult<NodeId> {
        let mut current = self.root();
        for (depth, segment) in path.segments().iter().enumerate() {
            if !self.node(current)?.is_dir() {
                return Err(VfsError::not_a_directory(prefix_of(path, depth)));
            }
            current = self
                .find_child(current, segment)
                .ok_or_else(|| VfsError::not_found(prefix_of(path, depth + 1)))?;
        }
        Ok(current)
    }

    /// The directory that holds (or would hold) `path`, and the leaf name.
    pub fn resolve_parent<'p>(&self, path: &VfsPath<'p>) -> VfsResult<(NodeId, &'p str)> {
        let leaf = path
            .leaf_name()
            .ok_or_else(|| VfsError::invalid_path("/ has no parent"))?;
        let parent_path = path.parent_path();
        let parent = self.resolve(&parent_path)?;
        if !self.node(parent)?.is_dir() {
            return Err(VfsError::not_a_directory(parent_path.to_string()));
        }
        Ok((parent, leaf))
    }

    pub fn find_child(&self, dir: NodeId, name: &str) -> Option<NodeId> {
        self.list_children(dir)
            .find(|&id| self.get(id).is_some_and(|n| n.name == name))
    }

    /// Children of `dir`, newest first. Empty for files.
    pub fn list_children(&self, dir: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.get(dir).and_then(Node::first_child),
        }
    }

    /// True if `node` is `ancestor` or lies beneath it.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.get(id).and_then(Node::parent);
        }
        false
    }

    // ========================================================================
    // Mutation
    // ========================================================================

    /// Link `node` as the newest child of `parent`.
    pub fn insert_child(&mut self, parent: NodeId, node: Node) -> VfsResult<NodeId> {
        self.check_insertable(parent, &node.name, None)?;
        let id = self.alloc_slot(node);
        self.link_head(parent, id)?;
        Ok(id)
    }

    /// Unlink `name` from `parent` and release it with all descendants,
    /// returning their chunks to `pool`. Returns the number of nodes removed.
    pub fn remove_subtree(
        &mut self,
        parent: NodeId,
        name: &str,
        pool: &mut StoragePool,
    ) -> VfsResult<usize> {
        let child = self
            .find_child(parent, name)
            .ok_or_else(|| VfsError::not_found(name))?;
        self.unlink(child)?;

        let mut removed = 0;
        let mut stack = vec![child];
        while let Some(id) = stack.pop() {
            let Some(mut node) = self.release(id) else {
                continue;
            };
            removed += 1;
            stack.extend(node.next_sibling);
            stack.extend(node.first_child());
            if let Some(extents) = node.extents_mut() {
                for chunk in extents.take_chunks() {
                    pool.free(chunk);
                }
            }
        }
        Ok(removed)
    }

    /// Move `node` under `new_parent` as `new_name`, making it the newest child.
    pub fn relink(&mut self, node: NodeId, new_parent: NodeId, new_name: &str) -> VfsResult<()> {
        if node == self.root() {
            return Err(VfsError::invalid_path("cannot move /"));
        }
        if self.is_within(new_parent, node) {
            return Err(VfsError::invalid_path(format!(
                "cannot move {new_name} beneath itself"
            )));
        }
        self.check_insertable(new_parent, new_name, Some(node))?;

        self.unlink(node)?;
        let moved = self.node_mut(node)?;
        moved.name = new_name.to_string();
        moved.touch();
        self.link_head(new_parent, node)
    }

    fn check_insertable(&self, parent: NodeId, name: &str, moving: Option<NodeId>) -> VfsResult<()> {
        if !self.node(parent)?.is_dir() {
            return Err(VfsError::not_a_directory(self.node(parent)?.name.clone()));
        }
        match self.find_child(parent, name) {
            Some(existing) if Some(existing) != moving => Err(VfsError::already_exists(name)),
            _ => Ok(()),
        }
    }

    fn link_head(&mut self, parent: NodeId, id: NodeId) -> VfsResult<()> {
        let head = self.node(parent)?.first_child();
        let node = self.node_mut(id)?;
        node.parent = Some(parent);
        node.next_sibling = head;
        self.node_mut(parent)?.set_first_child(Some(id));
        Ok(())
    }

    /// Cut `id` out of its parent's sibling chain.
    fn unlink(&mut self, id: NodeId) -> VfsResult<()> {
        let node = self.node(id)?;
        let next = node.next_sibling;
        let Some(parent) = node.parent else {
            return Ok(());
        };

        if self.node(parent)?.first_child() == Some(id) {
            self.node_mut(parent)?.set_first_child(next);
        } else {
            let prev = self
                .list_children(parent)
                .find(|&c| self.get(c).and_then(|n| n.next_sibling) == Some(id))
                .ok_or_else(|| {
                    VfsError::not_found(self.get(id).map_or("", |n| n.name.as_str()).to_string())
                })?;
            self.node_mut(prev)?.next_sibling = next;
        }

        let node = self.node_mut(id)?;
        node.parent = None;
        node.next_sibling = None;
        Ok(())
    }

    fn alloc_slot(&mut self, node: Node) -> NodeId {
        self.live += 1;
        match self.free_slots.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                NodeId(slot)
            }
            None => {
                self.slots.push(Some(node));
                NodeId(self.slots.len() - 1)
            }
        }
    }

    fn release(&mut self, id: NodeId) -> Option<Node> {
        let node = self.slots.get_mut(id.0)?.take()?;
        self.free_slots.push(id.0);
        self.live -= 1;
        Some(node)
    }
}

/// The first `depth` segments of `path`, for error messages.
fn prefix_of(path: &VfsPath<'_>, depth: usize) -> String {
    let mut out = String::new();
    for segment in &path.segments()[..depth] {
        out.push('/');
        out.push_str(segment);
    }
    if out.is_empty() {
        out.push('/');
    }
    out
}

/// Lazy walk along a directory's sibling chain.
pub struct Children<'a> {
    tree: &'a NamespaceTree,
    next: Option<NodeId>,
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.next?;
        self.next = self.tree.get(id).and_then(|n| n.next_sibling);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::StorageLayout;

    fn pool() -> StoragePool {
        StoragePool::new(StorageLayout::new(64 * 1024, 16 * 1024, 4096).unwrap())
    }

    fn names(tree: &NamespaceTree, dir: NodeId) -> Vec<String> {
        tree.list_children(dir)
            .map(|id| tree.get(id).unwrap().name().to_string())
            .collect()
    }

    fn resolve(tree: &NamespaceTree, path: &str) -> VfsResult<NodeId> {
        tree.resolve(&VfsPath::parse(path).unwrap())
    }

    #[test]
    fn test_root_exists() {
        let tree = NamespaceTree::new();
        let root = tree.get(tree.root()).unwrap();
        assert!(root.is_dir());
        assert_eq!(root.name(), "/");
        assert_eq!(resolve(&tree, "/").unwrap(), NodeId::ROOT);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_children_newest_first() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        tree.insert_child(root, Node::file("one")).unwrap();
        tree.insert_child(root, Node::directory("two")).unwrap();
        tree.insert_child(root, Node::file("three")).unwrap();
        assert_eq!(names(&tree, root), ["three", "two", "one"]);

        // Re-enumerable.
        assert_eq!(tree.list_children(root).count(), 3);
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        tree.insert_child(root, Node::file("same")).unwrap();
        let err = tree.insert_child(root, Node::directory("same")).unwrap_err();
        assert!(matches!(err, VfsError::AlreadyExists(_)));
        assert_eq!(tree.len(), 2);
    }

    #[test]
    fn test_resolve_nested() {
        let mut tree = NamespaceTree::new();
        let a = tree.insert_child(tree.root(), Node::directory("a")).unwrap();
        let b = tree.insert_child(a, Node::directory("b")).unwrap();
        let c = tree.insert_child(b, Node::file("c.txt")).unwrap();

        assert_eq!(resolve(&tree, "/a/b/c.txt").unwrap(), c);
        assert!(matches!(resolve(&tree, "/a/x/c.txt"), Err(VfsError::NotFound(p)) if p == "/a/x"));
        assert!(matches!(
            resolve(&tree, "/a/b/c.txt/d"),
            Err(VfsError::NotADirectory(p)) if p == "/a/b/c.txt"
        ));
    }

    #[test]
    fn test_resolve_parent() {
        let mut tree = NamespaceTree::new();
        let a = tree.insert_child(tree.root(), Node::directory("a")).unwrap();
        tree.insert_child(a, Node::file("f")).unwrap();

        let path = VfsPath::parse("/a/new").unwrap();
        assert_eq!(tree.resolve_parent(&path).unwrap(), (a, "new"));

        let path = VfsPath::parse("/a/f/new").unwrap();
        assert!(matches!(tree.resolve_parent(&path), Err(VfsError::NotADirectory(_))));

        let path = VfsPath::parse("/missing/new").unwrap();
        assert!(matches!(tree.resolve_parent(&path), Err(VfsError::NotFound(_))));
    }

    #[test]
    fn test_remove_middle_sibling() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        for name in ["a", "b", "c"] {
            tree.insert_child(root, Node::file(name)).unwrap();
        }
        let mut pool = pool();
        assert_eq!(tree.remove_subtree(root, "b", &mut pool).unwrap(), 1);
        assert_eq!(names(&tree, root), ["c", "a"]);

        assert!(matches!(
            tree.remove_subtree(root, "b", &mut pool),
            Err(VfsError::NotFound(_))
        ));
    }

    #[test]
    fn test_remove_subtree_frees_chunks_and_slots() {
        let mut tree = NamespaceTree::new();
        let mut pool = pool();
        let root = tree.root();
        let keep = tree.insert_child(root, Node::file("keep")).unwrap();
        let a = tree.insert_child(root, Node::directory("a")).unwrap();
        let b = tree.insert_child(a, Node::directory("b")).unwrap();
        let f1 = tree.insert_child(a, Node::file("f1")).unwrap();
        let f2 = tree.insert_child(b, Node::file("f2")).unwrap();

        for file in [f1, f2] {
            let chain = tree.get_mut(file).unwrap().extents_mut().unwrap();
            let at = chain.push(pool.allocate().unwrap());
            chain.extend_valid(at, 10);
        }
        assert_eq!(pool.used_chunks(), 2);

        assert_eq!(tree.remove_subtree(root, "a", &mut pool).unwrap(), 4);
        assert_eq!(pool.used_chunks(), 0);
        assert_eq!(tree.len(), 2);
        assert_eq!(names(&tree, root), ["keep"]);
        assert!(tree.get(keep).is_some());

        // Freed slots are reused.
        let reused = tree.insert_child(root, Node::file("new")).unwrap();
        assert!([a, b, f1, f2].contains(&reused));
    }

    #[test]
    fn test_relink_moves_between_directories() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let src = tree.insert_child(root, Node::directory("src")).unwrap();
        let dst = tree.insert_child(root, Node::directory("dst")).unwrap();
        let file = tree.insert_child(src, Node::file("f")).unwrap();

        tree.relink(file, dst, "g").unwrap();
        assert_eq!(names(&tree, src), Vec::<String>::new());
        assert_eq!(names(&tree, dst), ["g"]);
        assert_eq!(resolve(&tree, "/dst/g").unwrap(), file);
        assert_eq!(tree.get(file).unwrap().parent(), Some(dst));
    }

    #[test]
    fn test_relink_rejects_cycles_and_collisions() {
        let mut tree = NamespaceTree::new();
        let root = tree.root();
        let a = tree.insert_child(root, Node::directory("a")).unwrap();
        let b = tree.insert_child(a, Node::directory("b")).unwrap();
        tree.insert_child(root, Node::file("taken")).unwrap();

        assert!(matches!(tree.relink(a, b, "a"), Err(VfsError::InvalidPath(_))));
        assert!(matches!(tree.relink(a, a, "x"), Err(VfsError::InvalidPath(_))));
        assert!(matches!(tree.relink(b, root, "taken"), Err(VfsError::AlreadyExists(_))));
        assert!(matches!(tree.relink(root, a, "r"), Err(VfsError::InvalidPath(_))));

        // Renaming to its own current name is allowed.
        tree.relink(b, a, "b").unwrap();
        assert_eq!(names(&tree, a), ["b"]);
    }
}
