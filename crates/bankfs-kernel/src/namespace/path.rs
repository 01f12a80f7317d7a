//! Absolute path parsing.
//!
//! `/a//b/` parses to the segments `["a", "b"]`: empty segments from repeated
//! or trailing slashes are dropped. `.` and `..` are not interpreted here and
//! are refused, so they can never end up stored as names.

use std::fmt;

use crate::vfs::{VfsError, VfsResult};

/// Longest accepted path segment, in bytes.
pub const MAX_NAME_LEN: usize = 1023;

/// A parsed absolute path, borrowing its segments from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VfsPath<'a> {
    segments: Vec<&'a str>,
}

impl<'a> VfsPath<'a> {
    /// Parse an absolute, slash-separated path.
    pub fn parse(raw: &'a str) -> VfsResult<Self> {
        if !raw.starts_with('/') {
            return Err(VfsError::invalid_path(format!("not absolute: {raw:?}")));
        }

        let mut segments = Vec::new();
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            if segment == "." || segment == ".." {
                return Err(VfsError::invalid_path(raw));
            }
            if segment.len() > MAX_NAME_LEN {
                return Err(VfsError::NameTooLong(segment.to_string()));
            }
            segments.push(segment);
        }
        Ok(Self { segments })
    }

    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[&'a str] {
        &self.segments
    }

    /// Last segment; `None` for `/`.
    pub fn leaf_name(&self) -> Option<&'a str> {
        self.segments.last().copied()
    }

    /// All segments but the last. The parent of `/` is `/`.
    pub fn parent_path(&self) -> VfsPath<'a> {
        let end = self.segments.len().saturating_sub(1);
        Self {
            segments: self.segments[..end].to_vec(),
        }
    }

    /// True if `self` equals `prefix` or lies beneath it.
    pub fn starts_with(&self, prefix: &VfsPath<'_>) -> bool {
        self.segments.len() >= prefix.segments.len()
            && self.segments.iter().zip(&prefix.segments).all(|(a, b)| a == b)
    }
}

impl fmt::Display for VfsPath<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return f.write_str("/");
        }
        for segment in &self.segments {
            write!(f, "/{segment}")?;
        }
        Ok(())
    }
}
