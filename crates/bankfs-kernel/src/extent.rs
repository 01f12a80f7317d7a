//! Per-file extent chains.
//!
//! A file's content is an ordered run of chunks. Every extent but the last is
//! completely filled; the last may be partial. The chain keeps the running
//! total of valid bytes so the file size never has to be recounted.

use crate::storage::ChunkIndex;

/// One chunk's share of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub chunk: ChunkIndex,
    /// Bytes of the chunk that belong to the file.
    pub valid_length: usize,
}

/// Ordered chunk list for one file.
#[derive(Debug, Clone, Default)]
pub struct ExtentChain {
    extents: Vec<Extent>,
    size: u64,
}

impl ExtentChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// File size: the sum of valid lengths.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn len(&self) -> usize {
        self.extents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extents.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Extent> {
        self.extents.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Extent> {
        self.extents.iter()
    }

    pub fn chunks(&self) -> impl Iterator<Item = ChunkIndex> + '_ {
        self.extents.iter().map(|e| e.chunk)
    }

    /// Append a freshly allocated, empty extent. Returns its position.
    pub(crate) fn push(&mut self, chunk: ChunkIndex) -> usize {
        self.extents.push(Extent {
            chunk,
            valid_length: 0,
        });
        self.extents.len() - 1
    }

    /// Raise an extent's valid length to `end` if it is currently shorter.
    pub(crate) fn extend_valid(&mut self, index: usize, end: usize) {
        let extent = &mut self.extents[index];
        if end > extent.valid_length {
            self.size += (end - extent.valid_length) as u64;
            extent.valid_length = end;
        }
    }

    /// Shorten the last extent to `valid_length` bytes.
    pub(crate) fn shrink_tail(&mut self, valid_length: usize) {
        if let Some(tail) = self.extents.last_mut() {
            if valid_length < tail.valid_length {
                self.size -= (tail.valid_length - valid_length) as u64;
                tail.valid_length = valid_length;
            }
        }
    }

    /// Drop every extent from position `keep` onward, returning their chunks.
    pub(crate) fn split_off(&mut self, keep: usize) -> Vec<ChunkIndex> {
        if keep >= self.extents.len() {
            return Vec::new();
        }
        let removed = self.extents.split_off(keep);
        self.size -= removed.iter().map(|e| e.valid_length as u64).sum::<u64>();
        removed.into_iter().map(|e| e.chunk).collect()
    }

    /// Empty the chain, returning all of its chunks.
    pub(crate) fn take_chunks(&mut self) -> Vec<ChunkIndex> {
        self.split_off(0)
    }

    /// Check the chain's shape against a chunk size: all extents but the last
    /// are full, none overflows, and the cached size matches.
    pub fn is_well_formed(&self, chunk_size: usize) -> bool {
        let last = self.extents.len().saturating_sub(1);
        let shape_ok = self.extents.iter().enumerate().all(|(i, e)| {
            e.valid_length <= chunk_size && (i == last || e.valid_length == chunk_size)
        });
        let total: u64 = self.extents.iter().map(|e| e.valid_length as u64).sum();
        shape_ok && total == self.size
    }
}
