//! Pool geometry and chunk addressing.
//!
//! A pool is `bank_count` banks of `chunks_per_bank` chunks each. Chunk
//! indices are global and ascending; the bank holding a chunk and the byte
//! offset inside that bank follow directly from the index.

use std::fmt;

use crate::config::{ConfigError, ConfigResult};

/// Global index of a chunk in the storage pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ChunkIndex(u32);

impl ChunkIndex {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub(crate) fn as_usize(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ChunkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "chunk#{}", self.0)
    }
}

/// Validated pool geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageLayout {
    chunk_size: usize,
    chunks_per_bank: usize,
    bank_count: usize,
}

impl StorageLayout {
    /// Build a layout, rejecting sizes that do not tile evenly.
    pub fn new(total_size: u64, bank_size: usize, chunk_size: usize) -> ConfigResult<Self> {
        if total_size == 0 || bank_size == 0 || chunk_size == 0 {
            return Err(ConfigError::invalid("sizes must be non-zero"));
        }
        if u32::try_from(chunk_size).is_err() {
            return Err(ConfigError::invalid(format!(
                "chunk_size {chunk_size} does not fit in 32 bits"
            )));
        }
        if bank_size % chunk_size != 0 {
            return Err(ConfigError::invalid(format!(
                "chunk_size {chunk_size} does not divide bank_size {bank_size}"
            )));
        }
        if total_size % bank_size as u64 != 0 {
            return Err(ConfigError::invalid(format!(
                "bank_size {bank_size} does not divide total_size {total_size}"
            )));
        }

        let chunks = total_size / chunk_size as u64;
        if chunks > u64::from(u32::MAX) {
            return Err(ConfigError::invalid(format!(
                "{chunks} chunks exceed the addressable chunk range"
            )));
        }
        let bank_count = usize::try_from(total_size / bank_size as u64)
            .map_err(|_| ConfigError::invalid("bank count overflows usize"))?;

        Ok(Self {
            chunk_size,
            chunks_per_bank: bank_size / chunk_size,
            bank_count,
        })
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn bank_size(&self) -> usize {
        self.chunk_size * self.chunks_per_bank
    }

    pub fn bank_count(&self) -> usize {
        self.bank_count
    }

    pub fn chunks_per_bank(&self) -> usize {
        self.chunks_per_bank
    }

    /// Total number of chunks, i.e. `total_size / chunk_size`.
    pub fn total_chunks(&self) -> u32 {
        (self.chunks_per_bank * self.bank_count) as u32
    }

    pub fn total_size(&self) -> u64 {
        self.bank_size() as u64 * self.bank_count as u64
    }

    /// Bank number and byte offset within that bank for a chunk.
    #[inline]
    pub fn locate(&self, chunk: ChunkIndex) -> (usize, usize) {
        let index = chunk.as_usize();
        (
            index / self.chunks_per_bank,
            (index % self.chunks_per_bank) * self.chunk_size,
        )
    }

    /// Position in an extent chain that holds a file offset.
    #[inline]
    pub fn extent_of(&self, file_offset: u64) -> usize {
        (file_offset / self.chunk_size as u64) as usize
    }

    /// Byte offset inside its chunk for a file offset.
    #[inline]
    pub fn within_chunk(&self, file_offset: u64) -> usize {
        (file_offset % self.chunk_size as u64) as usize
    }
}
