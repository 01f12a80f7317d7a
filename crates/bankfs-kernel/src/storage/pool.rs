//! The bank-backed chunk pool.

use crate::storage::bitmap::ChunkBitmap;
use crate::storage::layout::{ChunkIndex, StorageLayout};
use crate::vfs::{VfsError, VfsResult};

/// Fixed-capacity pool of chunks grouped into banks.
///
/// Banks are allocated once, zeroed, when the pool is built and live as long
/// as the pool. The bitmap is private: the only way to flip a chunk between
/// free and used is [`allocate`](Self::allocate) / [`free`](Self::free).
///
/// Chunk reads and writes copy straight between the caller's slice and the
/// bank, so there is no staging buffer to share between callers.
pub struct StoragePool {
    layout: StorageLayout,
    banks: Vec<Box<[u8]>>,
    bitmap: ChunkBitmap,
}

impl std::fmt::Debug for StoragePool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoragePool")
            .field("layout", &self.layout)
            .field("used_chunks", &self.bitmap.used())
            .field("free_chunks", &self.bitmap.free())
            .finish()
    }
}

impl StoragePool {
    pub fn new(layout: StorageLayout) -> Self {
        let banks = (0..layout.bank_count())
            .map(|_| vec![0u8; layout.bank_size()].into_boxed_slice())
            .collect();
        Self {
            layout,
            banks,
            bitmap: ChunkBitmap::new(layout.total_chunks() as usize),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn total_chunks(&self) -> u32 {
        self.layout.total_chunks()
    }

    pub fn free_chunks(&self) -> u32 {
        self.bitmap.free() as u32
    }

    pub fn used_chunks(&self) -> u32 {
        self.bitmap.used() as u32
    }

    pub fn is_allocated(&self, chunk: ChunkIndex) -> bool {
        self.bitmap.get(chunk.as_usize())
    }

    /// Claim the lowest-numbered free chunk.
    pub fn allocate(&mut self) -> VfsResult<ChunkIndex> {
        let Some(index) = self.bitmap.first_clear() else {
            tracing::warn!(
                total = self.layout.total_chunks(),
                "storage pool exhausted"
            );
            return Err(VfsError::OutOfSpace);
        };
        self.bitmap.set(index);
        let chunk = ChunkIndex::new(index as u32);
        tracing::trace!(%chunk, "allocated");
        Ok(chunk)
    }

    /// Return a chunk to the pool. Freeing a free chunk does nothing.
    pub fn free(&mut self, chunk: ChunkIndex) {
        if self.bitmap.clear(chunk.as_usize()) {
            tracing::trace!(%chunk, "freed");
        }
    }

    /// Copy `buf.len()` bytes out of a chunk starting at `offset`.
    pub fn read_chunk(&self, chunk: ChunkIndex, offset: usize, buf: &mut [u8]) -> VfsResult<()> {
        let range = self.chunk_range(chunk, offset, buf.len())?;
        let (bank, _) = self.layout.locate(chunk);
        buf.copy_from_slice(&self.banks[bank][range]);
        Ok(())
    }

    /// Copy `data` into a chunk starting at `offset`.
    pub fn write_chunk(&mut self, chunk: ChunkIndex, offset: usize, data: &[u8]) -> VfsResult<()> {
        let range = self.chunk_range(chunk, offset, data.len())?;
        let (bank, _) = self.layout.locate(chunk);
        self.banks[bank][range].copy_from_slice(data);
        Ok(())
    }

    /// Byte range inside the owning bank, bounds-checked against the chunk.
    fn chunk_range(
        &self,
        chunk: ChunkIndex,
        offset: usize,
        len: usize,
    ) -> VfsResult<std::ops::Range<usize>> {
        if chunk.get() >= self.layout.total_chunks() {
            return Err(VfsError::invalid_offset(format!("{chunk} is outside the pool")));
        }
        let end = offset
            .checked_add(len)
            .filter(|&end| end <= self.layout.chunk_size())
            .ok_or_else(|| {
                VfsError::invalid_offset(format!(
                    "{chunk}: {len} bytes at {offset} exceed chunk size {}",
                    self.layout.chunk_size()
                ))
            })?;
        let (_, base) = self.layout.locate(chunk);
        Ok(base + offset..base + end)
    }
}
