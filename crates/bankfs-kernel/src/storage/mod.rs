//! Chunk-addressed storage.
//!
//! - [`StorageLayout`] - bank/chunk geometry and offset arithmetic
//! - [`StoragePool`] - the banks themselves plus the used/free bitmap
//!
//! Allocation is first-fit in ascending chunk order. There is no free list
//! and no best-fit search; `allocate` scans the bitmap.

mod bitmap;
mod layout;
mod pool;

pub use bitmap::ChunkBitmap;
pub use layout::{ChunkIndex, StorageLayout};
pub use pool::StoragePool;
