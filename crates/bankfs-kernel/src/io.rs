//! Byte-range I/O over extent chains.
//!
//! A file offset splits into an extent position (`offset / chunk_size`) and an
//! offset inside that chunk. Reads copy out of successive extents until the
//! request is met or the chain ends. Writes overwrite or append, growing the
//! chain one chunk at a time; they never open a hole.

use crate::extent::ExtentChain;
use crate::storage::StoragePool;
use crate::vfs::{VfsError, VfsResult};

/// Read up to `len` bytes at `offset`. Short (or empty) at end of file.
pub fn read(chain: &ExtentChain, pool: &StoragePool, offset: u64, len: usize) -> VfsResult<Vec<u8>> {
    let size = chain.size();
    if offset >= size || len == 0 {
        return Ok(Vec::new());
    }

    let layout = pool.layout();
    let want = (len as u64).min(size - offset) as usize;
    let mut out = vec![0u8; want];
    let mut filled = 0;
    let mut index = layout.extent_of(offset);
    let mut within = layout.within_chunk(offset);

    while filled < want {
        let Some(extent) = chain.get(index) else {
            break;
        };
        if within >= extent.valid_length {
            break;
        }
        let n = (want - filled).min(extent.valid_length - within);
        pool.read_chunk(extent.chunk, within, &mut out[filled..filled + n])?;
        tracing::trace!(chunk = %extent.chunk, within, n, "read");
        filled += n;
        index += 1;
        within = 0;
    }

    out.truncate(filled);
    Ok(out)
}

/// Write `data` at `offset`, returning how many bytes were placed.
///
/// `offset` may be anywhere up to the current size; anything past it would
/// leave unwritten bytes behind and is rejected with `InvalidOffset`. When
/// the pool runs dry midway the bytes already placed stay, and their count
/// is returned. Running dry before the first byte is `OutOfSpace`.
pub fn write(chain: &mut ExtentChain, pool: &mut StoragePool, offset: u64, data: &[u8]) -> VfsResult<usize> {
    let size = chain.size();
    if offset > size {
        return Err(VfsError::invalid_offset(format!(
            "write at {offset} would leave a hole past end of file ({size})"
        )));
    }
    if data.is_empty() {
        return Ok(0);
    }

    let chunk_size = pool.layout().chunk_size();
    let mut index = pool.layout().extent_of(offset);
    let mut within = pool.layout().within_chunk(offset);
    let mut written = 0;

    while written < data.len() {
        if index == chain.len() {
            match pool.allocate() {
                Ok(chunk) => {
                    chain.push(chunk);
                }
                Err(VfsError::OutOfSpace) if written > 0 => {
                    tracing::debug!(written, requested = data.len(), "partial write, pool exhausted");
                    break;
                }
                Err(e) => return Err(e),
            }
        }

        let Some(extent) = chain.get(index).copied() else {
            break;
        };
        if within > extent.valid_length {
            return Err(VfsError::invalid_offset(format!(
                "offset {within} is past the {} valid bytes of {}",
                extent.valid_length, extent.chunk
            )));
        }

        let n = (data.len() - written).min(chunk_size - within);
        pool.write_chunk(extent.chunk, within, &data[written..written + n])?;
        chain.extend_valid(index, within + n);
        tracing::trace!(chunk = %extent.chunk, within, n, "wrote");

        written += n;
        index += 1;
        within = 0;
    }

    Ok(written)
}

/// Set the file size. Shrinking releases whole chunks past the new end;
/// growing appends zeros.
pub fn truncate(chain: &mut ExtentChain, pool: &mut StoragePool, new_size: u64) -> VfsResult<()> {
    let size = chain.size();
    let chunk_size = pool.layout().chunk_size();

    if new_size < size {
        let keep = new_size.div_ceil(chunk_size as u64) as usize;
        for chunk in chain.split_off(keep) {
            pool.free(chunk);
        }
        if keep > 0 {
            let tail = new_size - (keep as u64 - 1) * chunk_size as u64;
            chain.shrink_tail(tail as usize);
        }
    } else if new_size > size {
        let zeros = vec![0u8; chunk_size];
        let mut end = size;
        while end < new_size {
            let n = (new_size - end).min(chunk_size as u64) as usize;
            let placed = write(chain, pool, end, &zeros[..n])?;
            end += placed as u64;
            if placed < n {
                return Err(VfsError::OutOfSpace);
            }
        }
    }

    Ok(())
}
