//! Used/free tracking, one bit per chunk.

/// Fixed-length bitmap with a running count of set bits.
#[derive(Debug, Clone)]
pub struct ChunkBitmap {
    words: Vec<u64>,
    len: usize,
    used: usize,
}

impl ChunkBitmap {
    /// A bitmap of `len` clear bits.
    pub fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(64)],
            len,
            used: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn used(&self) -> usize {
        self.used
    }

    pub fn free(&self) -> usize {
        self.len - self.used
    }

    pub fn get(&self, index: usize) -> bool {
        index < self.len && self.words[index / 64] & (1u64 << (index % 64)) != 0
    }

    /// Set a bit. Returns false if it was already set or out of range.
    pub fn set(&mut self, index: usize) -> bool {
        if index >= self.len || self.get(index) {
            return false;
        }
        self.words[index / 64] |= 1u64 << (index % 64);
        self.used += 1;
        true
    }

    /// Clear a bit. Returns false if it was already clear or out of range.
    pub fn clear(&mut self, index: usize) -> bool {
        if !self.get(index) {
            return false;
        }
        self.words[index / 64] &= !(1u64 << (index % 64));
        self.used -= 1;
        true
    }

    /// Lowest clear bit, scanning from index 0.
    pub fn first_clear(&self) -> Option<usize> {
        if self.used == self.len {
            return None;
        }
        self.words
            .iter()
            .enumerate()
            .find(|(_, word)| **word != u64::MAX)
            .map(|(i, word)| i * 64 + word.trailing_ones() as usize)
            .filter(|&index| index < self.len)
    }
}
