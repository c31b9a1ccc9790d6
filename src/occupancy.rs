use alloc::vec;
use alloc::vec::Vec;

const WORD_BITS: usize = u64::BITS as usize;

/// Fixed-length bitset with one bit per bucket.
///
/// Bit `i` is set iff bucket `i` holds at least one entry. The searches walk
/// whole words at a time so skipping long runs of empty buckets costs one
/// `trailing_zeros`/`leading_zeros` per 64 buckets.
#[derive(Clone, Debug)]
pub(crate) struct Occupancy {
    words: Vec<u64>,
    len: usize,
}

impl Occupancy {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            words: vec![0; len.div_ceil(WORD_BITS)],
            len,
        }
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn get(&self, index: usize) -> bool {
        debug_assert!(index < self.len);
        self.words[index / WORD_BITS] & (1 << (index % WORD_BITS)) != 0
    }

    #[inline]
    pub(crate) fn set(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.words[index / WORD_BITS] |= 1 << (index % WORD_BITS);
    }

    #[inline]
    pub(crate) fn unset(&mut self, index: usize) {
        debug_assert!(index < self.len);
        self.words[index / WORD_BITS] &= !(1 << (index % WORD_BITS));
    }

    /// Number of set bits.
    #[cfg_attr(not(any(test, feature = "stats")), allow(dead_code))]
    pub(crate) fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns the smallest set index that is `>= from`.
    pub(crate) fn next_set(&self, from: usize) -> Option<usize> {
        if from >= self.len {
            return None;
        }

        let mut word_index = from / WORD_BITS;
        // Mask off bits below `from` in the first word.
        let mut word = self.words[word_index] & (u64::MAX << (from % WORD_BITS));
        loop {
            if word != 0 {
                let index = word_index * WORD_BITS + word.trailing_zeros() as usize;
                // Bits past `len` are never set, so any hit is in range.
                debug_assert!(index < self.len);
                return Some(index);
            }

            word_index += 1;
            if word_index == self.words.len() {
                return None;
            }
            word = self.words[word_index];
        }
    }

    /// Returns the largest set index that is `<= from`.
    pub(crate) fn prev_set(&self, from: usize) -> Option<usize> {
        if self.len == 0 {
            return None;
        }

        let from = from.min(self.len - 1);
        let mut word_index = from / WORD_BITS;
        let shift = WORD_BITS - 1 - from % WORD_BITS;
        // Mask off bits above `from` in the first word.
        let mut word = self.words[word_index] & (u64::MAX >> shift);
        loop {
            if word != 0 {
                return Some(word_index * WORD_BITS + (WORD_BITS - 1 - word.leading_zeros() as usize));
            }

            if word_index == 0 {
                return None;
            }
            word_index -= 1;
            word = self.words[word_index];
        }
    }
}
