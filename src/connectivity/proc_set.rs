//! Run-time sized set of worker indices.

use std::fmt;

const WORD: usize = u64::BITS as usize;

/// Bit set over `0..width` worker indices, sized when the partition is known.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct ProcSet {
    words: Vec<u64>,
    width: usize,
}

impl ProcSet {
    pub fn new(width: usize) -> Self {
        Self {
            words: vec![0; width.div_ceil(WORD)],
            width,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn insert(&mut self, p: usize) {
        debug_assert!(p < self.width, "worker {p} outside set of width {}", self.width);
        self.words[p / WORD] |= 1 << (p % WORD);
    }

    pub fn remove(&mut self, p: usize) {
        debug_assert!(p < self.width);
        self.words[p / WORD] &= !(1 << (p % WORD));
    }

    pub fn contains(&self, p: usize) -> bool {
        p < self.width && self.words[p / WORD] & (1 << (p % WORD)) != 0
    }

    /// Number of workers in the set.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.width).filter(move |&p| self.contains(p))
    }

    /// `'0'`/`'1'` per worker, highest worker first.
    pub fn to_bit_string(&self) -> String {
        (0..self.width)
            .rev()
            .map(|p| if self.contains(p) { '1' } else { '0' })
            .collect()
    }
}

impl fmt::Debug for ProcSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
