//! Column ordinal sets

use std::fmt;

const WORD_BITS: usize = 64;

/// Set of column ordinals, used for unique keys, group sets and equi-join columns.
///
/// Backed by 64-bit words; trailing zero words are never stored, so two masks
/// holding the same ordinals compare and hash equal regardless of how they
/// were built.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ColumnMask {
    words: Vec<u64>,
}

impl ColumnMask {
    pub fn new() -> Self {
        Self { words: Vec::new() }
    }

    pub fn singleton(bit: usize) -> Self {
        let mut mask = Self::new();
        mask.insert(bit);
        mask
    }

    /// Mask of the ordinals `start..end`.
    pub fn range(start: usize, end: usize) -> Self {
        (start..end).collect()
    }

    pub fn insert(&mut self, bit: usize) {
        let word = bit / WORD_BITS;
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        self.words[word] |= 1u64 << (bit % WORD_BITS);
    }

    pub fn remove(&mut self, bit: usize) {
        let word = bit / WORD_BITS;
        if let Some(w) = self.words.get_mut(word) {
            *w &= !(1u64 << (bit % WORD_BITS));
            self.trim();
        }
    }

    pub fn contains(&self, bit: usize) -> bool {
        self.words
            .get(bit / WORD_BITS)
            .is_some_and(|w| w & (1u64 << (bit % WORD_BITS)) != 0)
    }

    pub fn union(&self, other: &Self) -> Self {
        let len = self.words.len().max(other.words.len());
        let words = (0..len)
            .map(|i| self.word(i) | other.word(i))
            .collect();
        Self { words }
    }

    pub fn intersection(&self, other: &Self) -> Self {
        let len = self.words.len().min(other.words.len());
        let mut mask = Self {
            words: (0..len).map(|i| self.word(i) & other.word(i)).collect(),
        };
        mask.trim();
        mask
    }

    pub fn difference(&self, other: &Self) -> Self {
        let mut mask = Self {
            words: (0..self.words.len())
                .map(|i| self.word(i) & !other.word(i))
                .collect(),
        };
        mask.trim();
        mask
    }

    /// True if every ordinal of `self` is also in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.words
            .iter()
            .enumerate()
            .all(|(i, w)| w & !other.word(i) == 0)
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns a mask with every ordinal moved up by `offset`.
    pub fn shift(&self, offset: usize) -> Self {
        self.iter().map(|bit| bit + offset).collect()
    }

    /// Ordinals in ascending order.
    pub fn iter(&self) -> ColumnMaskIter<'_> {
        ColumnMaskIter {
            words: &self.words,
            index: 0,
            current: self.words.first().copied().unwrap_or(0),
        }
    }

    fn word(&self, i: usize) -> u64 {
        self.words.get(i).copied().unwrap_or(0)
    }

    fn trim(&mut self) {
        while self.words.last() == Some(&0) {
            self.words.pop();
        }
    }
}

pub struct ColumnMaskIter<'a> {
    words: &'a [u64],
    index: usize,
    current: u64,
}

impl Iterator for ColumnMaskIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        loop {
            if self.current != 0 {
                let bit = self.current.trailing_zeros() as usize;
                self.current &= self.current - 1; // clear lowest set bit
                return Some(self.index * WORD_BITS + bit);
            }
            self.index += 1;
            self.current = *self.words.get(self.index)?;
        }
    }
}

impl FromIterator<usize> for ColumnMask {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut mask = Self::new();
        for bit in iter {
            mask.insert(bit);
        }
        mask
    }
}

impl fmt::Display for ColumnMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for b in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{}", b)?;
            first = false;
        }
        write!(f, "}}")
    }
}
