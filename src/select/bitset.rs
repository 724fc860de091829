//! Fixed-size membership set over entry indices.

use super::SelectError;

const WORD_BITS: usize = u64::BITS as usize;

/// One bit per archive entry, sized once at creation.
///
/// The set never grows or shrinks: its length is the entry count of the
/// archive it was built for. Bits are only ever set, never cleared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MembershipSet {
    words: Vec<u64>,
    len: usize,
}

impl MembershipSet {
    /// Create a set for `len` entries, all unmarked.
    ///
    /// # Errors
    ///
    /// Returns [`SelectError::Allocation`] if storage for `len` bits
    /// cannot be obtained.
    pub fn try_new(len: usize) -> Result<Self, SelectError> {
        let nwords = len.div_ceil(WORD_BITS);
        let mut words = Vec::new();
        words
            .try_reserve_exact(nwords)
            .map_err(|source| SelectError::Allocation {
                what: "membership set",
                source,
            })?;
        words.resize(nwords, 0);
        Ok(Self { words, len })
    }

    /// Number of entries this set covers.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Mark every index `0..len`.
    pub fn mark_all(&mut self) {
        self.words.fill(u64::MAX);
        let tail = self.len % WORD_BITS;
        if tail != 0
            && let Some(last) = self.words.last_mut()
        {
            *last = (1u64 << tail) - 1;
        }
    }

    /// Mark a single index.
    ///
    /// # Panics
    ///
    /// Panics if `index` is not below [`len()`](Self::len). Indices must come
    /// from the archive the set was created for.
    pub fn mark(&mut self, index: usize) {
        assert!(
            index < self.len,
            "entry index {index} out of range for membership set of {} entries",
            self.len
        );
        self.words[index / WORD_BITS] |= 1u64 << (index % WORD_BITS);
    }

    /// Whether `index` is marked. Out-of-range indices are never marked.
    pub fn is_marked(&self, index: usize) -> bool {
        index < self.len && self.words[index / WORD_BITS] & (1u64 << (index % WORD_BITS)) != 0
    }

    /// Number of marked indices.
    pub fn count(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Marked indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        (0..self.len).filter(move |&i| self.is_marked(i))
    }
}
