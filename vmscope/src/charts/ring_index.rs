//! Logical-to-physical index translation for the row ring.
//!
//! All modular arithmetic of the store lives here. The backing arrays grow in
//! steps until `limit` slots exist; after that the oldest slot is overwritten
//! and `head` (the physical slot of logical row 0) moves forward.

/// Where the next row goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Advance {
    /// An already allocated, never used slot.
    Free(usize),
    /// Backing arrays must first be resized to `allocated` slots.
    Grow { allocated: usize, slot: usize },
    /// The ring is full; the oldest row at `slot` is replaced.
    Overwrite(usize),
}

#[derive(Debug, Clone)]
pub(crate) struct RingIndex {
    head: usize,
    len: usize,
    allocated: usize,
    limit: usize,
    step: usize,
}

impl RingIndex {
    pub(crate) fn new(limit: usize, step: usize) -> Self {
        Self { head: 0, len: 0, allocated: 0, limit, step }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn allocated(&self) -> usize {
        self.allocated
    }

    pub(crate) fn is_full(&self) -> bool {
        self.len == self.limit
    }

    /// Physical slot of a logical row (0 = oldest), or `None` past the end.
    pub(crate) fn physical(&self, logical: usize) -> Option<usize> {
        if logical >= self.len {
            return None;
        }
        let slot = self.head + logical;
        Some(if slot >= self.len { slot - self.len } else { slot })
    }

    /// Reserve the slot for one more row and update the bookkeeping.
    pub(crate) fn advance(&mut self) -> Advance {
        if self.len < self.allocated {
            let slot = self.len;
            self.len += 1;
            return Advance::Free(slot);
        }

        if self.allocated < self.limit {
            // Growth changes the physical layout, so rotation restarts at 0.
            // While growing the ring has never wrapped, so no row moves.
            self.allocated += self.step.min(self.limit - self.allocated);
            self.head = 0;
            let slot = self.len;
            self.len += 1;
            return Advance::Grow { allocated: self.allocated, slot };
        }

        let slot = self.head;
        self.head += 1;
        if self.head == self.limit {
            self.head = 0;
        }
        Advance::Overwrite(slot)
    }

    pub(crate) fn clear(&mut self) {
        self.head = 0;
        self.len = 0;
        self.allocated = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_grows_in_steps_until_limit() {
        let mut ring = RingIndex::new(5, 2);
        assert_eq!(ring.advance(), Advance::Grow { allocated: 2, slot: 0 });
        assert_eq!(ring.advance(), Advance::Free(1));
        assert_eq!(ring.advance(), Advance::Grow { allocated: 4, slot: 2 });
        assert_eq!(ring.advance(), Advance::Free(3));
        // Last step is clamped to the limit
        assert_eq!(ring.advance(), Advance::Grow { allocated: 5, slot: 4 });
        assert!(ring.is_full());
    }

    #[test]
    fn test_overwrite_wraps_head() {
        let mut ring = RingIndex::new(3, 3);
        for _ in 0..3 {
            ring.advance();
        }
        assert_eq!(ring.advance(), Advance::Overwrite(0));
        assert_eq!(ring.advance(), Advance::Overwrite(1));
        assert_eq!(ring.advance(), Advance::Overwrite(2));
        assert_eq!(ring.advance(), Advance::Overwrite(0));
        assert_eq!(ring.len(), 3);
        assert_eq!(ring.allocated(), 3);
    }

    #[test]
    fn test_physical_follows_head() {
        let mut ring = RingIndex::new(3, 3);
        for _ in 0..4 {
            ring.advance();
        }
        // Slot 0 now holds the newest row, slot 1 the oldest
        assert_eq!(ring.physical(0), Some(1));
        assert_eq!(ring.physical(1), Some(2));
        assert_eq!(ring.physical(2), Some(0));
        assert_eq!(ring.physical(3), None);
    }

    #[test]
    fn test_clear_forgets_everything() {
        let mut ring = RingIndex::new(2, 1);
        ring.advance();
        ring.advance();
        ring.advance();
        ring.clear();
        assert_eq!(ring.len(), 0);
        assert_eq!(ring.allocated(), 0);
        assert_eq!(ring.advance(), Advance::Grow { allocated: 1, slot: 0 });
    }
}
