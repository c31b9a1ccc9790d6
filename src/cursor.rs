/// A position inside a [`HashTable`](crate::HashTable) or
/// [`HashMap`](crate::HashMap).
///
/// A cursor is a plain `(bucket, slot)` coordinate: it does not borrow the
/// container, so it stays usable across mutations and is resolved again by
/// the container on each access. Two cursors are equal iff both coordinates
/// are equal. Only cursors taken from the same container may be compared.
///
/// Cursors remain valid across insertions that do not grow the table and
/// across erasure of any other entry. Erasing an entry leaves its slot empty
/// instead of moving the rest of its chain, so only the erased entry's cursor
/// goes stale.
///
/// Rehashing, `clear` and `drain` invalidate every cursor. Debug builds tag
/// cursors with the owning table and its generation, and assert on stale or
/// foreign use.
#[derive(Clone, Copy, Debug)]
pub struct Cursor {
    pub(crate) bucket: usize,
    pub(crate) slot: usize,
    #[cfg(debug_assertions)]
    pub(crate) table: u32,
    #[cfg(debug_assertions)]
    pub(crate) generation: u32,
}

impl Cursor {
    const END_BUCKET: usize = usize::MAX;

    #[inline]
    pub(crate) fn new(bucket: usize, slot: usize, _table: u32, _generation: u32) -> Self {
        Self {
            bucket,
            slot,
            #[cfg(debug_assertions)]
            table: _table,
            #[cfg(debug_assertions)]
            generation: _generation,
        }
    }

    #[inline]
    pub(crate) fn end(_table: u32, _generation: u32) -> Self {
        Self::new(Self::END_BUCKET, 0, _table, _generation)
    }

    /// Returns `true` if this is the end sentinel.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.bucket == Self::END_BUCKET
    }

    /// The bucket this cursor points into, or `None` for the end sentinel.
    #[inline]
    pub fn bucket(&self) -> Option<usize> {
        (!self.is_end()).then_some(self.bucket)
    }

    /// Position inside the bucket's chain.
    #[inline]
    pub fn slot(&self) -> usize {
        self.slot
    }
}

impl PartialEq for Cursor {
    fn eq(&self, other: &Self) -> bool {
        #[cfg(debug_assertions)]
        debug_assert_eq!(
            self.table, other.table,
            "compared cursors from different tables"
        );
        self.bucket == other.bucket && self.slot == other.slot
    }
}

impl Eq for Cursor {}
