use alloc::vec::Vec;
use core::fmt::Debug;
use core::iter::FusedIterator;
use core::marker::PhantomData;

use tracing::debug;
use tracing::trace;
use tracing::warn;

use crate::cursor::Cursor;
use crate::error::Error;
use crate::occupancy::Occupancy;

/// Bucket count used by `new()`, `Default` and `clear()`.
pub const DEFAULT_BUCKET_COUNT: usize = 1 << 10;

/// Max load factor of a freshly constructed table.
pub const DEFAULT_MAX_LOAD_FACTOR: f32 = 1.0;

/// Chain lengths at or above this value share the last histogram bin.
#[cfg(any(test, feature = "stats"))]
pub const CHAIN_HISTOGRAM_BINS: usize = 16;

/// Entries colliding in one bucket, each stored with its full hash.
///
/// Erasing an entry leaves a hole so every other entry keeps its slot, which
/// keeps cursors to them valid. Trailing holes are trimmed, insertion fills
/// the first hole, and rehashing compacts.
#[derive(Clone)]
struct Bucket<V> {
    slots: Vec<Option<(u64, V)>>,
    live: usize,
}

impl<V> Default for Bucket<V> {
    fn default() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
        }
    }
}

impl<V> Bucket<V> {
    #[inline]
    fn get(&self, slot: usize) -> Option<&(u64, V)> {
        self.slots.get(slot)?.as_ref()
    }

    #[inline]
    fn get_mut(&mut self, slot: usize) -> Option<&mut (u64, V)> {
        self.slots.get_mut(slot)?.as_mut()
    }

    fn occupied(&self, slot: usize) -> &(u64, V) {
        match self.get(slot) {
            Some(entry) => entry,
            None => unreachable!("occupied entry refers to an empty slot"),
        }
    }

    fn occupied_mut(&mut self, slot: usize) -> &mut (u64, V) {
        match self.get_mut(slot) {
            Some(entry) => entry,
            None => unreachable!("occupied entry refers to an empty slot"),
        }
    }

    /// First live slot at or after `from`.
    fn next_live(&self, from: usize) -> Option<usize> {
        self.slots
            .get(from..)?
            .iter()
            .position(Option::is_some)
            .map(|offset| from + offset)
    }

    fn position(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<usize> {
        self.slots
            .iter()
            .position(|slot| matches!(slot, Some((h, value)) if *h == hash && eq(value)))
    }

    fn insert(&mut self, hash: u64, value: V) -> usize {
        self.live += 1;
        match self.slots.iter().position(Option::is_none) {
            Some(slot) => {
                self.slots[slot] = Some((hash, value));
                slot
            }
            None => {
                self.slots.push(Some((hash, value)));
                self.slots.len() - 1
            }
        }
    }

    fn take(&mut self, slot: usize) -> Option<(u64, V)> {
        let entry = self.slots.get_mut(slot)?.take()?;
        self.live -= 1;
        while matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
        Some(entry)
    }
}

fn empty_buckets<V>(count: usize) -> Vec<Bucket<V>> {
    let mut buckets = Vec::with_capacity(count);
    buckets.resize_with(count, Bucket::default);
    buckets
}

/// Largest bucket array that can be allocated at all.
fn max_bucket_count<V>() -> usize {
    isize::MAX as usize / core::mem::size_of::<Bucket<V>>()
}

#[inline(always)]
fn bucket_for(hash: u64, bucket_count: usize) -> usize {
    (hash % bucket_count as u64) as usize
}

#[cfg(debug_assertions)]
fn next_table_id() -> u32 {
    use core::sync::atomic::AtomicU32;
    use core::sync::atomic::Ordering;

    static NEXT_TABLE_ID: AtomicU32 = AtomicU32::new(0);
    NEXT_TABLE_ID.fetch_add(1, Ordering::Relaxed)
}

#[cfg(not(debug_assertions))]
#[inline(always)]
fn next_table_id() -> u32 {
    0
}

/// Debug statistics for a [`HashTable`].
///
/// Available in tests or with the `stats` feature.
#[cfg(any(test, feature = "stats"))]
#[derive(Debug, Clone)]
pub struct DebugStats {
    /// Number of elements currently in the table
    pub populated: usize,
    /// Number of buckets in the bucket array
    pub bucket_count: usize,
    /// Number of buckets holding at least one entry
    pub occupied_buckets: usize,
    /// Length of the longest chain
    pub longest_chain: usize,
    /// Load factor (populated / bucket_count)
    pub load_factor: f64,
    /// Configured maximum load factor
    pub max_load_factor: f32,
    /// Bucket utilization (occupied_buckets / bucket_count)
    pub bucket_utilization: f64,
}

#[cfg(any(test, feature = "stats"))]
impl DebugStats {
    /// Pretty-print the debug statistics.
    #[cfg(feature = "std")]
    pub fn print(&self) {
        println!("=== Hash Table Debug Statistics ===");
        println!(
            "Population: {}/{} buckets ({:.2}% load factor, max {:.2}%)",
            self.populated,
            self.bucket_count,
            self.load_factor * 100.0,
            self.max_load_factor * 100.0
        );
        println!(
            "Bucket Usage: {}/{} ({:.2}% utilization)",
            self.occupied_buckets,
            self.bucket_count,
            self.bucket_utilization * 100.0
        );
        println!("Longest chain: {} entries", self.longest_chain);
    }
}

/// A hash table using separate chaining.
///
/// `HashTable<V>` stores values of type `V` in a bucket array where each
/// bucket owns a chain of colliding entries. Like the raw tables it is modeled
/// after, it does not hash anything itself: every operation takes the hash
/// value and an equality predicate. [`HashMap`](crate::HashMap) wraps it with
/// a key type and a hasher.
///
/// Bucket occupancy is tracked in a bitset, and the first and last occupied
/// buckets are cached, so traversal skips empty buckets and `begin()` does
/// not scan.
///
/// The table grows by doubling its bucket count before an insertion would
/// bring the load factor to or above the max load factor. It never shrinks
/// on its own.
///
/// ## Example
///
/// ```rust
/// use chain_hash::hash_table::Entry;
/// use chain_hash::hash_table::HashTable;
///
/// #[derive(Debug, PartialEq)]
/// struct Person {
///     id: u64,
///     name: String,
/// }
///
/// let mut table = HashTable::with_bucket_count(16);
///
/// // The id doubles as the hash here.
/// match table.entry(123, |p: &Person| p.id == 123) {
///     Entry::Vacant(entry) => {
///         entry.insert(Person {
///             id: 123,
///             name: "Alice".to_string(),
///         });
///     }
///     Entry::Occupied(_) => unreachable!(),
/// }
///
/// assert_eq!(table.find(123, |p| p.id == 123).map(|p| p.name.as_str()), Some("Alice"));
/// ```
pub struct HashTable<V> {
    buckets: Vec<Bucket<V>>,
    occupancy: Occupancy,

    first_occupied: Option<usize>,
    last_occupied: Option<usize>,

    populated: usize,
    max_load_factor: f32,

    // Stamped into cursors; checked in debug builds only.
    id: u32,
    generation: u32,
}

impl<V: Clone> Clone for HashTable<V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets.clone(),
            occupancy: self.occupancy.clone(),
            first_occupied: self.first_occupied,
            last_occupied: self.last_occupied,
            populated: self.populated,
            max_load_factor: self.max_load_factor,
            id: next_table_id(),
            generation: 0,
        }
    }
}

impl<V> Debug for HashTable<V> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        struct Chains<'a, V>(&'a HashTable<V>);

        impl<V> Debug for Chains<'_, V> {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                let table = self.0;
                let mut map = f.debug_map();
                let mut from = 0;
                while let Some(bucket) = table.occupancy.next_set(from) {
                    map.entry(&bucket, &table.buckets[bucket].live);
                    from = bucket + 1;
                }
                map.finish()
            }
        }

        f.debug_struct("HashTable")
            .field("populated", &self.populated)
            .field("bucket_count", &self.bucket_count())
            .field("max_load_factor", &self.max_load_factor)
            .field("first_occupied", &self.first_occupied)
            .field("last_occupied", &self.last_occupied)
            .field("chains", &Chains(self))
            .finish()
    }
}

impl<V> Default for HashTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> HashTable<V> {
    /// Creates an empty table with [`DEFAULT_BUCKET_COUNT`] buckets.
    pub fn new() -> Self {
        Self::with_bucket_count(DEFAULT_BUCKET_COUNT)
    }

    /// Creates an empty table with exactly `bucket_count` buckets.
    ///
    /// A bucket count of zero is raised to one.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let table: HashTable<String> = HashTable::with_bucket_count(100);
    /// assert_eq!(table.bucket_count(), 100);
    /// assert!(table.is_empty());
    /// ```
    pub fn with_bucket_count(bucket_count: usize) -> Self {
        let bucket_count = bucket_count.max(1);
        Self {
            buckets: empty_buckets(bucket_count),
            occupancy: Occupancy::new(bucket_count),
            first_occupied: None,
            last_occupied: None,
            populated: 0,
            max_load_factor: DEFAULT_MAX_LOAD_FACTOR,
            id: next_table_id(),
            generation: 0,
        }
    }

    /// Returns `true` if the table contains no elements.
    pub fn is_empty(&self) -> bool {
        self.populated == 0
    }

    /// Returns the number of elements in the table.
    pub fn len(&self) -> usize {
        self.populated
    }

    /// Returns the number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Returns the bucket a hash value resolves to.
    #[inline]
    pub fn bucket_index(&self, hash: u64) -> usize {
        bucket_for(hash, self.bucket_count())
    }

    /// Returns the number of entries chained in bucket `index`.
    ///
    /// # Errors
    ///
    /// [`Error::BucketIndexOutOfRange`] if `index >= self.bucket_count()`.
    pub fn bucket_len(&self, index: usize) -> Result<usize, Error> {
        self.buckets
            .get(index)
            .map(|bucket| bucket.live)
            .ok_or(Error::BucketIndexOutOfRange {
                index,
                bucket_count: self.bucket_count(),
            })
    }

    /// Lowest index of a non-empty bucket, or `None` when empty.
    pub fn first_occupied(&self) -> Option<usize> {
        self.first_occupied
    }

    /// Highest index of a non-empty bucket, or `None` when empty.
    pub fn last_occupied(&self) -> Option<usize> {
        self.last_occupied
    }

    /// Current load factor: `len / bucket_count`.
    pub fn load_factor(&self) -> f32 {
        self.populated as f32 / self.bucket_count() as f32
    }

    /// The load factor the table stays strictly below.
    pub fn max_load_factor(&self) -> f32 {
        self.max_load_factor
    }

    /// Sets the max load factor, growing the table if its current load
    /// already meets or exceeds the new limit.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLoadFactor`] if `factor` is not finite, not strictly
    /// positive, or so small that the bucket count needed for one more entry
    /// cannot be allocated. The table is left unchanged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_bucket_count(8);
    /// for i in 0..6u64 {
    ///     table.insert_unique(i, i);
    /// }
    ///
    /// table.set_max_load_factor(0.5).unwrap();
    /// assert_eq!(table.bucket_count(), 16);
    /// assert!(table.set_max_load_factor(0.0).is_err());
    /// assert!(table.set_max_load_factor(1e-30).is_err());
    /// assert_eq!(table.max_load_factor(), 0.5);
    /// ```
    pub fn set_max_load_factor(&mut self, factor: f32) -> Result<(), Error> {
        if !factor.is_finite() || factor <= 0.0 {
            return Err(Error::InvalidLoadFactor(factor));
        }

        let previous = core::mem::replace(&mut self.max_load_factor, factor);
        let target = match self.grown_bucket_count(self.populated.saturating_add(1)) {
            Some(_) => self.grown_bucket_count(self.populated),
            None => None,
        };
        let Some(target) = target else {
            self.max_load_factor = previous;
            return Err(Error::InvalidLoadFactor(factor));
        };

        debug!(from = previous, to = factor, "max load factor changed");
        self.rehash(target);
        Ok(())
    }

    /// Smallest doubling of the current bucket count that keeps `len` entries
    /// strictly below the max load factor, or `None` if that bucket array
    /// could never be allocated.
    fn grown_bucket_count(&self, len: usize) -> Option<usize> {
        let max_load = f64::from(self.max_load_factor);
        let limit = max_bucket_count::<V>();
        let mut count = self.bucket_count();
        while len as f64 >= max_load * count as f64 {
            count = count.checked_mul(2).filter(|&next| next <= limit)?;
        }
        Some(count)
    }

    /// Rebuilds the table with `bucket_count` buckets.
    ///
    /// Does nothing unless `bucket_count` exceeds the current bucket count.
    /// Entries are moved in bucket order, then chain order, so the resulting
    /// layout is deterministic and free of holes. Invalidates every cursor.
    pub fn rehash(&mut self, bucket_count: usize) {
        if bucket_count <= self.bucket_count() {
            return;
        }

        debug!(
            from = self.bucket_count(),
            to = bucket_count,
            len = self.populated,
            "rehashing"
        );

        let old = core::mem::replace(&mut self.buckets, empty_buckets(bucket_count));
        self.occupancy = Occupancy::new(bucket_count);
        self.first_occupied = None;
        self.last_occupied = None;
        self.generation = self.generation.wrapping_add(1);

        for (hash, value) in old.into_iter().flat_map(|bucket| bucket.slots).flatten() {
            let index = bucket_for(hash, bucket_count);
            let bucket = &mut self.buckets[index];
            bucket.slots.push(Some((hash, value)));
            bucket.live += 1;
            if bucket.live == 1 {
                self.mark_occupied(index);
            }
        }
    }

    /// Grows the table so that `additional` more entries can be inserted
    /// without triggering a rehash.
    ///
    /// If the bucket count that would need cannot be allocated, the table is
    /// left as is.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table: HashTable<u64> = HashTable::with_bucket_count(8);
    /// table.reserve(100);
    /// assert!(table.bucket_count() > 100);
    /// ```
    pub fn reserve(&mut self, additional: usize) {
        match self.grown_bucket_count(self.populated.saturating_add(additional)) {
            Some(target) => self.rehash(target),
            None => warn!(
                len = self.populated,
                additional, "reserve exceeds the largest possible bucket count"
            ),
        }
    }

    /// Removes all elements and returns the table to [`DEFAULT_BUCKET_COUNT`]
    /// buckets. The max load factor is kept.
    pub fn clear(&mut self) {
        trace!(len = self.populated, "clearing table");
        self.reset(DEFAULT_BUCKET_COUNT);
    }

    fn reset(&mut self, bucket_count: usize) -> Vec<Bucket<V>> {
        self.occupancy = Occupancy::new(bucket_count);
        self.first_occupied = None;
        self.last_occupied = None;
        self.populated = 0;
        self.generation = self.generation.wrapping_add(1);
        core::mem::replace(&mut self.buckets, empty_buckets(bucket_count))
    }

    fn mark_occupied(&mut self, bucket: usize) {
        self.occupancy.set(bucket);
        self.first_occupied = Some(self.first_occupied.map_or(bucket, |f| f.min(bucket)));
        self.last_occupied = Some(self.last_occupied.map_or(bucket, |l| l.max(bucket)));
    }

    fn mark_vacant(&mut self, bucket: usize) {
        self.occupancy.unset(bucket);

        if self.first_occupied == Some(bucket) && self.last_occupied == Some(bucket) {
            self.first_occupied = None;
            self.last_occupied = None;
            return;
        }

        // Another bucket is still occupied, so each scan below is bounded by
        // the opposite boundary.
        if self.first_occupied == Some(bucket) {
            self.first_occupied = self.occupancy.next_set(bucket + 1);
        } else if self.last_occupied == Some(bucket) {
            self.last_occupied = self.occupancy.prev_set(bucket - 1);
        }
    }

    #[inline]
    fn cursor(&self, bucket: usize, slot: usize) -> Cursor {
        Cursor::new(bucket, slot, self.id, self.generation)
    }

    #[inline]
    fn check_cursor(&self, _cursor: Cursor) {
        #[cfg(debug_assertions)]
        {
            debug_assert_eq!(
                _cursor.table, self.id,
                "cursor used with a table it was not taken from"
            );
            debug_assert_eq!(
                _cursor.generation, self.generation,
                "cursor used after the table was rehashed or cleared"
            );
        }
    }

    /// Cursor at the first live entry of `bucket`, which must be occupied.
    fn head(&self, bucket: usize) -> Cursor {
        match self.buckets[bucket].next_live(0) {
            Some(slot) => self.cursor(bucket, slot),
            None => self.end(),
        }
    }

    /// Cursor at the first entry of the first non-empty bucket after `bucket`.
    fn first_after(&self, bucket: usize) -> Cursor {
        match self.last_occupied {
            Some(last) if bucket < last => self
                .occupancy
                .next_set(bucket + 1)
                .map_or_else(|| self.end(), |next| self.head(next)),
            _ => self.end(),
        }
    }

    /// Cursor at the first live entry after `cursor` in traversal order.
    fn following(&self, cursor: Cursor) -> Cursor {
        match self.buckets.get(cursor.bucket) {
            Some(bucket) => match bucket.next_live(cursor.slot + 1) {
                Some(slot) => self.cursor(cursor.bucket, slot),
                None => self.first_after(cursor.bucket),
            },
            None => self.end(),
        }
    }

    /// Cursor at the first entry in traversal order, or [`end`](Self::end)
    /// when the table is empty.
    pub fn begin(&self) -> Cursor {
        match self.first_occupied {
            Some(bucket) => self.head(bucket),
            None => self.end(),
        }
    }

    /// The end sentinel. Never refers to an entry.
    pub fn end(&self) -> Cursor {
        Cursor::end(self.id, self.generation)
    }

    /// Returns the cursor following `cursor` in traversal order.
    ///
    /// Walks the rest of the current chain first, then jumps to the next
    /// occupied bucket. Advancing the end cursor is a contract violation.
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        self.check_cursor(cursor);
        debug_assert!(!cursor.is_end(), "advanced past the end of the table");
        self.following(cursor)
    }

    /// Returns the value at `cursor`, or `None` for the end cursor.
    pub fn get(&self, cursor: Cursor) -> Option<&V> {
        self.check_cursor(cursor);
        self.buckets
            .get(cursor.bucket)?
            .get(cursor.slot)
            .map(|(_, value)| value)
    }

    /// Returns the value at `cursor` mutably, or `None` for the end cursor.
    pub fn get_mut(&mut self, cursor: Cursor) -> Option<&mut V> {
        self.check_cursor(cursor);
        self.buckets
            .get_mut(cursor.bucket)?
            .get_mut(cursor.slot)
            .map(|(_, value)| value)
    }

    /// Finds the cursor of the value matching `hash` and `eq`, or the end
    /// cursor if there is none.
    pub fn find_cursor(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Cursor {
        let bucket = self.bucket_index(hash);
        self.buckets[bucket]
            .position(hash, eq)
            .map_or_else(|| self.end(), |slot| self.cursor(bucket, slot))
    }

    /// Finds a value by hash and equality predicate.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_bucket_count(8);
    /// table.entry(42, |&n: &u64| n == 42).or_insert(42);
    ///
    /// assert_eq!(table.find(42, |&n| n == 42), Some(&42));
    /// assert_eq!(table.find(7, |&n| n == 7), None);
    /// ```
    pub fn find(&self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&V> {
        let cursor = self.find_cursor(hash, eq);
        self.get(cursor)
    }

    /// Finds a value by hash and equality predicate and returns it mutably.
    pub fn find_mut(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<&mut V> {
        let cursor = self.find_cursor(hash, eq);
        self.get_mut(cursor)
    }

    /// Returns the entry for the value matching `hash` and `eq`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::Entry;
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_bucket_count(8);
    /// let hash = 5;
    ///
    /// table.entry(hash, |s: &String| s == "key").or_insert("key".to_string());
    /// match table.entry(hash, |s: &String| s == "key") {
    ///     Entry::Occupied(entry) => assert_eq!(entry.get(), "key"),
    ///     Entry::Vacant(_) => unreachable!(),
    /// }
    /// ```
    pub fn entry(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Entry<'_, V> {
        let cursor = self.find_cursor(hash, eq);
        if cursor.is_end() {
            Entry::Vacant(VacantEntry { table: self, hash })
        } else {
            Entry::Occupied(OccupiedEntry {
                table: self,
                cursor,
            })
        }
    }

    /// Stores `value` in the chain for `hash` without checking for an equal
    /// value, growing first if the insertion would reach the max load factor.
    ///
    /// The value takes the first hole in the chain, or goes to its end.
    /// Returns the cursor of the new entry.
    pub fn insert_unique(&mut self, hash: u64, value: V) -> Cursor {
        match self.grown_bucket_count(self.populated + 1) {
            Some(target) => self.rehash(target),
            None => warn!(
                len = self.populated,
                bucket_count = self.bucket_count(),
                "bucket count cannot grow further"
            ),
        }

        let index = self.bucket_index(hash);
        let bucket = &mut self.buckets[index];
        let slot = bucket.insert(hash, value);
        if bucket.live == 1 {
            self.mark_occupied(index);
        }
        self.populated += 1;

        self.cursor(index, slot)
    }

    /// Removes and returns the value matching `hash` and `eq`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_bucket_count(8);
    /// table.entry(42, |&n: &u64| n == 42).or_insert(42);
    ///
    /// assert_eq!(table.remove(42, |&n| n == 42), Some(42));
    /// assert!(table.is_empty());
    /// assert_eq!(table.remove(99, |&n| n == 99), None);
    /// ```
    pub fn remove(&mut self, hash: u64, eq: impl Fn(&V) -> bool) -> Option<V> {
        let cursor = self.find_cursor(hash, eq);
        self.remove_at(cursor).map(|(value, _)| value)
    }

    /// Removes the value at `cursor`.
    ///
    /// Returns the value and the cursor of the entry that followed it in
    /// traversal order, or `None` if `cursor` does not point at an entry.
    /// Cursors to every other entry stay valid.
    pub fn remove_at(&mut self, cursor: Cursor) -> Option<(V, Cursor)> {
        self.check_cursor(cursor);
        let (_, value) = self.buckets.get_mut(cursor.bucket)?.take(cursor.slot)?;
        self.populated -= 1;
        if self.buckets[cursor.bucket].live == 0 {
            self.mark_vacant(cursor.bucket);
        }
        Some((value, self.following(cursor)))
    }

    /// Returns an iterator over the values in traversal order.
    pub fn iter(&self) -> Iter<'_, V> {
        Iter {
            buckets: &self.buckets,
            occupancy: &self.occupancy,
            next_bucket: self.first_occupied.unwrap_or(self.bucket_count()),
            chain: Default::default(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator over mutable references to the values in
    /// traversal order.
    pub fn iter_mut(&mut self) -> IterMut<'_, V> {
        IterMut {
            rest: &mut self.buckets,
            offset: 0,
            occupancy: &self.occupancy,
            chain: Default::default(),
            remaining: self.populated,
        }
    }

    /// Returns an iterator that removes and yields all values from the table.
    ///
    /// The table keeps its bucket count. Invalidates every cursor.
    ///
    /// # Examples
    ///
    /// ```rust
    /// # use chain_hash::hash_table::HashTable;
    /// #
    /// let mut table = HashTable::with_bucket_count(8);
    /// table.entry(1, |&n: &u64| n == 1).or_insert(1);
    /// table.entry(2, |&n: &u64| n == 2).or_insert(2);
    ///
    /// let values: Vec<u64> = table.drain().collect();
    /// assert!(table.is_empty());
    /// assert_eq!(table.bucket_count(), 8);
    /// assert_eq!(values, vec![1, 2]);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, V> {
        let remaining = self.populated;
        let bucket_count = self.bucket_count();
        let buckets = self.reset(bucket_count);
        Drain {
            inner: IntoIter::new(buckets, remaining),
            _table: PhantomData,
        }
    }

    /// Counts buckets by chain length.
    ///
    /// Index `n` of the result holds the number of buckets whose chain has
    /// exactly `n` entries; the last bin, index [`CHAIN_HISTOGRAM_BINS`],
    /// aggregates every longer chain. Index 0 counts empty buckets.
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> Vec<usize> {
        let mut hist = alloc::vec![0usize; CHAIN_HISTOGRAM_BINS + 1];
        for bucket in &self.buckets {
            hist[bucket.live.min(CHAIN_HISTOGRAM_BINS)] += 1;
        }
        hist
    }

    /// Returns utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> DebugStats {
        let bucket_count = self.bucket_count();
        let occupied_buckets = self.occupancy.count_ones();
        DebugStats {
            populated: self.populated,
            bucket_count,
            occupied_buckets,
            longest_chain: self.buckets.iter().map(|b| b.live).max().unwrap_or(0),
            load_factor: self.populated as f64 / bucket_count as f64,
            max_load_factor: self.max_load_factor,
            bucket_utilization: occupied_buckets as f64 / bucket_count as f64,
        }
    }

    /// Pretty-prints the chain-length histogram horizontally using stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        let hist = self.chain_histogram();
        let max = *hist.iter().max().unwrap_or(&0);
        if max == 0 {
            println!("chain histogram: empty");
            return;
        }

        let max_bar = 60usize;
        let total_units = max_bar * 8;
        println!(
            "chain histogram ({} entries, {} buckets):",
            self.populated,
            self.bucket_count()
        );

        let make_bar = |count: usize| -> alloc::string::String {
            if count == 0 {
                return alloc::string::String::new();
            }
            let units = ((count as u128 * total_units as u128).div_ceil(max as u128)) as usize;
            let mut bar = "█".repeat(units / 8);
            let partial = match units % 8 {
                1 => Some('▏'),
                2 => Some('▎'),
                3 => Some('▍'),
                4 => Some('▌'),
                5 => Some('▋'),
                6 => Some('▊'),
                7 => Some('▉'),
                _ => None,
            };
            bar.extend(partial);
            bar
        };

        for (len, &count) in hist.iter().take(CHAIN_HISTOGRAM_BINS).enumerate() {
            println!("{:>3} | {} ({})", len, make_bar(count), count);
        }
        let long = hist[CHAIN_HISTOGRAM_BINS];
        println!("{:>2}+ | {} ({})", CHAIN_HISTOGRAM_BINS, make_bar(long), long);
    }
}

/// A view into a single entry in the hash table, which may be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashTable`].
///
/// [`entry`]: HashTable::entry
pub enum Entry<'a, V> {
    /// A vacant entry - no matching value is present in the table
    Vacant(VacantEntry<'a, V>),
    /// An occupied entry - a matching value is present in the table
    Occupied(OccupiedEntry<'a, V>),
}

impl<'a, V> Entry<'a, V> {
    /// Inserts `default` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts the result of `default` if the entry is vacant and returns a
    /// mutable reference to the value. `default` only runs on insertion.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Runs `f` on the value if the entry is occupied.
    pub fn and_modify(self, f: impl FnOnce(&mut V)) -> Self {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Inserts `V::default()` if the entry is vacant and returns a mutable
    /// reference to the value.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }
}

/// A view into a vacant entry in a [`HashTable`].
pub struct VacantEntry<'a, V> {
    table: &'a mut HashTable<V>,
    hash: u64,
}

impl<'a, V> VacantEntry<'a, V> {
    /// The hash this entry will be stored under.
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// Inserts the value, growing the table if needed, and returns a mutable
    /// reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        self.insert_entry(value).into_mut()
    }

    /// Inserts the value and returns the now occupied entry.
    pub fn insert_entry(self, value: V) -> OccupiedEntry<'a, V> {
        let cursor = self.table.insert_unique(self.hash, value);
        OccupiedEntry {
            table: self.table,
            cursor,
        }
    }
}

/// A view into an occupied entry in a [`HashTable`].
pub struct OccupiedEntry<'a, V> {
    table: &'a mut HashTable<V>,
    cursor: Cursor,
}

impl<'a, V> OccupiedEntry<'a, V> {
    /// The position of this entry in the table.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Gets a reference to the value.
    pub fn get(&self) -> &V {
        &self.table.buckets[self.cursor.bucket].occupied(self.cursor.slot).1
    }

    /// Gets a mutable reference to the value.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.table.buckets[self.cursor.bucket]
            .occupied_mut(self.cursor.slot)
            .1
    }

    /// Converts the entry into a mutable reference with the table's lifetime.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.table.buckets[self.cursor.bucket]
            .occupied_mut(self.cursor.slot)
            .1
    }

    /// Removes the value from the table and returns it.
    pub fn remove(self) -> V {
        match self.table.remove_at(self.cursor) {
            Some((value, _)) => value,
            None => unreachable!("occupied entry refers to an empty slot"),
        }
    }
}

/// An iterator over the values of a [`HashTable`], created by
/// [`HashTable::iter`].
pub struct Iter<'a, V> {
    buckets: &'a [Bucket<V>],
    occupancy: &'a Occupancy,
    next_bucket: usize,
    chain: core::slice::Iter<'a, Option<(u64, V)>>,
    remaining: usize,
}

impl<V> Clone for Iter<'_, V> {
    fn clone(&self) -> Self {
        Self {
            buckets: self.buckets,
            occupancy: self.occupancy,
            next_bucket: self.next_bucket,
            chain: self.chain.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, V> Iterator for Iter<'a, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((_, value)) = self.chain.find_map(Option::as_ref) {
                self.remaining -= 1;
                return Some(value);
            }

            let bucket = self.occupancy.next_set(self.next_bucket)?;
            self.chain = self.buckets[bucket].slots.iter();
            self.next_bucket = bucket + 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for Iter<'_, V> {}

impl<V> FusedIterator for Iter<'_, V> {}

/// A mutable iterator over the values of a [`HashTable`], created by
/// [`HashTable::iter_mut`].
pub struct IterMut<'a, V> {
    // Buckets not yet visited; `rest[0]` is bucket `offset`.
    rest: &'a mut [Bucket<V>],
    offset: usize,
    occupancy: &'a Occupancy,
    chain: core::slice::IterMut<'a, Option<(u64, V)>>,
    remaining: usize,
}

impl<'a, V> Iterator for IterMut<'a, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((_, value)) = self.chain.find_map(Option::as_mut) {
                self.remaining -= 1;
                return Some(value);
            }

            let bucket = self.occupancy.next_set(self.offset)?;
            let rest = core::mem::take(&mut self.rest);
            let (_, tail) = rest.split_at_mut(bucket - self.offset);
            let (current, tail) = tail.split_first_mut()?;
            self.chain = current.slots.iter_mut();
            self.rest = tail;
            self.offset = bucket + 1;
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IterMut<'_, V> {}

impl<V> FusedIterator for IterMut<'_, V> {}

/// An owning iterator over the values of a [`HashTable`].
pub struct IntoIter<V> {
    buckets: alloc::vec::IntoIter<Bucket<V>>,
    chain: alloc::vec::IntoIter<Option<(u64, V)>>,
    remaining: usize,
}

impl<V> IntoIter<V> {
    fn new(buckets: Vec<Bucket<V>>, remaining: usize) -> Self {
        Self {
            buckets: buckets.into_iter(),
            chain: Default::default(),
            remaining,
        }
    }
}

impl<V> Iterator for IntoIter<V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some((_, value)) = self.chain.by_ref().flatten().next() {
                self.remaining -= 1;
                return Some(value);
            }

            if self.remaining == 0 {
                return None;
            }
            self.chain = self.buckets.next()?.slots.into_iter();
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<V> ExactSizeIterator for IntoIter<V> {}

impl<V> FusedIterator for IntoIter<V> {}

/// A draining iterator over the values in a [`HashTable`], created by
/// [`HashTable::drain`].
///
/// The table is already empty once `drain` returns; values not consumed are
/// dropped with the iterator.
pub struct Drain<'a, V> {
    inner: IntoIter<V>,
    _table: PhantomData<&'a mut HashTable<V>>,
}

impl<V> Iterator for Drain<'_, V> {
    type Item = V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<V> ExactSizeIterator for Drain<'_, V> {}

impl<V> FusedIterator for Drain<'_, V> {}

impl<V> IntoIterator for HashTable<V> {
    type IntoIter = IntoIter<V>;
    type Item = V;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter::new(self.buckets, self.populated)
    }
}

impl<'a, V> IntoIterator for &'a HashTable<V> {
    type IntoIter = Iter<'a, V>;
    type Item = &'a V;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, V> IntoIterator for &'a mut HashTable<V> {
    type IntoIter = IterMut<'a, V>;
    type Item = &'a mut V;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}
