use core::borrow::Borrow;
use core::fmt::Debug;
use core::hash::BuildHasher;
use core::hash::Hash;
use core::iter::FusedIterator;
use core::ops::Index;

use crate::DefaultHashBuilder;
use crate::cursor::Cursor;
use crate::error::Error;
use crate::hash_table::DEFAULT_BUCKET_COUNT;
use crate::hash_table::Entry as TableEntry;
use crate::hash_table::HashTable;

/// Equality predicate matching a stored `(K, V)` pair against a borrowed key.
fn equivalent_key<K, Q, V>(key: &Q) -> impl Fn(&(K, V)) -> bool + '_
where
    K: Borrow<Q>,
    Q: ?Sized + Eq,
{
    move |x| key == x.0.borrow()
}

/// A hash map implemented using the separate-chaining [`HashTable`] as the
/// underlying storage.
///
/// `HashMap<K, V, S>` stores key-value pairs where keys implement `Hash + Eq`
/// and uses a configurable hasher builder `S` to hash keys. Iteration order is
/// bucket order, then chain order; it does not follow insertion order.
///
/// Besides the usual Rust map API, the map exposes [`Cursor`]-based traversal
/// and erasure ([`begin`], [`advance`], [`erase_at`], [`erase_range`]) and
/// first-wins [`insert`].
///
/// `Clone` makes a deep copy. To move the contents out and leave an empty map
/// with the default bucket count behind, use [`core::mem::take`].
///
/// [`begin`]: HashMap::begin
/// [`advance`]: HashMap::advance
/// [`erase_at`]: HashMap::erase_at
/// [`erase_range`]: HashMap::erase_range
/// [`insert`]: HashMap::insert
///
/// # Examples
///
/// ```rust
/// use chain_hash::HashMap;
///
/// let mut map = HashMap::with_bucket_count(8);
/// map.insert(1, 10);
/// map.insert(2, 20);
/// map.insert(3, 30);
///
/// assert_eq!(map.at(&2), Ok(&20));
/// assert_eq!(map.erase(&2), 1);
/// assert!(map.find(&2).is_end());
/// assert_eq!(map.erase(&2), 0);
///
/// let moved = std::mem::take(&mut map);
/// assert_eq!(moved.len(), 2);
/// assert!(map.is_empty());
/// ```
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: HashTable<(K, V)>,
    hash_builder: S,
}

impl<K, V, S> Debug for HashMap<K, V, S>
where
    K: Debug,
    V: Debug,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        if self.len() != other.len() {
            return false;
        }
        self.iter()
            .all(|(key, value)| other.get(key).is_some_and(|v| *value == *v))
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Hash + Eq,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    /// Creates an empty map with the default bucket count and hasher.
    pub fn new() -> Self {
        Self::with_hasher(DefaultHashBuilder::default())
    }

    /// Creates an empty map with `bucket_count` buckets and the default
    /// hasher.
    ///
    /// ```rust
    /// # use chain_hash::HashMap;
    /// let map: HashMap<i32, String> = HashMap::with_bucket_count(64);
    /// assert_eq!(map.bucket_count(), 64);
    /// ```
    pub fn with_bucket_count(bucket_count: usize) -> Self {
        Self::with_bucket_count_and_hasher(bucket_count, DefaultHashBuilder::default())
    }
}

impl<K, V, S> Default for HashMap<K, V, S>
where
    S: Default,
{
    fn default() -> Self {
        Self::with_hasher(S::default())
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates an empty map with the default bucket count and the given
    /// hasher builder.
    pub fn with_hasher(hash_builder: S) -> Self {
        Self::with_bucket_count_and_hasher(DEFAULT_BUCKET_COUNT, hash_builder)
    }

    /// Creates an empty map with `bucket_count` buckets and the given hasher
    /// builder. A bucket count of zero is raised to one.
    pub fn with_bucket_count_and_hasher(bucket_count: usize, hash_builder: S) -> Self {
        Self {
            table: HashTable::with_bucket_count(bucket_count),
            hash_builder,
        }
    }

    /// Returns the number of elements in the map.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Returns `true` if the map contains no elements.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns the number of buckets.
    pub fn bucket_count(&self) -> usize {
        self.table.bucket_count()
    }

    /// Returns the number of entries in bucket `index`.
    ///
    /// # Errors
    ///
    /// [`Error::BucketIndexOutOfRange`] if `index >= self.bucket_count()`.
    pub fn bucket_size(&self, index: usize) -> Result<usize, Error> {
        self.table.bucket_len(index)
    }

    /// Current load factor: `len / bucket_count`.
    pub fn load_factor(&self) -> f32 {
        self.table.load_factor()
    }

    /// The load factor the map stays strictly below.
    pub fn max_load_factor(&self) -> f32 {
        self.table.max_load_factor()
    }

    /// Sets the max load factor, rehashing if the current load meets or
    /// exceeds it.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidLoadFactor`] for non-finite or non-positive factors,
    /// and for factors too small for the map to grow to. The map is left
    /// unchanged.
    pub fn set_max_load_factor(&mut self, factor: f32) -> Result<(), Error> {
        self.table.set_max_load_factor(factor)
    }

    /// Grows the map to `bucket_count` buckets. Never shrinks.
    ///
    /// Invalidates every cursor if the map actually grows.
    pub fn rehash(&mut self, bucket_count: usize) {
        self.table.rehash(bucket_count);
    }

    /// Reserves room for at least `additional` more elements without
    /// rehashing.
    pub fn reserve(&mut self, additional: usize) {
        self.table.reserve(additional);
    }

    /// Returns a reference to the map's hasher builder.
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Removes all elements and returns the map to the default bucket count.
    ///
    /// ```rust
    /// # use chain_hash::HashMap;
    /// let mut map = HashMap::with_bucket_count(8);
    /// map.insert(1, "a");
    /// map.clear();
    /// assert!(map.is_empty());
    /// assert_eq!(map.bucket_count(), 1024);
    /// ```
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Cursor at the first entry, or [`end`](Self::end) if the map is empty.
    pub fn begin(&self) -> Cursor {
        self.table.begin()
    }

    /// The end sentinel.
    pub fn end(&self) -> Cursor {
        self.table.end()
    }

    /// Returns the cursor that follows `cursor`.
    ///
    /// ```rust
    /// # use chain_hash::HashMap;
    /// let map = HashMap::from([(1, 'a'), (2, 'b'), (3, 'c')]);
    ///
    /// let mut visited = 0;
    /// let mut cursor = map.begin();
    /// while cursor != map.end() {
    ///     assert!(map.get_at(cursor).is_some());
    ///     visited += 1;
    ///     cursor = map.advance(cursor);
    /// }
    /// assert_eq!(visited, map.len());
    /// ```
    pub fn advance(&self, cursor: Cursor) -> Cursor {
        self.table.advance(cursor)
    }

    /// Returns the key-value pair at `cursor`, or `None` for the end cursor.
    pub fn get_at(&self, cursor: Cursor) -> Option<(&K, &V)> {
        self.table.get(cursor).map(|(k, v)| (k, v))
    }

    /// Returns the key and a mutable value at `cursor`, or `None` for the end
    /// cursor.
    pub fn get_at_mut(&mut self, cursor: Cursor) -> Option<(&K, &mut V)> {
        self.table.get_mut(cursor).map(|(k, v)| (&*k, v))
    }

    /// Removes the entry at `cursor` and returns the cursor of the entry that
    /// followed it, or the end cursor. Cursors to other entries stay valid.
    ///
    /// Erasing at the end cursor is a contract violation.
    pub fn erase_at(&mut self, cursor: Cursor) -> Cursor {
        debug_assert!(!cursor.is_end(), "erased at the end cursor");
        match self.table.remove_at(cursor) {
            Some((_, next)) => next,
            None => self.table.end(),
        }
    }

    /// Removes every entry in `[first, last)` and returns `last`, which still
    /// refers to the same entry.
    ///
    /// `last` must be reachable from `first` by advancing.
    ///
    /// ```rust
    /// # use chain_hash::HashMap;
    /// let mut map: HashMap<u32, u32> = (0..10).map(|i| (i, i)).collect();
    ///
    /// let first = map.begin();
    /// let mut last = first;
    /// for _ in 0..4 {
    ///     last = map.advance(last);
    /// }
    ///
    /// map.erase_range(first, last);
    /// assert_eq!(map.len(), 6);
    ///
    /// let end = map.end();
    /// map.erase_range(map.begin(), end);
    /// assert!(map.is_empty());
    /// ```
    pub fn erase_range(&mut self, first: Cursor, last: Cursor) -> Cursor {
        let mut cursor = first;
        while cursor != last && !cursor.is_end() {
            cursor = self.erase_at(cursor);
        }
        debug_assert_eq!(cursor, last, "range end is not reachable from its start");
        cursor
    }

    /// Returns an iterator over the key-value pairs of the map.
    ///
    /// ```rust
    /// # use chain_hash::HashMap;
    /// let map = HashMap::from([(1, "a"), (2, "b")]);
    ///
    /// for (key, value) in map.iter() {
    ///     println!("Key: {}, Value: {}", key, value);
    /// }
    /// ```
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            inner: self.table.iter(),
        }
    }

    /// Returns an iterator over the key-value pairs with mutable values.
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            inner: self.table.iter_mut(),
        }
    }

    /// Returns an iterator over the keys of the map.
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    /// Returns an iterator over the values of the map.
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    /// Returns an iterator over mutable references to the values.
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }

    /// Removes and yields all key-value pairs. The map keeps its bucket
    /// count.
    ///
    /// ```rust
    /// # use chain_hash::HashMap;
    /// let mut map = HashMap::from([(1, "a"), (2, "b")]);
    ///
    /// let pairs: Vec<_> = map.drain().collect();
    /// assert!(map.is_empty());
    /// assert_eq!(pairs.len(), 2);
    /// ```
    pub fn drain(&mut self) -> Drain<'_, K, V> {
        Drain {
            inner: self.table.drain(),
        }
    }

    /// Counts buckets by chain length. See
    /// [`HashTable::chain_histogram`].
    #[cfg(any(test, feature = "stats"))]
    pub fn chain_histogram(&self) -> alloc::vec::Vec<usize> {
        self.table.chain_histogram()
    }

    /// Returns utilization statistics for debugging.
    #[cfg(any(test, feature = "stats"))]
    pub fn debug_stats(&self) -> crate::hash_table::DebugStats {
        self.table.debug_stats()
    }

    /// Pretty-prints the chain-length histogram using stdout.
    #[cfg(all(any(test, feature = "stats"), feature = "std"))]
    pub fn print_chain_histogram(&self) {
        self.table.print_chain_histogram();
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    /// Creates a map from `(key, value)` pairs with at least `bucket_count`
    /// buckets.
    ///
    /// Pairs are inserted in iteration order; a later pair with a key that is
    /// already present is ignored.
    pub fn from_iter_with_bucket_count<I>(iter: I, bucket_count: usize) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        S: Default,
    {
        let iter = iter.into_iter();
        let mut map = Self::with_bucket_count_and_hasher(bucket_count, S::default());
        map.reserve(iter.size_hint().0);
        map.insert_many(iter);
        map
    }

    /// Returns the bucket `key` resolves to.
    pub fn bucket<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.table.bucket_index(self.hash_builder.hash_one(key))
    }

    /// Inserts a key-value pair unless the key is already present.
    ///
    /// Returns the cursor of the entry holding `key` and whether the pair was
    /// inserted. An existing entry keeps its value. Inserting may rehash,
    /// which invalidates every cursor.
    ///
    /// ```rust
    /// # use chain_hash::HashMap;
    /// let mut map = HashMap::new();
    /// let (cursor, inserted) = map.insert(37, "a");
    /// assert!(inserted);
    /// assert_eq!(map.get_at(cursor), Some((&37, &"a")));
    ///
    /// let (_, inserted) = map.insert(37, "b");
    /// assert!(!inserted);
    /// assert_eq!(map[&37], "a");
    /// ```
    pub fn insert(&mut self, key: K, value: V) -> (Cursor, bool) {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(entry) => (entry.cursor(), false),
            TableEntry::Vacant(entry) => (entry.insert_entry((key, value)).cursor(), true),
        }
    }

    /// Inserts every pair in order, keeping the first value seen for each
    /// key.
    pub fn insert_many<I>(&mut self, iter: I)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }

    /// Returns a cursor at the entry for `key`, or the end cursor.
    pub fn find<Q>(&self, key: &Q) -> Cursor
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table.find_cursor(hash, equivalent_key(key))
    }

    /// Returns 1 if the map contains `key`, 0 otherwise.
    pub fn count<Q>(&self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.contains_key(key))
    }

    /// Returns `true` if the map contains a value for `key`.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).is_some()
    }

    /// Returns a reference to the value for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_key_value(key).map(|(_, v)| v)
    }

    /// Returns the stored key and value for `key`.
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find(hash, equivalent_key(key))
            .map(|(k, v)| (k, v))
    }

    /// Returns a mutable reference to the value for `key`.
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table
            .find_mut(hash, equivalent_key(key))
            .map(|(_, v)| v)
    }

    /// Returns the value for `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is absent.
    ///
    /// ```rust
    /// # use chain_hash::{Error, HashMap};
    /// let map = HashMap::from([("a", 1)]);
    /// assert_eq!(map.at("a"), Ok(&1));
    /// assert_eq!(map.at("b"), Err(Error::KeyNotFound));
    /// ```
    pub fn at<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get(key).ok_or(Error::KeyNotFound)
    }

    /// Returns the value for `key` mutably.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is absent.
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.get_mut(key).ok_or(Error::KeyNotFound)
    }

    /// Returns the value for `key`, inserting `V::default()` first if the key
    /// is absent.
    ///
    /// ```rust
    /// # use chain_hash::HashMap;
    /// let mut counts: HashMap<&str, u32> = HashMap::new();
    /// for word in ["a", "b", "a"] {
    ///     *counts.get_or_insert_default(word) += 1;
    /// }
    /// assert_eq!(counts[&"a"], 2);
    /// assert_eq!(counts[&"b"], 1);
    /// ```
    pub fn get_or_insert_default(&mut self, key: K) -> &mut V
    where
        V: Default,
    {
        self.entry(key).or_default()
    }

    /// Removes `key` and returns the number of entries removed (0 or 1).
    pub fn erase<Q>(&mut self, key: &Q) -> usize
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        usize::from(self.remove_entry(key).is_some())
    }

    /// Removes `key`, returning its value if it was present.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        self.remove_entry(key).map(|(_, v)| v)
    }

    /// Removes `key`, returning the stored key and value if it was present.
    pub fn remove_entry<Q>(&mut self, key: &Q) -> Option<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hash_builder.hash_one(key);
        self.table.remove(hash, equivalent_key(key))
    }

    /// Gets the given key's corresponding entry in the map for in-place
    /// manipulation.
    ///
    /// ```rust
    /// # use chain_hash::HashMap;
    /// let mut map = HashMap::new();
    ///
    /// map.entry(1).or_insert("a");
    /// map.entry(2).or_insert("b");
    ///
    /// assert_eq!(map.get(&1), Some(&"a"));
    /// assert_eq!(map.get(&2), Some(&"b"));
    /// ```
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V> {
        let hash = self.hash_builder.hash_one(&key);
        match self.table.entry(hash, |(k, _)| k == &key) {
            TableEntry::Occupied(entry) => Entry::Occupied(OccupiedEntry { entry }),
            TableEntry::Vacant(entry) => Entry::Vacant(VacantEntry { entry, key }),
        }
    }
}

impl<K, Q, V, S> Index<&Q> for HashMap<K, V, S>
where
    K: Hash + Eq + Borrow<Q>,
    Q: ?Sized + Hash + Eq,
    S: BuildHasher,
{
    type Output = V;

    /// # Panics
    ///
    /// Panics if the key is not present. Use [`HashMap::at`] for a fallible
    /// lookup.
    fn index(&self, key: &Q) -> &V {
        self.get(key).expect("no entry found for key")
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.insert_many(iter);
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Hash + Eq,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_iter_with_bucket_count(iter, DEFAULT_BUCKET_COUNT)
    }
}

impl<K, V, const N: usize> From<[(K, V); N]> for HashMap<K, V, DefaultHashBuilder>
where
    K: Hash + Eq,
{
    fn from(pairs: [(K, V); N]) -> Self {
        Self::from_iter_with_bucket_count(pairs, DEFAULT_BUCKET_COUNT)
    }
}

/// A view into a single entry in the map, which may either be vacant or
/// occupied.
///
/// This enum is constructed from the [`entry`] method on [`HashMap`].
///
/// [`entry`]: HashMap::entry
pub enum Entry<'a, K, V> {
    /// A vacant entry.
    Vacant(VacantEntry<'a, K, V>),
    /// An occupied entry.
    Occupied(OccupiedEntry<'a, K, V>),
}

impl<'a, K, V> Entry<'a, K, V> {
    /// Inserts a default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_insert(self, default: V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default),
        }
    }

    /// Inserts a value computed from a closure if the entry is vacant and
    /// returns a mutable reference.
    pub fn or_insert_with<F>(self, default: F) -> &'a mut V
    where
        F: FnOnce() -> V,
    {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Provides in-place mutable access to an occupied entry before any
    /// potential inserts.
    pub fn and_modify<F>(self, f: F) -> Self
    where
        F: FnOnce(&mut V),
    {
        match self {
            Entry::Occupied(mut entry) => {
                f(entry.get_mut());
                Entry::Occupied(entry)
            }
            Entry::Vacant(entry) => Entry::Vacant(entry),
        }
    }

    /// Returns a reference to this entry's key.
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

impl<'a, K, V> Entry<'a, K, V>
where
    V: Default,
{
    /// Inserts the default value if the entry is vacant and returns a mutable
    /// reference.
    pub fn or_default(self) -> &'a mut V {
        self.or_insert_with(Default::default)
    }
}

/// A view into a vacant entry in the map.
pub struct VacantEntry<'a, K, V> {
    entry: crate::hash_table::VacantEntry<'a, (K, V)>,
    key: K,
}

impl<'a, K, V> VacantEntry<'a, K, V> {
    /// Gets a reference to the key that would be used when inserting a value.
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Take ownership of the key.
    pub fn into_key(self) -> K {
        self.key
    }

    /// Inserts the value into the map and returns a mutable reference to it.
    pub fn insert(self, value: V) -> &'a mut V {
        &mut self.entry.insert((self.key, value)).1
    }

    /// Inserts the value and returns the now occupied entry.
    pub fn insert_entry(self, value: V) -> OccupiedEntry<'a, K, V> {
        OccupiedEntry {
            entry: self.entry.insert_entry((self.key, value)),
        }
    }
}

/// A view into an occupied entry in the map.
pub struct OccupiedEntry<'a, K, V> {
    entry: crate::hash_table::OccupiedEntry<'a, (K, V)>,
}

impl<'a, K, V> OccupiedEntry<'a, K, V> {
    /// The position of this entry in the map.
    pub fn cursor(&self) -> Cursor {
        self.entry.cursor()
    }

    /// Gets a reference to the key in the entry.
    pub fn key(&self) -> &K {
        &self.entry.get().0
    }

    /// Gets a reference to the value in the entry.
    pub fn get(&self) -> &V {
        &self.entry.get().1
    }

    /// Gets a mutable reference to the value in the entry.
    pub fn get_mut(&mut self) -> &mut V {
        &mut self.entry.get_mut().1
    }

    /// Converts the entry into a mutable reference to the value.
    pub fn into_mut(self) -> &'a mut V {
        &mut self.entry.into_mut().1
    }

    /// Replaces the value in the entry and returns the old value.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(&mut self.entry.get_mut().1, value)
    }

    /// Removes the entry from the map and returns the value.
    pub fn remove(self) -> V {
        self.entry.remove().1
    }

    /// Removes the entry from the map and returns the key and value.
    pub fn remove_entry(self) -> (K, V) {
        self.entry.remove()
    }
}

/// An iterator over the key-value pairs of a `HashMap`.
pub struct Iter<'a, K, V> {
    inner: crate::hash_table::Iter<'a, (K, V)>,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// A mutable iterator over the key-value pairs of a `HashMap`.
pub struct IterMut<'a, K, V> {
    inner: crate::hash_table::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<K, V> FusedIterator for IterMut<'_, K, V> {}

/// An iterator over the keys of a `HashMap`.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, _)| k)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}

/// An iterator over the values of a `HashMap`.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}

/// A mutable iterator over the values of a `HashMap`.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}

/// An owning iterator over the key-value pairs of a `HashMap`.
pub struct IntoIter<K, V> {
    inner: crate::hash_table::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V> FusedIterator for IntoIter<K, V> {}

/// A draining iterator over the key-value pairs of a `HashMap`.
pub struct Drain<'a, K, V> {
    inner: crate::hash_table::Drain<'a, (K, V)>,
}

impl<K, V> Iterator for Drain<'_, K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Drain<'_, K, V> {}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type IntoIter = IntoIter<K, V>;
    type Item = (K, V);

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            inner: self.table.into_iter(),
        }
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type IntoIter = Iter<'a, K, V>;
    type Item = (&'a K, &'a V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashMap<K, V, S> {
    type IntoIter = IterMut<'a, K, V>;
    type Item = (&'a K, &'a mut V);

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

#[cfg(test)]
mod tests {
    use alloc::format;
    use alloc::string::String;
    use alloc::string::ToString;
    use alloc::vec;
    use alloc::vec::Vec;
    use core::hash::BuildHasher;

    use rand::TryRngCore;
    use rand::rngs::OsRng;
    use siphasher::sip::SipHasher;

    use super::*;

    #[derive(Clone)]
    struct SipHashBuilder {
        k1: u64,
        k2: u64,
    }

    impl BuildHasher for SipHashBuilder {
        type Hasher = SipHasher;

        fn build_hasher(&self) -> Self::Hasher {
            SipHasher::new_with_keys(self.k1, self.k2)
        }
    }

    impl Default for SipHashBuilder {
        fn default() -> Self {
            let mut rng = OsRng;
            Self {
                k1: rng.try_next_u64().unwrap_or(0),
                k2: rng.try_next_u64().unwrap_or(0),
            }
        }
    }

    /// Hashes every key to the same value.
    #[derive(Clone, Default)]
    struct ConstBuildHasher;

    struct ConstHasher;

    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;

        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }

    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}

        fn finish(&self) -> u64 {
            0
        }
    }

    type SipMap<K, V> = HashMap<K, V, SipHashBuilder>;

    fn sorted_pairs<K: Ord + Clone, V: Clone, S>(map: &HashMap<K, V, S>) -> Vec<(K, V)> {
        let mut pairs: Vec<(K, V)> = map.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        pairs.sort_by(|a, b| a.0.cmp(&b.0));
        pairs
    }

    #[test]
    fn test_new_and_with_hasher() {
        let map: HashMap<i32, String> = HashMap::new();
        assert!(map.is_empty());
        assert_eq!(map.len(), 0);
        assert_eq!(map.bucket_count(), DEFAULT_BUCKET_COUNT);

        let map2 = SipMap::<i32, String>::with_hasher(SipHashBuilder::default());
        assert!(map2.is_empty());
        assert_eq!(map2.max_load_factor(), 1.0);
    }

    #[test]
    fn test_with_bucket_count() {
        let map: HashMap<i32, String> = HashMap::with_bucket_count(1 << 10);
        assert_eq!(map.bucket_count(), 1 << 10);

        let map2 = SipMap::<i32, String>::with_bucket_count_and_hasher(200, SipHashBuilder::default());
        assert_eq!(map2.bucket_count(), 200);
        assert!(map2.is_empty());
    }

    #[test]
    fn test_insert_is_first_wins() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());

        let (cursor, inserted) = map.insert(1, "hello".to_string());
        assert!(inserted);
        assert_eq!(map.get_at(cursor), Some((&1, &"hello".to_string())));
        assert_eq!(map.len(), 1);

        let (again, inserted) = map.insert(1, "world".to_string());
        assert!(!inserted);
        assert_eq!(again, cursor);
        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"hello".to_string()));
        assert_eq!(map.get(&2), None);
    }

    #[test]
    fn test_example_scenario() {
        let mut map = SipMap::with_bucket_count_and_hasher(8, SipHashBuilder::default());
        map.insert_many([(1, 10), (2, 20), (3, 30)]);
        assert_eq!(map.len(), 3);
        assert_eq!(map.at(&2), Ok(&20));

        assert_eq!(map.erase(&2), 1);
        assert_eq!(map.find(&2), map.end());
        assert_eq!(map.count(&2), 0);
        assert_eq!(sorted_pairs(&map), vec![(1, 10), (3, 30)]);
        assert_eq!(map.erase(&2), 0);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_growth_scenario() {
        let mut map = SipMap::with_bucket_count_and_hasher(8, SipHashBuilder::default());
        for i in 0..1024u64 {
            map.insert(i, i * 3);
        }
        assert!(map.bucket_count() >= 1024);
        assert_eq!(map.len(), 1024);
        for i in 0..1024u64 {
            assert_eq!(map.at(&i), Ok(&(i * 3)));
        }
    }

    #[test]
    fn test_at_and_at_mut() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        map.insert("a".to_string(), 1);

        assert_eq!(map.at("a"), Ok(&1));
        assert_eq!(map.at("b"), Err(Error::KeyNotFound));

        *map.at_mut("a").unwrap() += 41;
        assert_eq!(map.at("a"), Ok(&42));
        assert_eq!(map.at_mut("b"), Err(Error::KeyNotFound));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn test_get_or_insert_default() {
        let mut map: SipMap<i32, Vec<i32>> = SipMap::with_hasher(SipHashBuilder::default());

        map.get_or_insert_default(1).push(42);
        assert_eq!(map.len(), 1);
        map.get_or_insert_default(1).push(24);
        assert_eq!(map.get(&1), Some(&vec![42, 24]));

        assert!(map.get_or_insert_default(2).is_empty());
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_get_mut() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        if let Some(value) = map.get_mut(&1) {
            value.push_str(" world");
        }

        assert_eq!(map.get(&1), Some(&"hello world".to_string()));
        assert_eq!(map.get_mut(&2), None);
    }

    #[test]
    fn test_contains_key_and_count() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        assert!(!map.contains_key(&1));
        assert_eq!(map.count(&1), 0);

        map.insert(1, "value".to_string());
        assert!(map.contains_key(&1));
        assert_eq!(map.count(&1), 1);
        assert!(!map.contains_key(&2));
    }

    #[test]
    fn test_find_and_cursor_access() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        map.insert(7, 70);

        let cursor = map.find(&7);
        assert_ne!(cursor, map.end());
        assert_eq!(map.get_at(cursor), Some((&7, &70)));

        if let Some((_, v)) = map.get_at_mut(cursor) {
            *v = 71;
        }
        assert_eq!(map[&7], 71);

        assert!(map.find(&8).is_end());
        assert_eq!(map.get_at(map.end()), None);
    }

    #[test]
    fn test_remove() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());
        map.insert(2, "world".to_string());

        assert_eq!(map.remove(&1), Some("hello".to_string()));
        assert_eq!(map.len(), 1);
        assert!(!map.contains_key(&1));
        assert!(map.contains_key(&2));

        assert_eq!(map.remove(&1), None);
        assert_eq!(map.remove(&3), None);
    }

    #[test]
    fn test_remove_entry() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        assert_eq!(map.remove_entry(&1), Some((1, "hello".to_string())));
        assert_eq!(map.len(), 0);
        assert_eq!(map.remove_entry(&1), None);
    }

    #[test]
    fn test_erase_at_every_entry() {
        let mut map = SipMap::with_bucket_count_and_hasher(16, SipHashBuilder::default());
        for i in 0..100 {
            map.insert(i, i);
        }

        for i in 0..100 {
            let cursor = map.find(&i);
            map.erase_at(cursor);
            assert!(map.find(&i).is_end());
        }
        assert!(map.is_empty());
        assert!(map.begin().is_end());
    }

    #[test]
    fn test_erase_at_walks_whole_map() {
        // All keys share one chain.
        let mut map: HashMap<i32, i32, ConstBuildHasher> =
            HashMap::with_bucket_count_and_hasher(8, ConstBuildHasher);
        for i in 0..6 {
            map.insert(i, i);
        }

        let mut cursor = map.begin();
        let mut erased = Vec::new();
        while cursor != map.end() {
            erased.push(*map.get_at(cursor).unwrap().0);
            cursor = map.erase_at(cursor);
        }
        assert_eq!(erased, vec![0, 1, 2, 3, 4, 5]);
        assert!(map.is_empty());
    }

    #[test]
    fn test_erase_range_all() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        for i in 0..1024 {
            map.insert(i, i * 3);
        }

        let (first, last) = (map.begin(), map.end());
        let next = map.erase_range(first, last);
        assert!(next.is_end());
        assert!(map.is_empty());
    }

    #[test]
    fn test_erase_small_range() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        for i in 0..64 {
            map.insert(i, i * 3);
        }

        let start = map.begin();
        let mut end = start;
        let mut erased = Vec::new();
        for _ in 0..5 {
            erased.push(*map.get_at(end).unwrap().0);
            end = map.advance(end);
        }
        let after = map.get_at(end).map(|(k, _)| *k);

        let next = map.erase_range(start, end);
        assert_eq!(map.len(), 59);
        assert_eq!(map.get_at(next).map(|(k, _)| *k), after);
        for k in erased {
            assert!(!map.contains_key(&k));
        }
    }

    #[test]
    fn test_erase_range_within_one_chain() {
        let mut map: HashMap<i32, i32, ConstBuildHasher> =
            HashMap::with_bucket_count_and_hasher(8, ConstBuildHasher);
        for i in 0..6 {
            map.insert(i, i);
        }

        let first = map.advance(map.begin());
        let last = map.advance(map.advance(map.advance(first)));
        let next = map.erase_range(first, last);

        assert_eq!(map.get_at(next), Some((&4, &4)));
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![0, 4, 5]);

        let empty = map.erase_range(next, next);
        assert_eq!(empty, next);
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn test_cursor_survives_erasing_chain_neighbour() {
        let mut map: HashMap<i32, i32, ConstBuildHasher> =
            HashMap::with_bucket_count_and_hasher(8, ConstBuildHasher);
        map.insert(1, 10);
        map.insert(2, 20);
        map.insert(3, 30);

        let second = map.find(&2);
        let third = map.find(&3);
        assert_eq!(map.erase(&1), 1);
        assert_eq!(map.get_at(second), Some((&2, &20)));
        assert_eq!(map.get_at(third), Some((&3, &30)));

        assert_eq!(map.erase_at(second), third);
        assert_eq!(map.get_at(third), Some((&3, &30)));
        assert_eq!(map.begin(), third);
    }

    #[test]
    fn test_cursor_survives_insert_without_growth() {
        let mut map = SipMap::with_bucket_count_and_hasher(64, SipHashBuilder::default());
        let (saved, inserted) = map.insert(7, 70);
        assert!(inserted);

        for i in 100..120 {
            map.insert(i, i);
        }
        assert_eq!(map.bucket_count(), 64);
        assert_eq!(map.get_at(saved), Some((&7, &70)));
        assert_eq!(map.find(&7), saved);
    }

    #[test]
    fn test_clear() {
        let mut map = SipMap::with_bucket_count_and_hasher(4, SipHashBuilder::default());
        for i in 0..100 {
            map.insert(i, i.to_string());
        }

        map.clear();
        assert_eq!(map.len(), 0);
        assert!(map.is_empty());
        assert_eq!(map.bucket_count(), DEFAULT_BUCKET_COUNT);
        assert!(!map.contains_key(&1));
        assert_eq!(map.iter().count(), 0);
    }

    #[test]
    fn test_rehash_and_reserve() {
        let mut map = SipMap::with_bucket_count_and_hasher(8, SipHashBuilder::default());
        for i in 0..5 {
            map.insert(i, i);
        }

        map.rehash(4);
        assert_eq!(map.bucket_count(), 8);

        map.rehash(100);
        assert_eq!(map.bucket_count(), 100);
        assert_eq!(map.len(), 5);
        for i in 0..5 {
            assert_eq!(map.get(&i), Some(&i));
        }

        map.reserve(1000);
        assert!(map.bucket_count() > 1005);
        assert_eq!(map.len(), 5);
    }

    #[test]
    fn test_max_load_factor() {
        let mut map = SipMap::with_bucket_count_and_hasher(8, SipHashBuilder::default());
        for i in 0..7 {
            map.insert(i, i);
        }
        assert_eq!(map.bucket_count(), 8);

        map.set_max_load_factor(0.5).unwrap();
        assert_eq!(map.bucket_count(), 16);
        assert!(map.load_factor() < 0.5);

        assert_eq!(
            map.set_max_load_factor(-2.0),
            Err(Error::InvalidLoadFactor(-2.0))
        );
        assert_eq!(map.max_load_factor(), 0.5);
    }

    #[test]
    fn test_tiny_max_load_factor_is_rejected() {
        let mut map = SipMap::with_bucket_count_and_hasher(8, SipHashBuilder::default());
        map.insert(1, 1);

        assert_eq!(
            map.set_max_load_factor(1e-30),
            Err(Error::InvalidLoadFactor(1e-30))
        );
        assert_eq!(map.max_load_factor(), 1.0);
        assert_eq!(map.bucket_count(), 8);
        assert_eq!(map.at(&1), Ok(&1));

        map.insert(2, 2);
        assert_eq!(map.len(), 2);
    }

    #[test]
    fn test_bucket_introspection() {
        let mut map = SipMap::with_bucket_count_and_hasher(8, SipHashBuilder::default());
        map.insert("key", 1);

        let bucket = map.bucket("key");
        assert!(bucket < map.bucket_count());
        assert_eq!(map.bucket_size(bucket), Ok(1));
        assert_eq!(map.find("key").bucket(), Some(bucket));
        assert_eq!(
            map.bucket_size(8),
            Err(Error::BucketIndexOutOfRange {
                index: 8,
                bucket_count: 8
            })
        );
    }

    #[test]
    fn test_entry_api() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());

        let value = map.entry(1).or_insert("hello".to_string());
        assert_eq!(value, &"hello".to_string());
        assert_eq!(map.len(), 1);

        let value = map.entry(1).or_insert("world".to_string());
        assert_eq!(value, &"hello".to_string());
        assert_eq!(map.len(), 1);

        map.entry(2).or_insert_with(|| "computed".to_string());
        assert_eq!(map.get(&2), Some(&"computed".to_string()));

        map.entry(1)
            .and_modify(|v| v.push_str(" world"))
            .or_insert("default".to_string());
        assert_eq!(map.get(&1), Some(&"hello world".to_string()));

        assert_eq!(map.entry(3).key(), &3);
    }

    #[test]
    fn test_occupied_entry() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "hello".to_string());

        match map.entry(1) {
            Entry::Occupied(mut entry) => {
                assert_eq!(entry.key(), &1);
                assert_eq!(entry.get(), &"hello".to_string());

                *entry.get_mut() = "world".to_string();
                assert_eq!(entry.get(), &"world".to_string());

                let old_value = entry.insert("new".to_string());
                assert_eq!(old_value, "world".to_string());
                assert_eq!(entry.get(), &"new".to_string());

                let (key, value) = entry.remove_entry();
                assert_eq!(key, 1);
                assert_eq!(value, "new".to_string());
            }
            Entry::Vacant(_) => panic!("Expected occupied entry"),
        }

        assert!(map.is_empty());
    }

    #[test]
    fn test_vacant_entry() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());

        match map.entry(1) {
            Entry::Vacant(entry) => {
                assert_eq!(entry.key(), &1);

                let value = entry.insert("hello".to_string());
                assert_eq!(value, &"hello".to_string());
            }
            Entry::Occupied(_) => panic!("Expected vacant entry"),
        }

        assert_eq!(map.len(), 1);
        assert_eq!(map.get(&1), Some(&"hello".to_string()));
    }

    #[test]
    fn test_iterators() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());

        let iter = map.iter();
        assert_eq!(iter.len(), 3);
        let pairs: std::collections::HashMap<i32, String> =
            iter.map(|(k, v)| (*k, v.clone())).collect();
        assert_eq!(pairs.len(), 3);
        assert_eq!(pairs.get(&1), Some(&"one".to_string()));
        assert_eq!(pairs.get(&3), Some(&"three".to_string()));

        let keys: std::collections::HashSet<i32> = map.keys().copied().collect();
        assert_eq!(keys, [1, 2, 3].into_iter().collect());

        let values: std::collections::HashSet<String> = map.values().cloned().collect();
        assert!(values.contains("one"));
        assert!(values.contains("two"));
        assert!(values.contains("three"));

        for v in map.values_mut() {
            v.push('!');
        }
        for (_, v) in &mut map {
            v.push('?');
        }
        assert_eq!(map[&2], "two!?");

        let mut owned: Vec<(i32, String)> = map.into_iter().collect();
        owned.sort();
        assert_eq!(owned[0], (1, "one!?".to_string()));
        assert_eq!(owned.len(), 3);
    }

    #[test]
    fn test_iteration_matches_cursors() {
        let mut map = SipMap::with_bucket_count_and_hasher(8, SipHashBuilder::default());
        for i in 0..200 {
            map.insert(i, i);
        }
        for i in (0..200).step_by(3) {
            map.erase(&i);
        }

        let by_iter: Vec<i32> = map.keys().copied().collect();
        let mut by_cursor = Vec::new();
        let mut cursor = map.begin();
        while cursor != map.end() {
            by_cursor.push(*map.get_at(cursor).unwrap().0);
            cursor = map.advance(cursor);
        }
        assert_eq!(by_iter, by_cursor);
        assert_eq!(by_iter.len(), map.len());
    }

    #[test]
    fn test_drain() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());
        map.insert(1, "one".to_string());
        map.insert(2, "two".to_string());
        map.insert(3, "three".to_string());

        let drained: std::collections::HashMap<i32, String> = map.drain().collect();
        assert_eq!(drained.len(), 3);
        assert!(map.is_empty());

        assert_eq!(drained.get(&1), Some(&"one".to_string()));
        assert_eq!(drained.get(&2), Some(&"two".to_string()));
        assert_eq!(drained.get(&3), Some(&"three".to_string()));
    }

    #[test]
    fn test_equality() {
        let mut a = SipMap::with_bucket_count_and_hasher(8, SipHashBuilder::default());
        let mut b = SipMap::with_bucket_count_and_hasher(64, SipHashBuilder::default());
        for i in 0..50 {
            a.insert(i, i * 2);
        }
        for i in (0..50).rev() {
            b.insert(i, i * 2);
        }

        assert_eq!(a, a);
        assert_eq!(a, b);
        assert_eq!(b, a);

        *b.get_mut(&10).unwrap() = 0;
        assert_ne!(a, b);
        assert_ne!(b, a);

        b.remove(&10);
        assert_ne!(a, b);
        b.insert(100, 20);
        assert_ne!(a, b);
    }

    #[test]
    fn test_clone_is_independent() {
        let mut a = SipMap::with_hasher(SipHashBuilder::default());
        for i in 0..20 {
            a.insert(i, format!("value_{}", i));
        }

        let mut b = a.clone();
        assert_eq!(a, b);

        b.get_mut(&0).unwrap().push_str("_changed");
        b.erase(&1);
        b.insert(99, "new".to_string());
        assert_eq!(a.len(), 20);
        assert_eq!(a.get(&0), Some(&"value_0".to_string()));
        assert!(a.contains_key(&1));
        assert!(!a.contains_key(&99));
    }

    #[test]
    fn test_take_resets_source() {
        let mut a = SipMap::with_bucket_count_and_hasher(8, SipHashBuilder::default());
        for i in 0..20 {
            a.insert(i, i);
        }
        let snapshot = a.clone();

        let b = core::mem::take(&mut a);
        assert_eq!(b, snapshot);
        assert!(a.is_empty());
        assert_eq!(a.bucket_count(), DEFAULT_BUCKET_COUNT);
        assert!(a.begin().is_end());
    }

    #[test]
    fn test_from_array_and_iter() {
        let map = HashMap::from([(1, 1), (2, 2), (3, 3), (4, 4), (10, 123), (112312, 132131)]);
        assert_eq!(map.len(), 6);
        assert_eq!(map[&10], 123);
        assert_eq!(map[&112312], 132131);

        let dup = HashMap::from([(1, "first"), (1, "second")]);
        assert_eq!(dup.len(), 1);
        assert_eq!(dup[&1], "first");

        let collected: SipMap<u32, u32> =
            SipMap::from_iter_with_bucket_count((0..1024).map(|i| (i, i * 3)), 8);
        assert_eq!(collected.len(), 1024);
        assert!(collected.bucket_count() >= 1024);
        for (k, v) in &collected {
            assert_eq!(*v, k * 3);
        }

        let mut extended: SipMap<u32, u32> = (0..10).map(|i| (i, i)).collect();
        extended.extend([(5, 500), (10, 10)]);
        assert_eq!(extended.len(), 11);
        assert_eq!(extended[&5], 5);
    }

    #[test]
    #[should_panic(expected = "no entry found for key")]
    fn test_index_panics_when_absent() {
        let map: HashMap<i32, i32> = HashMap::new();
        let _value = map[&1];
    }

    #[test]
    fn test_collision_handling() {
        let mut map: HashMap<i32, i32, ConstBuildHasher> =
            HashMap::with_bucket_count_and_hasher(8, ConstBuildHasher);

        for i in 0..100 {
            map.insert(i, i * 2);
        }
        assert_eq!(map.len(), 100);
        assert_eq!(map.bucket_size(0), Ok(100));

        for i in (0..100).step_by(2) {
            assert_eq!(map.remove(&i), Some(i * 2));
        }
        assert_eq!(map.len(), 50);
        for i in (1..100).step_by(2) {
            assert_eq!(map.get(&i), Some(&(i * 2)));
        }
    }

    #[test]
    fn test_string_keys() {
        let mut map = SipMap::with_hasher(SipHashBuilder::default());

        map.insert("hello".to_string(), 1);
        map.insert("world".to_string(), 2);
        map.insert("rust".to_string(), 3);

        assert_eq!(map.get("hello"), Some(&1));
        assert_eq!(map.get(&"world".to_string()), Some(&2));
        assert_eq!(map.get("rust"), Some(&3));
        assert_eq!(map.get("missing"), None);
        assert_eq!(map.erase("rust"), 1);
    }

    #[test]
    fn test_default_trait() {
        let map: SipMap<i32, String> = HashMap::default();
        assert!(map.is_empty());
        assert_eq!(map.bucket_count(), DEFAULT_BUCKET_COUNT);
    }

    #[test]
    fn test_debug_format() {
        let mut map: HashMap<i32, &str, ConstBuildHasher> =
            HashMap::with_bucket_count_and_hasher(4, ConstBuildHasher);
        map.insert(1, "a");
        map.insert(2, "b");
        assert_eq!(format!("{:?}", map), r#"{1: "a", 2: "b"}"#);
    }
}
