use thiserror::Error;

/// Recoverable failures reported by [`HashMap`](crate::HashMap) and
/// [`HashTable`](crate::HashTable).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum Error {
    /// A checked lookup such as [`HashMap::at`](crate::HashMap::at) found no
    /// entry for the key.
    #[error("key not found")]
    KeyNotFound,

    /// A bucket introspection call was given an index past the bucket array.
    #[error("bucket index {index} out of range for {bucket_count} buckets")]
    BucketIndexOutOfRange {
        /// The requested bucket index.
        index: usize,
        /// The table's bucket count at the time of the call.
        bucket_count: usize,
    },

    /// A max load factor must be finite, strictly positive, and large enough
    /// that the bucket array can grow to satisfy it.
    #[error("invalid max load factor {0}")]
    InvalidLoadFactor(f32),
}
