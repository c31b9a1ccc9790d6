#![warn(missing_docs)]
#![doc = include_str!("../README.md")]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod cursor;
mod error;
mod occupancy;

/// A key-value map built on the separate-chaining table.
///
/// This module provides a `HashMap` that wraps the `HashTable` and provides
/// a standard key-value map interface with configurable hashers, plus
/// cursor-based traversal and erasure.
pub mod hash_map;

/// The raw separate-chaining table, addressed by precomputed hashes.
pub mod hash_table;

pub use cursor::Cursor;
pub use error::Error;
pub use hash_map::Entry;
pub use hash_map::HashMap;
#[cfg(feature = "stats")]
pub use hash_table::DebugStats;
pub use hash_table::DEFAULT_BUCKET_COUNT;
pub use hash_table::DEFAULT_MAX_LOAD_FACTOR;
pub use hash_table::HashTable;

cfg_if::cfg_if! {
    if #[cfg(feature = "foldhash")] {
        /// The hasher builder a [`HashMap`] uses unless another is given.
        pub type DefaultHashBuilder = foldhash::fast::RandomState;
    } else if #[cfg(feature = "std")] {
        /// The hasher builder a [`HashMap`] uses unless another is given.
        pub type DefaultHashBuilder = std::collections::hash_map::RandomState;
    } else {
        compile_error!("chain-hash needs either the `foldhash` or the `std` feature for a default hasher");
    }
}
