//! Write-rare containers: a fixed buffer sequence, a sorted map and a sorted set.
//!
//! None of them support single element insert or remove. Their content is only
//! ever replaced wholesale, which keeps the storage a single exact-size buffer,
//! makes iteration a plain slice walk, and lets the map and set answer lookups by
//! binary search over a buffer sorted once per replace.
//!
//! Replacing takes `&mut self`; concurrent readers are fine between replaces.

mod error;
pub use error::*;

mod sequence;
pub use sequence::*;

mod map;
pub use map::*;

mod set;
pub use set::*;

pub mod search;
pub mod utils;

#[cfg(feature = "serde")]
mod serde_impl;
