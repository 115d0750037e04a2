//! Auto-incremented, insertion-ordered, unique-key mappings.
//!
//! An `automap` is a set of unique keys, each permanently assigned the
//! dense index it was inserted at: the first key gets `0`, the second gets
//! `1`, and so on. There is no independent value to store or overwrite, and
//! no way to remove a key once added — the mapping only ever grows.
//!
//! Two variants are provided:
//!
//! - [`FrozenAutoMap`] — immutable after construction, cheap to clone
//!   (clones share their backing table and key store).
//! - [`AutoMap`] — supports appending new keys (`add`/`extend`) after
//!   construction.
//!
//! Internally both are backed by an open-addressed hash table that
//! resolves collisions by scanning short contiguous blocks of slots rather
//! than a single-slot linear or quadratic probe. Lookups accept any query
//! type that can be losslessly coerced to the mapping's stored key type
//! (see [`CoerceKey`]) — a `f64` query against an integer-keyed map, for
//! instance, succeeds only when the float has no fractional part.

mod coerce;
mod error;
mod hash;
mod key;
mod map;
mod table;
mod view;

pub use coerce::CoerceKey;
pub use error::{AutoMapError, NoKey};
pub use key::{AutoMapKey, F32Key, F64Key, FixedBytes, FixedUnicode};
pub use map::{AutoMap, FrozenAutoMap};
pub use view::{Items, ItemsIter, Keys, KeysIter, Values, ValuesIter};
