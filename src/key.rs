//! Typed key specializations and the key store (spec.md §3 "Key store", §4.3
//! "Key coercion" inputs, Design Notes "Typed specialization over
//! polymorphism").
//!
//! CPython's `automap` distinguishes its eleven element-type specializations
//! with a dtype enum and runtime branching. Rust already has the tool the
//! spec's own Design Notes recommend instead: a generic `AutoMapKey` trait
//! implemented per concrete type, monomorphized by the compiler so each
//! `FrozenAutoMap<K>`/`AutoMap<K>` gets its own specialized lookup/insert
//! path for free.

use alloc_prelude::*;
use core::fmt;
use core::hash::{Hash, Hasher};

use crate::hash::{float_hash, int_hash, object_hash, uint_hash};

// This crate has no `alloc`-only build; `alloc_prelude` is just `std`'s
// relevant pieces re-exported under one name to keep the `use` above honest
// about what this module actually needs.
mod alloc_prelude {
    pub(crate) use std::string::String;
    pub(crate) use std::sync::Arc;
    pub(crate) use std::vec::Vec;
}

/// A type usable as an `automap` key. One impl per typed key specialization
/// from spec.md §3 plus a blanket "object store" fallback.
pub trait AutoMapKey: Eq {
    /// The stored hash for this key, per the rules in spec.md §3 invariant 2
    /// and §4.3 (each dtype's own hash function, with the sentinel `-1`
    /// remapped to `-2`).
    fn insertion_hash(&self) -> i64;
}

macro_rules! impl_signed_key {
    ($($t:ty),+) => {
        $(
            impl AutoMapKey for $t {
                #[inline]
                fn insertion_hash(&self) -> i64 {
                    int_hash(i64::from(*self))
                }
            }
        )+
    };
}

macro_rules! impl_unsigned_key {
    ($($t:ty),+) => {
        $(
            impl AutoMapKey for $t {
                #[inline]
                fn insertion_hash(&self) -> i64 {
                    uint_hash(u64::from(*self))
                }
            }
        )+
    };
}

impl_signed_key!(i8, i16, i32, i64);
impl_unsigned_key!(u8, u16, u32, u64);

impl AutoMapKey for isize {
    #[inline]
    fn insertion_hash(&self) -> i64 {
        int_hash(*self as i64)
    }
}

impl AutoMapKey for usize {
    #[inline]
    fn insertion_hash(&self) -> i64 {
        uint_hash(*self as u64)
    }
}

impl Eq for F32Key {}

/// Newtype around `f32` providing the `Eq` the [`AutoMapKey`] supertrait
/// requires. `f32`/`f64` cannot implement `Eq` themselves (`NaN != NaN`
/// under `PartialEq`), so both float specializations are wrapped; see
/// [`F64Key`] for the equality rule (bitwise, not IEEE).
#[derive(Debug, Clone, Copy, PartialOrd)]
pub struct F32Key(pub f32);

impl PartialEq for F32Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl AutoMapKey for F32Key {
    #[inline]
    fn insertion_hash(&self) -> i64 {
        float_hash(f64::from(self.0))
    }
}

impl From<f32> for F32Key {
    #[inline]
    fn from(value: f32) -> Self {
        F32Key(value)
    }
}

impl fmt::Display for F32Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Hash for F32Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl Eq for F64Key {}

/// Newtype around `f64` that provides the `Eq` spec.md §3 requires of a
/// table key. Bitwise equality (not IEEE `==`) is used so that a `FrozenAutoMap<F64Key>`
/// obeys the unique-key invariant even in the presence of `NaN` or signed
/// zero; ordinary lookups go through [`crate::coerce::CoerceKey`] and never
/// construct an `F64Key` whose bit pattern differs from a plain `f64`
/// produced by `as`.
#[derive(Debug, Clone, Copy, PartialOrd)]
pub struct F64Key(pub f64);

impl PartialEq for F64Key {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl AutoMapKey for F64Key {
    #[inline]
    fn insertion_hash(&self) -> i64 {
        float_hash(self.0)
    }
}

impl From<f64> for F64Key {
    #[inline]
    fn from(value: f64) -> Self {
        F64Key(value)
    }
}

impl fmt::Display for F64Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl Hash for F64Key {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl AutoMapKey for String {
    #[inline]
    fn insertion_hash(&self) -> i64 {
        object_hash(self.as_str())
    }
}

impl AutoMapKey for Vec<u8> {
    #[inline]
    fn insertion_hash(&self) -> i64 {
        object_hash(self.as_slice())
    }
}

/// Fixed-width Unicode key, the `numpy` `U<N>` specialization of spec.md §3.
/// Stores up to `N` `char`s, nul-padded; equality and hashing only consider
/// the significant prefix (up to the first nul or the declared width,
/// whichever is shorter), matching the "logical end" scan spec.md §4.3
/// describes for coercing shorter queries.
#[derive(Debug, Clone, Copy)]
pub struct FixedUnicode<const N: usize> {
    chars: [char; N],
}

impl<const N: usize> FixedUnicode<N> {
    /// Builds a fixed-width key from `text`, nul-padding on the right.
    /// Returns `None` if `text` has more than `N` code points (spec.md §4.3
    /// "reject if the query exceeds the stored element width").
    #[must_use]
    pub fn new(text: &str) -> Option<Self> {
        let mut chars = ['\0'; N];
        let mut len = 0;
        for c in text.chars() {
            if len == N {
                return None;
            }
            chars[len] = c;
            len += 1;
        }
        Some(FixedUnicode { chars })
    }

    /// The code points up to the first nul (or the full width if none).
    #[must_use]
    pub fn significant(&self) -> &[char] {
        let end = self.chars.iter().position(|&c| c == '\0').unwrap_or(N);
        &self.chars[..end]
    }
}

impl<const N: usize> PartialEq for FixedUnicode<N> {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl<const N: usize> Eq for FixedUnicode<N> {}

impl<const N: usize> Hash for FixedUnicode<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl<const N: usize> AutoMapKey for FixedUnicode<N> {
    fn insertion_hash(&self) -> i64 {
        object_hash(self.significant())
    }
}

/// Fixed-width byte string key, the `numpy` `S<N>` specialization of
/// spec.md §3. Analogous to [`FixedUnicode`] with single-byte units.
#[derive(Debug, Clone, Copy)]
pub struct FixedBytes<const N: usize> {
    bytes: [u8; N],
}

impl<const N: usize> FixedBytes<N> {
    /// Builds a fixed-width key from `data`, nul-padding on the right.
    /// Returns `None` if `data` is longer than `N` bytes.
    #[must_use]
    pub fn new(data: &[u8]) -> Option<Self> {
        if data.len() > N {
            return None;
        }
        let mut bytes = [0u8; N];
        bytes[..data.len()].copy_from_slice(data);
        Some(FixedBytes { bytes })
    }

    /// The bytes up to the first nul (or the full width if none).
    #[must_use]
    pub fn significant(&self) -> &[u8] {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(N);
        &self.bytes[..end]
    }
}

impl<const N: usize> PartialEq for FixedBytes<N> {
    fn eq(&self, other: &Self) -> bool {
        self.significant() == other.significant()
    }
}

impl<const N: usize> Eq for FixedBytes<N> {}

impl<const N: usize> Hash for FixedBytes<N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.significant().hash(state);
    }
}

impl<const N: usize> AutoMapKey for FixedBytes<N> {
    fn insertion_hash(&self) -> i64 {
        object_hash(self.significant())
    }
}

/// The key store: either a dynamic, growable sequence (the general case) or
/// an immutable, shared typed buffer (the typed-array specialization).
/// Spec.md §3 "Key store".
#[derive(Clone, Debug)]
pub(crate) enum KeyStore<K> {
    Owned(Vec<K>),
    Borrowed(Arc<[K]>),
}

impl<K> KeyStore<K> {
    #[inline]
    pub(crate) fn as_slice(&self) -> &[K] {
        match self {
            KeyStore::Owned(v) => v.as_slice(),
            KeyStore::Borrowed(a) => a.as_ref(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether this store permits growth (spec.md §4.2, §4.6: "Growth is
    /// only permitted for the object-keyed variant; typed-array-backed
    /// mappings are sized once at construction").
    #[inline]
    pub(crate) fn is_growable(&self) -> bool {
        matches!(self, KeyStore::Owned(_))
    }

    /// Appends `key`, returning its new index. Panics if called on a
    /// `Borrowed` store; callers must check [`KeyStore::is_growable`] first
    /// (mirrors `crate::map`'s contract, which always checks before calling).
    #[inline]
    pub(crate) fn push(&mut self, key: K) -> usize {
        match self {
            KeyStore::Owned(v) => {
                v.push(key);
                v.len() - 1
            }
            KeyStore::Borrowed(_) => {
                unreachable!("push on a borrowed key store must be rejected before this point")
            }
        }
    }
}
