//! Canonical per-dtype hashing used by [`crate::key::AutoMapKey`] and by key
//! coercion.
//!
//! `automap.c` (the module this crate generalizes) delegates hashing to
//! `PyObject_Hash`, which in turn runs CPython's own per-type hash routines.
//! Those routines are re-derived here because this crate has no equivalent
//! host runtime to call out to: integers hash to themselves, and floats hash
//! through the same base-2 mantissa/exponent accumulation CPython uses so
//! that a float key and an integer key with the same numeric value land in
//! the same table slot.

use core::hash::{Hash, Hasher};

/// Sentinel `Table` hash value denoting an empty slot (spec.md invariant 1).
pub(crate) const EMPTY_HASH: i64 = -1;

/// Remaps the single reserved sentinel to an adjacent value, matching
/// spec.md invariant 2 ("remapped from −1 to −2").
#[inline]
#[must_use]
fn avoid_sentinel(hash: i64) -> i64 {
    if hash == EMPTY_HASH {
        -2
    } else {
        hash
    }
}

/// Hash for the signed-integer typed key specialization: identity.
#[inline]
#[must_use]
pub(crate) fn int_hash(value: i64) -> i64 {
    avoid_sentinel(value)
}

/// Hash for the unsigned-integer typed key specialization: shifted right one
/// bit to fit the signed hash range (spec.md §4.3).
#[inline]
#[must_use]
pub(crate) fn uint_hash(value: u64) -> i64 {
    avoid_sentinel((value >> 1) as i64)
}

const PYHASH_BITS: u32 = 61;
const PYHASH_MODULUS: u64 = (1u64 << PYHASH_BITS) - 1;
const PYHASH_INF: i64 = 314_159;
const PYHASH_NAN: i64 = 0;

/// Decomposes `value` into `(mantissa, exponent)` with `value == mantissa *
/// 2^exponent` and `0.5 <= mantissa.abs() < 1.0`, the C `frexp` contract.
/// `core`/`std` do not expose `frexp`, so it is rebuilt from the IEEE-754 bit
/// layout.
fn frexp(value: f64) -> (f64, i32) {
    if value == 0.0 {
        return (0.0, 0);
    }
    let bits = value.to_bits();
    let sign = bits & (1 << 63);
    let raw_exponent = ((bits >> 52) & 0x7ff) as i32;
    if raw_exponent == 0 {
        // Subnormal: scale into the normal range and recurse once.
        let (mantissa, exponent) = frexp(value * 4_503_599_627_370_496.0 /* 2^52 */);
        return (mantissa, exponent - 52);
    }
    let exponent = raw_exponent - 1022;
    let mantissa_bits = sign | (1022u64 << 52) | (bits & 0x000f_ffff_ffff_ffff);
    (f64::from_bits(mantissa_bits), exponent)
}

/// Hash for the float typed key specialization: CPython's `pyhash.c`
/// algorithm, so that `float_hash(3.0) == int_hash(3)` (spec.md §4.3, §9).
#[must_use]
pub(crate) fn float_hash(value: f64) -> i64 {
    if value.is_nan() {
        return PYHASH_NAN;
    }
    if value.is_infinite() {
        return if value > 0.0 { PYHASH_INF } else { -PYHASH_INF };
    }

    let (magnitude, sign) = if value < 0.0 { (-value, -1i64) } else { (value, 1i64) };
    let (mut frac, mut exponent) = frexp(magnitude);
    let mut x: u64 = 0;
    while frac != 0.0 {
        x = ((x << 28) & PYHASH_MODULUS) | (x >> (PYHASH_BITS - 28));
        frac *= 268_435_456.0; // 2^28
        exponent -= 28;
        let whole = frac as u64;
        frac -= whole as f64;
        x = x.wrapping_add(whole);
        if x >= PYHASH_MODULUS {
            x -= PYHASH_MODULUS;
        }
    }

    let e = if exponent >= 0 {
        exponent.rem_euclid(PYHASH_BITS as i32)
    } else {
        PYHASH_BITS as i32 - 1 - ((-1 - exponent).rem_euclid(PYHASH_BITS as i32))
    };
    x = ((x << e) & PYHASH_MODULUS) | (x >> (PYHASH_BITS as i32 - e) as u32);

    let result = (x as i64).wrapping_mul(sign);
    avoid_sentinel(result)
}

/// Hash for the general "object store" fallback: folds `value`'s [`Hash`]
/// impl down to 64 bits, the same rotate-and-multiply construction the
/// teacher crate uses in `StHasher` (see `src/hasher.rs`).
#[must_use]
pub(crate) fn object_hash<T: Hash + ?Sized>(value: &T) -> i64 {
    struct FoldingHasher(u64);

    impl Hasher for FoldingHasher {
        fn finish(&self) -> u64 {
            self.0
        }

        fn write(&mut self, bytes: &[u8]) {
            for chunk in bytes.chunks(8) {
                let mut buf = [0u8; 8];
                buf[..chunk.len()].copy_from_slice(chunk);
                let word = u64::from_ne_bytes(buf);
                self.0 = self.0.rotate_left(5) ^ word;
                self.0 = self.0.wrapping_mul(0x517c_c1b7_2722_0a95);
            }
        }
    }

    let mut hasher = FoldingHasher(0);
    value.hash(&mut hasher);
    avoid_sentinel(hasher.finish() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_hash_is_identity() {
        assert_eq!(3, int_hash(3));
        assert_eq!(0, int_hash(0));
    }

    #[test]
    fn int_hash_remaps_sentinel() {
        assert_eq!(-2, int_hash(-1));
    }

    #[test]
    fn uint_hash_remaps_sentinel() {
        // value >> 1 == -1 happens for no u64, but the helper must still be
        // safe to call across the whole range.
        assert_eq!(0, uint_hash(0));
        assert_eq!(1, uint_hash(2));
    }

    #[test]
    fn float_hash_matches_int_hash_for_integral_values() {
        for v in [0i64, 1, -1, 3, 1000, -1000, 123_456_789] {
            assert_eq!(int_hash(v), float_hash(v as f64), "mismatch for {v}");
        }
    }

    #[test]
    fn float_hash_is_stable() {
        assert_eq!(float_hash(1.5), float_hash(1.5));
        assert_ne!(float_hash(1.5), float_hash(2.5));
    }

    #[test]
    fn float_hash_handles_specials() {
        assert_eq!(PYHASH_INF, float_hash(f64::INFINITY));
        assert_eq!(-PYHASH_INF, float_hash(f64::NEG_INFINITY));
        assert_eq!(PYHASH_NAN, float_hash(f64::NAN));
    }

    #[test]
    fn object_hash_is_deterministic() {
        assert_eq!(object_hash("hello"), object_hash("hello"));
        assert_ne!(object_hash("hello"), object_hash("world"));
    }
}
