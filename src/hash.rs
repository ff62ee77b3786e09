// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! "Honey Badger Hash" — doesn't care that `f32`/`f64` have no `Eq`, because for determinism
//! checksums all we need is a hash that's consistent across processes, not a law-abiding
//! [`Hash`](std::hash::Hash) impl.
//!
//! Game code implements [`HbHash`] for its own `World`/`Player` types, usually by hand; a
//! `#[derive(HbHash)]` proc-macro is out of scope for this crate.

use crate::{ArenaKey, ArenaMap};
use fxhash::FxHasher32;
use std::hash::{Hash, Hasher};

/// Hashes a value for the purpose of desync detection, tolerating floats.
pub trait HbHash {
    fn hb_hash<H: Hasher>(&self, state: &mut H);

    fn hb_hash_to_u32(&self) -> u32 {
        let mut hasher = CompatHasher::default();
        self.hb_hash(&mut hasher);
        hasher.finish() as u32
    }
}

macro_rules! hb_hash_via_bits {
    ($float:ty, $bits:ty) => {
        impl HbHash for $float {
            fn hb_hash<H: Hasher>(&self, state: &mut H) {
                // NaN != NaN under IEEE 754, but every process produces the same bit pattern for
                // the same NaN-producing computation, which is all determinism checking needs.
                self.to_bits().hash(state)
            }
        }
    };
}

hb_hash_via_bits!(f32, u32);
hb_hash_via_bits!(f64, u64);

macro_rules! hb_hash_via_hash {
    ($t:ty) => {
        impl HbHash for $t {
            fn hb_hash<H: Hasher>(&self, state: &mut H) {
                Hash::hash(self, state)
            }
        }
    };
}

hb_hash_via_hash!(bool);
hb_hash_via_hash!(u8);
hb_hash_via_hash!(u16);
hb_hash_via_hash!(u32);
hb_hash_via_hash!(u64);
hb_hash_via_hash!(i8);
hb_hash_via_hash!(i16);
hb_hash_via_hash!(i32);
hb_hash_via_hash!(i64);

impl<T: HbHash> HbHash for Option<T> {
    fn hb_hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Some(v) => {
                1u8.hash(state);
                v.hb_hash(state);
            }
            None => 0u8.hash(state),
        }
    }
}

impl<T: HbHash> HbHash for [T] {
    fn hb_hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for v in self {
            v.hb_hash(state);
        }
    }
}

impl<T: HbHash> HbHash for Vec<T> {
    fn hb_hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hb_hash(state)
    }
}

impl<K: ArenaKey, V: HbHash> HbHash for ArenaMap<K, V> {
    fn hb_hash<H: Hasher>(&self, state: &mut H) {
        // Iteration order is key order (see `ArenaMap` docs), so this is reproducible across
        // processes without needing a canonical sort step.
        self.len().hash(state);
        for (_, v) in self.iter() {
            v.hb_hash(state);
        }
    }
}

/// A [`Hasher`] whose output is stable across Rust compiler versions and platforms, unlike the
/// default `SipHasher` (whose exact algorithm is an implementation detail). Wraps
/// [`FxHasher32`], which converts `usize` to `u32` before mixing so the result doesn't vary
/// between 32-bit and 64-bit targets.
#[derive(Default)]
pub struct CompatHasher {
    inner: FxHasher32,
}

impl Hasher for CompatHasher {
    fn finish(&self) -> u64 {
        self.inner.finish()
    }

    fn write(&mut self, bytes: &[u8]) {
        self.inner.write(bytes)
    }

    fn write_usize(&mut self, i: usize) {
        self.inner.write_u32(i as u32);
    }
}
