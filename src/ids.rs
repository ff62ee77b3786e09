// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use std::fmt::{self, Debug, Formatter};
use std::num::NonZeroU16;

/// A key that can be mapped to a monotonically increasing integer, for use with [`ArenaMap`].
///
/// [`ArenaMap`]: crate::ArenaMap
pub trait ArenaKey: Copy {
    fn from_index(i: usize) -> Self;
    fn to_index(self) -> usize;
}

/// Identifies a connected client, server- and client-side. 1-based, so it doubles as a non-zero
/// handle without needing a separate "no player" sentinel in maps keyed by it.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PlayerId(NonZeroU16);

impl PlayerId {
    /// Constructs the `n`th client's id (0-based), e.g. for tests and bots.
    pub fn nth_client(n: u16) -> Option<Self> {
        NonZeroU16::new(n.checked_add(1)?).map(Self)
    }

    pub fn get(self) -> u16 {
        self.0.get()
    }
}

impl Debug for PlayerId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "PlayerId({})", self.0)
    }
}

impl ArenaKey for PlayerId {
    fn from_index(i: usize) -> Self {
        Self(NonZeroU16::new((i + 1) as u16).expect("index too large for PlayerId"))
    }

    fn to_index(self) -> usize {
        self.0.get() as usize - 1
    }
}
