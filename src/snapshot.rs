// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Snapshot Buffer: a ring of immutable world states keyed by tick and
//! timestamp.

use crate::ids::PlayerId;
use crate::time::TimestampMs;
use crate::ArenaMap;
use std::collections::VecDeque;

/// An immutable record of world state at a tick. Once added to a
/// [`SnapshotBuffer`], a snapshot is never mutated.
#[derive(Debug, Clone)]
pub struct Snapshot<W> {
    pub tick: u64,
    pub timestamp_ms: TimestampMs,
    pub state: W,
    /// Highest input `seq` the server had processed from each client up to and including this
    /// tick. Absent entries mean the server has not yet processed any input from that client.
    pub input_acks: ArenaMap<PlayerId, u32>,
}

/// Fixed-capacity ring of snapshots in tick order. Capacity is a runtime value
/// (`EngineConfig::snapshot_history_size`), not a const generic, so this is backed by a
/// `VecDeque` rather than `arrayvec`/`heapless` (see `DESIGN.md`).
#[derive(Debug, Clone)]
pub struct SnapshotBuffer<W> {
    snapshots: VecDeque<Snapshot<W>>,
    capacity: usize,
}

impl<W> SnapshotBuffer<W> {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: VecDeque::with_capacity(capacity.min(1024)),
            capacity: capacity.max(1),
        }
    }

    /// Appends a snapshot, evicting the oldest if at capacity.
    ///
    /// # Panics
    ///
    /// In debug builds, if `s.tick` is not strictly greater than the current latest tick — the
    /// invariant every caller (`GameLoop`, `RollbackClient`) must uphold.
    pub fn add(&mut self, s: Snapshot<W>) {
        debug_assert!(
            self.snapshots.back().map_or(true, |last| s.tick > last.tick),
            "snapshots must be added in strictly increasing tick order"
        );
        if self.snapshots.len() >= self.capacity {
            self.snapshots.pop_front();
        }
        self.snapshots.push_back(s);
    }

    /// The highest-tick snapshot. Under the add-order invariant this is also the most recently
    /// inserted one, but computed by tick rather than assumed, so an out-of-order push can never
    /// silently regress what renders as "current".
    pub fn latest(&self) -> Option<&Snapshot<W>> {
        self.snapshots.iter().max_by_key(|s| s.tick)
    }

    /// The snapshot whose tick equals `t`, if still buffered.
    pub fn at_tick(&self, t: u64) -> Option<&Snapshot<W>> {
        self.snapshots.iter().find(|s| s.tick == t)
    }

    /// The most recent snapshot with `timestamp_ms <= ts`, or the earliest buffered snapshot if
    /// `ts` precedes all of them.
    pub fn at_timestamp(&self, ts: TimestampMs) -> Option<&Snapshot<W>> {
        if self.snapshots.is_empty() {
            return None;
        }
        let best = self
            .snapshots
            .iter()
            .filter(|s| s.timestamp_ms <= ts)
            .max_by_key(|s| s.timestamp_ms);
        best.or_else(|| self.snapshots.iter().min_by_key(|s| s.timestamp_ms))
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Snapshot<W>> {
        self.snapshots.iter()
    }
}
