// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Input Buffer: the client's queue of unacknowledged inputs, sequence-numbered.

use crate::messages::InputMessage;
use crate::time::TimestampMs;
use std::collections::BTreeMap;

/// Stores unacked [`InputMessage`]s by `seq`, bounded by `max_len` with oldest-first eviction.
pub struct InputBuffer<I> {
    messages: BTreeMap<u32, InputMessage<I>>,
    next_seq: u32,
    max_len: usize,
}

impl<I> InputBuffer<I> {
    pub fn new(max_len: usize) -> Self {
        Self {
            messages: BTreeMap::new(),
            next_seq: 0,
            max_len: max_len.max(1),
        }
    }

    /// Allocates the next `seq` and stores the input, evicting the lowest `seq` if over capacity.
    pub fn add(&mut self, input: I, timestamp_ms: TimestampMs) -> InputMessage<I>
    where
        I: Copy,
    {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        let message = InputMessage {
            seq,
            input,
            timestamp_ms,
        };
        self.messages.insert(seq, message);
        if self.messages.len() > self.max_len {
            if let Some((&lowest, _)) = self.messages.iter().next().map(|(k, v)| (k, *v)) {
                log::warn!("input buffer overflow, evicting seq {lowest}");
                self.messages.remove(&lowest);
            }
        }
        message
    }

    /// All messages with `seq > after`, ascending by `seq`.
    pub fn unacknowledged(&self, after: u32) -> Vec<InputMessage<I>>
    where
        I: Copy,
    {
        self.messages
            .range((std::ops::Bound::Excluded(after), std::ops::Bound::Unbounded))
            .map(|(_, m)| *m)
            .collect()
    }

    /// Every buffered message, ascending by `seq`. Equivalent to `unacknowledged` against a
    /// client that has never acked anything, before the local player's first ack arrives.
    pub fn all(&self) -> Vec<InputMessage<I>>
    where
        I: Copy,
    {
        self.messages.values().copied().collect()
    }

    /// Deletes all entries with `seq <= up_to`. Idempotent: calling twice with the same `up_to`
    /// is a no-op the second time.
    pub fn acknowledge(&mut self, up_to: u32) {
        self.messages.retain(|&seq, _| seq > up_to);
    }

    /// Resets the buffer, including `next_seq`.
    pub fn clear(&mut self) {
        self.messages.clear();
        self.next_seq = 0;
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn next_seq(&self) -> u32 {
        self.next_seq
    }
}
