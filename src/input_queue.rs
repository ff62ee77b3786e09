// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Input Queue: the server's per-client input backlog, dequeued once per tick.

use crate::ids::PlayerId;
use crate::messages::InputMessage;
use crate::ArenaMap;

/// Combines however many inputs arrived for a client since the last tick into the single input
/// that tick will apply.
pub trait InputMerger<I> {
    /// `pending` is non-empty and ordered by `seq`. `previous` is the input last applied for this
    /// client, if any (used when a merger wants to fall back to repeating state rather than
    /// picking a single pending value).
    fn merge(&self, pending: &[I], previous: Option<I>) -> I;
}

/// Default merger: "last input wins". Simple and deterministic, but can discard momentary presses
/// (jump, shoot) that arrived and were released between ticks.
#[derive(Debug, Default, Clone, Copy)]
pub struct LastInputWins;

impl<I: Copy> InputMerger<I> for LastInputWins {
    fn merge(&self, pending: &[I], _previous: Option<I>) -> I {
        *pending.last().expect("merge called with empty pending slice")
    }
}

/// Inputs whose momentary-action fields can be combined by bitwise OR instead of overwritten, so
/// a merger doesn't have to pick a single winner and drop the others.
pub trait MergeInputs: Copy {
    fn merge_or(self, other: Self) -> Self;
}

/// Combines every pending input via [`MergeInputs::merge_or`] instead of discarding all but the
/// last, so a jump/shoot press that arrived mid-jitter-window is never silently dropped.
#[derive(Debug, Default, Clone, Copy)]
pub struct OrUnionMerger;

impl<I: MergeInputs> InputMerger<I> for OrUnionMerger {
    fn merge(&self, pending: &[I], _previous: Option<I>) -> I {
        let mut iter = pending.iter().copied();
        let first = iter.next().expect("merge called with empty pending slice");
        iter.fold(first, MergeInputs::merge_or)
    }
}

struct ClientQueue<I> {
    pending: Vec<InputMessage<I>>,
    last_applied: Option<I>,
    last_drained_seq: Option<u32>,
    ack: Option<u32>,
}

impl<I> Default for ClientQueue<I> {
    fn default() -> Self {
        Self {
            pending: Vec::new(),
            last_applied: None,
            last_drained_seq: None,
            ack: None,
        }
    }
}

/// Per-client FIFOs of inputs awaiting their tick's `drain`.
pub struct InputQueue<I> {
    clients: ArenaMap<PlayerId, ClientQueue<I>>,
}

impl<I> Default for InputQueue<I> {
    fn default() -> Self {
        Self {
            clients: ArenaMap::new(),
        }
    }
}

impl<I: Copy> InputQueue<I> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_client(&mut self, client: PlayerId) {
        self.clients.insert(client, ClientQueue::default());
    }

    pub fn remove_client(&mut self, client: PlayerId) {
        self.clients.remove(client);
    }

    /// Enqueues an arriving [`InputMessage`]. Stale (`seq <= last drained for this client`) and
    /// duplicate (`seq <= highest already pending`) messages are dropped silently.
    pub fn enqueue(&mut self, client: PlayerId, message: InputMessage<I>) {
        let Some(queue) = self.clients.get_mut(client) else {
            log::warn!("dropping input for unknown client {client:?}");
            return;
        };
        if let Some(last_drained) = queue.last_drained_seq {
            if message.seq <= last_drained {
                log::warn!("dropping stale input seq {} for {client:?}", message.seq);
                return;
            }
        }
        if let Some(last_pending) = queue.pending.last() {
            if message.seq <= last_pending.seq {
                log::warn!("dropping duplicate/out-of-order input seq {} for {client:?}", message.seq);
                return;
            }
        }
        queue.pending.push(message);
    }

    /// Dequeues this tick's input for `client` via `merger`, falling back to the last-seen input
    /// (preferred) or `idle` if nothing has arrived yet. The highest `seq` drained becomes this
    /// client's ack, and acks never regress since `drain` only ever advances them.
    pub fn drain(&mut self, client: PlayerId, merger: &dyn InputMerger<I>, idle: I) -> I {
        let Some(queue) = self.clients.get_mut(client) else {
            return idle;
        };
        if queue.pending.is_empty() {
            return queue.last_applied.unwrap_or(idle);
        }
        let values: Vec<I> = queue.pending.iter().map(|m| m.input).collect();
        let merged = merger.merge(&values, queue.last_applied);
        let highest_seq = queue.pending.last().expect("checked non-empty above").seq;
        queue.last_drained_seq = Some(highest_seq);
        queue.ack = Some(highest_seq);
        queue.last_applied = Some(merged);
        queue.pending.clear();
        merged
    }

    /// This client's current ack (highest drained `seq`), or `None` if nothing has been drained
    /// yet.
    pub fn ack_for(&self, client: PlayerId) -> Option<u32> {
        self.clients.get(client).and_then(|q| q.ack)
    }

    pub fn contains(&self, client: PlayerId) -> bool {
        self.clients.contains(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PlayerId;

    fn msg(seq: u32, input: u8) -> InputMessage<u8> {
        InputMessage {
            seq,
            input,
            timestamp_ms: seq as u64 * 50,
        }
    }

    #[test]
    fn drains_last_input_wins_by_default() {
        let mut q = InputQueue::<u8>::new();
        let c = PlayerId::nth_client(0).unwrap();
        q.add_client(c);
        q.enqueue(c, msg(0, 1));
        q.enqueue(c, msg(1, 2));
        q.enqueue(c, msg(2, 3));
        let out = q.drain(c, &LastInputWins, 0);
        assert_eq!(out, 3);
        assert_eq!(q.ack_for(c), Some(2));
    }

    #[test]
    fn repeats_last_applied_when_nothing_arrived() {
        let mut q = InputQueue::<u8>::new();
        let c = PlayerId::nth_client(0).unwrap();
        q.add_client(c);
        q.enqueue(c, msg(0, 5));
        assert_eq!(q.drain(c, &LastInputWins, 0), 5);
        // nothing new arrived this tick
        assert_eq!(q.drain(c, &LastInputWins, 0), 5);
        assert_eq!(q.ack_for(c), Some(0));
    }

    #[test]
    fn uses_idle_input_before_anything_arrives() {
        let mut q = InputQueue::<u8>::new();
        let c = PlayerId::nth_client(0).unwrap();
        q.add_client(c);
        assert_eq!(q.drain(c, &LastInputWins, 99), 99);
        assert_eq!(q.ack_for(c), None);
    }

    #[test]
    fn stale_and_duplicate_inputs_are_dropped() {
        let mut q = InputQueue::<u8>::new();
        let c = PlayerId::nth_client(0).unwrap();
        q.add_client(c);
        q.enqueue(c, msg(0, 1));
        q.drain(c, &LastInputWins, 0);
        // stale: seq 0 already drained
        q.enqueue(c, msg(0, 99));
        assert_eq!(q.drain(c, &LastInputWins, 0), 1);
    }

    #[test]
    fn unknown_client_input_is_a_no_op() {
        let mut q = InputQueue::<u8>::new();
        let unknown = PlayerId::nth_client(7).unwrap();
        q.enqueue(unknown, msg(0, 1));
        assert_eq!(q.drain(unknown, &LastInputWins, 42), 42);
    }

    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    struct Flags(u8);
    impl MergeInputs for Flags {
        fn merge_or(self, other: Self) -> Self {
            Flags(self.0 | other.0)
        }
    }

    #[test]
    fn or_union_merger_preserves_momentary_presses() {
        let mut q = InputQueue::<Flags>::new();
        let c = PlayerId::nth_client(0).unwrap();
        q.add_client(c);
        q.enqueue(
            c,
            InputMessage {
                seq: 0,
                input: Flags(0b01),
                timestamp_ms: 0,
            },
        );
        q.enqueue(
            c,
            InputMessage {
                seq: 1,
                input: Flags(0b10),
                timestamp_ms: 50,
            },
        );
        let merged = q.drain(c, &OrUnionMerger, Flags(0));
        assert_eq!(merged.0, 0b11);
    }
}
