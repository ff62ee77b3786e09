// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Rollback Client: a GGPO-style alternative to the server-authoritative strategy, for symmetric
//! peer simulations. Every peer runs the same world forward on its own
//! prediction of remote inputs, and resimulates from the point a correction arrives.

use crate::game::Simulate;
use crate::ids::PlayerId;
use crate::ArenaMap;
use std::collections::BTreeMap;

/// Frame-indexed history of one peer's (or the local player's) inputs, overwritten on rollback.
/// Kept as a plain `BTreeMap` rather than [`crate::snapshot::SnapshotBuffer`]: rollback needs
/// point overwrites of arbitrary past frames, not ring eviction, and truncate-from-frame
/// semantics the snapshot ring doesn't (and shouldn't) support.
type FrameHistory<T> = BTreeMap<u64, T>;

pub struct RollbackClient<W: Simulate> {
    local_player: PlayerId,
    current_frame: u64,
    confirmed_frame: u64,
    state_history: FrameHistory<W>,
    local_input_history: FrameHistory<W::Input>,
    remote_input_history: ArenaMap<PlayerId, FrameHistory<W::Input>>,
    input_delay: u32,
    dt_ms: u32,
}

impl<W: Simulate> RollbackClient<W> {
    pub fn new(initial_world: W, local_player: PlayerId, input_delay: u32, dt_ms: u32) -> Self {
        let mut state_history = FrameHistory::new();
        state_history.insert(0, initial_world);
        Self {
            local_player,
            current_frame: 0,
            confirmed_frame: 0,
            state_history,
            local_input_history: FrameHistory::new(),
            remote_input_history: ArenaMap::new(),
            input_delay,
            dt_ms,
        }
    }

    pub fn current_frame(&self) -> u64 {
        self.current_frame
    }

    pub fn confirmed_frame(&self) -> u64 {
        self.confirmed_frame
    }

    pub fn world(&self) -> &W {
        self.state_history
            .get(&self.current_frame)
            .expect("current_frame always has a state")
    }

    /// Stores a local input, delayed by `input_delay` frames so it lands at a frame every peer
    /// can still receive before simulating it.
    pub fn on_local_input(&mut self, input: W::Input) {
        let frame = self.current_frame + self.input_delay as u64;
        self.local_input_history.insert(frame, input);
    }

    /// Stores a remote player's input for `frame`. If it arrives for a frame already simulated
    /// (`frame < current_frame`), triggers a rollback to resimulate with the corrected input.
    pub fn on_remote_input(&mut self, player: PlayerId, input: W::Input, frame: u64) {
        if !self.remote_input_history.contains(player) {
            self.remote_input_history.insert(player, FrameHistory::new());
        }
        self.remote_input_history
            .get_mut(player)
            .expect("just inserted above if missing")
            .insert(frame, input);
        if frame < self.current_frame {
            log::debug!("rollback triggered: remote input for frame {frame} < current {}", self.current_frame);
            self.rollback_to(frame);
        }
    }

    /// Collects inputs for `frame` and advances the simulation by one frame: local input from
    /// history (or idle if the delayed input hasn't arrived yet), remote inputs from history (or
    /// predicted as "repeat the last known input" when missing).
    pub fn advance_frame(&mut self, players: &[PlayerId]) {
        let frame = self.current_frame;
        let inputs = self.resolve_inputs(frame, players);
        let world = self
            .state_history
            .get(&frame)
            .expect("current_frame always has a state")
            .simulate(&inputs, self.dt_ms);
        self.state_history.insert(frame + 1, world);
        self.current_frame += 1;
        self.cleanup_old_inputs();
    }

    /// Advances `confirmed_frame`, e.g. called by a transport adapter once it knows a frame's
    /// inputs are final across all peers. Confirmation can come from either remote-input receipt
    /// (`on_remote_input`) or this explicit call, matching real GGPO's
    /// advance-from-synchronized-input behavior.
    pub fn confirm_frame(&mut self, frame: u64) {
        self.confirmed_frame = self.confirmed_frame.max(frame);
        self.cleanup_old_inputs();
    }

    fn resolve_inputs(&self, frame: u64, players: &[PlayerId]) -> ArenaMap<PlayerId, W::Input> {
        let mut inputs = ArenaMap::new();
        for &player in players {
            let input = if player == self.local_player {
                self.local_input_history
                    .get(&frame)
                    .copied()
                    .unwrap_or_else(W::create_idle_input)
            } else {
                self.remote_input_history
                    .get(player)
                    .and_then(|history| {
                        history
                            .range(..=frame)
                            .next_back()
                            .map(|(_, input)| *input)
                    })
                    .unwrap_or_else(W::create_idle_input)
            };
            inputs.insert(player, input);
        }
        inputs
    }

    /// Restores state at frame `f`, then resimulates `[f, to)` with now-corrected inputs,
    /// replacing the subsequent history entries. `current_frame` ends back where it started.
    fn rollback_to(&mut self, f: u64) {
        let to = self.current_frame;
        debug_assert!(
            self.state_history.contains_key(&f),
            "rollback target frame {f} fell outside the retained history"
        );
        self.current_frame = f;
        self.state_history.retain(|&tick, _| tick <= f);
        let players: Vec<PlayerId> = self.remote_input_history.keys().chain(std::iter::once(self.local_player)).collect();
        while self.current_frame < to {
            self.advance_frame_without_cleanup(&players);
        }
    }

    fn advance_frame_without_cleanup(&mut self, players: &[PlayerId]) {
        let frame = self.current_frame;
        let inputs = self.resolve_inputs(frame, players);
        let world = self
            .state_history
            .get(&frame)
            .expect("resimulated frame always has a state")
            .simulate(&inputs, self.dt_ms);
        self.state_history.insert(frame + 1, world);
        self.current_frame += 1;
    }

    /// Drops input history for frames below `confirmed_frame - 10`.
    fn cleanup_old_inputs(&mut self) {
        let floor = self.confirmed_frame.saturating_sub(10);
        self.local_input_history.retain(|&frame, _| frame >= floor);
        for (_, history) in self.remote_input_history.iter_mut() {
            history.retain(|&frame, _| frame >= floor);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ActionOutcome;

    #[derive(Clone, Debug, PartialEq)]
    struct Sum(i64);

    impl Simulate for Sum {
        type Input = i64;
        type Action = ();
        type ActionOutcome = ();

        fn simulate(&self, inputs: &ArenaMap<PlayerId, Self::Input>, _dt_ms: u32) -> Self {
            Sum(self.0 + inputs.values().sum::<i64>())
        }
        fn interpolate(_from: &Self, to: &Self, _alpha: f32) -> Self {
            to.clone()
        }
        fn create_idle_input() -> Self::Input {
            0
        }
        fn add_player(&mut self, _id: PlayerId) {}
        fn remove_player(&mut self, _id: PlayerId) {}
        fn validate_action(&self, _c: PlayerId, _a: &()) -> ActionOutcome<()> {
            ActionOutcome::rejected()
        }
        fn apply_action_outcome(&mut self, _c: PlayerId, _o: &()) {}
    }

    /// Frames 0-9 simulated; remote input arrives late for frame 5; frames 5-9 are resimulated;
    /// `current_frame` stays at 10.
    #[test]
    fn rollback_resimulates_from_corrected_frame() {
        let local = PlayerId::nth_client(0).unwrap();
        let remote = PlayerId::nth_client(1).unwrap();
        let mut client = RollbackClient::<Sum>::new(Sum(0), local, 0, 50);
        let players = [local, remote];

        for frame in 0..10u64 {
            client.on_local_input(1);
            client.on_remote_input(remote, 1, frame);
            client.advance_frame(&players);
        }
        assert_eq!(client.current_frame(), 10);
        let without_correction = client.world().0;

        // late-arriving corrected input for frame 5: bump remote input from 1 to 10.
        client.on_remote_input(remote, 10, 5);
        assert_eq!(client.current_frame(), 10);
        assert_eq!(client.world().0, without_correction + 9);
    }

    #[test]
    fn confirm_frame_advances_monotonically() {
        let local = PlayerId::nth_client(0).unwrap();
        let mut client = RollbackClient::<Sum>::new(Sum(0), local, 0, 50);
        client.confirm_frame(5);
        assert_eq!(client.confirmed_frame(), 5);
        client.confirm_frame(3);
        assert_eq!(client.confirmed_frame(), 5);
        client.confirm_frame(8);
        assert_eq!(client.confirmed_frame(), 8);
    }

    #[test]
    fn input_delay_defers_local_input_application() {
        let local = PlayerId::nth_client(0).unwrap();
        let mut client = RollbackClient::<Sum>::new(Sum(0), local, 2, 50);
        client.on_local_input(5);
        // input landed at frame 0+2=2, not frame 0
        client.advance_frame(&[local]);
        assert_eq!(client.world().0, 0);
    }
}
