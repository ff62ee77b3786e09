// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Game Loop: the server's fixed-timestep driver. Owns the live world and the snapshot history;
//! everything upstream (action validation, input queueing) is orchestrated by
//! [`crate::server_strategy::ServerStrategy`], which calls [`GameLoop::step`] once per tick.

use crate::game::Simulate;
use crate::ids::PlayerId;
use crate::input_queue::{InputMerger, InputQueue};
use crate::snapshot::{Snapshot, SnapshotBuffer};
use crate::time::TimestampMs;
use crate::ArenaMap;

pub struct GameLoop<W: Simulate> {
    world: W,
    tick: u64,
    dt_ms: u32,
    snapshots: SnapshotBuffer<W>,
}

impl<W: Simulate> GameLoop<W> {
    pub fn new(world: W, dt_ms: u32, snapshot_history_size: usize) -> Self {
        Self {
            world,
            tick: 0,
            dt_ms,
            snapshots: SnapshotBuffer::new(snapshot_history_size),
        }
    }

    pub fn world(&self) -> &W {
        &self.world
    }

    /// Mutable access to the live world, used by `ServerStrategy` to apply a validated action's
    /// outcome before this tick's `simulate` call.
    pub fn world_mut(&mut self) -> &mut W {
        &mut self.world
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn snapshots(&self) -> &SnapshotBuffer<W> {
        &self.snapshots
    }

    /// Resolves one input per known client, simulates one tick, and appends the resulting
    /// snapshot, invoking `on_tick` with it. Ticks never overlap — this is a plain synchronous
    /// call the host's periodic timer drives once per period; if a tick takes longer than the
    /// period the next one fires immediately rather than queueing a backlog, since there is no
    /// internal scheduler to build one up.
    pub fn step(
        &mut self,
        clients: impl Iterator<Item = PlayerId>,
        input_queue: &mut InputQueue<W::Input>,
        merger: &dyn InputMerger<W::Input>,
        timestamp_ms: TimestampMs,
        on_tick: &mut dyn FnMut(&Snapshot<W>),
    ) -> &Snapshot<W> {
        let idle = W::create_idle_input();
        let mut inputs = ArenaMap::new();
        let mut input_acks = ArenaMap::new();
        for client in clients {
            let input = input_queue.drain(client, merger, idle);
            inputs.insert(client, input);
            if let Some(ack) = input_queue.ack_for(client) {
                input_acks.insert(client, ack);
            }
        }

        self.world = self.world.simulate(&inputs, self.dt_ms);
        self.tick += 1;

        let snapshot = Snapshot {
            tick: self.tick,
            timestamp_ms,
            state: self.world.clone(),
            input_acks,
        };
        self.snapshots.add(snapshot);
        let latest = self
            .snapshots
            .latest()
            .expect("just added a snapshot above");
        on_tick(latest);
        latest
    }
}

#[cfg(feature = "desync")]
impl<W: Simulate + crate::hash::HbHash> GameLoop<W> {
    /// A determinism checksum of the live world, gated behind the `desync` feature since hashing
    /// every tick is wasted work once a host trusts its simulation. Intended for a host to log and
    /// compare across peers/replays when chasing a desync.
    pub fn checksum(&self) -> u32 {
        self.world.hb_hash_to_u32()
    }
}
