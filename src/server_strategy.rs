// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Server Strategy: the server-authoritative orchestrator wrapping Game Loop, Input Queue,
//! Snapshot Buffer, Action Queue, Lag Compensator, and World Manager.

use crate::action_queue::ActionQueue;
use crate::config::EngineConfig;
use crate::game::{ActionOutcome, Simulate};
use crate::game_loop::GameLoop;
use crate::ids::PlayerId;
use crate::input_queue::{InputMerger, InputQueue, LastInputWins};
use crate::lag_compensator::LagCompensator;
use crate::messages::{ActionAck, ActionMessage, InputMessage, MembershipEvent};
use crate::snapshot::Snapshot;
use crate::time::TimestampMs;
use crate::world_manager::WorldManager;

pub struct ServerStrategy<W: Simulate> {
    game_loop: GameLoop<W>,
    input_queue: InputQueue<W::Input>,
    action_queue: ActionQueue<W::Action>,
    lag_compensator: LagCompensator,
    world_manager: WorldManager,
    merger: Box<dyn InputMerger<W::Input>>,
    pending_removals: Vec<PlayerId>,
}

impl<W: Simulate> ServerStrategy<W> {
    pub fn new(initial_world: W, config: EngineConfig) -> Self {
        Self::with_merger(initial_world, config, Box::new(LastInputWins))
    }

    pub fn with_merger(
        initial_world: W,
        config: EngineConfig,
        merger: Box<dyn InputMerger<W::Input>>,
    ) -> Self {
        Self {
            game_loop: GameLoop::new(initial_world, config.dt_ms(), config.snapshot_history_size),
            input_queue: InputQueue::new(),
            action_queue: ActionQueue::new(),
            lag_compensator: LagCompensator::new(config.max_rewind_ms),
            world_manager: WorldManager::new(),
            merger,
            pending_removals: Vec::new(),
        }
    }

    pub fn get_tick(&self) -> u64 {
        self.game_loop.tick()
    }

    pub fn world(&self) -> &W {
        self.game_loop.world()
    }

    /// Registers a new client, adding it to the world immediately and emitting a `join` event so
    /// the host can broadcast it.
    pub fn add_client(&mut self, client: PlayerId, on_membership: &mut dyn FnMut(MembershipEvent)) {
        self.world_manager.add_client(self.game_loop.world_mut(), client);
        self.input_queue.add_client(client);
        self.lag_compensator.add_client(client);
        on_membership(MembershipEvent::Join(client));
    }

    /// Marks a client for removal. Its input/action queues are drained and discarded immediately;
    /// the world and known-client set are updated at the next `tick()` so the transition is
    /// visible in exactly one snapshot.
    pub fn remove_client(&mut self, client: PlayerId) {
        self.input_queue.remove_client(client);
        self.action_queue.remove_client(client);
        self.lag_compensator.remove_client(client);
        self.pending_removals.push(client);
    }

    /// Enqueues an arriving input. Unknown clients are dropped silently.
    pub fn on_client_input(&mut self, client: PlayerId, message: InputMessage<W::Input>, server_now_ms: TimestampMs) {
        if !self.world_manager.contains(client) {
            log::warn!("dropping input from unknown client {client:?}");
            return;
        }
        self.lag_compensator.on_input_arrival(client, message.timestamp_ms, server_now_ms);
        self.input_queue.enqueue(client, message);
    }

    /// Enqueues an arriving action for validation on the next tick.
    pub fn on_client_action(&mut self, message: ActionMessage<W::Action>) {
        if !self.world_manager.contains(message.client_id) {
            log::warn!("dropping action from unknown client {:?}", message.client_id);
            return;
        }
        self.action_queue.enqueue(message);
    }

    /// Drives one server tick: applies deferred removals (emitting a `leave` event for each),
    /// validates and applies queued actions, resolves this tick's inputs, simulates, and
    /// appends/broadcasts the resulting snapshot.
    pub fn tick(
        &mut self,
        server_now_ms: TimestampMs,
        on_membership: &mut dyn FnMut(MembershipEvent),
        on_action_ack: &mut dyn FnMut(PlayerId, ActionAck<W::ActionOutcome>),
        on_tick: &mut dyn FnMut(&Snapshot<W>),
    ) -> &Snapshot<W> {
        for client in self.pending_removals.drain(..) {
            self.world_manager.remove_client(self.game_loop.world_mut(), client);
            on_membership(MembershipEvent::Leave(client));
        }

        let actions: Vec<_> = self.action_queue.drain().collect();
        for ActionMessage { client_id, seq, action, timestamp_ms } in actions {
            let outcome = self
                .lag_compensator
                .validate_action(self.game_loop.snapshots(), client_id, timestamp_ms, &action);
            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(err) => {
                    log::warn!("action rejected: {err}");
                    ActionOutcome::rejected()
                }
            };
            if outcome.success {
                if let Some(result) = &outcome.result {
                    self.game_loop.world_mut().apply_action_outcome(client_id, result);
                }
            }
            on_action_ack(
                client_id,
                ActionAck {
                    seq,
                    success: outcome.success,
                    result: outcome.result,
                },
            );
        }

        let clients: Vec<PlayerId> = self.world_manager.known_clients().collect();
        self.game_loop.step(
            clients.into_iter(),
            &mut self.input_queue,
            self.merger.as_ref(),
            server_now_ms,
            on_tick,
        )
    }
}
