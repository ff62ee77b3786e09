// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! The game-definition contract, the seam between this crate and concrete game rules. Every type
//! here is implemented by the game, never by the core.

use crate::ids::PlayerId;
use crate::ArenaMap;

/// A deterministic, pure game simulation. `W: Simulate` is the opaque world type: the core clones
/// it, stores it in snapshots, and passes it to these methods, but never reads
/// its fields.
pub trait Simulate: Clone {
    /// Per-player input. `Copy` because it is stored by value in input buffers/queues and
    /// resimulated many times during reconciliation/rollback.
    type Input: Copy;
    /// A discrete, lag-compensated action (e.g. "attack"). Not `Copy`: actions are drained once
    /// and dropped, never replayed.
    type Action;
    /// Whatever the game's action validator wants to report back to the caller on success (e.g.
    /// damage dealt). `()` for games with no action channel.
    type ActionOutcome;

    /// Advances the world by one tick given one input per known client. Must be pure: the same
    /// `(self, inputs, dt_ms)` always produces a world that hashes equal, for any number of
    /// independent callers.
    fn simulate(&self, inputs: &ArenaMap<PlayerId, Self::Input>, dt_ms: u32) -> Self;

    /// Blends two worlds for rendering, `alpha` in `[0, 1]`. Teleport suppression, discrete-field
    /// selection, and appear/vanish-for-one-frame handling for join/leave asymmetry all live in
    /// the game's implementation; [`crate::interpolator::lerp_with_teleport`] is provided as a
    /// building block for the common position/velocity case.
    fn interpolate(from: &Self, to: &Self, alpha: f32) -> Self;

    /// The input substituted for a client the server has never heard from, or a disconnected/AFK
    /// client that has produced nothing this tick and has no prior input to repeat.
    fn create_idle_input() -> Self::Input;

    /// Adds a new player's state to the world. Called by [`crate::world_manager::WorldManager`].
    fn add_player(&mut self, id: PlayerId);

    /// Removes a player's state from the world.
    fn remove_player(&mut self, id: PlayerId);

    /// Validates an action against a (possibly historical, lag-compensated) world state. Must not
    /// mutate `self`; [`ActionOutcome::result`] carries whatever is needed to apply the effect to
    /// the live world via [`Simulate::apply_action_outcome`].
    fn validate_action(
        &self,
        client_id: PlayerId,
        action: &Self::Action,
    ) -> ActionOutcome<Self::ActionOutcome>;

    /// Applies a successful action's outcome to the *current* (non-historical) world, the
    /// game-specific application point for a validated action's effect.
    fn apply_action_outcome(&mut self, client_id: PlayerId, outcome: &Self::ActionOutcome);
}

/// A game-supplied capability set for client-side prediction. Only implemented client-side; the
/// server never predicts.
pub trait PredictionScope: Simulate {
    /// The subset of `W` a client may simulate ahead of the server: typically the local player
    /// and anything it owns outright (projectiles it fired, etc).
    type Partial: Clone;

    /// Isolates `local_id`'s predictable state out of an authoritative or historical world.
    fn extract_predictable(world: &Self, local_id: PlayerId) -> Self::Partial;

    /// Overlays predicted fields (position, velocity, movement substate) onto an authoritative
    /// world, leaving everything else (combat, score) server-authoritative.
    fn merge_prediction(server_world: &Self, predicted: &Self::Partial) -> Self;

    /// Advances the predictable subset by one tick.
    fn simulate_predicted(partial: &Self::Partial, input: Self::Input, dt_ms: u32) -> Self::Partial;

    /// The local player's render position within a predicted partial, if it has one this tick
    /// (used by [`crate::tick_smoother::TickSmoother`]).
    fn get_local_player_position(partial: &Self::Partial, local_id: PlayerId) -> Option<(f32, f32)>;
}

/// Result of validating an action.
#[derive(Debug, Clone)]
pub struct ActionOutcome<R> {
    pub success: bool,
    pub result: Option<R>,
}

impl<R> ActionOutcome<R> {
    pub fn rejected() -> Self {
        Self {
            success: false,
            result: None,
        }
    }

    pub fn accepted(result: R) -> Self {
        Self {
            success: true,
            result: Some(result),
        }
    }
}
