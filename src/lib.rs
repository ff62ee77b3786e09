// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! A game-agnostic netcode core: authoritative-server tick loop with client-side prediction,
//! server reconciliation, entity interpolation, lag compensation, and a GGPO-style rollback
//! alternative.
//!
//! The crate never touches a socket, a render surface, or an input device; it consumes a game
//! definition ([`Simulate`], optionally [`PredictionScope`]) and produces/consumes plain structs
//! ([`InputMessage`], [`Snapshot`], [`ActionMessage`]) that the host's own transport moves between
//! processes however it likes.
//!
//! Two top-level orchestrators cover the two supported topologies:
//! - [`ServerStrategy`] / [`ClientStrategy`]: authoritative server with client-side prediction and
//!   reconciliation.
//! - [`RollbackClient`]: GGPO-style rollback for symmetric peer simulations.

mod action_queue;
mod arena_map;
mod client_strategy;
mod config;
mod error;
mod game;
mod game_loop;
mod hash;
mod ids;
mod input_buffer;
mod input_queue;
mod interpolator;
mod lag_compensator;
mod messages;
mod predictor;
mod reconciler;
mod rollback;
mod server_strategy;
mod snapshot;
mod tick_smoother;
mod time;
mod world_manager;

pub use action_queue::ActionQueue;
pub use arena_map::ArenaMap;
pub use client_strategy::{ClientRenderView, ClientStrategy};
pub use config::EngineConfig;
pub use error::NetcodeError;
pub use game::{ActionOutcome, PredictionScope, Simulate};
pub use game_loop::GameLoop;
pub use hash::{CompatHasher, HbHash};
pub use ids::{ArenaKey, PlayerId};
pub use input_buffer::InputBuffer;
pub use input_queue::{InputMerger, InputQueue, LastInputWins, MergeInputs, OrUnionMerger};
pub use interpolator::{lerp_with_teleport, Interpolator};
pub use lag_compensator::{ClockInfo, LagCompensator};
pub use messages::{ActionAck, ActionMessage, InputMessage, MembershipEvent};
pub use predictor::Predictor;
pub use reconciler::Reconciler;
pub use rollback::RollbackClient;
pub use server_strategy::ServerStrategy;
pub use snapshot::{Snapshot, SnapshotBuffer};
pub use tick_smoother::TickSmoother;
pub use time::{Clock, TimestampMs};
pub use world_manager::WorldManager;
