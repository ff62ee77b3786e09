// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! World Manager: adds and removes players in world state, and keeps the
//! ordered set of clients the `GameLoop` resolves inputs for each tick.

use crate::game::Simulate;
use crate::ids::PlayerId;
use std::collections::BTreeSet;

/// Tracks which clients are known to the world, so a tick's input resolution for every known
/// client doesn't need the host to pass a fresh list every call.
#[derive(Debug, Default)]
pub struct WorldManager {
    known_clients: BTreeSet<PlayerId>,
}

impl WorldManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a player to `world` and to the known-client set.
    pub fn add_client<W: Simulate>(&mut self, world: &mut W, client: PlayerId) {
        world.add_player(client);
        self.known_clients.insert(client);
    }

    /// Removes a player from `world` and from the known-client set.
    pub fn remove_client<W: Simulate>(&mut self, world: &mut W, client: PlayerId) {
        world.remove_player(client);
        self.known_clients.remove(&client);
    }

    pub fn contains(&self, client: PlayerId) -> bool {
        self.known_clients.contains(&client)
    }

    /// Known clients in stable (`PlayerId`) order, for deterministic input-map construction.
    pub fn known_clients(&self) -> impl Iterator<Item = PlayerId> + '_ {
        self.known_clients.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.known_clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.known_clients.is_empty()
    }
}
