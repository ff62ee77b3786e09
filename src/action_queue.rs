// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Action Queue: the server's per-tick queue of discrete actions awaiting lag-compensated
//! validation.

use crate::ids::PlayerId;
use crate::messages::ActionMessage;
use std::collections::VecDeque;

/// FIFO of actions awaiting their tick's drain. Unlike [`crate::input_queue::InputQueue`], this
/// has no per-client merge step: every action is validated individually.
pub struct ActionQueue<A> {
    queue: VecDeque<ActionMessage<A>>,
}

impl<A> Default for ActionQueue<A> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
        }
    }
}

impl<A> ActionQueue<A> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&mut self, message: ActionMessage<A>) {
        self.queue.push_back(message);
    }

    /// Drains every queued action, oldest first, for validation this tick.
    pub fn drain(&mut self) -> std::collections::vec_deque::Drain<'_, ActionMessage<A>> {
        self.queue.drain(..)
    }

    /// Discards a disconnecting client's queued actions.
    pub fn remove_client(&mut self, client: PlayerId) {
        self.queue.retain(|m| m.client_id != client);
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
