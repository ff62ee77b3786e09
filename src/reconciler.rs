// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Reconciler: the correctness engine. Detects server-ack divergence and
//! replays unacked inputs over the server's authoritative state.

use crate::game::PredictionScope;
use crate::ids::PlayerId;
use crate::input_buffer::InputBuffer;
use crate::predictor::Predictor;
use crate::snapshot::Snapshot;

/// Replays unacked inputs on every snapshot arrival — not just on detected divergence, since any
/// acked input transition may have corrected drift — divergence is never detected by
/// byte-compare.
pub struct Reconciler<W: PredictionScope> {
    local_id: PlayerId,
    /// `-1` sentinel for "nothing acked yet", kept as `i64` rather than `i32` so it comfortably
    /// holds any `u32` ack without a cast at the comparison site.
    last_acked_seq: i64,
}

impl<W: PredictionScope> Reconciler<W> {
    pub fn new(local_id: PlayerId) -> Self {
        Self {
            local_id,
            last_acked_seq: -1,
        }
    }

    pub fn last_acked_seq(&self) -> i64 {
        self.last_acked_seq
    }

    pub fn reset(&mut self) {
        self.last_acked_seq = -1;
    }

    /// Reconciles against an arriving snapshot, replaying unacked inputs and publishing the
    /// merged world via `on_reconciled`. Does nothing if the snapshot's ack for the local player
    /// matches the last one processed — idempotent.
    pub fn reconcile(
        &mut self,
        snapshot: &Snapshot<W>,
        input_buffer: &mut InputBuffer<W::Input>,
        predictor: &mut Predictor<W>,
        dt_ms: u32,
        on_reconciled: &mut dyn FnMut(W),
    ) {
        let ack_seq = snapshot.input_acks.get(self.local_id).copied();
        let ack = ack_seq.map(i64::from).unwrap_or(-1);
        if ack == self.last_acked_seq {
            return;
        }

        if let Some(ack_seq) = ack_seq {
            input_buffer.acknowledge(ack_seq);
        }
        let unacked = match ack_seq {
            Some(ack_seq) => input_buffer.unacknowledged(ack_seq),
            None => input_buffer.all(),
        };

        let mut partial = W::extract_predictable(&snapshot.state, self.local_id);
        for message in &unacked {
            partial = W::simulate_predicted(&partial, message.input, dt_ms);
        }

        log::debug!(
            "reconciling {:?}: ack {} -> replaying {} unacked inputs",
            self.local_id,
            ack,
            unacked.len()
        );

        predictor.set_predicted(partial.clone());
        self.last_acked_seq = ack;
        on_reconciled(W::merge_prediction(&snapshot.state, &partial));
    }
}
