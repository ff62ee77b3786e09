// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Client Strategy: the server-authoritative client orchestrator wrapping Input Buffer,
//! received-snapshot buffer (via the Interpolator), Predictor, Reconciler, and Tick Smoother.

use crate::config::EngineConfig;
use crate::game::PredictionScope;
use crate::ids::PlayerId;
use crate::input_buffer::InputBuffer;
use crate::interpolator::Interpolator;
use crate::messages::InputMessage;
use crate::predictor::Predictor;
use crate::reconciler::Reconciler;
use crate::snapshot::Snapshot;
use crate::tick_smoother::TickSmoother;
use crate::time::TimestampMs;

/// What the host renders this frame: the merged world (remote entities interpolated, local
/// player predicted) plus a smoothed override position for the local player, if any reconciliation
/// is still bleeding off.
pub struct ClientRenderView<W> {
    pub world: W,
    pub local_player_position: Option<(f32, f32)>,
}

pub struct ClientStrategy<W: PredictionScope> {
    local_id: PlayerId,
    input_buffer: InputBuffer<W::Input>,
    predictor: Predictor<W>,
    reconciler: Reconciler<W>,
    interpolator: Interpolator<W>,
    tick_smoother: TickSmoother,
    dt_ms: u32,
}

impl<W: PredictionScope> ClientStrategy<W> {
    pub fn new(local_id: PlayerId, config: EngineConfig) -> Self {
        Self {
            local_id,
            input_buffer: InputBuffer::new(config.max_input_buffer_size),
            predictor: Predictor::new(local_id),
            reconciler: Reconciler::new(local_id),
            interpolator: Interpolator::new(config.snapshot_history_size, config.interpolation_delay_ms),
            tick_smoother: TickSmoother::new(config.smoothing_duration_frames),
            dt_ms: config.dt_ms(),
        }
    }

    pub fn local_id(&self) -> PlayerId {
        self.local_id
    }

    /// Seeds the predictor from the first authoritative world received, e.g. on join.
    pub fn seed(&mut self, world: &W) {
        self.predictor.seed(world);
    }

    /// Stamps a local input with the next `seq`, records it for replay, and returns the message
    /// to send to the server.
    pub fn on_local_input(&mut self, input: W::Input, timestamp_ms: TimestampMs) -> InputMessage<W::Input> {
        let message = self.input_buffer.add(input, timestamp_ms);
        self.predictor.predict(input, self.dt_ms);
        message
    }

    /// Feeds an arriving snapshot to the reconciler (for the local player) and the interpolator
    /// (for remote entities), publishing the reconciled merged world via `on_reconciled`.
    pub fn on_snapshot(&mut self, snapshot: Snapshot<W>, on_reconciled: &mut dyn FnMut(W)) {
        let prev_pos = self
            .predictor
            .current()
            .and_then(|p| W::get_local_player_position(p, self.local_id));

        self.reconciler.reconcile(
            &snapshot,
            &mut self.input_buffer,
            &mut self.predictor,
            self.dt_ms,
            on_reconciled,
        );

        if let (Some(prev), Some(partial)) = (prev_pos, self.predictor.current()) {
            if let Some(new) = W::get_local_player_position(partial, self.local_id) {
                if new != prev {
                    self.tick_smoother.on_reconciliation(prev, new);
                }
            }
        }

        self.interpolator.on_snapshot(snapshot);
    }

    /// Computes this frame's render view: remote entities interpolated at `now_ms -
    /// interpolation_delay_ms`, overlaid with the local player's current prediction, plus a
    /// tick-smoothed local player position.
    pub fn on_render_frame(&mut self, now_ms: TimestampMs) -> Option<ClientRenderView<W>> {
        let remote = self.interpolator.render(now_ms)?;
        let predicted = self.predictor.current()?;
        let world = W::merge_prediction(&remote, predicted);
        let true_pos = W::get_local_player_position(predicted, self.local_id);
        let local_player_position = true_pos.map(|pos| self.tick_smoother.smooth(pos));
        Some(ClientRenderView {
            world,
            local_player_position,
        })
    }

    /// Resets all client-side state on disconnect.
    pub fn reset(&mut self) {
        self.input_buffer.clear();
        self.predictor.reset();
        self.reconciler.reset();
        self.interpolator.clear();
        self.tick_smoother.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{ActionOutcome, Simulate};
    use crate::ArenaMap;

    #[derive(Clone, Debug, PartialEq)]
    struct World1D {
        x: f64,
    }

    impl Simulate for World1D {
        type Input = f64;
        type Action = ();
        type ActionOutcome = ();

        fn simulate(&self, inputs: &ArenaMap<PlayerId, Self::Input>, _dt_ms: u32) -> Self {
            World1D { x: self.x + inputs.values().sum::<f64>() }
        }
        fn interpolate(_from: &Self, to: &Self, _alpha: f32) -> Self {
            to.clone()
        }
        fn create_idle_input() -> Self::Input {
            0.0
        }
        fn add_player(&mut self, _id: PlayerId) {}
        fn remove_player(&mut self, _id: PlayerId) {}
        fn validate_action(&self, _c: PlayerId, _a: &()) -> ActionOutcome<()> {
            ActionOutcome::rejected()
        }
        fn apply_action_outcome(&mut self, _c: PlayerId, _o: &()) {}
    }

    impl PredictionScope for World1D {
        type Partial = World1D;
        fn extract_predictable(world: &Self, _local_id: PlayerId) -> Self::Partial {
            world.clone()
        }
        fn merge_prediction(server_world: &Self, predicted: &Self::Partial) -> Self {
            World1D { x: predicted.x, ..server_world.clone() }
        }
        fn simulate_predicted(partial: &Self::Partial, input: Self::Input, _dt_ms: u32) -> Self::Partial {
            World1D { x: partial.x + input }
        }
        fn get_local_player_position(partial: &Self::Partial, _local_id: PlayerId) -> Option<(f32, f32)> {
            Some((partial.x as f32, 0.0))
        }
    }

    #[test]
    fn local_input_predicts_immediately() {
        let local = PlayerId::nth_client(0).unwrap();
        let mut client = ClientStrategy::<World1D>::new(local, EngineConfig::default());
        client.seed(&World1D { x: 0.0 });
        let message = client.on_local_input(10.0, 0);
        assert_eq!(message.seq, 0);
        assert_eq!(client.predictor.current().unwrap().x, 10.0);
    }

    #[test]
    fn reset_clears_prediction_and_buffers() {
        let local = PlayerId::nth_client(0).unwrap();
        let mut client = ClientStrategy::<World1D>::new(local, EngineConfig::default());
        client.seed(&World1D { x: 0.0 });
        client.on_local_input(1.0, 0);
        client.reset();
        assert!(client.predictor.current().is_none());
        assert!(client.input_buffer.is_empty());
    }

    #[test]
    fn render_frame_is_none_before_any_snapshot() {
        let local = PlayerId::nth_client(0).unwrap();
        let mut client = ClientStrategy::<World1D>::new(local, EngineConfig::default());
        client.seed(&World1D { x: 0.0 });
        assert!(client.on_render_frame(0).is_none());
    }
}
