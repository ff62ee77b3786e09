// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Predictor: the client's extract -> simulate -> merge pipeline, holding a
//! rolling predicted-partial state ahead of the server.

use crate::game::PredictionScope;
use crate::ids::PlayerId;

pub struct Predictor<W: PredictionScope> {
    local_id: PlayerId,
    predicted: Option<W::Partial>,
}

impl<W: PredictionScope> Predictor<W> {
    pub fn new(local_id: PlayerId) -> Self {
        Self {
            local_id,
            predicted: None,
        }
    }

    /// Seeds the rolling prediction from an authoritative or historical world, discarding any
    /// prior predicted partial. Used on join and by the [`crate::reconciler::Reconciler`] as the
    /// base for a replay.
    pub fn seed(&mut self, world: &W) {
        self.predicted = Some(W::extract_predictable(world, self.local_id));
    }

    /// Overwrites the rolling prediction directly (used by the reconciler after replaying unacked
    /// inputs, to avoid re-deriving what it just computed).
    pub fn set_predicted(&mut self, partial: W::Partial) {
        self.predicted = Some(partial);
    }

    /// Advances the rolling prediction by one local input and returns the new partial.
    ///
    /// # Panics
    ///
    /// If called before [`Predictor::seed`].
    pub fn predict(&mut self, input: W::Input, dt_ms: u32) -> &W::Partial {
        let partial = self
            .predicted
            .take()
            .expect("predictor must be seeded before predicting");
        self.predicted = Some(W::simulate_predicted(&partial, input, dt_ms));
        self.predicted.as_ref().expect("just set it above")
    }

    pub fn current(&self) -> Option<&W::Partial> {
        self.predicted.as_ref()
    }

    pub fn local_id(&self) -> PlayerId {
        self.local_id
    }

    /// Clears the rolling prediction (e.g. on disconnect).
    pub fn reset(&mut self) {
        self.predicted = None;
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
            World1D {
                x: self.x + inputs.values().sum::<f64>(),
            }
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
            World1D {
                x: predicted.x,
                ..server_world.clone()
            }
        }

        fn simulate_predicted(partial: &Self::Partial, input: Self::Input, _dt_ms: u32) -> Self::Partial {
            World1D { x: partial.x + input }
        }

        fn get_local_player_position(partial: &Self::Partial, _local_id: PlayerId) -> Option<(f32, f32)> {
            Some((partial.x as f32, 0.0))
        }
    }

    #[test]
    fn predict_advances_from_seed() {
        let local = PlayerId::nth_client(0).unwrap();
        let mut p = Predictor::<World1D>::new(local);
        p.seed(&World1D { x: 0.0 });
        p.predict(10.0, 50);
        p.predict(5.0, 50);
        assert_eq!(p.current().unwrap().x, 15.0);
    }

    #[test]
    #[should_panic]
    fn predict_without_seed_panics() {
        let local = PlayerId::nth_client(0).unwrap();
        let mut p = Predictor::<World1D>::new(local);
        p.predict(1.0, 50);
    }
}
