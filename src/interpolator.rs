// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Interpolator: renders remote entities from two past snapshots, delayed by
//! `interpolation_delay_ms` so there's always a bracketing pair to blend between.

use crate::game::Simulate;
use crate::snapshot::{Snapshot, SnapshotBuffer};
use crate::time::TimestampMs;

/// Buffers received snapshots and produces a time-shifted render state between two of them.
pub struct Interpolator<W> {
    received: SnapshotBuffer<W>,
    delay_ms: u64,
}

impl<W: Simulate> Interpolator<W> {
    pub fn new(history_size: usize, delay_ms: u64) -> Self {
        Self {
            received: SnapshotBuffer::new(history_size),
            delay_ms,
        }
    }

    /// Feeds an arriving snapshot. Returns `false` if it was dropped for being stale — its tick is
    /// `<=` the latest already processed.
    pub fn on_snapshot(&mut self, snapshot: Snapshot<W>) -> bool {
        if let Some(latest) = self.received.latest() {
            if snapshot.tick <= latest.tick {
                log::warn!(
                    "dropping stale snapshot tick {} (latest processed {})",
                    snapshot.tick,
                    latest.tick
                );
                return false;
            }
        }
        self.received.add(snapshot);
        true
    }

    /// Computes the interpolated render world for wall-clock `now`. `None` until at least one
    /// snapshot has been received.
    pub fn render(&self, now_ms: TimestampMs) -> Option<W> {
        let tr = now_ms.saturating_sub(self.delay_ms);
        let (a, b) = self.bracket(tr)?;
        if a.timestamp_ms == b.timestamp_ms {
            return Some(W::interpolate(&a.state, &b.state, 1.0));
        }
        let alpha = ((tr as f64 - a.timestamp_ms as f64)
            / (b.timestamp_ms as f64 - a.timestamp_ms as f64))
            .clamp(0.0, 1.0) as f32;
        Some(W::interpolate(&a.state, &b.state, alpha))
    }

    /// Finds the adjacent snapshots bracketing `tr`, clamping to endpoints if `tr` falls outside
    /// the buffered range.
    fn bracket(&self, tr: TimestampMs) -> Option<(&Snapshot<W>, &Snapshot<W>)> {
        let mut before: Option<&Snapshot<W>> = None;
        let mut after: Option<&Snapshot<W>> = None;
        for s in self.received.iter() {
            if s.timestamp_ms <= tr && before.map_or(true, |b: &Snapshot<W>| s.timestamp_ms > b.timestamp_ms) {
                before = Some(s);
            }
            if s.timestamp_ms >= tr && after.map_or(true, |a: &Snapshot<W>| s.timestamp_ms < a.timestamp_ms) {
                after = Some(s);
            }
        }
        match (before, after) {
            (Some(b), Some(a)) => Some((b, a)),
            (Some(b), None) => Some((b, b)),
            (None, Some(a)) => Some((a, a)),
            (None, None) => None,
        }
    }

    pub fn clear(&mut self) {
        self.received.clear();
    }
}

/// Lerps a 2D position/velocity pair, snapping to `to` instead of blending when the jump exceeds
/// `teleport_threshold` world units — masks respawns and large corrections. A
/// building block for games to call from their own [`Simulate::interpolate`]; the core's
/// `Interpolator` never calls this itself, since `W` is opaque to it.
pub fn lerp_with_teleport(from: (f32, f32), to: (f32, f32), alpha: f32, teleport_threshold: f32) -> (f32, f32) {
    let dx = to.0 - from.0;
    let dy = to.1 - from.1;
    if (dx * dx + dy * dy).sqrt() > teleport_threshold {
        to
    } else {
        (from.0 + dx * alpha, from.1 + dy * alpha)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::ActionOutcome;
    use crate::ids::PlayerId;
    use crate::ArenaMap;

    #[derive(Clone, Debug, PartialEq)]
    struct Pos {
        x: f32,
        y: f32,
    }

    impl Simulate for Pos {
        type Input = ();
        type Action = ();
        type ActionOutcome = ();

        fn simulate(&self, _inputs: &ArenaMap<PlayerId, Self::Input>, _dt_ms: u32) -> Self {
            self.clone()
        }

        fn interpolate(from: &Self, to: &Self, alpha: f32) -> Self {
            let (x, y) = lerp_with_teleport((from.x, from.y), (to.x, to.y), alpha, 200.0);
            Pos { x, y }
        }

        fn create_idle_input() {}
        fn add_player(&mut self, _id: PlayerId) {}
        fn remove_player(&mut self, _id: PlayerId) {}
        fn validate_action(&self, _c: PlayerId, _a: &()) -> ActionOutcome<()> {
            ActionOutcome::rejected()
        }
        fn apply_action_outcome(&mut self, _c: PlayerId, _o: &()) {}
    }

    fn snap(tick: u64, ts: u64, x: f32) -> Snapshot<Pos> {
        Snapshot {
            tick,
            timestamp_ms: ts,
            state: Pos { x, y: 0.0 },
            input_acks: ArenaMap::new(),
        }
    }

    #[test]
    fn interpolates_between_two_bracketing_snapshots() {
        let mut interp = Interpolator::<Pos>::new(60, 50);
        interp.on_snapshot(snap(0, 1000, 0.0));
        interp.on_snapshot(snap(1, 1100, 100.0));
        // now=1150, delay=50 -> tr=1100, exactly at B
        let rendered = interp.render(1150).unwrap();
        assert_eq!(rendered.x, 100.0);

        // tr = 1050, halfway between 1000 and 1100
        let rendered = interp.render(1100).unwrap();
        assert_eq!(rendered.x, 50.0);
    }

    #[test]
    fn clamps_to_endpoints_outside_buffered_range() {
        let mut interp = Interpolator::<Pos>::new(60, 0);
        interp.on_snapshot(snap(0, 1000, 0.0));
        interp.on_snapshot(snap(1, 1100, 100.0));
        assert_eq!(interp.render(500).unwrap().x, 0.0);
        assert_eq!(interp.render(5000).unwrap().x, 100.0);
    }

    #[test]
    fn stale_snapshot_is_dropped() {
        let mut interp = Interpolator::<Pos>::new(60, 0);
        assert!(interp.on_snapshot(snap(100, 1000, 0.0)));
        assert!(!interp.on_snapshot(snap(99, 900, 0.0)));
        assert!(interp.on_snapshot(snap(101, 1100, 1.0)));
    }

    #[test]
    fn teleport_suppresses_blending() {
        let mut interp = Interpolator::<Pos>::new(60, 0);
        interp.on_snapshot(snap(0, 1000, 10.0));
        interp.on_snapshot(snap(1, 1100, 500.0));
        let rendered = interp.render(1050).unwrap();
        assert_eq!(rendered.x, 500.0);
    }

    #[test]
    fn interpolate_endpoints_are_identity_at_bounds() {
        let a = Pos { x: 1.0, y: 2.0 };
        let b = Pos { x: 5.0, y: 6.0 };
        assert_eq!(Pos::interpolate(&a, &b, 0.0), a);
        assert_eq!(Pos::interpolate(&a, &b, 1.0), b);
    }
}
