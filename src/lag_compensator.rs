// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Lag Compensator: rewinds history to the client's reported timestamp so
//! action validation reflects what the shooting client actually saw on their screen.

use crate::error::NetcodeError;
use crate::game::{ActionOutcome, Simulate};
use crate::ids::PlayerId;
use crate::snapshot::SnapshotBuffer;
use crate::time::TimestampMs;
use crate::ArenaMap;

/// Per-client clock estimate, refreshed on every input arrival.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockInfo {
    pub latency_ms: u64,
    /// `server_wall_clock - client_reported_timestamp`, added to a client timestamp to convert it
    /// into server time.
    pub clock_skew_ms: i64,
}

pub struct LagCompensator {
    clients: ArenaMap<PlayerId, ClockInfo>,
    max_rewind_ms: u64,
}

impl LagCompensator {
    pub fn new(max_rewind_ms: u64) -> Self {
        Self {
            clients: ArenaMap::new(),
            max_rewind_ms,
        }
    }

    pub fn add_client(&mut self, client: PlayerId) {
        self.clients.insert(client, ClockInfo::default());
    }

    pub fn remove_client(&mut self, client: PlayerId) {
        self.clients.remove(client);
    }

    /// Updates `client`'s clock skew estimate from an arriving input's reported timestamp,
    /// compared to the server's wall clock at arrival. Called once per input, regardless of
    /// whether it's ultimately kept or dropped as stale by the input queue.
    pub fn on_input_arrival(&mut self, client: PlayerId, client_timestamp_ms: TimestampMs, server_now_ms: TimestampMs) {
        if let Some(info) = self.clients.get_mut(client) {
            info.clock_skew_ms = server_now_ms as i64 - client_timestamp_ms as i64;
        }
    }

    /// Lets a transport adapter that tracks round-trip time feed it in directly, since RTT
    /// measurement is a transport concern out of this crate's scope.
    pub fn set_latency(&mut self, client: PlayerId, latency_ms: u64) {
        if let Some(info) = self.clients.get_mut(client) {
            info.latency_ms = latency_ms;
        }
    }

    pub fn clock_info(&self, client: PlayerId) -> Option<ClockInfo> {
        self.clients.get(client).copied()
    }

    /// Validates an action reported at client time `tc` against the historical snapshot nearest
    /// `tc` converted to server time. Fails with [`NetcodeError::RewindWindowExceeded`] if no
    /// snapshot is within `max_rewind_ms`.
    pub fn validate_action<W: Simulate>(
        &self,
        snapshots: &SnapshotBuffer<W>,
        client: PlayerId,
        client_timestamp_ms: TimestampMs,
        action: &W::Action,
    ) -> Result<ActionOutcome<W::ActionOutcome>, NetcodeError> {
        let skew = self.clients.get(client).map(|c| c.clock_skew_ms).unwrap_or(0);
        let server_ts = (client_timestamp_ms as i64 + skew).max(0) as u64;
        let snapshot = snapshots
            .at_timestamp(server_ts)
            .ok_or(NetcodeError::RewindWindowExceeded {
                requested_ms: server_ts,
                max_rewind_ms: self.max_rewind_ms,
            })?;
        let rewind = server_ts.abs_diff(snapshot.timestamp_ms);
        if rewind > self.max_rewind_ms {
            log::warn!(
                "rejecting action from {client:?}: rewind {rewind}ms exceeds max_rewind_ms {}ms",
                self.max_rewind_ms
            );
            return Err(NetcodeError::RewindWindowExceeded {
                requested_ms: server_ts,
                max_rewind_ms: self.max_rewind_ms,
            });
        }
        Ok(snapshot.state.validate_action(client, action))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;

    #[derive(Clone, Debug, PartialEq)]
    struct Target {
        x: f32,
    }

    impl Simulate for Target {
        type Input = ();
        type Action = f32;
        type ActionOutcome = ();

        fn simulate(&self, _inputs: &ArenaMap<PlayerId, Self::Input>, _dt_ms: u32) -> Self {
            self.clone()
        }
        fn interpolate(_from: &Self, to: &Self, _alpha: f32) -> Self {
            to.clone()
        }
        fn create_idle_input() {}
        fn add_player(&mut self, _id: PlayerId) {}
        fn remove_player(&mut self, _id: PlayerId) {}

        fn validate_action(&self, _client_id: PlayerId, action: &f32) -> ActionOutcome<()> {
            const ATTACK_RADIUS: f32 = 50.0;
            if (self.x - action).abs() <= ATTACK_RADIUS {
                ActionOutcome::accepted(())
            } else {
                ActionOutcome::rejected()
            }
        }
        fn apply_action_outcome(&mut self, _c: PlayerId, _o: &()) {}
    }

    fn snap(tick: u64, ts: u64, x: f32) -> Snapshot<Target> {
        Snapshot {
            tick,
            timestamp_ms: ts,
            state: Target { x },
            input_acks: ArenaMap::new(),
        }
    }

    /// A hit-detection scenario where the target has moved between ticks: the action is
    /// validated against the snapshot nearest the attacker's reported timestamp, not the latest one.
    #[test]
    fn lag_comp_hit_scenario() {
        let mut buffer = SnapshotBuffer::new(10);
        for (tick, ts, x) in [(0u64, 1000u64, 10.0f32), (1, 1050, 15.0), (2, 1100, 20.0), (3, 1150, 25.0), (4, 1200, 30.0)] {
            buffer.add(snap(tick, ts, x));
        }
        let compensator = LagCompensator::new(300);
        let attacker = PlayerId::nth_client(0).unwrap();
        let outcome = compensator
            .validate_action(&buffer, attacker, 1075, &15.0)
            .unwrap();
        assert!(outcome.success);
    }

    #[test]
    fn rewind_window_exceeded_rejects() {
        let mut buffer = SnapshotBuffer::new(10);
        buffer.add(snap(0, 0, 10.0));
        let compensator = LagCompensator::new(300);
        let client = PlayerId::nth_client(0).unwrap();
        // requested time is 1000ms past the only buffered snapshot
        let outcome = compensator.validate_action(&buffer, client, 1000, &10.0);
        assert!(outcome.is_err());
    }

    #[test]
    fn clock_skew_shifts_requested_time() {
        let mut buffer = SnapshotBuffer::new(10);
        buffer.add(snap(0, 1000, 10.0));
        buffer.add(snap(1, 1100, 500.0));
        let mut compensator = LagCompensator::new(300);
        let client = PlayerId::nth_client(0).unwrap();
        compensator.add_client(client);
        // server clock is 1000ms ahead of the client's clock
        compensator.on_input_arrival(client, 50, 1050);
        assert_eq!(compensator.clock_info(client).unwrap().clock_skew_ms, 1000);
        // client reports timestamp 75 -> server time 1075, bracketed to snapshot at 1000
        let outcome = compensator.validate_action(&buffer, client, 75, &10.0).unwrap();
        assert!(outcome.success);
    }
}
