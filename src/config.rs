// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Recognized engine configuration and its defaults.

/// Tunables shared by [`ServerStrategy`](crate::ServerStrategy) and
/// [`ClientStrategy`](crate::ClientStrategy).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Server ticks per second. Supported up to 60; above ~30 the per-tick work budget gets
    /// tight for anything beyond toy simulations.
    pub tick_rate: u32,
    /// Snapshot ring buffer capacity.
    pub snapshot_history_size: usize,
    /// Render-time lag applied to remote entities so the [`Interpolator`](crate::Interpolator)
    /// always has two bracketing snapshots to blend between.
    pub interpolation_delay_ms: u64,
    /// Client-side cap on unacknowledged inputs before oldest-first eviction.
    pub max_input_buffer_size: usize,
    /// Rollback-mode local input delay, in frames.
    pub input_delay_frames: u32,
    /// World-unit distance beyond which interpolation snaps instead of lerping.
    pub teleport_threshold: f32,
    /// Lag compensation rewind horizon.
    pub max_rewind_ms: u64,
    /// Tick smoother ramp duration, in render frames.
    pub smoothing_duration_frames: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_rate: 20,
            snapshot_history_size: 60,
            interpolation_delay_ms: 50,
            max_input_buffer_size: 1024,
            input_delay_frames: 2,
            teleport_threshold: 200.0,
            max_rewind_ms: 300,
            smoothing_duration_frames: 6,
        }
    }
}

impl EngineConfig {
    pub fn with_tick_rate(mut self, tick_rate: u32) -> Self {
        self.tick_rate = tick_rate;
        self
    }

    pub fn with_snapshot_history_size(mut self, size: usize) -> Self {
        self.snapshot_history_size = size;
        self
    }

    pub fn with_interpolation_delay_ms(mut self, ms: u64) -> Self {
        self.interpolation_delay_ms = ms;
        self
    }

    pub fn with_max_input_buffer_size(mut self, size: usize) -> Self {
        self.max_input_buffer_size = size;
        self
    }

    pub fn with_max_rewind_ms(mut self, ms: u64) -> Self {
        self.max_rewind_ms = ms;
        self
    }

    pub fn with_input_delay_frames(mut self, frames: u32) -> Self {
        self.input_delay_frames = frames;
        self
    }

    pub fn with_teleport_threshold(mut self, threshold: f32) -> Self {
        self.teleport_threshold = threshold;
        self
    }

    pub fn with_smoothing_duration_frames(mut self, frames: u32) -> Self {
        self.smoothing_duration_frames = frames;
        self
    }

    /// Milliseconds per server tick, derived from `tick_rate`.
    pub fn dt_ms(&self) -> u32 {
        1000 / self.tick_rate
    }
}
