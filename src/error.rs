// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

//! Error taxonomy. Transient conditions (stale snapshot, stale input, unknown client) are handled
//! by silently dropping and are not represented here at all — only conditions that must be
//! surfaced to the host produce a [`NetcodeError`].
//!
//! A fatal game-definition failure (the world's `simulate` call panicking or otherwise being
//! unable to produce a next state) has no variant here: [`crate::Simulate::simulate`] is
//! infallible by signature (`-> Self`, no `Result`), so there is no tick-abort-and-retry path for
//! the core to drive. A host whose simulation can fail should make that failure unrepresentable
//! in its `World` type rather than reporting it through this enum.

use thiserror::Error;

/// Errors surfaced to the host application. Most failure modes are handled by silent drops or
/// `debug_assert!`s closer to the violation (see module docs), so this enum only covers the one
/// case that must stay visible to the caller: a rejected, lag-compensated action.
#[derive(Debug, Error)]
pub enum NetcodeError {
    /// Lag compensation couldn't find a historical snapshot within the rewind horizon.
    #[error("action rejected: no snapshot within {max_rewind_ms}ms of requested time {requested_ms}")]
    RewindWindowExceeded {
        requested_ms: u64,
        max_rewind_ms: u64,
    },
}
