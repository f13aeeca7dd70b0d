//! # ddev Probe Backoff
//!
//! File: cli/src/common/backoff.rs
//!
//! ## Overview
//!
//! The bounded exponential backoff schedule used for health probes and
//! restore-completion waits: initial 250 ms, factor 2, capped at 8 s,
//! under a total deadline (120 s by default).
//!
use std::time::Duration;

pub const INITIAL: Duration = Duration::from_millis(250);
pub const CAP: Duration = Duration::from_secs(8);
pub const DEADLINE: Duration = Duration::from_secs(120);

/// Iterator over successive probe delays. The caller enforces the total
/// deadline; this only yields the per-attempt waits.
pub fn delays() -> impl Iterator<Item = Duration> {
    let mut next = INITIAL;
    std::iter::from_fn(move || {
        let current = next;
        next = std::cmp::min(next * 2, CAP);
        Some(current)
    })
}
