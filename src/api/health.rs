//! Shared health state for the /health endpoint.
//! Updated by SessionTicker and the archive sync handler.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use serde::Serialize;

/// Shared health metrics. Written by background components, read by API.
#[derive(Default)]
pub struct HealthState {
    /// Mirrors the match clock as of the last tick.
    pub clock_running: AtomicBool,
    /// Millisecond timestamp of the last ticker pass (0 = not started).
    pub last_tick_at_ms: AtomicU64,
    pub events_logged: AtomicU64,
    pub active_suspensions: AtomicU64,
    /// Archive sync requests handed to the writer and not yet answered.
    pub archive_pending: AtomicU64,
    /// Millisecond timestamp of the last successful archive write (0 = none).
    pub last_archive_at_ms: AtomicU64,
}

#[derive(Debug, Serialize)]
pub struct HealthSnapshot {
    pub status: &'static str,
    pub clock_running: bool,
    pub last_tick_at_ms: u64,
    pub events_logged: u64,
    pub active_suspensions: u64,
    pub archive_pending: u64,
    pub last_archive_at_ms: u64,
}

impl HealthState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_tick(&self, now_ms: u64, clock_running: bool, events: usize, suspensions: usize) {
        self.last_tick_at_ms.store(now_ms, Ordering::Relaxed);
        self.clock_running.store(clock_running, Ordering::Relaxed);
        self.events_logged.store(events as u64, Ordering::Relaxed);
        self.active_suspensions.store(suspensions as u64, Ordering::Relaxed);
    }

    pub fn inc_archive_pending(&self) {
        self.archive_pending.fetch_add(1, Ordering::Relaxed);
    }

    pub fn dec_archive_pending(&self) {
        self.archive_pending.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn set_last_archive_at_ms(&self, ms: u64) {
        self.last_archive_at_ms.store(ms, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> HealthSnapshot {
        let last_tick_at_ms = self.last_tick_at_ms.load(Ordering::Relaxed);
        HealthSnapshot {
            status: if last_tick_at_ms == 0 { "starting" } else { "ok" },
            clock_running: self.clock_running.load(Ordering::Relaxed),
            last_tick_at_ms,
            events_logged: self.events_logged.load(Ordering::Relaxed),
            active_suspensions: self.active_suspensions.load(Ordering::Relaxed),
            archive_pending: self.archive_pending.load(Ordering::Relaxed),
            last_archive_at_ms: self.last_archive_at_ms.load(Ordering::Relaxed),
        }
    }
}

/// Wall-clock milliseconds since the Unix epoch.
pub fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
