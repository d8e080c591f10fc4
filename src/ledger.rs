//! Play/sleep duration accounting.
//!
//! The ledger keeps two cumulative counters and the start of the segment
//! each one is currently accruing.  Exactly one segment is live at a time:
//! `Awake` (Play and Hunting) or `Asleep` (Sleep).
//!
//! ```text
//!   accrue(now):   live_counter += now - live_start ; live_start = now
//!   switch_to(s):  accrue(now) ; live = s ; start(s) = now
//!   reset(now):    both counters = 0 ; both starts = now
//! ```
//!
//! All arithmetic saturates.  A clock that steps backwards credits zero
//! and re-anchors the segment at the new reading.

use serde::{Deserialize, Serialize};

/// Which counter is currently accruing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment {
    Awake,
    Asleep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationLedger {
    cumulative_play_ms: u64,
    cumulative_sleep_ms: u64,
    play_segment_start: u64,
    sleep_segment_start: u64,
    live: Segment,
}

impl DurationLedger {
    /// Fresh ledger with both counters at zero and `live` accruing from `now`.
    pub const fn new(now: u64, live: Segment) -> Self {
        Self {
            cumulative_play_ms: 0,
            cumulative_sleep_ms: 0,
            play_segment_start: now,
            sleep_segment_start: now,
            live,
        }
    }

    /// Fold the live segment up to `now` into its counter.
    /// Returns the milliseconds credited.
    pub fn accrue(&mut self, now: u64) -> u64 {
        let (counter, start) = match self.live {
            Segment::Awake => (&mut self.cumulative_play_ms, &mut self.play_segment_start),
            Segment::Asleep => (&mut self.cumulative_sleep_ms, &mut self.sleep_segment_start),
        };
        let delta = now.saturating_sub(*start);
        *counter = counter.saturating_add(delta);
        *start = now;
        delta
    }

    /// Flush the outgoing segment, then start `segment` at `now`.
    /// Switching to the already-live segment is just a flush.
    pub fn switch_to(&mut self, segment: Segment, now: u64) {
        self.accrue(now);
        if segment == self.live {
            return;
        }
        self.live = segment;
        match segment {
            Segment::Awake => self.play_segment_start = now,
            Segment::Asleep => self.sleep_segment_start = now,
        }
    }

    /// Zero both counters and restart both segments at `now`.
    pub fn reset(&mut self, now: u64) {
        self.cumulative_play_ms = 0;
        self.cumulative_sleep_ms = 0;
        self.play_segment_start = now;
        self.sleep_segment_start = now;
    }

    pub fn play_ms(&self) -> u64 {
        self.cumulative_play_ms
    }

    pub fn sleep_ms(&self) -> u64 {
        self.cumulative_sleep_ms
    }

    pub fn total_ms(&self) -> u64 {
        self.cumulative_play_ms.saturating_add(self.cumulative_sleep_ms)
    }

    pub fn live(&self) -> Segment {
        self.live
    }

    pub fn play_segment_start(&self) -> u64 {
        self.play_segment_start
    }

    pub fn sleep_segment_start(&self) -> u64 {
        self.sleep_segment_start
    }

    /// Snapshot of the flushed counters.  Never includes an unflushed
    /// segment, so a report can't double-count the same interval.
    pub fn report(&self) -> TelemetryReport {
        TelemetryReport {
            play_time_ms: self.cumulative_play_ms,
            sleep_time_ms: self.cumulative_sleep_ms,
        }
    }
}

/// The `(playTime, sleepTime)` pair delivered to the analytics endpoint.
///
/// Field names on the wire match the existing server:
/// `{"playTime": <ms>, "sleepTime": <ms>}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TelemetryReport {
    #[serde(rename = "playTime")]
    pub play_time_ms: u64,
    #[serde(rename = "sleepTime")]
    pub sleep_time_ms: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accrue_credits_live_segment_only() {
        let mut l = DurationLedger::new(0, Segment::Awake);
        assert_eq!(l.accrue(1_000), 1_000);
        assert_eq!(l.play_ms(), 1_000);
        assert_eq!(l.sleep_ms(), 0);
        assert_eq!(l.play_segment_start(), 1_000);
    }

    #[test]
    fn repeated_accrue_does_not_recount() {
        let mut l = DurationLedger::new(0, Segment::Awake);
        l.accrue(500);
        l.accrue(500);
        l.accrue(800);
        assert_eq!(l.play_ms(), 800);
    }

    #[test]
    fn switch_flushes_outgoing_then_starts_incoming_at_now() {
        let mut l = DurationLedger::new(0, Segment::Awake);
        l.accrue(2_000);
        l.switch_to(Segment::Asleep, 3_000);
        assert_eq!(l.play_ms(), 3_000);
        assert_eq!(l.live(), Segment::Asleep);
        assert_eq!(l.sleep_segment_start(), 3_000);

        l.accrue(13_000);
        assert_eq!(l.sleep_ms(), 10_000);
        assert_eq!(l.play_ms(), 3_000);
    }

    #[test]
    fn clock_rollback_credits_zero() {
        let mut l = DurationLedger::new(5_000, Segment::Asleep);
        assert_eq!(l.accrue(1_000), 0);
        assert_eq!(l.sleep_ms(), 0);
        // Re-anchored at the rolled-back reading.
        assert_eq!(l.accrue(1_500), 500);
    }

    #[test]
    fn reset_zeroes_counters_and_keeps_live_segment() {
        let mut l = DurationLedger::new(0, Segment::Asleep);
        l.accrue(4_000);
        l.reset(4_000);
        assert_eq!(l.total_ms(), 0);
        assert_eq!(l.live(), Segment::Asleep);
        assert_eq!(l.play_segment_start(), 4_000);
        assert_eq!(l.sleep_segment_start(), 4_000);
    }

    #[test]
    fn saturates_instead_of_wrapping() {
        let mut l = DurationLedger::new(0, Segment::Awake);
        l.accrue(u64::MAX);
        l.switch_to(Segment::Awake, u64::MAX);
        assert_eq!(l.play_ms(), u64::MAX);
    }

    #[test]
    fn report_serialises_with_server_field_names() {
        let r = TelemetryReport {
            play_time_ms: 30_000,
            sleep_time_ms: 10_000,
        };
        let json = serde_json::to_string(&r).unwrap();
        assert_eq!(json, r#"{"playTime":30000,"sleepTime":10000}"#);
    }
}
