//! Fuzz target: mode controller tick sequences
//!
//! Every 10 input bytes become one tick: a signed clock step (i16, ms)
//! and raw x/y floats, including NaN and infinities.  Checks:
//! - No panics, whatever the clock or sensor does
//! - At most one transition per tick, always from the pre-tick mode
//! - Counters never decrease
//! - Credited time equals the forward clock delta
//!
//! cargo fuzz run fuzz_tick_sequence

#![no_main]

use cattoy::fsm::Controller;
use cattoy::motion::MotionSample;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let ctl = Controller::default();
    let mut now = 1u64 << 32;
    let mut state = ctl.start(now);

    for chunk in data.chunks_exact(10) {
        let step = i16::from_le_bytes([chunk[0], chunk[1]]);
        let x = f32::from_le_bytes([chunk[2], chunk[3], chunk[4], chunk[5]]);
        let y = f32::from_le_bytes([chunk[6], chunk[7], chunk[8], chunk[9]]);

        let prev = now;
        now = now.saturating_add_signed(i64::from(step) * 16);

        let before = state;
        let (next, out) = ctl.tick(state, now, MotionSample::new(x, y));

        assert_eq!(out.credited_ms, now.saturating_sub(prev));
        assert!(next.cumulative_play_ms() >= before.cumulative_play_ms());
        assert!(next.cumulative_sleep_ms() >= before.cumulative_sleep_ms());
        match out.transition {
            Some(t) => {
                assert_eq!(t.from, before.mode());
                assert_eq!(t.to, next.mode());
                assert_ne!(t.from, t.to);
            }
            None => assert_eq!(next.mode(), before.mode()),
        }
        state = next;
    }
});
