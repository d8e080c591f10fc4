//! Piezo buzzer on LEDC channel 1.
//!
//! A note is the buzzer timer retuned to the note frequency with the
//! channel at 50 % duty; silence is duty 0.  Sequences block on the
//! caller's delay provider.

use embedded_hal::delay::DelayNs;

use crate::drivers::hw_init;
use crate::drivers::patterns::{sweep_steps, Sweep, CHIRP_SEQUENCE, SWEEP_STEP_MS};

pub struct Buzzer {
    sounding: Option<u32>,
    notes_played: u32,
}

impl Buzzer {
    pub fn new() -> Self {
        Self {
            sounding: None,
            notes_played: 0,
        }
    }

    /// Start a tone.  Keeps sounding until [`silence`](Self::silence).
    pub fn tone(&mut self, freq_hz: u32) {
        hw_init::ledc_set_frequency(hw_init::LEDC_TIMER_BUZZER, freq_hz);
        if self.sounding.is_none() {
            hw_init::ledc_set(hw_init::LEDC_CH_BUZZER, hw_init::BUZZER_ON_DUTY);
        }
        self.sounding = Some(freq_hz);
        self.notes_played = self.notes_played.wrapping_add(1);
    }

    pub fn silence(&mut self) {
        hw_init::ledc_set(hw_init::LEDC_CH_BUZZER, 0);
        self.sounding = None;
    }

    /// One frequency sweep, then silence.
    pub fn sweep(&mut self, sweep: Sweep, delay: &mut impl DelayNs) {
        for freq in sweep_steps(sweep) {
            self.tone(freq);
            delay.delay_ms(SWEEP_STEP_MS);
        }
        self.silence();
    }

    /// Full bird call.
    pub fn chirp(&mut self, delay: &mut impl DelayNs) {
        for phase in CHIRP_SEQUENCE {
            for _ in 0..phase.repeats {
                self.sweep(phase.sweep, delay);
                if phase.gap_ms > 0 {
                    delay.delay_ms(phase.gap_ms);
                }
            }
        }
    }

    pub fn current_tone(&self) -> Option<u32> {
        self.sounding
    }

    pub fn notes_played(&self) -> u32 {
        self.notes_played
    }
}

impl Default for Buzzer {
    fn default() -> Self {
        Self::new()
    }
}
