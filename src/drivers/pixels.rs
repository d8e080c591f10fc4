//! WS2812 light ring driver.
//!
//! Holds a frame buffer of [`NUM_PIXELS`] colours and pushes it out on
//! [`show`](PixelStrip::show).  Each pixel is 24 bits, GRB order, MSB
//! first, encoded as RMT high/low pulse pairs.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: `TxRmtDriver` from `esp-idf-hal`, blocking transmit.
//! On host/test: keeps the last shown frame in memory.

use crate::drivers::patterns::{Rgb, OFF};
use crate::error::ActuatorError;
pub use crate::pins::NUM_PIXELS;

#[cfg(target_os = "espidf")]
use esp_idf_hal::rmt::{FixedLengthSignal, PinState, Pulse, TxRmtDriver};

/// Bits per pixel on the wire.
const BITS_PER_PIXEL: usize = 24;

/// Pack a colour into the 24-bit GRB word the WS2812 expects.
pub fn encode_grb((r, g, b): Rgb) -> u32 {
    (u32::from(g) << 16) | (u32::from(r) << 8) | u32::from(b)
}

pub struct PixelStrip {
    frame: [Rgb; NUM_PIXELS],
    shown: [Rgb; NUM_PIXELS],
    #[cfg(target_os = "espidf")]
    tx: TxRmtDriver<'static>,
}

impl PixelStrip {
    #[cfg(target_os = "espidf")]
    pub fn new(tx: TxRmtDriver<'static>) -> Self {
        Self {
            frame: [OFF; NUM_PIXELS],
            shown: [OFF; NUM_PIXELS],
            tx,
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            frame: [OFF; NUM_PIXELS],
            shown: [OFF; NUM_PIXELS],
        }
    }

    /// Set one pixel in the buffer.  Out-of-range indices are ignored.
    pub fn set(&mut self, index: usize, colour: Rgb) {
        if let Some(px) = self.frame.get_mut(index) {
            *px = colour;
        }
    }

    pub fn fill(&mut self, colour: Rgb) {
        self.frame = [colour; NUM_PIXELS];
    }

    pub fn clear(&mut self) {
        self.fill(OFF);
    }

    /// Transmit the buffer.
    pub fn show(&mut self) -> Result<(), ActuatorError> {
        self.transmit()?;
        self.shown = self.frame;
        Ok(())
    }

    /// Last frame that reached the strip.
    pub fn shown(&self) -> &[Rgb; NUM_PIXELS] {
        &self.shown
    }

    pub fn is_dark(&self) -> bool {
        self.shown.iter().all(|px| *px == OFF)
    }

    #[cfg(target_os = "espidf")]
    fn transmit(&mut self) -> Result<(), ActuatorError> {
        use core::time::Duration;

        let ticks_hz = self
            .tx
            .counter_clock()
            .map_err(|_| ActuatorError::PixelWriteFailed)?;
        let pulse = |state, ns| {
            Pulse::new_with_duration(ticks_hz, state, &Duration::from_nanos(ns))
                .map_err(|_| ActuatorError::PixelWriteFailed)
        };
        let zero = (pulse(PinState::High, 350)?, pulse(PinState::Low, 900)?);
        let one = (pulse(PinState::High, 900)?, pulse(PinState::Low, 350)?);

        let mut signal = FixedLengthSignal::<{ BITS_PER_PIXEL * NUM_PIXELS }>::new();
        for (p, colour) in self.frame.iter().enumerate() {
            let word = encode_grb(*colour);
            for bit in 0..BITS_PER_PIXEL {
                let set = word & (1 << (BITS_PER_PIXEL - 1 - bit)) != 0;
                let pair = if set { &one } else { &zero };
                signal
                    .set(p * BITS_PER_PIXEL + bit, pair)
                    .map_err(|_| ActuatorError::PixelWriteFailed)?;
            }
        }
        self.tx
            .start_blocking(&signal)
            .map_err(|_| ActuatorError::PixelWriteFailed)
    }

    #[cfg(not(target_os = "espidf"))]
    fn transmit(&mut self) -> Result<(), ActuatorError> {
        Ok(())
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for PixelStrip {
    fn default() -> Self {
        Self::new()
    }
}
