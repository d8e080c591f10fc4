//! Motion samples and threshold classification.
//!
//! Only the horizontal axes feed the magnitude.  A sample that is not
//! finite (sensor sentinel, NaN from a bad conversion) collapses to zero
//! motion so a single bad read can never trigger a wake.

/// One accelerometer read, in g.  Read fresh every tick, never cached.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionSample {
    pub x: f32,
    pub y: f32,
}

impl MotionSample {
    /// No motion.  Substituted when the sensor read fails.
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Both axes are finite numbers.
    pub fn is_valid(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Euclidean norm of x/y.  Invalid samples report `0.0`.
    pub fn magnitude(&self) -> f32 {
        if !self.is_valid() {
            return 0.0;
        }
        // hypot avoids overflow on absurd-but-finite readings.
        let m = self.x.hypot(self.y);
        if m.is_finite() { m } else { 0.0 }
    }
}

/// Classified view of a sample against the motion threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MotionReading {
    pub magnitude: f32,
    /// `magnitude > threshold`.  Exactly-equal counts as quiescent.
    pub detected: bool,
    /// `false` when the raw sample was not finite and was zeroed.
    pub valid: bool,
}

impl MotionReading {
    pub fn classify(sample: MotionSample, threshold: f32) -> Self {
        let magnitude = sample.magnitude();
        Self {
            magnitude,
            detected: magnitude > threshold,
            valid: sample.is_valid(),
        }
    }

    pub fn quiescent(&self) -> bool {
        !self.detected
    }
}
