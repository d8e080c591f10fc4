//! Drive motor (L298N H-bridge, one channel).
//!
//! Direction comes from the IN1/IN2 pair, speed from LEDC PWM on EN.
//!
//! | IN1 | IN2 | EN   | Result  |
//! |-----|-----|------|---------|
//! | H   | L   | duty | forward |
//! | L   | H   | duty | reverse |
//! | L   | L   | 0    | coast   |
//!
//! ## Dual-target design
//!
//! On ESP-IDF: drives real PWM and GPIO via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::pins;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorState {
    Stopped,
    Running { duty: u8, dir: Direction },
}

pub struct MotorDriver {
    state: MotorState,
}

impl MotorDriver {
    pub fn new() -> Self {
        Self {
            state: MotorState::Stopped,
        }
    }

    /// Run at an 8-bit duty.  Zero duty is a stop.
    pub fn run(&mut self, duty: u8, direction: Direction) {
        if duty == 0 {
            self.stop();
            return;
        }

        // Drop EN before flipping the bridge so IN1/IN2 never both see drive.
        if let MotorState::Running { dir, .. } = self.state {
            if dir != direction {
                hw_init::ledc_set(hw_init::LEDC_CH_MOTOR, 0);
            }
        }
        Self::set_bridge(Some(direction));
        hw_init::ledc_set(hw_init::LEDC_CH_MOTOR, duty);

        self.state = MotorState::Running { duty, dir: direction };
    }

    pub fn stop(&mut self) {
        hw_init::ledc_set(hw_init::LEDC_CH_MOTOR, 0);
        Self::set_bridge(None);
        self.state = MotorState::Stopped;
    }

    fn set_bridge(direction: Option<Direction>) {
        let (in1, in2) = match direction {
            Some(Direction::Forward) => (true, false),
            Some(Direction::Reverse) => (false, true),
            None => (false, false),
        };
        hw_init::gpio_write(pins::MOTOR_IN1_GPIO, in1);
        hw_init::gpio_write(pins::MOTOR_IN2_GPIO, in2);
    }

    pub fn state(&self) -> MotorState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        !matches!(self.state, MotorState::Stopped)
    }
}

impl Default for MotorDriver {
    fn default() -> Self {
        Self::new()
    }
}
