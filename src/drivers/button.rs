//! ISR-debounced button driver with short, long, and double press detection.
//!
//! ## Hardware
//!
//! Active-low momentary switch on the ball's seam. GPIO fires on the
//! falling edge; the ISR bumps an edge counter in an atomic, and
//! [`ButtonDriver::tick`] (called from the main loop) runs the debounce
//! and gesture state machine.
//!
//! Loop timestamps are `u32` milliseconds, which wrap after about 49.7
//! days of uptime.  Every interval is taken with `wrapping_sub`, and edges
//! are detected by counter change rather than by timestamp, so a gesture
//! spanning the wrap is still classified.
//!
//! ## Gesture detection
//!
//! | Gesture      | Condition                              | Event               |
//! |--------------|----------------------------------------|---------------------|
//! | Short press  | Released, no second press within 300ms | `ButtonShortPress`  |
//! | Long press   | Held >= 5s                             | `ButtonLongPress`   |
//! | Double press | Second press within 300ms of release   | `ButtonDoublePress` |

use core::sync::atomic::{AtomicU32, Ordering};

use crate::events::Event;

const DEBOUNCE_MS: u32 = 50;
const LONG_PRESS_MS: u32 = 5000;
const DOUBLE_PRESS_WINDOW_MS: u32 = 300;

/// Falling edges seen by the ISR since boot (wrapping).
static BUTTON_EDGES: AtomicU32 = AtomicU32::new(0);

/// Classified gestures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    ShortPress,
    LongPress,
    DoublePress,
}

impl From<ButtonEvent> for Event {
    fn from(e: ButtonEvent) -> Self {
        match e {
            ButtonEvent::ShortPress => Event::ButtonShortPress,
            ButtonEvent::LongPress => Event::ButtonLongPress,
            ButtonEvent::DoublePress => Event::ButtonDoublePress,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GestureState {
    Idle,
    DebounceWait { since_ms: u32 },
    Pressed { since_ms: u32 },
    WaitSecondPress { released_ms: u32 },
}

pub struct ButtonDriver {
    gpio: i32,
    state: GestureState,
    last_edge: u32,
}

impl ButtonDriver {
    pub fn new(gpio: i32) -> Self {
        Self {
            gpio,
            state: GestureState::Idle,
            last_edge: 0,
        }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    /// Call from the main loop.  `now_ms` is wrapping u32 milliseconds.
    pub fn tick(&mut self, now_ms: u32) -> Option<ButtonEvent> {
        let edges = BUTTON_EDGES.load(Ordering::Acquire);
        let pressed = self.is_pressed_hw();
        self.tick_with(edges, pressed, now_ms)
    }

    /// Gesture machine over explicit inputs: the ISR edge count and the
    /// current pin level.  Any change in `edges` is a new press.
    pub fn tick_with(&mut self, edges: u32, pressed: bool, now_ms: u32) -> Option<ButtonEvent> {
        let new_edge = edges != self.last_edge;
        self.last_edge = edges;

        match self.state {
            GestureState::Idle => {
                if new_edge {
                    self.state = GestureState::DebounceWait { since_ms: now_ms };
                }
                None
            }

            GestureState::DebounceWait { since_ms } => {
                if now_ms.wrapping_sub(since_ms) >= DEBOUNCE_MS {
                    self.state = if pressed {
                        GestureState::Pressed { since_ms }
                    } else {
                        // Bounce shorter than the debounce window still
                        // counts as a tap.
                        GestureState::WaitSecondPress { released_ms: now_ms }
                    };
                }
                None
            }

            GestureState::Pressed { since_ms } => {
                if now_ms.wrapping_sub(since_ms) >= LONG_PRESS_MS {
                    self.state = GestureState::Idle;
                    return Some(ButtonEvent::LongPress);
                }
                if !pressed {
                    self.state = GestureState::WaitSecondPress { released_ms: now_ms };
                }
                None
            }

            GestureState::WaitSecondPress { released_ms } => {
                let gap = now_ms.wrapping_sub(released_ms);
                if new_edge && gap <= DOUBLE_PRESS_WINDOW_MS {
                    self.state = GestureState::Idle;
                    return Some(ButtonEvent::DoublePress);
                }
                if gap > DOUBLE_PRESS_WINDOW_MS {
                    self.state = GestureState::Idle;
                    return Some(ButtonEvent::ShortPress);
                }
                None
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn is_pressed_hw(&self) -> bool {
        !crate::drivers::hw_init::gpio_read(self.gpio)
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_pressed_hw(&self) -> bool {
        false
    }
}

/// ISR handler for the button GPIO falling edge.  Lock-free.
pub fn button_isr_handler() {
    BUTTON_EDGES.fetch_add(1, Ordering::Release);
}
