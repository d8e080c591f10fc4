//! Interrupt-driven input events.
//!
//! Events are produced by the button driver (its gesture classifier runs
//! in the main loop, fed by the GPIO ISR edge counter) and by the serial
//! console thread.  The main control loop consumes them between ticks,
//! where they become [`AppCommand`]s.
//!
//! ```text
//! ┌─────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ GPIO ISR    │────▶│ ButtonDriver │────▶│  Event Queue │────▶ Main Loop
//! └─────────────┘     └──────────────┘     │  (lock-free) │
//! ┌─────────────┐                          │              │
//! │ stdin lines │─────────────────────────▶│              │
//! └─────────────┘                          └──────────────┘
//! ```

use heapless::mpmc::Q16;

use crate::adapters::console::ConsoleCommand;
use crate::app::commands::AppCommand;
use crate::config::ToyConfig;
use crate::fsm::Mode;

/// Input events, in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    /// Debounced short press.  Puts the toy to sleep.
    ButtonShortPress,
    /// Hold >= 5 s.  Zeroes the play/sleep counters.
    ButtonLongPress,
    /// Two presses within 300 ms.  Wakes the toy into Play.
    ButtonDoublePress,
    /// A parsed serial console line.
    Console(ConsoleCommand),
}

impl Event {
    /// The service command for this event.  `current` is the live config
    /// that console `set` lines are applied on top of.
    pub fn into_command(self, current: &ToyConfig) -> AppCommand {
        match self {
            Self::ButtonShortPress => AppCommand::ForceMode(Mode::Sleep),
            Self::ButtonDoublePress => AppCommand::ForceMode(Mode::Play),
            Self::ButtonLongPress => AppCommand::ResetCounters,
            Self::Console(cmd) => cmd.into_app_command(current),
        }
    }
}

/// Bounded multi-producer/multi-consumer event queue.
///
/// Backed by `heapless::mpmc`, so pushing is lock-free and safe from any
/// task.  When full, new events are dropped.
pub struct EventQueue {
    inner: Q16<Event>,
}

impl EventQueue {
    pub const fn new() -> Self {
        Self { inner: Q16::new() }
    }

    /// Returns `false` if the queue is full (event dropped).
    pub fn push(&self, event: Event) -> bool {
        self.inner.enqueue(event).is_ok()
    }

    pub fn pop(&self) -> Option<Event> {
        self.inner.dequeue()
    }

    /// Process pending events in FIFO order.
    pub fn drain(&self, mut handler: impl FnMut(Event)) {
        while let Some(event) = self.pop() {
            handler(event);
        }
    }
}

impl Default for EventQueue {
    fn default() -> Self {
        Self::new()
    }
}

static EVENTS: EventQueue = EventQueue::new();

/// Push onto the global queue.
pub fn push_event(event: Event) -> bool {
    let accepted = EVENTS.push(event);
    if !accepted {
        log::warn!("Event queue full, dropped {:?}", event);
    }
    accepted
}

/// Drain the global queue into a callback.
pub fn drain_events(handler: impl FnMut(Event)) {
    EVENTS.drain(handler);
}
