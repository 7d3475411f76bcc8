//! Interrupt-to-poll handoff
//!
//! The INT1 pin fires in interrupt context while samples are consumed
//! from a polling loop. [`InterruptCounter`] carries events across that
//! boundary as a single-producer/single-consumer cell with explicit
//! memory ordering, so no event is lost and no lock is needed.
//!
//! ```ignore
//! use lsm303dlhc_motion::InterruptCounter;
//!
//! static MOTION_EVENTS: InterruptCounter = InterruptCounter::new();
//!
//! // Pin interrupt handler: identify the pin, read the source register
//! // to clear the latch, count the event.
//! fn on_int1_pin() {
//!     if let Ok(src) = sensor.interrupt1_source() {
//!         if src.active {
//!             MOTION_EVENTS.record();
//!         }
//!     }
//! }
//!
//! // Polling loop: drain whatever accumulated since the last pass.
//! let events = MOTION_EVENTS.take();
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

/// Lock-free event counter between one interrupt handler and one
/// polling loop
#[derive(Debug, Default)]
pub struct InterruptCounter {
    events: AtomicU32,
}

impl InterruptCounter {
    /// Create an empty counter; usable in a `static`
    pub const fn new() -> Self {
        InterruptCounter {
            events: AtomicU32::new(0),
        }
    }

    /// Count one event (producer side, interrupt context)
    pub fn record(&self) {
        self.events.fetch_add(1, Ordering::Release);
    }

    /// Drain the counter, returning the number of events recorded since
    /// the previous drain (consumer side, polling loop)
    pub fn take(&self) -> u32 {
        self.events.swap(0, Ordering::AcqRel)
    }

    /// Number of undrained events
    pub fn pending(&self) -> u32 {
        self.events.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_and_take() {
        let counter = InterruptCounter::new();
        assert_eq!(counter.pending(), 0);

        counter.record();
        counter.record();
        counter.record();
        assert_eq!(counter.pending(), 3);

        assert_eq!(counter.take(), 3);
        assert_eq!(counter.pending(), 0);
        assert_eq!(counter.take(), 0);
    }

    #[test]
    fn test_events_between_drains_accumulate() {
        let counter = InterruptCounter::new();
        counter.record();
        assert_eq!(counter.take(), 1);
        counter.record();
        counter.record();
        assert_eq!(counter.take(), 2);
    }
}
