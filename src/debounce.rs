// Burst collapsing for high-frequency activity events.
// Time comes from the caller; the debouncer owns no timers.

use crate::types::Timestamp;

/// Collapses bursts of events into one handled event per window.
///
/// Trailing mode holds the latest event and releases it from [`poll`](Debouncer::poll)
/// once `window` has passed since the last call. Fire-first mode hands the first
/// event of a burst straight back and swallows the rest until the window elapses.
///
/// Controls motion uses fire-first. Trailing mode is the `fire_first = false`
/// half of the same contract; a caller using it must `poll` from its tick,
/// typically when the clock reaches [`deadline`](Debouncer::deadline).
#[derive(Debug, Clone)]
pub struct Debouncer<E> {
    window_us: u64,
    fire_first: bool,
    deadline: Option<Timestamp>,
    held: Option<E>,
}

impl<E> Debouncer<E> {
    pub fn new(window_ms: u64, fire_first: bool) -> Self {
        Debouncer {
            window_us: window_ms.saturating_mul(1000),
            fire_first,
            deadline: None,
            held: None,
        }
    }

    /// Feed an event. Returns it when it should be handled right now.
    pub fn call(&mut self, now: Timestamp, event: E) -> Option<E> {
        if self.fire_first {
            if let Some(deadline) = self.deadline {
                if now < deadline {
                    log::trace!("debounce: suppressed until {}us", deadline.as_micros());
                    return None;
                }
            }
            self.deadline = Some(self.window_end(now));
            return Some(event);
        }

        self.deadline = Some(self.window_end(now));
        self.held = Some(event);
        None
    }

    /// Release a held trailing event once its window has elapsed.
    pub fn poll(&mut self, now: Timestamp) -> Option<E> {
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;
        self.held.take()
    }

    /// When the current window closes, if one is open.
    pub fn deadline(&self) -> Option<Timestamp> {
        self.deadline
    }

    /// Drop any held event and close the window.
    pub fn cancel(&mut self) {
        self.deadline = None;
        self.held = None;
    }

    fn window_end(&self, now: Timestamp) -> Timestamp {
        Timestamp::from_micros(now.as_micros().saturating_add(self.window_us))
    }
}
