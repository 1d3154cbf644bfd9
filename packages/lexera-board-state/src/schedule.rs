/// Cancellable scheduled work for a single-threaded event loop.
///
/// Each timer is owned by the component that arms it. Arming replaces any
/// pending action of the same timer, so only the most recent one fires.
/// Time is passed in explicitly; the owner polls with the current instant
/// and receives the payload once the deadline has passed.
use std::time::{Duration, Instant};

#[derive(Debug)]
pub struct Timer<T> {
    pending: Option<(Instant, T)>,
}

impl<T> Default for Timer<T> {
    fn default() -> Self {
        Self { pending: None }
    }
}

impl<T> Timer<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the timer, cancelling whatever was pending.
    pub fn arm(&mut self, now: Instant, delay: Duration, payload: T) {
        self.pending = Some((now + delay, payload));
    }

    pub fn cancel(&mut self) -> Option<T> {
        self.pending.take().map(|(_, payload)| payload)
    }

    pub fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(due, _)| *due)
    }

    /// Take the payload if the deadline has been reached.
    pub fn fire(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((due, _)) if *due <= now => self.cancel(),
            _ => None,
        }
    }
}

/// Coalesces bursts of triggers into one firing after a quiet window.
#[derive(Debug)]
pub struct Debouncer {
    window: Duration,
    timer: Timer<()>,
}

impl Debouncer {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            timer: Timer::new(),
        }
    }

    pub fn trigger(&mut self, now: Instant) {
        self.timer.arm(now, self.window, ());
    }

    pub fn poll(&mut self, now: Instant) -> bool {
        self.timer.fire(now).is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.timer.deadline()
    }

    pub fn cancel(&mut self) {
        self.timer.cancel();
    }
}

/// Rejects re-entry for a short window after the first entry.
#[derive(Debug)]
pub struct ReentrancyGuard {
    window: Duration,
    held_until: Option<Instant>,
}

impl ReentrancyGuard {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            held_until: None,
        }
    }

    /// Returns true and holds the guard if it was free.
    pub fn try_enter(&mut self, now: Instant) -> bool {
        if self.is_held(now) {
            return false;
        }
        self.held_until = Some(now + self.window);
        true
    }

    pub fn is_held(&self, now: Instant) -> bool {
        self.held_until.is_some_and(|until| now < until)
    }

    pub fn release(&mut self) {
        self.held_until = None;
    }
}

/// Earliest of several optional deadlines.
pub fn earliest(deadlines: impl IntoIterator<Item = Option<Instant>>) -> Option<Instant> {
    deadlines.into_iter().flatten().min()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timer_fires_once_after_deadline() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.arm(t0, Duration::from_millis(300), "close");
        assert_eq!(timer.fire(t0 + Duration::from_millis(299)), None);
        assert_eq!(timer.fire(t0 + Duration::from_millis(300)), Some("close"));
        assert_eq!(timer.fire(t0 + Duration::from_millis(400)), None);
    }

    #[test]
    fn test_rearm_supersedes_pending() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.arm(t0, Duration::from_millis(100), 1);
        timer.arm(t0 + Duration::from_millis(50), Duration::from_millis(100), 2);
        assert_eq!(timer.fire(t0 + Duration::from_millis(120)), None);
        assert_eq!(timer.fire(t0 + Duration::from_millis(150)), Some(2));
    }

    #[test]
    fn test_cancel() {
        let t0 = Instant::now();
        let mut timer = Timer::new();
        timer.arm(t0, Duration::ZERO, ());
        assert!(timer.cancel().is_some());
        assert!(!timer.is_armed());
        assert_eq!(timer.fire(t0 + Duration::from_secs(1)), None);
    }

    #[test]
    fn test_debouncer_coalesces_burst() {
        let t0 = Instant::now();
        let mut debounce = Debouncer::new(Duration::from_millis(50));
        for i in 0..5 {
            debounce.trigger(t0 + Duration::from_millis(i * 10));
        }
        assert!(!debounce.poll(t0 + Duration::from_millis(80)));
        assert!(debounce.poll(t0 + Duration::from_millis(90)));
        assert!(!debounce.poll(t0 + Duration::from_millis(200)));
    }

    #[test]
    fn test_reentrancy_guard_window() {
        let t0 = Instant::now();
        let mut guard = ReentrancyGuard::new(Duration::from_secs(1));
        assert!(guard.try_enter(t0));
        assert!(!guard.try_enter(t0 + Duration::from_millis(999)));
        assert!(guard.try_enter(t0 + Duration::from_secs(1)));
        guard.release();
        assert!(guard.try_enter(t0 + Duration::from_millis(1001)));
    }

    #[test]
    fn test_earliest() {
        let t0 = Instant::now();
        let t1 = t0 + Duration::from_millis(5);
        assert_eq!(earliest([None, Some(t1), Some(t0)]), Some(t0));
        assert_eq!(earliest([None, None]), None);
    }
}
