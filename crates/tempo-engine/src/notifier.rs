//! Exactly-once flag-fall notification

use tempo_core::{PerSide, Side};

/// Callback invoked with the side whose time expired.
pub type TimeoutHandler = Box<dyn FnMut(Side) + Send>;

/// Single-slot timeout callback with a per-side fired latch.
///
/// The handler is invoked synchronously at the tick where a side's remaining
/// time first reaches zero, at most once per side per initialize lifetime.
/// Registering a new handler replaces the previous one; the latch is cleared
/// only by `initialize`/`reset` on the owning engine.
#[derive(Default)]
pub struct TimeoutNotifier {
    handler: Option<TimeoutHandler>,
    fired: PerSide<bool>,
}

impl TimeoutNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the current handler. Last registration wins.
    pub fn set_handler(&mut self, handler: TimeoutHandler) {
        self.handler = Some(handler);
    }

    /// Re-arm both sides. Called on initialize/reset.
    pub fn clear_latch(&mut self) {
        self.fired = PerSide::splat(false);
    }

    /// Whether the callback already fired for `side` in this lifetime.
    pub fn has_fired(&self, side: Side) -> bool {
        self.fired.copied(side)
    }

    /// Fire the callback for `side` if it has not fired yet.
    ///
    /// Returns whether the callback was actually invoked. A second expiry for
    /// the same side without an intervening re-arm is a defect upstream.
    pub fn fire(&mut self, side: Side) -> bool {
        if self.fired.copied(side) {
            debug_assert!(false, "duplicate expiry for {side}");
            return false;
        }
        self.fired.set(side, true);
        if let Some(handler) = self.handler.as_mut() {
            handler(side);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_fires_at_most_once_per_side() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();

        let mut notifier = TimeoutNotifier::new();
        notifier.set_handler(Box::new(move |side| sink.lock().unwrap().push(side)));

        assert!(notifier.fire(Side::White));
        assert!(notifier.has_fired(Side::White));
        assert!(!notifier.has_fired(Side::Black));

        // White's latch does not block black's first expiry.
        assert!(notifier.fire(Side::Black));
        assert_eq!(*seen.lock().unwrap(), vec![Side::White, Side::Black]);
    }

    #[test]
    fn test_clear_latch_re_arms() {
        let mut notifier = TimeoutNotifier::new();
        notifier.set_handler(Box::new(|_| {}));

        assert!(notifier.fire(Side::White));
        notifier.clear_latch();
        assert!(!notifier.has_fired(Side::White));
        assert!(notifier.fire(Side::White));
    }

    #[test]
    fn test_last_registration_wins() {
        let first = Arc::new(Mutex::new(0u32));
        let second = Arc::new(Mutex::new(0u32));

        let mut notifier = TimeoutNotifier::new();
        let a = first.clone();
        notifier.set_handler(Box::new(move |_| *a.lock().unwrap() += 1));
        let b = second.clone();
        notifier.set_handler(Box::new(move |_| *b.lock().unwrap() += 1));

        notifier.fire(Side::White);
        assert_eq!(*first.lock().unwrap(), 0);
        assert_eq!(*second.lock().unwrap(), 1);
    }

    #[test]
    fn test_fire_without_handler_still_latches() {
        let mut notifier = TimeoutNotifier::new();
        assert!(notifier.fire(Side::Black));
        assert!(notifier.has_fired(Side::Black));
    }
}
