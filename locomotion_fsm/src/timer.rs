use rapier3d::prelude::Real;

/// One-shot deferred action counted down by the driver's frame time.
///
/// Arming replaces any pending countdown; the owner advances it once per tick
/// and runs the action when `advance` reports that the delay elapsed. Only the
/// remaining delay is stored, so precision does not degrade with session length.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DeferredReset {
    remaining: Option<Real>,
}

impl DeferredReset {
    pub fn schedule(&mut self, delay: Real) {
        self.remaining = Some(delay.max(0.0));
    }

    pub fn cancel(&mut self) {
        self.remaining = None;
    }

    pub fn is_pending(&self) -> bool {
        self.remaining.is_some()
    }

    /// Seconds left before the action fires, if armed.
    pub fn remaining(&self) -> Option<Real> {
        self.remaining
    }

    /// Counts down by `dt`; returns true exactly once, on the first advance
    /// that reaches the end of the delay.
    pub fn advance(&mut self, dt: Real) -> bool {
        let Some(remaining) = self.remaining else {
            return false;
        };
        let remaining = remaining - dt.max(0.0);
        if remaining <= 0.0 {
            self.remaining = None;
            true
        } else {
            self.remaining = Some(remaining);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_once_after_delay() {
        let mut timer = DeferredReset::default();
        timer.schedule(0.5);
        assert!(!timer.advance(0.25));
        assert_eq!(timer.remaining(), Some(0.25));
        assert!(timer.advance(0.25));
        assert!(!timer.advance(0.5));
        assert!(!timer.is_pending());
        assert_eq!(timer.remaining(), None);
    }

    #[test]
    fn rescheduling_replaces_deadline() {
        let mut timer = DeferredReset::default();
        timer.schedule(0.5);
        assert!(!timer.advance(0.4));
        timer.schedule(0.5);
        assert!(!timer.advance(0.25));
        assert!(timer.advance(0.25));
    }

    #[test]
    fn cancel_without_pending_is_noop() {
        let mut timer = DeferredReset::default();
        timer.cancel();
        assert!(!timer.is_pending());
        timer.schedule(0.5);
        timer.cancel();
        assert!(!timer.advance(10.0));
    }

    #[test]
    fn counts_down_in_frame_ticks() {
        let mut timer = DeferredReset::default();
        timer.schedule(0.5);
        let mut ticks = 0;
        while !timer.advance(1.0 / 60.0) {
            ticks += 1;
        }
        assert!((29..=30).contains(&ticks));
    }
}
