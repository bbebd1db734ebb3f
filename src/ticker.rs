// Copyright (c) 2026 rezky_nightky

/// Frame-driven fixed-interval trigger.
///
/// Sub-systems that want to run "every N seconds" feed it the clamped frame
/// delta. It fires at most once per feed and drops any backlog beyond one
/// interval, so a long stall never turns into a burst of catch-up updates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ticker {
    interval: f64,
    accumulated: f64,
}

impl Ticker {
    pub fn new(interval: f64) -> Self {
        let interval = if interval.is_finite() && interval > 0.0 {
            interval
        } else {
            1.0
        };
        Self {
            interval,
            accumulated: 0.0,
        }
    }

    pub fn interval(&self) -> f64 {
        self.interval
    }

    pub fn feed(&mut self, dt: f64) -> bool {
        if dt.is_finite() && dt > 0.0 {
            self.accumulated += dt;
        }
        if self.accumulated < self.interval {
            return false;
        }
        self.accumulated = (self.accumulated - self.interval).min(self.interval);
        true
    }

    pub fn reset(&mut self) {
        self.accumulated = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fires_after_interval_elapses() {
        let mut t = Ticker::new(0.25);
        assert!(!t.feed(0.1));
        assert!(!t.feed(0.1));
        assert!(t.feed(0.1));
        assert!(!t.feed(0.1));
    }

    #[test]
    fn stall_keeps_at_most_one_interval_of_backlog() {
        let mut t = Ticker::new(0.1);
        assert!(t.feed(5.0));
        assert!(t.feed(0.0));
        assert!(!t.feed(0.0));
    }

    #[test]
    fn bad_interval_falls_back() {
        assert_eq!(Ticker::new(-1.0).interval(), 1.0);
        assert_eq!(Ticker::new(f64::NAN).interval(), 1.0);
    }
}
