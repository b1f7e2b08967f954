/// Engine time in milliseconds.
///
/// The tour runs on a virtual clock supplied by the host, so time is a plain
/// number rather than a wall-clock instant. Fractional milliseconds are kept
/// because derived animation durations are rarely whole numbers.
#[derive(Copy, Clone, Debug, Default, PartialEq, PartialOrd)]
pub struct TimeMs(pub f64);

impl TimeMs {
    pub const ZERO: TimeMs = TimeMs(0.0);

    pub fn after(self, delay_ms: f64) -> Self {
        TimeMs(self.0 + delay_ms.max(0.0))
    }

    pub fn since(self, earlier: TimeMs) -> f64 {
        (self.0 - earlier.0).max(0.0)
    }

    /// Total ordering, with NaN sorted last.
    pub fn total_cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeSpan {
    pub start: TimeMs,
    pub end: TimeMs,
}

impl TimeSpan {
    pub fn new(start: TimeMs, duration_ms: f64) -> Self {
        Self {
            start,
            end: start.after(duration_ms),
        }
    }

    pub fn duration(&self) -> f64 {
        (self.end.0 - self.start.0).max(0.0)
    }

    /// Fraction of the span elapsed at `now`, clamped to `[0, 1]`.
    ///
    /// Zero-length spans are considered complete.
    pub fn fraction_elapsed(&self, now: TimeMs) -> f64 {
        let d = self.duration();
        if d <= 0.0 {
            return 1.0;
        }
        (now.since(self.start) / d).clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{TimeMs, TimeSpan};

    #[test]
    fn after_ignores_negative_delays() {
        assert_eq!(TimeMs(100.0).after(-5.0), TimeMs(100.0));
        assert_eq!(TimeMs(100.0).after(50.5), TimeMs(150.5));
    }

    #[test]
    fn fraction_elapsed_is_clamped() {
        let span = TimeSpan::new(TimeMs(1000.0), 800.0);
        assert_eq!(span.fraction_elapsed(TimeMs(0.0)), 0.0);
        assert_eq!(span.fraction_elapsed(TimeMs(1400.0)), 0.5);
        assert_eq!(span.fraction_elapsed(TimeMs(5000.0)), 1.0);
        assert_eq!(TimeSpan::new(TimeMs(3.0), 0.0).fraction_elapsed(TimeMs(3.0)), 1.0);
    }
}
