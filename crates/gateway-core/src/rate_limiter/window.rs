//! Fixed-boundary usage windows

use std::time::{Duration, Instant};

/// Length of the request/token window
pub const MINUTE: Duration = Duration::from_secs(60);

/// Length of the cost window
pub const HOUR: Duration = Duration::from_secs(3_600);

/// Per-provider usage counters
///
/// Every counter belongs to a window that starts at `*_window_start`. When a
/// read or write observes an instant at or past the window end, the counters
/// reset and the start advances by whole window lengths, so boundaries never
/// drift.
#[derive(Debug, Clone)]
pub struct UsageWindow {
    requests_this_minute: u32,
    tokens_this_minute: u64,
    cost_this_hour: f64,
    minute_window_start: Instant,
    hour_window_start: Instant,
}

impl UsageWindow {
    pub fn new(now: Instant) -> Self {
        Self {
            requests_this_minute: 0,
            tokens_this_minute: 0,
            cost_this_hour: 0.0,
            minute_window_start: now,
            hour_window_start: now,
        }
    }

    fn roll(&mut self, now: Instant) {
        if let Some(start) = advance(self.minute_window_start, now, MINUTE) {
            self.minute_window_start = start;
            self.requests_this_minute = 0;
            self.tokens_this_minute = 0;
        }
        if let Some(start) = advance(self.hour_window_start, now, HOUR) {
            self.hour_window_start = start;
            self.cost_this_hour = 0.0;
        }
    }

    /// Count an attempted call
    pub fn record_request(&mut self, now: Instant) {
        self.roll(now);
        self.requests_this_minute = self.requests_this_minute.saturating_add(1);
    }

    /// Count tokens of a completed call
    pub fn record_tokens(&mut self, tokens: u64, now: Instant) {
        self.roll(now);
        self.tokens_this_minute = self.tokens_this_minute.saturating_add(tokens);
    }

    /// Count the cost of a completed call; negative or non-finite amounts are ignored
    pub fn record_cost(&mut self, cost: f64, now: Instant) {
        self.roll(now);
        if cost.is_finite() && cost > 0.0 {
            self.cost_this_hour += cost;
        }
    }

    pub fn requests_this_minute(&mut self, now: Instant) -> u32 {
        self.roll(now);
        self.requests_this_minute
    }

    pub fn tokens_this_minute(&mut self, now: Instant) -> u64 {
        self.roll(now);
        self.tokens_this_minute
    }

    pub fn cost_this_hour(&mut self, now: Instant) -> f64 {
        self.roll(now);
        self.cost_this_hour
    }

    pub fn minute_window_start(&self) -> Instant {
        self.minute_window_start
    }
}

/// New window start if `now` has crossed at least one boundary
fn advance(start: Instant, now: Instant, length: Duration) -> Option<Instant> {
    let elapsed = now.saturating_duration_since(start);
    if elapsed < length {
        return None;
    }
    let periods = elapsed.as_nanos() / length.as_nanos();
    let offset = Duration::from_nanos((periods * length.as_nanos()) as u64);
    Some(start + offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_survive_until_boundary() {
        let start = Instant::now();
        let mut window = UsageWindow::new(start);
        window.record_request(start);
        window.record_tokens(500, start + Duration::from_secs(10));

        let at_59 = start + Duration::from_secs(59);
        assert_eq!(window.requests_this_minute(at_59), 1);
        assert_eq!(window.tokens_this_minute(at_59), 500);

        let at_61 = start + Duration::from_secs(61);
        assert_eq!(window.requests_this_minute(at_61), 0);
        assert_eq!(window.tokens_this_minute(at_61), 0);
    }

    #[test]
    fn test_reset_exactly_at_boundary() {
        let start = Instant::now();
        let mut window = UsageWindow::new(start);
        window.record_request(start);

        let just_before = start + MINUTE - Duration::from_nanos(1);
        assert_eq!(window.requests_this_minute(just_before), 1);
        assert_eq!(window.requests_this_minute(start + MINUTE), 0);
    }

    #[test]
    fn test_boundaries_do_not_drift() {
        let start = Instant::now();
        let mut window = UsageWindow::new(start);

        // First observation after 2.5 windows: the window now starts at 120s
        window.record_request(start + Duration::from_secs(150));
        assert_eq!(
            window.minute_window_start(),
            start + Duration::from_secs(120)
        );
        assert_eq!(window.requests_this_minute(start + Duration::from_secs(179)), 1);
        assert_eq!(window.requests_this_minute(start + Duration::from_secs(180)), 0);
    }

    #[test]
    fn test_cost_uses_hour_window_and_stays_non_negative() {
        let start = Instant::now();
        let mut window = UsageWindow::new(start);
        window.record_cost(0.25, start);
        window.record_cost(-1.0, start);
        window.record_cost(f64::NAN, start);

        let later = start + Duration::from_secs(61);
        assert_eq!(window.requests_this_minute(later), 0);
        assert!((window.cost_this_hour(later) - 0.25).abs() < f64::EPSILON);
        assert_eq!(window.cost_this_hour(start + HOUR), 0.0);
    }

    #[test]
    fn test_earlier_instant_does_not_reset() {
        let start = Instant::now() + Duration::from_secs(5);
        let mut window = UsageWindow::new(start);
        window.record_request(start);
        assert_eq!(window.requests_this_minute(start - Duration::from_secs(1)), 1);
    }
}
