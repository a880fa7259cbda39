//! Search-as-you-type debouncing

use std::time::{Duration, Instant};

pub const DEBOUNCE: Duration = Duration::from_millis(300);
pub const MIN_QUERY_CHARS: usize = 2;
pub const MAX_RESULTS: usize = 8;

/// A search that is due to be sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub generation: u64,
    pub query: String,
}

/// What the UI should do after a keystroke
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputOutcome {
    /// Query too short: hide and drop results
    Cleared,
    /// A trigger is pending
    Scheduled,
}

/// Each keystroke supersedes the pending trigger. Responses are tagged with
/// the generation they were issued for; late ones are dropped, not cancelled.
#[derive(Debug)]
pub struct SearchDebouncer {
    delay: Duration,
    generation: u64,
    pending: Option<(String, Instant)>,
}

impl Default for SearchDebouncer {
    fn default() -> Self {
        Self::new(DEBOUNCE)
    }
}

impl SearchDebouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            generation: 0,
            pending: None,
        }
    }

    pub fn input(&mut self, query: &str, now: Instant) -> InputOutcome {
        self.generation += 1;
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            self.pending = None;
            return InputOutcome::Cleared;
        }
        self.pending = Some((query.to_string(), now + self.delay));
        InputOutcome::Scheduled
    }

    /// Take the pending search once its deadline has passed
    pub fn poll(&mut self, now: Instant) -> Option<SearchTicket> {
        let due = matches!(self.pending, Some((_, deadline)) if now >= deadline);
        if !due {
            return None;
        }
        let (query, _) = self.pending.take()?;
        Some(SearchTicket {
            generation: self.generation,
            query,
        })
    }

    /// Time left until the pending trigger fires
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.pending
            .as_ref()
            .map(|(_, deadline)| deadline.saturating_duration_since(now))
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Whether a response for `generation` is still wanted
    pub fn is_current(&self, generation: u64) -> bool {
        generation == self.generation
    }

    pub fn reset(&mut self) {
        self.generation += 1;
        self.pending = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fires_after_delay() {
        let start = Instant::now();
        let mut d = SearchDebouncer::default();
        assert_eq!(d.input("matrix", start), InputOutcome::Scheduled);
        assert!(d.poll(start + Duration::from_millis(100)).is_none());

        let ticket = d.poll(start + DEBOUNCE).unwrap();
        assert_eq!(ticket.query, "matrix");
        assert!(d.is_current(ticket.generation));
        assert!(!d.is_pending());
        assert!(d.poll(start + DEBOUNCE * 2).is_none());
    }

    #[test]
    fn test_new_keystroke_supersedes_pending() {
        let start = Instant::now();
        let mut d = SearchDebouncer::default();
        d.input("mat", start);
        d.input("matr", start + Duration::from_millis(200));

        // The first deadline passes without firing
        assert!(d.poll(start + Duration::from_millis(350)).is_none());
        let ticket = d.poll(start + Duration::from_millis(500)).unwrap();
        assert_eq!(ticket.query, "matr");
    }

    #[test]
    fn test_late_response_is_stale() {
        let start = Instant::now();
        let mut d = SearchDebouncer::default();
        d.input("alien", start);
        let first = d.poll(start + DEBOUNCE).unwrap();

        d.input("aliens", start + DEBOUNCE + Duration::from_millis(10));
        assert!(!d.is_current(first.generation));
    }

    #[test]
    fn test_short_query_clears() {
        let start = Instant::now();
        let mut d = SearchDebouncer::default();
        d.input("matrix", start);
        assert_eq!(d.input("m", start), InputOutcome::Cleared);
        assert!(!d.is_pending());
        assert!(d.poll(start + DEBOUNCE).is_none());

        assert_eq!(d.input("  ", start), InputOutcome::Cleared);
    }

    #[test]
    fn test_time_until_due() {
        let start = Instant::now();
        let mut d = SearchDebouncer::new(Duration::from_millis(300));
        assert_eq!(d.time_until_due(start), None);
        d.input("dune", start);
        assert_eq!(
            d.time_until_due(start + Duration::from_millis(100)),
            Some(Duration::from_millis(200))
        );
    }
}
