//! Debounced search input.
//!
//! Each keystroke restarts a fixed delay; only a term that survives the delay
//! is fetched. Fetches carry a sequence number so a slow response for an old
//! term cannot overwrite the listing of a newer one.

use std::time::{Duration, Instant};

pub const SEARCH_DEBOUNCE: Duration = Duration::from_millis(300);

pub struct Debouncer {
    delay: Duration,
    pending: Option<(String, Instant)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self { delay, pending: None }
    }

    /// Record new input, superseding whatever was pending.
    pub fn input(&mut self, term: impl Into<String>, now: Instant) {
        self.pending = Some((term.into(), now + self.delay));
    }

    /// Take the pending term once its delay has elapsed.
    pub fn poll(&mut self, now: Instant) -> Option<String> {
        match &self.pending {
            Some((_, due)) if *due <= now => self.pending.take().map(|(term, _)| term),
            _ => None,
        }
    }

    /// Time left until the pending term fires, for repaint scheduling.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.pending.as_ref().map(|(_, due)| due.saturating_duration_since(now))
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(SEARCH_DEBOUNCE)
    }
}

#[derive(Default)]
pub struct Sequencer {
    latest: u64,
}

impl Sequencer {
    pub fn issue(&mut self) -> u64 {
        self.latest += 1;
        self.latest
    }

    /// True only for the response to the most recently issued request.
    pub fn is_current(&self, seq: u64) -> bool {
        seq == self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debounce_fires_after_delay() {
        let t0 = Instant::now();
        let mut d = Debouncer::default();
        d.input("vo", t0);
        assert_eq!(d.poll(t0 + Duration::from_millis(299)), None);
        assert_eq!(d.poll(t0 + SEARCH_DEBOUNCE), Some("vo".to_string()));
        assert_eq!(d.poll(t0 + Duration::from_secs(1)), None, "Fires once");
    }

    #[test]
    fn test_new_input_resets_timer() {
        let t0 = Instant::now();
        let mut d = Debouncer::default();
        d.input("v", t0);
        d.input("vod", t0 + Duration::from_millis(200));
        assert_eq!(d.poll(t0 + Duration::from_millis(350)), None);
        assert_eq!(d.remaining(t0 + Duration::from_millis(350)), Some(Duration::from_millis(150)));
        assert_eq!(d.poll(t0 + Duration::from_millis(500)), Some("vod".to_string()));
    }

    #[test]
    fn test_stale_responses_are_not_current() {
        let mut seq = Sequencer::default();
        let first = seq.issue();
        let second = seq.issue();
        assert!(!seq.is_current(first));
        assert!(seq.is_current(second));
    }
}
