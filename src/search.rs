use std::time::{Duration, Instant};

use crate::catalog::SearchQuery;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(250);

/// Identifies one issued search request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SearchTicket(u64);

/// Debounces search-as-you-type input and drops superseded responses.
///
/// Input only becomes a request once it has been stable for the debounce
/// delay. Issuing a request supersedes the one in flight, so at most one
/// outstanding ticket is ever honored.
#[derive(Debug)]
pub struct SearchCoordinator {
    delay: Duration,
    pending: Option<(SearchQuery, Instant)>,
    in_flight: Option<SearchTicket>,
    issued: u64,
}

impl Default for SearchCoordinator {
    fn default() -> Self {
        Self::new(DEFAULT_DEBOUNCE)
    }
}

impl SearchCoordinator {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            pending: None,
            in_flight: None,
            issued: 0,
        }
    }

    /// Record new input, restarting the debounce timer.
    pub fn input(&mut self, query: SearchQuery, now: Instant) {
        self.pending = Some((query, now));
    }

    /// When the debounce delay has passed, issue a ticket for the latest input.
    pub fn poll(&mut self, now: Instant) -> Option<(SearchTicket, SearchQuery)> {
        let ready = matches!(&self.pending, Some((_, at)) if now.duration_since(*at) >= self.delay);
        if !ready {
            return None;
        }
        let (query, _) = self.pending.take()?;
        if let Some(stale) = self.in_flight {
            log::debug!("Search {stale:?} superseded");
        }
        self.issued += 1;
        let ticket = SearchTicket(self.issued);
        self.in_flight = Some(ticket);
        Some((ticket, query))
    }

    /// Hand back the results for `ticket` if it is still the current request.
    pub fn complete<T>(&mut self, ticket: SearchTicket, results: T) -> Option<T> {
        if self.in_flight == Some(ticket) {
            self.in_flight = None;
            Some(results)
        } else {
            log::debug!("Discarding stale search response {ticket:?}");
            None
        }
    }

    /// Blocking use: wait out the debounce delay, then run the latest input
    /// through `fetch`. Yields `None` when there was no input or the response
    /// was superseded meanwhile.
    pub fn settle<T, E>(
        &mut self,
        fetch: impl FnOnce(&SearchQuery) -> Result<T, E>,
    ) -> Result<Option<T>, E> {
        let Some((_, at)) = &self.pending else {
            return Ok(None);
        };
        std::thread::sleep((*at + self.delay).saturating_duration_since(Instant::now()));
        let Some((ticket, query)) = self.poll(Instant::now()) else {
            return Ok(None);
        };
        let results = fetch(&query)?;
        Ok(self.complete(ticket, results))
    }

    /// Abandon pending input and any outstanding request.
    pub fn cancel(&mut self) {
        self.pending = None;
        self.in_flight = None;
    }

    pub fn in_flight(&self) -> Option<SearchTicket> {
        self.in_flight
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn rapid_input_is_coalesced() {
        let t0 = Instant::now();
        let mut search = SearchCoordinator::default();
        search.input(SearchQuery::text("b"), t0);
        search.input(SearchQuery::text("be"), t0 + ms(100));
        search.input(SearchQuery::text("ben"), t0 + ms(200));
        assert!(search.poll(t0 + ms(300)).is_none());

        let (_, query) = search.poll(t0 + ms(450)).unwrap();
        assert_eq!(query.text, "ben");
        assert!(!search.has_pending());
        assert!(search.poll(t0 + ms(900)).is_none());
    }

    #[test]
    fn superseded_response_is_discarded() {
        let t0 = Instant::now();
        let mut search = SearchCoordinator::new(ms(200));
        search.input(SearchQuery::text("squ"), t0);
        let (first, _) = search.poll(t0 + ms(200)).unwrap();
        search.input(SearchQuery::text("squat"), t0 + ms(300));
        let (second, _) = search.poll(t0 + ms(500)).unwrap();

        assert_eq!(search.complete(first, vec!["old"]), None);
        assert_eq!(search.complete(second, vec!["new"]), Some(vec!["new"]));
        assert_eq!(search.in_flight(), None);
        // a late duplicate of the honored response is dropped as well
        assert_eq!(search.complete(second, vec!["new"]), None);
    }

    #[test]
    fn settle_waits_then_fetches_latest_input() {
        let mut search = SearchCoordinator::new(ms(20));
        let started = Instant::now();
        search.input(SearchQuery::text("dead"), started);
        search.input(SearchQuery::text("deadlift"), started);
        let found: Result<_, ()> = search.settle(|q| Ok(q.text.clone()));
        assert_eq!(found, Ok(Some("deadlift".to_string())));
        assert!(started.elapsed() >= ms(20));
        assert_eq!(search.in_flight(), None);

        // nothing typed since
        assert_eq!(search.settle(|_| Err::<(), _>("not called")), Ok(None));
    }

    #[test]
    fn settle_propagates_fetch_errors() {
        let mut search = SearchCoordinator::new(Duration::ZERO);
        search.input(SearchQuery::text("row"), Instant::now());
        let err = search.settle(|_| Err::<Vec<u32>, _>("offline"));
        assert_eq!(err, Err("offline"));
    }

    #[test]
    fn cancel_drops_everything() {
        let t0 = Instant::now();
        let mut search = SearchCoordinator::new(ms(10));
        search.input(SearchQuery::text("row"), t0);
        let (ticket, _) = search.poll(t0 + ms(10)).unwrap();
        search.input(SearchQuery::text("rows"), t0 + ms(11));
        search.cancel();
        assert!(search.poll(t0 + ms(100)).is_none());
        assert_eq!(search.complete(ticket, 1), None);
    }
}
