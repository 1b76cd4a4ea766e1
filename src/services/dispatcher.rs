use crate::{
    models::{MovieMatch, RecommendationResult, RequestId},
    services::results::filter_placeholders,
};

/// Lifecycle of a recommendation request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchStatus {
    Idle,
    Pending,
    Succeeded,
    Failed,
}

/// A result accepted for display, tagged with the request that produced it
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredResult {
    pub request_id: RequestId,
    pub message: String,
    /// Already run through the placeholder filter
    pub movies: Vec<MovieMatch>,
    revealed: bool,
}

impl DeliveredResult {
    pub fn is_revealed(&self) -> bool {
        self.revealed
    }
}

/// Synchronous state machine behind the recommendation page
///
/// `idle -> pending -> {succeeded, failed}`, with `failed -> pending` on retry.
/// Each dispatch gets a [`RequestId`] ticket; completions and reveals carrying
/// any other id are ignored, which is how late responses and stale timers are
/// kept from touching newer state.
#[derive(Debug)]
pub struct RecommendationDispatcher {
    status: DispatchStatus,
    in_flight: Option<RequestId>,
    delivered: Option<DeliveredResult>,
    notice: Option<String>,
}

impl Default for RecommendationDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

impl RecommendationDispatcher {
    pub fn new() -> Self {
        Self {
            status: DispatchStatus::Idle,
            in_flight: None,
            delivered: None,
            notice: None,
        }
    }

    pub fn status(&self) -> DispatchStatus {
        self.status
    }

    /// Whether a new request may be dispatched right now
    pub fn can_begin(&self) -> bool {
        matches!(self.status, DispatchStatus::Idle | DispatchStatus::Failed)
    }

    /// Moves to `pending` and hands out the ticket for the new request
    ///
    /// Returns `None` while a request is in flight or after a success.
    pub fn begin(&mut self) -> Option<RequestId> {
        if !self.can_begin() {
            return None;
        }

        let request_id = RequestId::new();
        self.status = DispatchStatus::Pending;
        self.in_flight = Some(request_id);
        self.delivered = None;
        self.notice = None;
        Some(request_id)
    }

    fn take_ticket(&mut self, request_id: RequestId) -> bool {
        if self.in_flight != Some(request_id) {
            return false;
        }
        self.in_flight = None;
        true
    }

    /// Stores a successful response; `false` if the ticket is stale
    pub fn succeed(&mut self, request_id: RequestId, result: RecommendationResult) -> bool {
        if !self.take_ticket(request_id) {
            return false;
        }

        self.status = DispatchStatus::Succeeded;
        self.delivered = Some(DeliveredResult {
            request_id,
            message: result.message,
            movies: filter_placeholders(result.movies),
            revealed: false,
        });
        true
    }

    /// Records a failed request so it can be retried; `false` if the ticket is stale
    pub fn fail(&mut self, request_id: RequestId, notice: impl Into<String>) -> bool {
        if !self.take_ticket(request_id) {
            return false;
        }

        self.status = DispatchStatus::Failed;
        self.notice = Some(notice.into());
        true
    }

    /// Makes the delivered result visible if it still belongs to `request_id`
    pub fn reveal(&mut self, request_id: RequestId) -> bool {
        match self.delivered.as_mut() {
            Some(delivered) if delivered.request_id == request_id && !delivered.revealed => {
                delivered.revealed = true;
                true
            }
            _ => false,
        }
    }

    /// Forgets everything, including any request still in flight
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn delivered(&self) -> Option<&DeliveredResult> {
        self.delivered.as_ref()
    }

    /// The delivered result, once its reveal delay has passed
    pub fn visible(&self) -> Option<&DeliveredResult> {
        self.delivered.as_ref().filter(|d| d.revealed)
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchScore, MovieId};

    fn result(scores: &[f64]) -> RecommendationResult {
        RecommendationResult {
            message: "ok".to_string(),
            movies: scores
                .iter()
                .enumerate()
                .map(|(i, s)| MovieMatch {
                    id: MovieId(i as i64),
                    title: format!("Movie {}", i),
                    description: String::new(),
                    image_url: None,
                    moods: vec![],
                    reviews: vec![],
                    match_score: MatchScore::from(*s),
                })
                .collect(),
        }
    }

    #[test]
    fn test_begin_only_once_while_pending() {
        let mut dispatcher = RecommendationDispatcher::new();
        assert_eq!(dispatcher.status(), DispatchStatus::Idle);

        let ticket = dispatcher.begin();
        assert!(ticket.is_some());
        assert_eq!(dispatcher.status(), DispatchStatus::Pending);
        assert!(dispatcher.begin().is_none());
    }

    #[test]
    fn test_success_filters_and_hides_until_revealed() {
        let mut dispatcher = RecommendationDispatcher::new();
        let ticket = dispatcher.begin().unwrap();

        assert!(dispatcher.succeed(ticket, result(&[1.0, 0.8, 0.3])));
        assert_eq!(dispatcher.status(), DispatchStatus::Succeeded);
        assert_eq!(dispatcher.delivered().unwrap().movies.len(), 2);
        assert!(dispatcher.visible().is_none());

        assert!(dispatcher.reveal(ticket));
        assert!(dispatcher.visible().unwrap().is_revealed());
        // Second reveal is a no-op
        assert!(!dispatcher.reveal(ticket));
    }

    #[test]
    fn test_succeeded_is_terminal() {
        let mut dispatcher = RecommendationDispatcher::new();
        let ticket = dispatcher.begin().unwrap();
        dispatcher.succeed(ticket, result(&[0.5]));
        assert!(dispatcher.begin().is_none());
    }

    #[test]
    fn test_failure_is_retryable() {
        let mut dispatcher = RecommendationDispatcher::new();
        let first = dispatcher.begin().unwrap();
        assert!(dispatcher.fail(first, "Failed to get recommendations"));
        assert_eq!(dispatcher.status(), DispatchStatus::Failed);
        assert_eq!(dispatcher.notice(), Some("Failed to get recommendations"));

        let second = dispatcher.begin().unwrap();
        assert_ne!(first, second);
        assert_eq!(dispatcher.status(), DispatchStatus::Pending);
        assert_eq!(dispatcher.notice(), None);
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut dispatcher = RecommendationDispatcher::new();
        let old = dispatcher.begin().unwrap();
        dispatcher.reset();
        let current = dispatcher.begin().unwrap();

        assert!(!dispatcher.succeed(old, result(&[0.9])));
        assert!(!dispatcher.fail(old, "late failure"));
        assert_eq!(dispatcher.status(), DispatchStatus::Pending);

        assert!(dispatcher.succeed(current, result(&[0.4])));
        assert!(!dispatcher.reveal(old));
        assert!(dispatcher.reveal(current));
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let mut dispatcher = RecommendationDispatcher::new();
        let ticket = dispatcher.begin().unwrap();
        dispatcher.succeed(ticket, result(&[1.0]));
        dispatcher.reset();

        assert_eq!(dispatcher.status(), DispatchStatus::Idle);
        assert!(dispatcher.delivered().is_none());
        assert!(dispatcher.can_begin());
    }
}
