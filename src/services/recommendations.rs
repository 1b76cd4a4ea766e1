use std::{sync::Arc, time::Duration};

use tokio::{
    sync::{watch, RwLock},
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Mood, Preference, RequestId, SelectionSet, Toggle},
    services::{
        dispatcher::{DeliveredResult, DispatchStatus, RecommendationDispatcher},
        providers::MovieBackend,
    },
    session::Session,
};

/// What a call to [`RecommendationController::submit`] amounted to
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// No mood or no preference selected, or no session is open
    Blocked,
    /// A request is already in flight, or this session already succeeded
    Ignored,
    /// Result accepted; visible once the reveal delay passes
    Delivered { request_id: RequestId, movies: usize },
    /// The response arrived for a session that no longer exists
    Discarded,
}

/// What reveal waiters watch
///
/// `epoch` moves on every session change, so a waiter can tell that the result
/// it was waiting for has been withdrawn even if later reveals overwrote the
/// intermediate values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RevealSignal {
    epoch: u64,
    revealed: Option<RequestId>,
}

/// Shared state behind the controller
pub struct ControllerState {
    session: Option<Session>,
    dispatcher: RecommendationDispatcher,
    reveal_task: Option<JoinHandle<()>>,
}

impl ControllerState {
    fn cancel_reveal(&mut self) {
        if let Some(task) = self.reveal_task.take() {
            task.abort();
        }
    }
}

/// Drives the recommendation page: session form, dispatch, and timed reveal
#[derive(Clone)]
pub struct RecommendationController {
    inner: Arc<RwLock<ControllerState>>,
    backend: Arc<dyn MovieBackend>,
    reveal_delay: Duration,
    revealed: Arc<watch::Sender<RevealSignal>>,
}

impl RecommendationController {
    pub fn new(backend: Arc<dyn MovieBackend>, reveal_delay: Duration) -> Self {
        let (revealed, _) = watch::channel(RevealSignal::default());
        Self {
            inner: Arc::new(RwLock::new(ControllerState {
                session: None,
                dispatcher: RecommendationDispatcher::new(),
                reveal_task: None,
            })),
            backend,
            reveal_delay,
            revealed: Arc::new(revealed),
        }
    }

    /// Opens a fresh session, dropping any previous form, result, or pending request
    pub async fn enter(&self) -> Uuid {
        let mut state = self.inner.write().await;
        self.withdraw(&mut state);
        let session = Session::new();
        let id = session.id();
        state.session = Some(session);

        tracing::debug!(session_id = %id, "Recommendation session started");
        id
    }

    /// Tears the session down; responses still in flight will be discarded
    pub async fn leave(&self) {
        let mut state = self.inner.write().await;
        self.withdraw(&mut state);
        if let Some(session) = state.session.take() {
            tracing::debug!(session_id = %session.id(), "Recommendation session closed");
        }
    }

    /// `None` when no session is open
    pub async fn toggle_mood(&self, mood: Mood) -> Option<Toggle> {
        let mut state = self.inner.write().await;
        state.session.as_mut().map(|s| s.toggle_mood(mood))
    }

    pub async fn select_preference(&self, preference: Preference) -> bool {
        let mut state = self.inner.write().await;
        match state.session.as_mut() {
            Some(session) => {
                session.select_preference(preference);
                true
            }
            None => false,
        }
    }

    pub async fn set_notes(&self, notes: impl Into<String>) -> bool {
        let mut state = self.inner.write().await;
        match state.session.as_mut() {
            Some(session) => {
                session.set_notes(notes);
                true
            }
            None => false,
        }
    }

    pub async fn selection(&self) -> Option<SelectionSet> {
        let state = self.inner.read().await;
        state.session.as_ref().map(|s| s.moods().clone())
    }

    pub async fn preference(&self) -> Option<Preference> {
        let state = self.inner.read().await;
        state.session.as_ref().and_then(|s| s.preference())
    }

    /// Whether the submit control should be enabled
    pub async fn can_submit(&self) -> bool {
        let state = self.inner.read().await;
        state.dispatcher.can_begin() && state.session.as_ref().is_some_and(Session::is_ready)
    }

    pub async fn status(&self) -> DispatchStatus {
        self.inner.read().await.dispatcher.status()
    }

    pub async fn notice(&self) -> Option<String> {
        self.inner.read().await.dispatcher.notice().map(str::to_string)
    }

    /// The current result, only after it has been revealed
    pub async fn visible_results(&self) -> Option<DeliveredResult> {
        self.inner.read().await.dispatcher.visible().cloned()
    }

    /// Waits until the currently delivered result is revealed
    ///
    /// Returns `None` right away when nothing has been delivered, and as soon
    /// as the session is left or re-entered while waiting.
    pub async fn wait_for_reveal(&self) -> Option<DeliveredResult> {
        // Subscribe under the lock so no withdrawal slips in between
        let (request_id, epoch, mut rx) = {
            let state = self.inner.read().await;
            let request_id = state.dispatcher.delivered()?.request_id;
            let epoch = self.revealed.borrow().epoch;
            (request_id, epoch, self.revealed.subscribe())
        };

        let signal = *rx
            .wait_for(|s| s.epoch != epoch || s.revealed == Some(request_id))
            .await
            .ok()?;
        if signal.epoch != epoch {
            tracing::debug!(request_id = %request_id, "Reveal withdrawn before it happened");
            return None;
        }

        self.visible_results()
            .await
            .filter(|result| result.request_id == request_id)
    }

    /// Sends the session's selection to the backend
    ///
    /// Transport failures are recorded as `failed`, keep the selection, and are
    /// returned as the error so the caller can show the notice.
    pub async fn submit(&self) -> AppResult<SubmitOutcome> {
        let (request_id, request) = {
            let mut state = self.inner.write().await;
            let Some(request) = state.session.as_ref().and_then(Session::to_request) else {
                return Ok(SubmitOutcome::Blocked);
            };
            let Some(request_id) = state.dispatcher.begin() else {
                tracing::debug!("Recommendation request already in flight, ignoring submit");
                return Ok(SubmitOutcome::Ignored);
            };
            (request_id, request)
        };

        tracing::info!(
            request_id = %request_id,
            moods = request.moods.len(),
            preference = %request.preference,
            backend = self.backend.name(),
            "Dispatching recommendation request"
        );

        let response = self.backend.recommend(request_id, &request).await;

        let mut state = self.inner.write().await;
        match response {
            Ok(result) => {
                if !state.dispatcher.succeed(request_id, result) {
                    tracing::debug!(request_id = %request_id, "Discarding stale recommendation response");
                    return Ok(SubmitOutcome::Discarded);
                }

                // The form is done with once a result is in
                state.session = None;
                let movies = state
                    .dispatcher
                    .delivered()
                    .map(|d| d.movies.len())
                    .unwrap_or_default();
                self.schedule_reveal(&mut state, request_id);

                tracing::info!(request_id = %request_id, movies, "Recommendation request succeeded");

                Ok(SubmitOutcome::Delivered { request_id, movies })
            }
            Err(e) => {
                if !state.dispatcher.fail(request_id, e.notice()) {
                    tracing::debug!(request_id = %request_id, error = %e, "Discarding stale recommendation failure");
                    return Ok(SubmitOutcome::Discarded);
                }

                tracing::warn!(request_id = %request_id, error = %e, "Recommendation request failed");

                Err(e)
            }
        }
    }

    /// Drops the dispatcher state and pending reveal, waking any reveal waiters
    fn withdraw(&self, state: &mut ControllerState) {
        state.cancel_reveal();
        state.dispatcher.reset();
        self.revealed.send_modify(|s| {
            s.epoch += 1;
            s.revealed = None;
        });
    }

    fn schedule_reveal(&self, state: &mut ControllerState, request_id: RequestId) {
        state.cancel_reveal();

        let inner = Arc::clone(&self.inner);
        let revealed = Arc::clone(&self.revealed);
        let delay = self.reveal_delay;

        state.reveal_task = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let mut state = inner.write().await;
            if state.dispatcher.reveal(request_id) {
                revealed.send_modify(|s| s.revealed = Some(request_id));
                tracing::debug!(request_id = %request_id, "Recommendation result revealed");
            }
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{MatchScore, MovieId, MovieMatch, RecommendationResult};
    use crate::services::providers::MockMovieBackend;

    const DELAY: Duration = Duration::from_millis(1500);

    fn movie(id: i64, score: f64) -> MovieMatch {
        MovieMatch {
            id: MovieId(id),
            title: format!("Movie {}", id),
            description: String::new(),
            image_url: Some(format!("/uploaded_images/{}.png", id)),
            moods: vec![Mood::new("Happy")],
            reviews: vec![],
            match_score: MatchScore::from(score),
        }
    }

    fn backend_returning(scores: Vec<f64>) -> MockMovieBackend {
        let mut backend = MockMovieBackend::new();
        backend.expect_name().return_const("mock");
        backend.expect_recommend().returning(move |_, _| {
            Ok(RecommendationResult {
                message: "Here you go".to_string(),
                movies: scores
                    .iter()
                    .enumerate()
                    .map(|(i, s)| movie(i as i64, *s))
                    .collect(),
            })
        });
        backend
    }

    async fn ready_controller(backend: MockMovieBackend) -> RecommendationController {
        let controller = RecommendationController::new(Arc::new(backend), DELAY);
        controller.enter().await;
        controller.toggle_mood(Mood::new("Happy")).await;
        controller.toggle_mood(Mood::new("Excited")).await;
        controller.select_preference(Preference::Congruence).await;
        controller
    }

    #[tokio::test]
    async fn test_submit_blocked_without_selection() {
        let mut backend = MockMovieBackend::new();
        backend.expect_recommend().never();
        let controller = RecommendationController::new(Arc::new(backend), DELAY);

        // No session yet
        assert_eq!(controller.submit().await.unwrap(), SubmitOutcome::Blocked);

        controller.enter().await;
        controller.toggle_mood(Mood::new("Sad")).await;
        assert!(!controller.can_submit().await);
        assert_eq!(controller.submit().await.unwrap(), SubmitOutcome::Blocked);
        assert_eq!(controller.status().await, DispatchStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_result_revealed_after_delay() {
        let controller = ready_controller(backend_returning(vec![1.0, 0.8, 0.3])).await;
        assert!(controller.can_submit().await);

        let outcome = controller.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Delivered { movies: 2, .. }));
        assert_eq!(controller.status().await, DispatchStatus::Succeeded);
        assert!(controller.visible_results().await.is_none());

        tokio::time::sleep(DELAY - Duration::from_millis(1)).await;
        assert!(controller.visible_results().await.is_none());

        tokio::time::sleep(Duration::from_millis(2)).await;
        let visible = controller.visible_results().await.unwrap();
        assert_eq!(visible.message, "Here you go");
        assert_eq!(visible.movies.len(), 2);
        assert_eq!(visible.movies[0].id, MovieId(1));
    }

    #[tokio::test(start_paused = true)]
    async fn test_success_ends_session() {
        let controller = ready_controller(backend_returning(vec![0.5])).await;
        controller.submit().await.unwrap();

        assert!(controller.selection().await.is_none());
        assert!(!controller.can_submit().await);
        assert_eq!(controller.submit().await.unwrap(), SubmitOutcome::Blocked);

        let revealed = controller.wait_for_reveal().await.unwrap();
        assert_eq!(revealed.movies.len(), 1);
    }

    #[tokio::test]
    async fn test_failure_keeps_selection_and_allows_retry() {
        let mut backend = MockMovieBackend::new();
        backend.expect_name().return_const("mock");
        let mut seq = mockall::Sequence::new();
        backend
            .expect_recommend()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(AppError::ExternalApi("Backend unavailable".to_string())));
        backend
            .expect_recommend()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(RecommendationResult {
                    message: String::new(),
                    movies: vec![movie(4, 0.6)],
                })
            });

        let controller = ready_controller(backend).await;

        let err = controller.submit().await.unwrap_err();
        assert!(err.is_transport());
        assert_eq!(controller.status().await, DispatchStatus::Failed);
        assert_eq!(controller.notice().await.as_deref(), Some("Backend unavailable"));

        let selection = controller.selection().await.unwrap();
        assert_eq!(selection.as_slice(), &[Mood::new("Happy"), Mood::new("Excited")]);
        assert_eq!(controller.preference().await, Some(Preference::Congruence));
        assert!(controller.can_submit().await);

        let outcome = controller.submit().await.unwrap();
        assert!(matches!(outcome, SubmitOutcome::Delivered { movies: 1, .. }));
        assert_eq!(controller.notice().await, None);
    }

    #[tokio::test]
    async fn test_request_carries_session_form() {
        let mut backend = MockMovieBackend::new();
        backend.expect_name().return_const("mock");
        backend
            .expect_recommend()
            .withf(|_, request| {
                request.moods == vec![Mood::new("Happy"), Mood::new("Excited")]
                    && request.preference == Preference::Congruence
                    && request.personal_notes == "rainy day"
            })
            .times(1)
            .returning(|_, _| {
                Ok(RecommendationResult {
                    message: String::new(),
                    movies: vec![],
                })
            });

        let controller = ready_controller(backend).await;
        controller.set_notes("rainy day").await;
        assert!(controller.submit().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn test_leave_cancels_pending_reveal() {
        let controller = ready_controller(backend_returning(vec![0.7])).await;
        controller.submit().await.unwrap();
        controller.leave().await;

        tokio::time::sleep(DELAY * 2).await;
        assert!(controller.visible_results().await.is_none());
        assert_eq!(controller.status().await, DispatchStatus::Idle);
        assert!(!controller.select_preference(Preference::Incongruence).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_waiter_returns_when_session_left() {
        let controller = ready_controller(backend_returning(vec![0.7])).await;
        controller.submit().await.unwrap();

        let waiter = tokio::spawn({
            let controller = controller.clone();
            async move { controller.wait_for_reveal().await }
        });
        tokio::task::yield_now().await;
        controller.leave().await;

        let waited = tokio::time::timeout(Duration::from_secs(3600), waiter)
            .await
            .expect("waiter should finish once the session is gone")
            .unwrap();
        assert!(waited.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_reveal_waiter_returns_when_session_reentered() {
        let controller = ready_controller(backend_returning(vec![0.7])).await;
        controller.submit().await.unwrap();

        let waiter = tokio::spawn({
            let controller = controller.clone();
            async move { controller.wait_for_reveal().await }
        });
        tokio::task::yield_now().await;
        controller.enter().await;

        let waited = tokio::time::timeout(Duration::from_secs(3600), waiter)
            .await
            .expect("waiter should finish once the session is replaced")
            .unwrap();
        assert!(waited.is_none());
        assert!(controller.visible_results().await.is_none());
    }
}
