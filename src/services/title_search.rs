use std::sync::Arc;

use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    error::{AppResult, ValidationError},
    models::{MovieId, MovieRecord, RequestId, Review},
    services::{
        providers::MovieBackend,
        reviews::{PostStatus, ReviewMerger},
    },
};

/// How a title search turned out; decides which popup view is shown
#[derive(Debug, Clone, PartialEq)]
pub enum SearchOutcome {
    /// One or more stored movies matched
    Found(Vec<MovieRecord>),
    /// The backend answered but nothing matched
    NotFound { query: String },
    /// The lookup itself failed: network, status, or unreadable body
    TransportError { query: String, notice: String },
}

impl SearchOutcome {
    /// Sorts a backend response into exactly one outcome
    pub fn classify(query: &str, response: AppResult<Vec<MovieRecord>>) -> Self {
        match response {
            Ok(movies) if movies.is_empty() => SearchOutcome::NotFound {
                query: query.to_string(),
            },
            Ok(movies) => SearchOutcome::Found(movies),
            Err(e) => SearchOutcome::TransportError {
                query: query.to_string(),
                notice: e.notice(),
            },
        }
    }

    pub fn movies(&self) -> &[MovieRecord] {
        match self {
            SearchOutcome::Found(movies) => movies,
            _ => &[],
        }
    }

    /// The matched movie when exactly one came back
    pub fn single(&self) -> Option<&MovieRecord> {
        match self.movies() {
            [movie] => Some(movie),
            _ => None,
        }
    }
}

/// The open search popup and the review forms inside it
struct Popup {
    id: Uuid,
    outcome: SearchOutcome,
    reviews: ReviewMerger,
}

impl Popup {
    fn movie(&self, movie_id: MovieId) -> Option<&MovieRecord> {
        self.outcome.movies().iter().find(|m| m.id == movie_id)
    }
}

#[derive(Default)]
struct SearchState {
    latest_search: Option<RequestId>,
    popup: Option<Popup>,
}

/// What a call to [`SearchController::submit_review`] amounted to
#[derive(Debug, Clone, PartialEq)]
pub enum ReviewSubmit {
    /// Blank draft, a post already running, or the movie is not in the popup
    Skipped,
    Posted(Review),
    /// The popup was closed or replaced before the backend answered
    Discarded,
}

/// Title search and the per-movie review forms of its result popup
#[derive(Clone)]
pub struct SearchController {
    inner: Arc<RwLock<SearchState>>,
    backend: Arc<dyn MovieBackend>,
}

impl SearchController {
    pub fn new(backend: Arc<dyn MovieBackend>) -> Self {
        Self {
            inner: Arc::new(RwLock::new(SearchState::default())),
            backend,
        }
    }

    /// Looks a title up and opens a popup for the outcome
    ///
    /// Blank queries are rejected before any call is made. The outcome of a
    /// search that was overtaken by a newer one (or by closing the popup) is
    /// still returned but not displayed.
    pub async fn search(&self, query: &str) -> AppResult<SearchOutcome> {
        if query.trim().is_empty() {
            return Err(ValidationError::EmptyQuery.into());
        }

        let request_id = RequestId::new();
        self.inner.write().await.latest_search = Some(request_id);

        tracing::info!(
            request_id = %request_id,
            query = %query,
            backend = self.backend.name(),
            "Searching movies"
        );

        let response = self.backend.search_movies(request_id, query).await;
        if let Err(e) = &response {
            tracing::warn!(request_id = %request_id, query = %query, error = %e, "Movie search failed");
        }
        let outcome = SearchOutcome::classify(query, response);

        let mut state = self.inner.write().await;
        if state.latest_search != Some(request_id) {
            tracing::debug!(request_id = %request_id, "Discarding stale search response");
            return Ok(outcome);
        }

        state.latest_search = None;
        state.popup = Some(Popup {
            id: Uuid::new_v4(),
            outcome: outcome.clone(),
            reviews: ReviewMerger::new(),
        });

        Ok(outcome)
    }

    /// Closes the popup, dropping its review forms
    pub async fn close_popup(&self) {
        let mut state = self.inner.write().await;
        state.latest_search = None;
        state.popup = None;
    }

    /// Outcome currently displayed, if a popup is open
    pub async fn outcome(&self) -> Option<SearchOutcome> {
        let state = self.inner.read().await;
        state.popup.as_ref().map(|p| p.outcome.clone())
    }

    /// Updates the review draft of a movie shown in the popup
    pub async fn set_draft(&self, movie_id: MovieId, text: impl Into<String>) -> bool {
        let mut state = self.inner.write().await;
        match state.popup.as_mut() {
            Some(popup) if popup.movie(movie_id).is_some() => {
                popup.reviews.set_draft(movie_id, text);
                true
            }
            _ => false,
        }
    }

    pub async fn draft(&self, movie_id: MovieId) -> Option<String> {
        let state = self.inner.read().await;
        state
            .popup
            .as_ref()
            .map(|p| p.reviews.draft(movie_id).to_string())
    }

    pub async fn review_status(&self, movie_id: MovieId) -> Option<PostStatus> {
        let state = self.inner.read().await;
        state.popup.as_ref().map(|p| p.reviews.status(movie_id))
    }

    pub async fn review_notice(&self, movie_id: MovieId) -> Option<String> {
        let state = self.inner.read().await;
        state
            .popup
            .as_ref()
            .and_then(|p| p.reviews.thread(movie_id))
            .and_then(|t| t.notice())
            .map(str::to_string)
    }

    /// Server reviews of a popup movie followed by those posted here
    pub async fn visible_reviews(&self, movie_id: MovieId) -> Option<Vec<Review>> {
        let state = self.inner.read().await;
        let popup = state.popup.as_ref()?;
        let movie = popup.movie(movie_id)?;
        Some(popup.reviews.visible(movie_id, &movie.reviews))
    }

    /// Posts the draft for `movie_id`
    ///
    /// A failed post keeps the draft and returns the error for display.
    pub async fn submit_review(&self, movie_id: MovieId) -> AppResult<ReviewSubmit> {
        let (popup_id, request_id, text) = {
            let mut state = self.inner.write().await;
            let Some(popup) = state.popup.as_mut() else {
                return Ok(ReviewSubmit::Skipped);
            };
            if popup.movie(movie_id).is_none() {
                return Ok(ReviewSubmit::Skipped);
            }
            let Some((request_id, text)) = popup.reviews.begin_submit(movie_id) else {
                return Ok(ReviewSubmit::Skipped);
            };
            (popup.id, request_id, text)
        };

        tracing::info!(request_id = %request_id, movie_id = %movie_id, "Posting review");

        let response = self.backend.create_review(request_id, movie_id, &text).await;

        let mut state = self.inner.write().await;
        let popup = match state.popup.as_mut() {
            Some(popup) if popup.id == popup_id => popup,
            _ => {
                tracing::debug!(request_id = %request_id, movie_id = %movie_id, "Discarding review response for closed popup");
                return Ok(ReviewSubmit::Discarded);
            }
        };

        match response {
            Ok(review) => {
                if !popup.reviews.complete(movie_id, request_id, review.clone()) {
                    return Ok(ReviewSubmit::Discarded);
                }
                tracing::info!(request_id = %request_id, movie_id = %movie_id, "Review posted");
                Ok(ReviewSubmit::Posted(review))
            }
            Err(e) => {
                if !popup.reviews.fail(movie_id, request_id, e.notice()) {
                    return Ok(ReviewSubmit::Discarded);
                }
                tracing::warn!(request_id = %request_id, movie_id = %movie_id, error = %e, "Review post failed");
                Err(e)
            }
        }
    }
}
