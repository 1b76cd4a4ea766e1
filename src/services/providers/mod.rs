/// Movie backend abstraction
///
/// The matching algorithm, storage, and image hosting all live behind the
/// backend service. This module describes what the client needs from it, so
/// controllers can be driven by the real HTTP backend or by a test double.
use crate::{
    error::AppResult,
    models::{
        ApiMood, HealthStatus, MovieId, MovieRecord, RecommendationRequest, RecommendationResult,
        RequestId, Review,
    },
    services::intake::MovieUpload,
};

pub mod http;

pub use http::HttpBackend;

/// Trait for movie backends
///
/// Every call is a single request with no automatic retry; retrying is left to
/// the user. Calls that take a [`RequestId`] send it along so the backend's
/// logs can be matched with ours.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait MovieBackend: Send + Sync {
    /// Liveness probe
    async fn health(&self) -> AppResult<HealthStatus>;

    /// Mood vocabulary known to the backend, ordered by name
    async fn fetch_moods(&self) -> AppResult<Vec<ApiMood>>;

    /// Asks for recommendations matching the submitted moods and preference
    async fn recommend(
        &self,
        request_id: RequestId,
        request: &RecommendationRequest,
    ) -> AppResult<RecommendationResult>;

    /// Looks up stored movies whose title contains `title`
    ///
    /// An empty list means nothing matched; that is not an error.
    async fn search_movies(&self, request_id: RequestId, title: &str)
        -> AppResult<Vec<MovieRecord>>;

    /// Attaches a review to an existing movie and returns the stored review
    async fn create_review(
        &self,
        request_id: RequestId,
        movie_id: MovieId,
        text: &str,
    ) -> AppResult<Review>;

    /// Stores a brand-new movie together with its first review
    async fn create_movie(&self, upload: MovieUpload) -> AppResult<MovieRecord>;

    /// Backend name for logging and debugging
    fn name(&self) -> &'static str;
}
