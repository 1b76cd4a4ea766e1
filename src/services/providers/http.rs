/// HTTP movie backend
///
/// Talks JSON (and multipart for uploads) to the movie service:
/// 1. Recommendations: POST /movierecommendationuserinput
/// 2. Search: GET /api/movies/search?title=...
/// 3. Reviews: POST /api/movies/{id}/reviews
/// 4. New movies: POST /api/movies (multipart)
/// 5. Mood vocabulary: GET /api/moods
use crate::{
    config::Config,
    error::{AppError, AppResult},
    models::{
        ApiMood, HealthStatus, MovieId, MovieRecord, RecommendationRequest, RecommendationResult,
        RequestId, Review, REQUEST_ID_HEADER,
    },
    services::{intake::MovieUpload, providers::MovieBackend},
};
use reqwest::{Client as HttpClient, Response};
use serde::{de::DeserializeOwned, Deserialize};
use serde_json::json;

const SUBMIT_MOVIE_FALLBACK: &str = "Failed to submit movie";

#[derive(Clone)]
pub struct HttpBackend {
    http_client: HttpClient,
    api_url: String,
}

impl HttpBackend {
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            http_client: HttpClient::new(),
            api_url: api_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Builds a backend with the configured base URL and timeout
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let http_client = HttpClient::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            http_client,
            api_url: config.backend_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    /// Turns a non-success response into an error, preferring the backend's
    /// `detail` message over `fallback`
    async fn ensure_success(response: Response, fallback: &str) -> AppResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        #[derive(Deserialize)]
        struct ErrorBody {
            detail: Option<String>,
        }

        let body = response.text().await.unwrap_or_default();
        tracing::warn!(status = %status, body = %body, "Movie backend request failed");

        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .unwrap_or_else(|| format!("{} (status {})", fallback, status.as_u16()));

        Err(AppError::ExternalApi(detail))
    }

    async fn read_json<T: DeserializeOwned>(response: Response, fallback: &str) -> AppResult<T> {
        let response = Self::ensure_success(response, fallback).await?;
        Ok(response.json::<T>().await?)
    }
}

#[async_trait::async_trait]
impl MovieBackend for HttpBackend {
    async fn health(&self) -> AppResult<HealthStatus> {
        let response = self.http_client.get(self.url("/")).send().await?;
        Self::read_json(response, "Health check failed").await
    }

    async fn fetch_moods(&self) -> AppResult<Vec<ApiMood>> {
        let response = self.http_client.get(self.url("/api/moods")).send().await?;
        let moods: Vec<ApiMood> = Self::read_json(response, "Failed to fetch moods").await?;

        tracing::debug!(count = moods.len(), "Fetched mood vocabulary");

        Ok(moods)
    }

    async fn recommend(
        &self,
        request_id: RequestId,
        request: &RecommendationRequest,
    ) -> AppResult<RecommendationResult> {
        let response = self
            .http_client
            .post(self.url("/movierecommendationuserinput"))
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .json(request)
            .send()
            .await?;

        let result: RecommendationResult =
            Self::read_json(response, "Failed to get recommendations").await?;

        tracing::info!(
            request_id = %request_id,
            movies = result.movies.len(),
            backend = "http",
            "Recommendations received"
        );

        Ok(result)
    }

    async fn search_movies(
        &self,
        request_id: RequestId,
        title: &str,
    ) -> AppResult<Vec<MovieRecord>> {
        let response = self
            .http_client
            .get(self.url("/api/movies/search"))
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .query(&[("title", title)])
            .send()
            .await?;

        let movies: Vec<MovieRecord> =
            Self::read_json(response, "Failed to search movies").await?;

        tracing::info!(
            request_id = %request_id,
            query = %title,
            results = movies.len(),
            backend = "http",
            "Title search completed"
        );

        Ok(movies)
    }

    async fn create_review(
        &self,
        request_id: RequestId,
        movie_id: MovieId,
        text: &str,
    ) -> AppResult<Review> {
        let response = self
            .http_client
            .post(self.url(&format!("/api/movies/{}/reviews", movie_id)))
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .json(&json!({ "review": text }))
            .send()
            .await?;

        let mut review: Review = Self::read_json(response, "Failed to post review").await?;
        review.movie_id.get_or_insert(movie_id);

        tracing::info!(request_id = %request_id, movie_id = %movie_id, "Review created");

        Ok(review)
    }

    async fn create_movie(&self, upload: MovieUpload) -> AppResult<MovieRecord> {
        let request_id = RequestId::new();
        let form = upload.into_form()?;

        let response = self
            .http_client
            .post(self.url("/api/movies"))
            .header(REQUEST_ID_HEADER, request_id.to_string())
            .multipart(form)
            .send()
            .await?;

        // Failures carry `detail` when the body is JSON; anything else gets the generic notice
        let movie: MovieRecord = Self::read_json(response, SUBMIT_MOVIE_FALLBACK).await?;

        tracing::info!(request_id = %request_id, movie_id = %movie.id, "Movie stored");

        Ok(movie)
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
