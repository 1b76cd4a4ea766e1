use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt::Display;

pub mod mood;
pub mod recommendation;
pub mod request_id;

pub use mood::{Mood, MoodVocabulary, Preference, PreferenceState, SelectionSet, Toggle, MAX_MOODS};
pub use recommendation::{RecommendationRequest, RecommendationResult};
pub use request_id::{RequestId, REQUEST_ID_HEADER};

/// Backend identifier of a stored movie
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(pub i64);

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Relevance the backend assigned to a recommended movie
///
/// The backend sends a bare number and uses exactly `1` to mean "not ranked
/// yet", so that value is lifted into its own variant on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub enum MatchScore {
    Scored(f64),
    Unscored,
}

/// Wire value the backend uses for an unranked movie
pub const PLACEHOLDER_SCORE: f64 = 1.0;

impl From<f64> for MatchScore {
    fn from(value: f64) -> Self {
        if value == PLACEHOLDER_SCORE {
            MatchScore::Unscored
        } else {
            MatchScore::Scored(value)
        }
    }
}

impl From<MatchScore> for f64 {
    fn from(score: MatchScore) -> Self {
        match score {
            MatchScore::Scored(value) => value,
            MatchScore::Unscored => PLACEHOLDER_SCORE,
        }
    }
}

impl MatchScore {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, MatchScore::Unscored)
    }
}

/// One movie in a recommendation result
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MovieMatch {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "imageRef", alias = "image_ref")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub moods: Vec<Mood>,
    #[serde(default)]
    pub reviews: Vec<String>,
    #[serde(alias = "matchScore")]
    pub match_score: MatchScore,
}

/// A review attached to a stored movie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Review {
    #[serde(rename = "review", alias = "text")]
    pub text: String,
    #[serde(
        default,
        alias = "createdAt",
        deserialize_with = "deserialize_timestamp"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "movieId")]
    pub movie_id: Option<MovieId>,
}

impl Review {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            created_at: None,
            movie_id: None,
        }
    }
}

/// A stored movie as returned by search and create
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(from = "ApiMovie")]
pub struct MovieRecord {
    pub id: MovieId,
    pub title: String,
    pub description: String,
    pub image_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub moods: Vec<Mood>,
    pub reviews: Vec<Review>,
}

// ============================================================================
// Backend API Types
// ============================================================================

/// Raw movie record as the backend serializes it
///
/// Older backends send only the latest review as a `review` string instead of
/// a `reviews` list.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiMovie {
    pub id: MovieId,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, alias = "imageRef", alias = "image_ref")]
    pub image_url: Option<String>,
    #[serde(default, alias = "createdAt", deserialize_with = "deserialize_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub moods: Vec<Mood>,
    #[serde(default)]
    pub reviews: Option<Vec<ApiReview>>,
    #[serde(default)]
    pub review: Option<String>,
}

/// A review entry inside a movie record: either bare text or a full object
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum ApiReview {
    Text(String),
    Full(Review),
}

impl From<ApiMovie> for MovieRecord {
    fn from(movie: ApiMovie) -> Self {
        let id = movie.id;
        let reviews = match (movie.reviews, movie.review) {
            (Some(list), _) => list
                .into_iter()
                .map(|r| match r {
                    ApiReview::Text(text) => Review::new(text),
                    ApiReview::Full(review) => review,
                })
                .collect(),
            (None, Some(text)) => vec![Review {
                text,
                created_at: movie.created_at,
                movie_id: Some(id),
            }],
            (None, None) => Vec::new(),
        };

        MovieRecord {
            id,
            title: movie.title,
            description: movie.description.unwrap_or_default(),
            image_url: movie.image_url,
            created_at: movie.created_at,
            moods: movie.moods,
            reviews,
        }
    }
}

/// Entry of `GET /api/moods`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ApiMood {
    pub id: i64,
    pub name: String,
}

/// Body of `GET /`
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub message: String,
}

/// Accepts RFC 3339 as well as the offset-less timestamps the backend emits,
/// reading the latter as UTC.
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    if let Ok(ts) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(Some(ts.with_timezone(&Utc)));
    }

    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| Some(naive.and_utc()))
        .map_err(serde::de::Error::custom)
}
