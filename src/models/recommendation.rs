use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize, Serializer};

use super::{Mood, MovieMatch, Preference};

/// Body of `POST /movierecommendationuserinput`
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationRequest {
    pub moods: Vec<Mood>,
    pub preference: Preference,
    pub personal_notes: String,
    /// Assigned when the request is submitted, not when moods were picked
    #[serde(serialize_with = "iso_millis")]
    pub timestamp: DateTime<Utc>,
}

impl RecommendationRequest {
    pub fn new(moods: Vec<Mood>, preference: Preference, personal_notes: String) -> Self {
        Self {
            moods,
            preference,
            personal_notes,
            timestamp: Utc::now(),
        }
    }
}

// Millisecond precision with a `Z` suffix
fn iso_millis<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Backend answer to a recommendation request
///
/// Movies keep the order the backend returned them in.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct RecommendationResult {
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub movies: Vec<MovieMatch>,
}
