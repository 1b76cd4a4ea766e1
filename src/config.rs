use serde::Deserialize;
use std::time::Duration;

/// Application configuration loaded from environment variables
///
/// Every variable is prefixed with `MOVIE_FEELS_`, e.g. `MOVIE_FEELS_BACKEND_URL`.
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// Base URL of the movie backend
    #[serde(default = "default_backend_url")]
    pub backend_url: String,

    /// Base URL images are served from
    #[serde(default = "default_static_base_url")]
    pub static_base_url: String,

    /// Prefix the backend puts on stored image paths
    #[serde(default = "default_image_path_prefix")]
    pub image_path_prefix: String,

    /// How long a recommendation result stays hidden after it arrives
    #[serde(default = "default_reveal_delay_ms")]
    pub reveal_delay_ms: u64,

    /// Outbound HTTP timeout
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Mood vocabulary offered for selection (comma-separated in the environment)
    #[serde(default = "default_moods")]
    pub moods: Vec<String>,
}

fn default_backend_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_static_base_url() -> String {
    "http://localhost:8000/static".to_string()
}

fn default_image_path_prefix() -> String {
    "/uploaded_images/".to_string()
}

fn default_reveal_delay_ms() -> u64 {
    1500
}

fn default_request_timeout_secs() -> u64 {
    30
}

pub(crate) fn default_moods() -> Vec<String> {
    [
        "Sad",
        "Happy",
        "Bored",
        "Grief",
        "Magical",
        "Excited",
        "Loneliness",
        "Romance",
        "Adventurous",
        "Brokenhearted",
        "Optimistic",
        "Thrilled",
        "Stressed",
        "Relaxed & Carefree",
        "Scared",
        "Angry",
        "Community Joy",
        "Hopeless",
        "Nostalgia",
    ]
    .iter()
    .map(|m| m.to_string())
    .collect()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_url: default_backend_url(),
            static_base_url: default_static_base_url(),
            image_path_prefix: default_image_path_prefix(),
            reveal_delay_ms: default_reveal_delay_ms(),
            request_timeout_secs: default_request_timeout_secs(),
            moods: default_moods(),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::prefixed("MOVIE_FEELS_")
            .from_env::<Config>()
            .map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    pub fn reveal_delay(&self) -> Duration {
        Duration::from_millis(self.reveal_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
