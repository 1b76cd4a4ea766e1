/// Input problems caught before any network call.
///
/// The `Display` text of each variant is the notice shown to the user, so
/// wording here is part of the interface.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please enter a movie title to search!")]
    EmptyQuery,

    #[error("Please select an image")]
    MissingImage,

    #[error("Image size should be less than 5MB")]
    ImageTooLarge { size: u64 },

    #[error("Please select a valid image file")]
    InvalidImageType { media_type: String },

    #[error("Please fill in the movie {0}")]
    MissingField(&'static str),

    #[error("Please select at least one mood")]
    NoMoods,

    #[error("Please select no more than 5 moods")]
    TooManyMoods,

    #[error("Unknown mood: {0}")]
    UnknownMood(String),

    #[error("Select at least one mood and a preference first")]
    IncompleteSelection,

    #[error("Unknown preference '{0}', expected congruence or incongruence")]
    InvalidPreference(String),
}

/// Application-level errors
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("External API error: {0}")]
    ExternalApi(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// True for failures of the call itself: network, status, or body decoding.
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::HttpClient(_) | AppError::ExternalApi(_))
    }

    /// The single message surfaced to the user for this failure.
    pub fn notice(&self) -> String {
        match self {
            AppError::Validation(e) => e.to_string(),
            AppError::ExternalApi(detail) => detail.clone(),
            AppError::HttpClient(_) => {
                "Could not reach the movie service. Please try again.".to_string()
            }
            AppError::Io(e) => format!("Could not read the file: {}", e),
            AppError::Internal(_) => "Something went wrong. Please try again.".to_string(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_notices() {
        assert_eq!(
            ValidationError::ImageTooLarge { size: 6 * 1024 * 1024 }.to_string(),
            "Image size should be less than 5MB"
        );
        assert_eq!(
            ValidationError::MissingField("title").to_string(),
            "Please fill in the movie title"
        );
    }

    #[test]
    fn test_validation_is_not_transport() {
        let err: AppError = ValidationError::EmptyQuery.into();
        assert!(!err.is_transport());
        assert_eq!(err.notice(), "Please enter a movie title to search!");
    }

    #[test]
    fn test_external_api_notice_is_detail() {
        let err = AppError::ExternalApi("Failed to create movie review: boom".to_string());
        assert!(err.is_transport());
        assert_eq!(err.notice(), "Failed to create movie review: boom");
    }
}
