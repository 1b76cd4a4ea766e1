use std::{path::Path, sync::Arc};

use reqwest::multipart::{Form, Part};

use crate::{
    error::{AppError, AppResult, ValidationError},
    models::{Mood, MovieRecord, SelectionSet, Toggle, MAX_MOODS},
    services::providers::MovieBackend,
};

/// Largest image the backend accepts, in bytes
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// An image file picked for upload
#[derive(Debug, Clone, PartialEq)]
pub struct ImageAttachment {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl ImageAttachment {
    pub fn new(file_name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, detecting its media type from content
    pub async fn from_path(path: impl AsRef<Path>) -> AppResult<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image".to_string());
        let media_type = detect_media_type(&file_name, &bytes);

        tracing::debug!(
            file = %file_name,
            media_type = %media_type,
            size = bytes.len(),
            "Loaded image attachment"
        );

        Ok(Self::new(file_name, media_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_image(&self) -> bool {
        self.media_type.starts_with("image/")
    }
}

/// Magic bytes first, then the file extension
pub fn detect_media_type(file_name: &str, data: &[u8]) -> String {
    if let Some(kind) = infer::get(data) {
        return kind.mime_type().to_string();
    }

    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "bmp" => "image/bmp",
        "svg" => "image/svg+xml",
        "txt" => "text/plain",
        _ => "application/octet-stream",
    }
    .to_string()
}

/// A new movie and its first review, as entered by the user
#[derive(Debug, Clone, Default)]
pub struct MovieDraft {
    pub image: Option<ImageAttachment>,
    pub title: String,
    pub description: String,
    pub review: String,
    pub moods: SelectionSet,
}

impl MovieDraft {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_mood(&mut self, mood: Mood) -> Toggle {
        self.moods.toggle(mood)
    }
}

/// Validated multipart payload for `POST /api/movies`
#[derive(Debug, Clone, PartialEq)]
pub struct MovieUpload {
    pub image: ImageAttachment,
    pub title: String,
    pub description: String,
    pub review: String,
    /// Comma-joined mood names; the backend splits on `,`
    pub moods: String,
}

impl MovieUpload {
    pub fn into_form(self) -> AppResult<Form> {
        let image = Part::bytes(self.image.bytes)
            .file_name(self.image.file_name)
            .mime_str(&self.image.media_type)
            .map_err(|e| AppError::Internal(format!("Failed to create multipart: {}", e)))?;

        Ok(Form::new()
            .part("image", image)
            .text("title", self.title)
            .text("description", self.description)
            .text("review", self.review)
            .text("moods", self.moods))
    }
}

/// Checks a [`MovieDraft`] before anything is sent
///
/// Checks run in a fixed order and the first failure wins.
#[derive(Debug, Clone, Copy)]
pub struct MovieIntakeValidator {
    max_image_bytes: u64,
}

impl Default for MovieIntakeValidator {
    fn default() -> Self {
        Self {
            max_image_bytes: MAX_IMAGE_BYTES,
        }
    }
}

impl MovieIntakeValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Checks only the image; useful right after a file is picked
    pub fn check_image(&self, image: &ImageAttachment) -> Result<(), ValidationError> {
        if image.size() > self.max_image_bytes {
            return Err(ValidationError::ImageTooLarge { size: image.size() });
        }
        if !image.is_image() {
            return Err(ValidationError::InvalidImageType {
                media_type: image.media_type.clone(),
            });
        }
        Ok(())
    }

    pub fn validate(&self, draft: &MovieDraft) -> Result<(), ValidationError> {
        let image = draft.image.as_ref().ok_or(ValidationError::MissingImage)?;
        self.check_image(image)?;

        for (name, value) in [
            ("title", &draft.title),
            ("description", &draft.description),
            ("review", &draft.review),
        ] {
            if value.trim().is_empty() {
                return Err(ValidationError::MissingField(name));
            }
        }

        if draft.moods.is_empty() {
            return Err(ValidationError::NoMoods);
        }
        if draft.moods.len() > MAX_MOODS {
            return Err(ValidationError::TooManyMoods);
        }

        Ok(())
    }

    /// Validates and turns the draft into an upload payload
    pub fn build(&self, draft: MovieDraft) -> Result<MovieUpload, ValidationError> {
        self.validate(&draft)?;
        let moods = draft.moods.joined();
        let image = draft.image.ok_or(ValidationError::MissingImage)?;

        Ok(MovieUpload {
            image,
            title: draft.title,
            description: draft.description,
            review: draft.review,
            moods,
        })
    }
}

/// Validates a draft and posts it to the backend
///
/// Validation failures never reach the network.
pub async fn submit_new_movie(
    backend: Arc<dyn MovieBackend>,
    draft: MovieDraft,
) -> AppResult<MovieRecord> {
    let upload = MovieIntakeValidator::new().build(draft).map_err(|e| {
        tracing::info!(reason = %e, "Movie submission rejected");
        e
    })?;

    tracing::info!(
        title = %upload.title,
        moods = %upload.moods,
        image_bytes = upload.image.size(),
        backend = backend.name(),
        "Submitting new movie"
    );

    let movie = backend.create_movie(upload).await.map_err(|e| {
        tracing::warn!(error = %e, "Movie submission failed");
        e
    })?;

    tracing::info!(movie_id = %movie.id, title = %movie.title, "Movie created");

    Ok(movie)
}
