use crate::config::Config;

/// Rewrites backend image references into loadable URLs
///
/// The backend stores images as `/uploaded_images/<file>` but serves them from
/// a separate static base, so the stored prefix is stripped before joining.
#[derive(Debug, Clone)]
pub struct ImageResolver {
    static_base_url: String,
    path_prefix: String,
}

impl ImageResolver {
    pub fn new(static_base_url: impl Into<String>, path_prefix: impl Into<String>) -> Self {
        Self {
            static_base_url: static_base_url.into().trim_end_matches('/').to_string(),
            path_prefix: path_prefix.into(),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(&config.static_base_url, &config.image_path_prefix)
    }

    pub fn resolve(&self, image_ref: &str) -> String {
        let file = image_ref.replacen(&self.path_prefix, "", 1);
        format!("{}/{}", self.static_base_url, file.trim_start_matches('/'))
    }
}

impl Default for ImageResolver {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
