/// Turns a stored image reference into a url a client can fetch.
pub trait ImageResolver: Send + Sync {
    fn resolve(&self, image: &str) -> Option<String>;

    fn resolve_opt(&self, image: Option<&str>) -> Option<String> {
        image.and_then(|image| self.resolve(image))
    }
}

/// Images served from a fixed base url, e.g. `https://cdn.example/media`.
#[derive(Debug, Clone)]
pub struct MediaUrl {
    base: String,
}

impl MediaUrl {
    pub fn new(base: &str) -> Self {
        Self {
            base: base.trim_end_matches('/').to_owned(),
        }
    }
}

impl ImageResolver for MediaUrl {
    fn resolve(&self, image: &str) -> Option<String> {
        let image = image.trim_start_matches('/');
        if image.is_empty() {
            return None;
        }

        Some(format!("{}/{}", self.base, image))
    }
}
