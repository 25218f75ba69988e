//! Featured image generation. Never fails: any problem degrades to "no image".

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::application::ports::{GenerativeModel, ModelError};
use crate::application::upstream::observe;
use crate::domain::posts::FeaturedImage;

#[derive(Clone)]
pub struct ImageService {
    model: Arc<dyn GenerativeModel>,
    timeout: Duration,
}

impl ImageService {
    pub fn new(model: Arc<dyn GenerativeModel>, timeout: Duration) -> Self {
        Self { model, timeout }
    }

    pub async fn generate(&self, title: &str) -> Option<FeaturedImage> {
        let started_at = Instant::now();
        let prompt = image_prompt(title);
        let result = match tokio::time::timeout(self.timeout, self.model.image(&prompt)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout),
        };
        observe("image", started_at, &result);

        match result {
            Ok(Some(image)) => Some(image),
            Ok(None) => {
                debug!(
                    target = "trendpress::application::imaging",
                    title,
                    "image model returned no image"
                );
                None
            }
            Err(err) => {
                warn!(
                    target = "trendpress::application::imaging",
                    title,
                    error = %err,
                    "featured image skipped"
                );
                None
            }
        }
    }
}

fn image_prompt(title: &str) -> String {
    format!(
        "A high-quality, modern, editorial featured image for a blog post titled \"{title}\". \
         Minimalist, professional photography or clean 3D render style. \
         No text or lettering in the image."
    )
}
