//! Image resolution: fetches and decodes image element sources.
//!
//! `ImageResolver` handles all fetching concerns so the template stays a pure
//! data model with no HTTP or filesystem knowledge. Decoded images land in a
//! shared [`ImageCache`] keyed by source locator; the renderer only ever reads
//! the cache.
//!
//! Resolution failures are reported and skipped — a broken image source
//! renders as a placeholder box rather than failing the whole page.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use image::DynamicImage;
use tokio::sync::RwLock;

use crate::error::PergaminoError;
use crate::template::{Properties, Template};

/// Decoded images keyed by their `src` locator, shared between the resolver
/// and render surfaces.
pub type ImageCache = Arc<RwLock<HashMap<String, DynamicImage>>>;

pub fn new_cache() -> ImageCache {
    Arc::new(RwLock::new(HashMap::new()))
}

/// Resolves external image sources referenced by a template.
pub struct ImageResolver {
    http_client: reqwest::Client,
    cache: ImageCache,
}

impl ImageResolver {
    pub fn new(cache: ImageCache) -> Result<Self, PergaminoError> {
        let http_client = reqwest::Client::builder()
            .user_agent("pergamino/0.1")
            .build()
            .map_err(|e| PergaminoError::Image(format!("HTTP client error: {}", e)))?;
        Ok(Self { http_client, cache })
    }

    pub fn cache(&self) -> ImageCache {
        self.cache.clone()
    }

    /// Resolve every image element in a template, filling the cache.
    ///
    /// Individual failures are reported and skipped; the template renders
    /// with a placeholder where the image would have been.
    pub async fn resolve(&self, template: &Template) {
        for element in &template.elements {
            let Properties::Image(img) = &element.properties else {
                continue;
            };
            if img.src.is_empty() || self.cache.read().await.contains_key(&img.src) {
                continue;
            }
            match self.fetch(&img.src).await {
                Ok(decoded) => {
                    self.cache.write().await.insert(img.src.clone(), decoded);
                }
                Err(e) => {
                    println!("[resolve] Image {} unresolved: {}", img.src, e);
                }
            }
        }
    }

    /// Fetch and decode one source: http(s) URLs over the wire, anything
    /// else as a local path.
    async fn fetch(&self, src: &str) -> Result<DynamicImage, PergaminoError> {
        let bytes = if src.starts_with("http://") || src.starts_with("https://") {
            let response = self
                .http_client
                .get(src)
                .send()
                .await
                .map_err(|e| PergaminoError::Image(format!("Failed to download {}: {}", src, e)))?;
            if !response.status().is_success() {
                return Err(PergaminoError::Image(format!(
                    "Failed to download {}: HTTP {}",
                    src,
                    response.status()
                )));
            }
            response
                .bytes()
                .await
                .map_err(|e| PergaminoError::Image(format!("Failed to read image data: {}", e)))?
                .to_vec()
        } else {
            tokio::fs::read(Path::new(src)).await?
        };

        image::load_from_memory(&bytes)
            .map_err(|e| PergaminoError::Image(format!("Failed to decode {}: {}", src, e)))
    }
}
