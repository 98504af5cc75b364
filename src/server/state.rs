//! Server state and configuration.

use crate::remote::{MemoryAssetStore, MemoryRepository};
use crate::resolve::{new_cache, ImageCache};
use crate::template::{PageLayout, A4_LANDSCAPE};

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to listen on (e.g., "0.0.0.0:8080")
    pub listen_addr: String,
    /// Default page layout for preview/export when the request names none.
    pub layout: PageLayout,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            layout: A4_LANDSCAPE,
        }
    }
}

/// Application state shared across handlers.
pub struct AppState {
    pub config: ServerConfig,
    pub repository: MemoryRepository,
    pub assets: MemoryAssetStore,
    /// Decoded image sources shared with render surfaces.
    pub images: ImageCache,
}

impl AppState {
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            repository: MemoryRepository::new(),
            assets: MemoryAssetStore::new(),
            images: new_cache(),
        }
    }
}
