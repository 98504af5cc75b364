//! Persistence and asset collaborators.
//!
//! The editor core never talks to storage directly; it goes through these
//! traits so the HTTP server, a database-backed deployment, and tests can
//! each supply their own backend. The in-memory implementations here back
//! the bundled server and the test suite.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::PergaminoError;
use crate::template::Template;

/// Stored template persistence.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    /// Save a template under its id, inserting or overwriting.
    async fn persist(&self, template: &Template) -> Result<(), PergaminoError>;

    /// Load a template by id.
    async fn fetch(&self, id: &str) -> Result<Template, PergaminoError>;

    /// All stored templates, newest first.
    async fn list(&self) -> Result<Vec<Template>, PergaminoError>;
}

/// An uploaded binary asset.
#[derive(Debug, Clone)]
pub struct Asset {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Uploaded image storage. `upload` returns the locator image elements put
/// in their `src` property.
#[async_trait]
pub trait AssetStore: Send + Sync {
    async fn upload(&self, content_type: &str, bytes: Vec<u8>) -> Result<String, PergaminoError>;

    async fn get(&self, id: &str) -> Result<Asset, PergaminoError>;
}

/// In-memory repository for the bundled server and tests.
#[derive(Default, Clone)]
pub struct MemoryRepository {
    templates: Arc<RwLock<HashMap<String, Template>>>,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TemplateRepository for MemoryRepository {
    async fn persist(&self, template: &Template) -> Result<(), PergaminoError> {
        self.templates
            .write()
            .await
            .insert(template.id.clone(), template.clone());
        Ok(())
    }

    async fn fetch(&self, id: &str) -> Result<Template, PergaminoError> {
        self.templates
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PergaminoError::NotFound(id.to_string()))
    }

    async fn list(&self) -> Result<Vec<Template>, PergaminoError> {
        let mut templates: Vec<Template> = self.templates.read().await.values().cloned().collect();
        templates.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(templates)
    }
}

/// In-memory asset store handing out `/api/assets/{id}` locators.
#[derive(Default, Clone)]
pub struct MemoryAssetStore {
    assets: Arc<RwLock<HashMap<String, Asset>>>,
}

impl MemoryAssetStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssetStore for MemoryAssetStore {
    async fn upload(&self, content_type: &str, bytes: Vec<u8>) -> Result<String, PergaminoError> {
        if bytes.is_empty() {
            return Err(PergaminoError::Upload("empty upload".to_string()));
        }
        let id = Uuid::new_v4().to_string();
        self.assets.write().await.insert(
            id.clone(),
            Asset {
                content_type: content_type.to_string(),
                bytes,
            },
        );
        Ok(format!("/api/assets/{}", id))
    }

    async fn get(&self, id: &str) -> Result<Asset, PergaminoError> {
        self.assets
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| PergaminoError::NotFound(id.to_string()))
    }
}
