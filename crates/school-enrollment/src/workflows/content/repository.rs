use super::domain::{SiteContent, SiteSettings};

/// Storage for the singleton site content and settings documents.
pub trait ContentRepository: Send + Sync {
    fn load_content(&self) -> Result<Option<SiteContent>, ContentStoreError>;
    fn save_content(&self, content: SiteContent) -> Result<(), ContentStoreError>;
    fn load_settings(&self) -> Result<Option<SiteSettings>, ContentStoreError>;
    fn save_settings(&self, settings: SiteSettings) -> Result<(), ContentStoreError>;
}

#[derive(Debug, thiserror::Error)]
#[error("content store unavailable: {0}")]
pub struct ContentStoreError(pub String);
