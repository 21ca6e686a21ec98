//! Public site content: the enrollment announcement, guidelines and school settings.

pub mod domain;
pub mod repository;
pub mod router;
pub mod service;

pub use domain::{
    Announcement, AnnouncementDetail, Guideline, SettingsUpdate, SiteContent, SiteContentUpdate,
    SiteSettings, SlotUpdate,
};
pub use repository::{ContentRepository, ContentStoreError};
pub use router::content_router;
pub use service::{ContentError, ContentService};
