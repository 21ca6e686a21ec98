use std::sync::Arc;

use tracing::info;

use super::domain::{
    Guideline, SettingsUpdate, SiteContent, SiteContentUpdate, SiteSettings,
};
use super::repository::{ContentRepository, ContentStoreError};

/// Reads and edits the public announcement, guidelines and school settings.
pub struct ContentService<R> {
    repository: Arc<R>,
    default_school_name: String,
}

impl<R> ContentService<R>
where
    R: ContentRepository + 'static,
{
    pub fn new(repository: Arc<R>, default_school_name: impl Into<String>) -> Self {
        Self {
            repository,
            default_school_name: default_school_name.into(),
        }
    }

    pub fn site_content(&self) -> Result<SiteContent, ContentError> {
        Ok(self.repository.load_content()?.unwrap_or_default())
    }

    pub fn settings(&self) -> Result<SiteSettings, ContentError> {
        Ok(self
            .repository
            .load_settings()?
            .unwrap_or_else(|| SiteSettings::with_school_name(&self.default_school_name)))
    }

    /// Replaces the announcement text and guidelines; document slots follow
    /// their [`SlotUpdate`](super::domain::SlotUpdate).
    pub fn update_content(&self, update: SiteContentUpdate) -> Result<SiteContent, ContentError> {
        let title = update.title.trim();
        if title.is_empty() {
            return Err(ContentError::MissingTitle);
        }

        let mut content = self.site_content()?;
        content.announcement.title = title.to_string();
        content.announcement.details = update
            .details
            .into_iter()
            .filter(|detail| !detail.label.trim().is_empty() || !detail.value.trim().is_empty())
            .collect();
        update.attachment.apply(&mut content.announcement.attachment);
        update
            .admitted_list
            .apply(&mut content.announcement.admitted_list);
        content.guidelines = number_guidelines(update.guidelines);

        self.repository.save_content(content.clone())?;
        info!(
            details = content.announcement.details.len(),
            guidelines = content.guidelines.len(),
            "site content updated"
        );
        Ok(content)
    }

    /// A blank school name keeps the current one.
    pub fn update_settings(&self, update: SettingsUpdate) -> Result<SiteSettings, ContentError> {
        let mut settings = self.settings()?;
        if let Some(name) = update.school_name.as_deref().map(str::trim) {
            if !name.is_empty() {
                settings.school_name = name.to_string();
            }
        }
        update.logo_url.apply(&mut settings.logo_url);
        update.banner_url.apply(&mut settings.banner_url);

        self.repository.save_settings(settings.clone())?;
        info!(school_name = %settings.school_name, "site settings updated");
        Ok(settings)
    }
}

/// Drops blank guidelines and fills in missing ids by position.
fn number_guidelines(guidelines: Vec<Guideline>) -> Vec<Guideline> {
    guidelines
        .into_iter()
        .filter(|guideline| !guideline.text.trim().is_empty())
        .enumerate()
        .map(|(index, guideline)| {
            let id = match guideline.id.trim() {
                "" => format!("guideline-{}", index + 1),
                id => id.to_string(),
            };
            Guideline {
                id,
                text: guideline.text.trim().to_string(),
            }
        })
        .collect()
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("announcement title is required")]
    MissingTitle,
    #[error(transparent)]
    Store(#[from] ContentStoreError),
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::workflows::content::domain::{AnnouncementDetail, SlotUpdate};
    use crate::workflows::uploads::StoredDocument;

    #[derive(Default)]
    struct MemoryContent {
        content: Mutex<Option<SiteContent>>,
        settings: Mutex<Option<SiteSettings>>,
    }

    impl ContentRepository for MemoryContent {
        fn load_content(&self) -> Result<Option<SiteContent>, ContentStoreError> {
            Ok(self.content.lock().expect("content mutex poisoned").clone())
        }

        fn save_content(&self, content: SiteContent) -> Result<(), ContentStoreError> {
            *self.content.lock().expect("content mutex poisoned") = Some(content);
            Ok(())
        }

        fn load_settings(&self) -> Result<Option<SiteSettings>, ContentStoreError> {
            Ok(self.settings.lock().expect("settings mutex poisoned").clone())
        }

        fn save_settings(&self, settings: SiteSettings) -> Result<(), ContentStoreError> {
            *self.settings.lock().expect("settings mutex poisoned") = Some(settings);
            Ok(())
        }
    }

    fn service() -> ContentService<MemoryContent> {
        ContentService::new(Arc::new(MemoryContent::default()), "TRUONG TIEU HOC NGUYEN HUE")
    }

    fn document(url: &str) -> StoredDocument {
        StoredDocument {
            url: url.to_string(),
            name: Some("thong-bao.pdf".to_string()),
        }
    }

    #[test]
    fn defaults_are_served_before_first_edit() {
        let service = service();
        let content = service.site_content().expect("content loads");
        assert_eq!(content.announcement.title, "Enrollment Announcement");
        assert!(content.guidelines.is_empty());
        assert_eq!(
            service.settings().expect("settings load").school_name,
            "TRUONG TIEU HOC NGUYEN HUE"
        );
    }

    #[test]
    fn document_slots_keep_replace_or_remove() {
        let service = service();
        service
            .update_content(SiteContentUpdate {
                title: "Tuyển sinh lớp 1".to_string(),
                attachment: SlotUpdate::Replace(document("/uploads/a.pdf")),
                admitted_list: SlotUpdate::Replace(document("/uploads/list.pdf")),
                ..SiteContentUpdate::default()
            })
            .expect("first update");

        let updated = service
            .update_content(SiteContentUpdate {
                title: "Tuyển sinh lớp 1".to_string(),
                details: vec![AnnouncementDetail {
                    label: "Deadline".to_string(),
                    value: "30/06".to_string(),
                }],
                guidelines: vec![
                    Guideline {
                        id: String::new(),
                        text: "Bring the birth certificate".to_string(),
                    },
                    Guideline {
                        id: "keep-me".to_string(),
                        text: " ".to_string(),
                    },
                ],
                attachment: SlotUpdate::Keep,
                admitted_list: SlotUpdate::Remove,
            })
            .expect("second update");

        assert_eq!(
            updated.announcement.attachment,
            Some(document("/uploads/a.pdf"))
        );
        assert_eq!(updated.announcement.admitted_list, None);
        assert_eq!(updated.announcement.details.len(), 1);
        assert_eq!(updated.guidelines.len(), 1);
        assert_eq!(updated.guidelines[0].id, "guideline-1");
    }

    #[test]
    fn blank_title_is_rejected() {
        assert!(matches!(
            service().update_content(SiteContentUpdate::default()),
            Err(ContentError::MissingTitle)
        ));
    }

    #[test]
    fn blank_school_name_keeps_current() {
        let service = service();
        service
            .update_settings(SettingsUpdate {
                school_name: Some("Nguyễn Huệ Primary".to_string()),
                logo_url: SlotUpdate::Replace("/uploads/logo.png".to_string()),
                banner_url: SlotUpdate::Keep,
            })
            .expect("first update");

        let settings = service
            .update_settings(SettingsUpdate {
                school_name: Some("   ".to_string()),
                logo_url: SlotUpdate::Keep,
                banner_url: SlotUpdate::Replace("/uploads/banner.jpg".to_string()),
            })
            .expect("second update");

        assert_eq!(settings.school_name, "Nguyễn Huệ Primary");
        assert_eq!(settings.logo_url.as_deref(), Some("/uploads/logo.png"));
        assert_eq!(settings.banner_url.as_deref(), Some("/uploads/banner.jpg"));
    }
}
