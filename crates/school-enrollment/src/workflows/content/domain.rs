use serde::{Deserialize, Serialize};

use crate::workflows::uploads::StoredDocument;

pub const DEFAULT_ANNOUNCEMENT_TITLE: &str = "Enrollment Announcement";

/// One label/value line of the public announcement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnouncementDetail {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    pub title: String,
    #[serde(default)]
    pub details: Vec<AnnouncementDetail>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment: Option<StoredDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admitted_list: Option<StoredDocument>,
}

impl Default for Announcement {
    fn default() -> Self {
        Self {
            title: DEFAULT_ANNOUNCEMENT_TITLE.to_string(),
            details: Vec::new(),
            attachment: None,
            admitted_list: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Guideline {
    #[serde(default)]
    pub id: String,
    pub text: String,
}

/// Announcement plus the ordered enrollment guidelines.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContent {
    pub announcement: Announcement,
    #[serde(default)]
    pub guidelines: Vec<Guideline>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteSettings {
    pub school_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_url: Option<String>,
}

impl SiteSettings {
    pub fn with_school_name(school_name: impl Into<String>) -> Self {
        Self {
            school_name: school_name.into(),
            logo_url: None,
            banner_url: None,
        }
    }
}

/// Edit applied to an optional file slot.
///
/// Serialized as `{"action": "keep"}`, `{"action": "remove"}` or
/// `{"action": "replace", "value": ...}`; an absent field keeps the slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "value", rename_all = "lowercase")]
pub enum SlotUpdate<T> {
    Keep,
    Replace(T),
    Remove,
}

impl<T> Default for SlotUpdate<T> {
    fn default() -> Self {
        SlotUpdate::Keep
    }
}

impl<T> SlotUpdate<T> {
    pub fn apply(self, slot: &mut Option<T>) {
        match self {
            SlotUpdate::Keep => {}
            SlotUpdate::Replace(value) => *slot = Some(value),
            SlotUpdate::Remove => *slot = None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteContentUpdate {
    pub title: String,
    #[serde(default)]
    pub details: Vec<AnnouncementDetail>,
    #[serde(default)]
    pub guidelines: Vec<Guideline>,
    #[serde(default)]
    pub attachment: SlotUpdate<StoredDocument>,
    #[serde(default)]
    pub admitted_list: SlotUpdate<StoredDocument>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsUpdate {
    #[serde(default)]
    pub school_name: Option<String>,
    #[serde(default)]
    pub logo_url: SlotUpdate<String>,
    #[serde(default)]
    pub banner_url: SlotUpdate<String>,
}
