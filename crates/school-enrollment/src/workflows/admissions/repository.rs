use serde::Serialize;

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ClassId, EnrollmentRoute, SchoolClass,
};

/// Storage abstraction for applications so the service can be exercised in isolation.
pub trait ApplicationRepository: Send + Sync {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError>;
    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError>;
    /// Persists every record or none of them.
    fn update_batch(&self, records: Vec<ApplicationRecord>) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError>;
    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
}

/// Storage abstraction for classes.
pub trait ClassRepository: Send + Sync {
    fn insert(&self, class: SchoolClass) -> Result<SchoolClass, RepositoryError>;
    fn update(&self, class: SchoolClass) -> Result<(), RepositoryError>;
    fn remove(&self, id: &ClassId) -> Result<(), RepositoryError>;
    fn fetch(&self, id: &ClassId) -> Result<Option<SchoolClass>, RepositoryError>;
    fn list(&self) -> Result<Vec<SchoolClass>, RepositoryError>;
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record already exists")]
    Conflict,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}

/// Parent-facing view of an application's progress.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationStatusView {
    pub application_id: ApplicationId,
    pub student_name: String,
    pub status: ApplicationStatus,
    pub status_label: &'static str,
    pub timeline_step: usize,
    pub enrollment_route: EnrollmentRoute,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl ApplicationStatusView {
    pub fn new(record: &ApplicationRecord, classes: &[SchoolClass]) -> Self {
        let class_name = match (&record.class_id, record.status) {
            (Some(class_id), ApplicationStatus::Assigned) => classes
                .iter()
                .find(|class| &class.id == class_id)
                .map(|class| class.name.clone()),
            _ => None,
        };
        let rejection_reason = match record.status {
            ApplicationStatus::Rejected => record.rejection_reason.clone(),
            _ => None,
        };

        Self {
            application_id: record.id.clone(),
            student_name: record.student.full_name.clone(),
            status: record.status,
            status_label: record.status.label(),
            timeline_step: record.status.timeline_step(),
            enrollment_route: record.enrollment_route,
            class_name,
            rejection_reason,
        }
    }
}

/// Class listing with derived occupancy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassOccupancyView {
    pub id: ClassId,
    pub name: String,
    pub max_size: u32,
    pub occupancy: u32,
    pub is_full: bool,
}
