use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::NaiveDate;
use serde_json::Value;

use crate::config::AdmissionsConfig;
use crate::workflows::admissions::domain::{
    ApplicationId, ApplicationRecord, ApplicationSubmission, ClassId, EnrollmentRoute,
    EnrollmentType, Gender, ParentContact, SchoolClass, StudentDetails, SupportingDocuments,
};
use crate::workflows::admissions::placement::{ClassCapacity, PlacementCandidate};
use crate::workflows::admissions::repository::{
    ApplicationRepository, ClassRepository, RepositoryError,
};
use crate::workflows::admissions::{admissions_router, AdmissionsService, ApplicationStatus};

pub(super) fn submission() -> ApplicationSubmission {
    ApplicationSubmission {
        student: StudentDetails {
            full_name: "Nguyễn Văn An".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2019, 3, 14).expect("valid date"),
            gender: Gender::Male,
            personal_id: "001219000123".to_string(),
            ethnicity: "Kinh".to_string(),
            place_of_birth: "Hà Nội".to_string(),
            hometown: "Nam Định".to_string(),
        },
        parent: ParentContact {
            full_name: "Nguyễn Văn Bình".to_string(),
            phone: "0912 345 678".to_string(),
            address: "12 Lê Lợi, Hoàn Kiếm".to_string(),
        },
        enrollment_type: EnrollmentType::Grade1,
        enrollment_route: EnrollmentRoute::InRoute,
        is_priority: false,
        documents: SupportingDocuments::default(),
    }
}

pub(super) fn submission_for(
    name: &str,
    route: EnrollmentRoute,
    is_priority: bool,
) -> ApplicationSubmission {
    let mut submission = submission();
    submission.student.full_name = name.to_string();
    submission.enrollment_route = route;
    submission.is_priority = is_priority;
    submission
}

pub(super) fn admissions_config() -> AdmissionsConfig {
    AdmissionsConfig::default()
}

pub(super) fn candidate(id: &str, is_priority: bool, route: EnrollmentRoute) -> PlacementCandidate {
    PlacementCandidate {
        application_id: ApplicationId(id.to_string()),
        is_priority,
        route,
        status: ApplicationStatus::Approved,
        class_id: None,
    }
}

pub(super) fn capacity(id: &str, max_size: u32) -> ClassCapacity {
    ClassCapacity {
        class_id: ClassId(id.to_string()),
        max_size,
    }
}

pub(super) fn ids(values: &[&str]) -> Vec<ApplicationId> {
    values
        .iter()
        .map(|value| ApplicationId(value.to_string()))
        .collect()
}

pub(super) type MemoryService = AdmissionsService<MemoryApplications, MemoryClasses>;

pub(super) fn build_service() -> (MemoryService, Arc<MemoryApplications>, Arc<MemoryClasses>) {
    let applications = Arc::new(MemoryApplications::default());
    let classes = Arc::new(MemoryClasses::default());
    let service = AdmissionsService::new(applications.clone(), classes.clone(), &admissions_config());
    (service, applications, classes)
}

/// Submits and walks an application through review to admission.
pub(super) fn admit(service: &MemoryService, submission: ApplicationSubmission) -> ApplicationRecord {
    let record = service.submit(submission).expect("submission succeeds");
    service.begin_review(&record.id).expect("review starts");
    service.approve(&record.id).expect("approval succeeds")
}

pub(super) fn class_with(service: &MemoryService, name: &str, max_size: u32) -> SchoolClass {
    service
        .create_class(crate::workflows::admissions::ClassDraft {
            name: Some(name.to_string()),
            max_size: Some(max_size),
        })
        .expect("class created")
}

#[derive(Default, Clone)]
pub(super) struct MemoryApplications {
    pub(super) records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl ApplicationRepository for MemoryApplications {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if !guard.contains_key(&record.id) {
            return Err(RepositoryError::NotFound);
        }
        guard.insert(record.id.clone(), record);
        Ok(())
    }

    fn update_batch(&self, records: Vec<ApplicationRecord>) -> Result<(), RepositoryError> {
        let mut guard = self.records.lock().expect("repository mutex poisoned");
        if records.iter().any(|record| !guard.contains_key(&record.id)) {
            return Err(RepositoryError::NotFound);
        }
        for record in records {
            guard.insert(record.id.clone(), record);
        }
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        let guard = self.records.lock().expect("repository mutex poisoned");
        Ok(guard.values().cloned().collect())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.records.lock().expect("repository mutex poisoned").len())
    }
}

#[derive(Default, Clone)]
pub(super) struct MemoryClasses {
    pub(super) classes: Arc<Mutex<HashMap<ClassId, SchoolClass>>>,
}

impl ClassRepository for MemoryClasses {
    fn insert(&self, class: SchoolClass) -> Result<SchoolClass, RepositoryError> {
        let mut guard = self.classes.lock().expect("class mutex poisoned");
        if guard.contains_key(&class.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(class.id.clone(), class.clone());
        Ok(class)
    }

    fn update(&self, class: SchoolClass) -> Result<(), RepositoryError> {
        let mut guard = self.classes.lock().expect("class mutex poisoned");
        guard.insert(class.id.clone(), class);
        Ok(())
    }

    fn remove(&self, id: &ClassId) -> Result<(), RepositoryError> {
        let mut guard = self.classes.lock().expect("class mutex poisoned");
        guard.remove(id).map(|_| ()).ok_or(RepositoryError::NotFound)
    }

    fn fetch(&self, id: &ClassId) -> Result<Option<SchoolClass>, RepositoryError> {
        let guard = self.classes.lock().expect("class mutex poisoned");
        Ok(guard.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<SchoolClass>, RepositoryError> {
        let guard = self.classes.lock().expect("class mutex poisoned");
        Ok(guard.values().cloned().collect())
    }
}

pub(super) struct UnavailableRepository;

impl ApplicationRepository for UnavailableRepository {
    fn insert(&self, _record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _record: ApplicationRecord) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update_batch(&self, _records: Vec<ApplicationRecord>) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}

pub(super) async fn read_text_body(response: Response) -> String {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    String::from_utf8(body.to_vec()).expect("utf-8 body")
}

pub(super) fn router_with_service(service: MemoryService) -> axum::Router {
    admissions_router(Arc::new(service))
}
