use metrics_exporter_prometheus::PrometheusHandle;
use school_enrollment::workflows::admissions::{
    AdmissionsService, ApplicationId, ApplicationRecord, ApplicationRepository, ClassId,
    ClassRepository, RepositoryError, SchoolClass,
};
use school_enrollment::workflows::auth::{OtpRecord, OtpRepository, OtpStoreError};
use school_enrollment::workflows::content::{
    ContentRepository, ContentService, ContentStoreError, SiteContent, SiteSettings,
};
use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex, MutexGuard};

pub(crate) type Admissions =
    AdmissionsService<InMemoryApplicationRepository, InMemoryClassRepository>;
pub(crate) type Content = ContentService<InMemoryContentRepository>;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) sms_enabled: bool,
}

fn lock<'a, T>(mutex: &'a Mutex<T>, what: &str) -> Result<MutexGuard<'a, T>, String> {
    mutex.lock().map_err(|_| format!("{what} mutex poisoned"))
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryApplicationRepository {
    records: Arc<Mutex<HashMap<ApplicationId, ApplicationRecord>>>,
}

impl InMemoryApplicationRepository {
    fn records(
        &self,
    ) -> Result<MutexGuard<'_, HashMap<ApplicationId, ApplicationRecord>>, RepositoryError> {
        lock(&self.records, "application").map_err(RepositoryError::Unavailable)
    }
}

impl ApplicationRepository for InMemoryApplicationRepository {
    fn insert(&self, record: ApplicationRecord) -> Result<ApplicationRecord, RepositoryError> {
        let mut guard = self.records()?;
        if guard.contains_key(&record.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(record.id.clone(), record.clone());
        Ok(record)
    }

    fn update(&self, record: ApplicationRecord) -> Result<(), RepositoryError> {
        let mut guard = self.records()?;
        if guard.contains_key(&record.id) {
            guard.insert(record.id.clone(), record);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn update_batch(&self, records: Vec<ApplicationRecord>) -> Result<(), RepositoryError> {
        let mut guard = self.records()?;
        if records.iter().any(|record| !guard.contains_key(&record.id)) {
            return Err(RepositoryError::NotFound);
        }
        for record in records {
            guard.insert(record.id.clone(), record);
        }
        Ok(())
    }

    fn fetch(&self, id: &ApplicationId) -> Result<Option<ApplicationRecord>, RepositoryError> {
        Ok(self.records()?.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<ApplicationRecord>, RepositoryError> {
        Ok(self.records()?.values().cloned().collect())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.records()?.len())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryClassRepository {
    classes: Arc<Mutex<HashMap<ClassId, SchoolClass>>>,
}

impl InMemoryClassRepository {
    fn classes(&self) -> Result<MutexGuard<'_, HashMap<ClassId, SchoolClass>>, RepositoryError> {
        lock(&self.classes, "class").map_err(RepositoryError::Unavailable)
    }
}

impl ClassRepository for InMemoryClassRepository {
    fn insert(&self, class: SchoolClass) -> Result<SchoolClass, RepositoryError> {
        let mut guard = self.classes()?;
        if guard.contains_key(&class.id) {
            return Err(RepositoryError::Conflict);
        }
        guard.insert(class.id.clone(), class.clone());
        Ok(class)
    }

    fn update(&self, class: SchoolClass) -> Result<(), RepositoryError> {
        let mut guard = self.classes()?;
        if guard.contains_key(&class.id) {
            guard.insert(class.id.clone(), class);
            Ok(())
        } else {
            Err(RepositoryError::NotFound)
        }
    }

    fn remove(&self, id: &ClassId) -> Result<(), RepositoryError> {
        self.classes()?
            .remove(id)
            .map(|_| ())
            .ok_or(RepositoryError::NotFound)
    }

    fn fetch(&self, id: &ClassId) -> Result<Option<SchoolClass>, RepositoryError> {
        Ok(self.classes()?.get(id).cloned())
    }

    fn list(&self) -> Result<Vec<SchoolClass>, RepositoryError> {
        Ok(self.classes()?.values().cloned().collect())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryContentRepository {
    content: Arc<Mutex<Option<SiteContent>>>,
    settings: Arc<Mutex<Option<SiteSettings>>>,
}

impl ContentRepository for InMemoryContentRepository {
    fn load_content(&self) -> Result<Option<SiteContent>, ContentStoreError> {
        Ok(lock(&self.content, "content").map_err(ContentStoreError)?.clone())
    }

    fn save_content(&self, content: SiteContent) -> Result<(), ContentStoreError> {
        *lock(&self.content, "content").map_err(ContentStoreError)? = Some(content);
        Ok(())
    }

    fn load_settings(&self) -> Result<Option<SiteSettings>, ContentStoreError> {
        Ok(lock(&self.settings, "settings").map_err(ContentStoreError)?.clone())
    }

    fn save_settings(&self, settings: SiteSettings) -> Result<(), ContentStoreError> {
        *lock(&self.settings, "settings").map_err(ContentStoreError)? = Some(settings);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub(crate) struct InMemoryOtpRepository {
    codes: Arc<Mutex<HashMap<String, OtpRecord>>>,
}

impl OtpRepository for InMemoryOtpRepository {
    fn upsert(&self, record: OtpRecord) -> Result<(), OtpStoreError> {
        lock(&self.codes, "otp")
            .map_err(OtpStoreError)?
            .insert(record.phone_number.clone(), record);
        Ok(())
    }

    fn fetch(&self, phone_number: &str) -> Result<Option<OtpRecord>, OtpStoreError> {
        Ok(lock(&self.codes, "otp")
            .map_err(OtpStoreError)?
            .get(phone_number)
            .cloned())
    }

    fn remove(&self, phone_number: &str) -> Result<(), OtpStoreError> {
        lock(&self.codes, "otp")
            .map_err(OtpStoreError)?
            .remove(phone_number);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, Utc};
    use school_enrollment::workflows::admissions::{
        ApplicationSubmission, EnrollmentRoute, EnrollmentType, Gender, ParentContact,
        StudentDetails, SupportingDocuments,
    };

    fn record(id: &str) -> ApplicationRecord {
        ApplicationRecord::from_submission(
            ApplicationId(id.to_string()),
            ApplicationSubmission {
                student: StudentDetails {
                    full_name: "Vũ Minh Châu".to_string(),
                    date_of_birth: NaiveDate::from_ymd_opt(2019, 1, 20).expect("valid date"),
                    gender: Gender::Female,
                    personal_id: String::new(),
                    ethnicity: String::new(),
                    place_of_birth: String::new(),
                    hometown: String::new(),
                },
                parent: ParentContact {
                    full_name: "Vũ Văn Tâm".to_string(),
                    phone: "0901234567".to_string(),
                    address: "8 Hai Bà Trưng".to_string(),
                },
                enrollment_type: EnrollmentType::Grade1,
                enrollment_route: EnrollmentRoute::InRoute,
                is_priority: false,
                documents: SupportingDocuments::default(),
            },
            Utc::now(),
        )
    }

    #[test]
    fn batch_update_is_all_or_nothing() {
        let repository = InMemoryApplicationRepository::default();
        let stored = repository.insert(record("NH25001")).expect("insert");

        let mut changed = stored.clone();
        changed.rejection_reason = Some("changed".to_string());
        let result = repository.update_batch(vec![changed, record("NH25002")]);

        assert!(matches!(result, Err(RepositoryError::NotFound)));
        let unchanged = repository
            .fetch(&stored.id)
            .expect("fetch")
            .expect("record present");
        assert_eq!(unchanged.rejection_reason, None);
    }

    #[test]
    fn duplicate_insert_conflicts() {
        let repository = InMemoryApplicationRepository::default();
        repository.insert(record("NH25001")).expect("first insert");
        assert!(matches!(
            repository.insert(record("NH25001")),
            Err(RepositoryError::Conflict)
        ));
    }
}
