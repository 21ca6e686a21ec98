use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, ClassId,
    SchoolClass, StatusTransitionError,
};
use super::intake::{IntakeGuard, IntakeViolation};
use super::placement::{
    check_manual_assignment, plan_placements, verify_batch, ClassCapacity, OccupancyLedger,
    PlacementCandidate, PlacementError, PlacementInstruction,
};
use super::reports::{render_report, EnrollmentSnapshot, ReportError, ReportKind};
use super::repository::{
    ApplicationRepository, ApplicationStatusView, ClassOccupancyView, ClassRepository,
    RepositoryError,
};
use crate::config::AdmissionsConfig;

/// Service composing intake, review, class management, and placement.
///
/// Automatic placement, manual overrides, bulk updates and class edits all
/// hold `placement_lock` from the occupancy read until the write completes.
pub struct AdmissionsService<R, C> {
    guard: IntakeGuard,
    applications: Arc<R>,
    classes: Arc<C>,
    default_class_size: u32,
    intake_lock: Mutex<()>,
    placement_lock: Mutex<()>,
}

static CLASS_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_class_id() -> ClassId {
    let sequence = CLASS_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    ClassId(format!(
        "CLASS_{}_{sequence}",
        Utc::now().timestamp_millis()
    ))
}

/// One requested seat in a caller-supplied batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementRequest {
    pub id: ApplicationId,
    pub class_id: ClassId,
}

/// Outcome of an automatic placement run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementReport {
    pub placed: Vec<ApplicationRecord>,
    pub unplaced: Vec<ApplicationId>,
    pub skipped: Vec<ApplicationId>,
}

/// Class creation or edit payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassDraft {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub max_size: Option<u32>,
}

impl<R, C> AdmissionsService<R, C>
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    pub fn new(applications: Arc<R>, classes: Arc<C>, config: &AdmissionsConfig) -> Self {
        Self {
            guard: IntakeGuard::new(config.application_id_prefix.clone()),
            applications,
            classes,
            default_class_size: config.default_class_size,
            intake_lock: Mutex::new(()),
            placement_lock: Mutex::new(()),
        }
    }

    /// Validate and store a new application in the submitted state.
    pub fn submit(
        &self,
        submission: ApplicationSubmission,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        let now = Utc::now();
        let submission = self.guard.validate(submission, now.date_naive())?;

        let _intake = acquire(&self.intake_lock)?;
        let id = self.guard.application_id(self.applications.count()?);
        let record = ApplicationRecord::from_submission(id, submission, now);
        let stored = self.applications.insert(record)?;

        info!(
            application_id = %stored.id,
            route = ?stored.enrollment_route,
            priority = stored.is_priority,
            "application submitted"
        );
        Ok(stored)
    }

    pub fn get(&self, id: &ApplicationId) -> Result<ApplicationRecord, AdmissionsServiceError> {
        let record = self.applications.fetch(id)?.ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    /// Parent lookup; ids are matched case-insensitively.
    pub fn lookup(&self, raw_id: &str) -> Result<ApplicationRecord, AdmissionsServiceError> {
        let raw_id = raw_id.trim();
        if let Some(record) = self.applications.fetch(&ApplicationId(raw_id.to_string()))? {
            return Ok(record);
        }

        let record = self
            .applications
            .list()?
            .into_iter()
            .find(|record| record.id.as_str().eq_ignore_ascii_case(raw_id))
            .ok_or(RepositoryError::NotFound)?;
        Ok(record)
    }

    pub fn status_view(&self, raw_id: &str) -> Result<ApplicationStatusView, AdmissionsServiceError> {
        let record = self.lookup(raw_id)?;
        let classes = self.classes.list()?;
        Ok(ApplicationStatusView::new(&record, &classes))
    }

    /// Applications, newest first.
    pub fn list(&self) -> Result<Vec<ApplicationRecord>, AdmissionsServiceError> {
        let mut records = self.applications.list()?;
        records.sort_by(|a, b| {
            b.submitted_at
                .cmp(&a.submitted_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(records)
    }

    pub fn begin_review(
        &self,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        self.transition(id, ApplicationStatus::Reviewing, None)
    }

    pub fn approve(&self, id: &ApplicationId) -> Result<ApplicationRecord, AdmissionsServiceError> {
        self.transition(id, ApplicationStatus::Approved, None)
    }

    pub fn reject(
        &self,
        id: &ApplicationId,
        reason: &str,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(AdmissionsServiceError::MissingRejectionReason);
        }
        self.transition(id, ApplicationStatus::Rejected, Some(reason.to_string()))
    }

    pub fn confirm_payment(
        &self,
        id: &ApplicationId,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        self.transition(id, ApplicationStatus::PaidFee, None)
    }

    fn transition(
        &self,
        id: &ApplicationId,
        next: ApplicationStatus,
        rejection_reason: Option<String>,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        let mut record = self.get(id)?;
        let previous = record.status;
        record.status = previous.transition(next)?;
        if rejection_reason.is_some() {
            record.rejection_reason = rejection_reason;
        }
        self.applications.update(record.clone())?;

        info!(application_id = %record.id, from = ?previous, to = ?next, "application status changed");
        Ok(record)
    }

    /// Classes ordered by name, which is also the first-fit order.
    pub fn classes(&self) -> Result<Vec<SchoolClass>, AdmissionsServiceError> {
        let mut classes = self.classes.list()?;
        classes.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        Ok(classes)
    }

    pub fn class_occupancy(&self) -> Result<Vec<ClassOccupancyView>, AdmissionsServiceError> {
        let records = self.applications.list()?;
        let ledger = OccupancyLedger::derive(&records);
        let views = self
            .classes()?
            .into_iter()
            .map(|class| {
                let occupancy = ledger.seats_taken(&class.id);
                ClassOccupancyView {
                    is_full: occupancy >= class.max_size,
                    occupancy,
                    max_size: class.max_size,
                    name: class.name,
                    id: class.id,
                }
            })
            .collect();
        Ok(views)
    }

    pub fn create_class(&self, draft: ClassDraft) -> Result<SchoolClass, AdmissionsServiceError> {
        let name = draft
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(AdmissionsServiceError::MissingClassName)?;

        let class = SchoolClass {
            id: next_class_id(),
            name: name.to_string(),
            max_size: draft.max_size.unwrap_or(self.default_class_size),
        };
        let stored = self.classes.insert(class)?;
        info!(class_id = %stored.id, name = %stored.name, max_size = stored.max_size, "class created");
        Ok(stored)
    }

    /// Rename or resize a class. Capacity cannot drop below the seats already taken.
    pub fn update_class(
        &self,
        id: &ClassId,
        draft: ClassDraft,
    ) -> Result<SchoolClass, AdmissionsServiceError> {
        let _placement = acquire(&self.placement_lock)?;
        let mut class = self.classes.fetch(id)?.ok_or(RepositoryError::NotFound)?;

        if let Some(name) = draft.name {
            let name = name.trim();
            if name.is_empty() {
                return Err(AdmissionsServiceError::MissingClassName);
            }
            class.name = name.to_string();
        }

        if let Some(max_size) = draft.max_size {
            let records = self.applications.list()?;
            let occupancy = OccupancyLedger::derive(&records).seats_taken(id);
            if max_size < occupancy {
                return Err(AdmissionsServiceError::CapacityBelowOccupancy {
                    class_id: id.clone(),
                    occupancy,
                    requested: max_size,
                });
            }
            class.max_size = max_size;
        }

        self.classes.update(class.clone())?;
        info!(class_id = %class.id, name = %class.name, max_size = class.max_size, "class updated");
        Ok(class)
    }

    /// Removes a class nobody references. Any record still pointing at the
    /// class blocks deletion, seated or not.
    pub fn delete_class(&self, id: &ClassId) -> Result<(), AdmissionsServiceError> {
        let _placement = acquire(&self.placement_lock)?;
        if self.classes.fetch(id)?.is_none() {
            return Err(RepositoryError::NotFound.into());
        }

        let occupancy = self
            .applications
            .list()?
            .iter()
            .filter(|record| record.class_id.as_ref() == Some(id))
            .count();
        if occupancy > 0 {
            return Err(AdmissionsServiceError::ClassOccupied {
                class_id: id.clone(),
                occupancy,
            });
        }

        self.classes.remove(id)?;
        info!(class_id = %id, "class deleted");
        Ok(())
    }

    /// Run first-fit placement over every admitted, unplaced application and
    /// persist the result as one batch.
    pub fn auto_assign(&self) -> Result<PlacementReport, AdmissionsServiceError> {
        let _placement = acquire(&self.placement_lock)?;

        let mut records = self.applications.list()?;
        // Oldest submissions first so ties resolve by submission order.
        records.sort_by(|a, b| {
            a.submitted_at
                .cmp(&b.submitted_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        let classes = self.classes()?;
        let capacities: Vec<ClassCapacity> = classes.iter().map(ClassCapacity::from).collect();
        let ledger = OccupancyLedger::derive(&records);

        let candidates: Vec<PlacementCandidate> = records
            .iter()
            .filter(|record| record.status == ApplicationStatus::Approved)
            .map(PlacementCandidate::from)
            .collect();

        let plan = plan_placements(&candidates, &capacities, &ledger);
        verify_batch(&plan.instructions, &candidates, &capacities, &ledger)
            .map_err(AdmissionsServiceError::InconsistentPlan)?;
        let placed = self.persist(&records, &plan.instructions)?;

        if !plan.skipped.is_empty() {
            warn!(
                skipped = ?plan.skipped,
                "approved applications already holding a class were left untouched"
            );
        }
        info!(
            placed = placed.len(),
            unplaced = plan.unplaced.len(),
            "automatic placement finished"
        );

        Ok(PlacementReport {
            placed,
            unplaced: plan.unplaced,
            skipped: plan.skipped,
        })
    }

    /// Seat one admitted applicant in a specific class.
    pub fn assign_manually(
        &self,
        id: &ApplicationId,
        class_id: &ClassId,
    ) -> Result<ApplicationRecord, AdmissionsServiceError> {
        let _placement = acquire(&self.placement_lock)?;

        let records = self.applications.list()?;
        let record = records
            .iter()
            .find(|record| &record.id == id)
            .ok_or(RepositoryError::NotFound)?;
        let capacities: Vec<ClassCapacity> =
            self.classes()?.iter().map(ClassCapacity::from).collect();
        let ledger = OccupancyLedger::derive(&records);

        let instruction = check_manual_assignment(
            &PlacementCandidate::from(record),
            class_id,
            &capacities,
            &ledger,
        )?;

        let mut updated = record.clone();
        instruction.apply(&mut updated)?;
        self.applications.update(updated.clone())?;

        info!(application_id = %updated.id, class_id = %class_id, "application assigned manually");
        Ok(updated)
    }

    /// Apply a caller-supplied batch of placements after validating all of it.
    pub fn apply_batch(
        &self,
        requests: Vec<PlacementRequest>,
    ) -> Result<Vec<ApplicationRecord>, AdmissionsServiceError> {
        let _placement = acquire(&self.placement_lock)?;

        let records = self.applications.list()?;
        let capacities: Vec<ClassCapacity> =
            self.classes()?.iter().map(ClassCapacity::from).collect();
        let ledger = OccupancyLedger::derive(&records);
        let candidates: Vec<PlacementCandidate> =
            records.iter().map(PlacementCandidate::from).collect();

        let instructions: Vec<PlacementInstruction> = requests
            .into_iter()
            .map(|request| PlacementInstruction::assign(request.id, request.class_id))
            .collect();
        verify_batch(&instructions, &candidates, &capacities, &ledger)?;

        let placed = self.persist(&records, &instructions)?;
        info!(placed = placed.len(), "bulk placement applied");
        Ok(placed)
    }

    fn persist(
        &self,
        records: &[ApplicationRecord],
        instructions: &[PlacementInstruction],
    ) -> Result<Vec<ApplicationRecord>, AdmissionsServiceError> {
        let by_id: HashMap<&ApplicationId, &ApplicationRecord> =
            records.iter().map(|record| (&record.id, record)).collect();

        let mut updated = Vec::with_capacity(instructions.len());
        for instruction in instructions {
            let mut record = by_id
                .get(&instruction.application_id)
                .map(|record| (*record).clone())
                .ok_or_else(|| PlacementError::UnknownApplication(instruction.application_id.clone()))?;
            instruction.apply(&mut record)?;
            updated.push(record);
        }

        if !updated.is_empty() {
            self.applications.update_batch(updated.clone())?;
        }
        Ok(updated)
    }

    /// Applications (newest first) and classes (by name).
    pub fn snapshot(&self) -> Result<EnrollmentSnapshot, AdmissionsServiceError> {
        Ok(EnrollmentSnapshot {
            applications: self.list()?,
            classes: self.classes()?,
        })
    }

    pub fn report(&self, kind: &ReportKind) -> Result<String, AdmissionsServiceError> {
        let mut snapshot = self.snapshot()?;
        snapshot.applications.reverse();
        if let ReportKind::Class(class_id) = kind {
            if !snapshot.classes.iter().any(|class| &class.id == class_id) {
                return Err(RepositoryError::NotFound.into());
            }
        }
        Ok(render_report(kind, &snapshot)?)
    }
}

fn acquire(lock: &Mutex<()>) -> Result<MutexGuard<'_, ()>, RepositoryError> {
    lock.lock()
        .map_err(|_| RepositoryError::Unavailable("admissions lock poisoned".to_string()))
}

/// Error raised by the admissions service.
#[derive(Debug, thiserror::Error)]
pub enum AdmissionsServiceError {
    #[error(transparent)]
    Intake(#[from] IntakeViolation),
    #[error(transparent)]
    Transition(#[from] StatusTransitionError),
    #[error(transparent)]
    Placement(#[from] PlacementError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    #[error(transparent)]
    Report(#[from] ReportError),
    #[error("automatic placement produced an invalid plan: {0}")]
    InconsistentPlan(PlacementError),
    #[error("class name is required")]
    MissingClassName,
    #[error("a rejection reason is required")]
    MissingRejectionReason,
    #[error("class {class_id} still has {occupancy} students")]
    ClassOccupied { class_id: ClassId, occupancy: usize },
    #[error("class {class_id} seats {occupancy} students; capacity cannot drop to {requested}")]
    CapacityBelowOccupancy {
        class_id: ClassId,
        occupancy: u32,
        requested: u32,
    },
}
