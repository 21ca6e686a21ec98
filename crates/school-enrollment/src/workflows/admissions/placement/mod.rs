//! Class placement: first-fit assignment of admitted students into classes.
//!
//! The planner is a pure function over a snapshot. Callers derive occupancy
//! from the stored applications, run [`plan_placements`], and persist the
//! returned instructions as a single batch. The manual override path goes
//! through [`check_manual_assignment`], which shares the same occupancy rules
//! so both paths agree on when a class is full.

mod engine;
mod occupancy;

pub use engine::{check_manual_assignment, plan_placements, verify_batch, PlacementPlan};
pub use occupancy::OccupancyLedger;

use serde::{Deserialize, Serialize};

use super::domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ClassId, EnrollmentRoute, SchoolClass,
    StatusTransitionError,
};

/// Placement-relevant view of an application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementCandidate {
    pub application_id: ApplicationId,
    pub is_priority: bool,
    pub route: EnrollmentRoute,
    pub status: ApplicationStatus,
    pub class_id: Option<ClassId>,
}

impl PlacementCandidate {
    /// Admitted and not yet holding a seat.
    pub fn is_eligible(&self) -> bool {
        self.status == ApplicationStatus::Approved && self.class_id.is_none()
    }

    fn sort_key(&self) -> (bool, u8) {
        (!self.is_priority, self.route.placement_rank())
    }
}

impl From<&ApplicationRecord> for PlacementCandidate {
    fn from(record: &ApplicationRecord) -> Self {
        Self {
            application_id: record.id.clone(),
            is_priority: record.is_priority,
            route: record.enrollment_route,
            status: record.status,
            class_id: record.class_id.clone(),
        }
    }
}

/// Capacity view of a class.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassCapacity {
    pub class_id: ClassId,
    pub max_size: u32,
}

impl From<&SchoolClass> for ClassCapacity {
    fn from(class: &SchoolClass) -> Self {
        Self {
            class_id: class.id.clone(),
            max_size: class.max_size,
        }
    }
}

/// Persistable outcome of a placement decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementInstruction {
    pub application_id: ApplicationId,
    pub class_id: ClassId,
    pub status: ApplicationStatus,
}

impl PlacementInstruction {
    pub fn assign(application_id: ApplicationId, class_id: ClassId) -> Self {
        Self {
            application_id,
            class_id,
            status: ApplicationStatus::Assigned,
        }
    }

    /// Moves the record into the class. Any previous class id is overwritten.
    pub fn apply(&self, record: &mut ApplicationRecord) -> Result<(), StatusTransitionError> {
        record.status = record.status.transition(self.status)?;
        record.class_id = Some(self.class_id.clone());
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PlacementError {
    #[error("class {class_id} is full ({max_size} seats)")]
    ClassFull { class_id: ClassId, max_size: u32 },
    #[error("class {0} does not exist")]
    UnknownClass(ClassId),
    #[error("application {0} is not part of the placement snapshot")]
    UnknownApplication(ApplicationId),
    #[error("application {application_id} is {status:?}; only approved applications can be placed")]
    NotEligible {
        application_id: ApplicationId,
        status: ApplicationStatus,
    },
    #[error("application {application_id} already holds a seat in class {class_id}")]
    AlreadyPlaced {
        application_id: ApplicationId,
        class_id: ClassId,
    },
    #[error("application {0} appears more than once in the batch")]
    DuplicateApplication(ApplicationId),
}
