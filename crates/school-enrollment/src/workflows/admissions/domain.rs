use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::workflows::uploads::StoredDocument;

/// Identifier wrapper for submitted applications (e.g. `NH25001`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ApplicationId(pub String);

impl ApplicationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for school classes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassId(pub String);

impl ClassId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnrollmentType {
    #[serde(rename = "GRADE_1")]
    Grade1,
    #[serde(rename = "TRANSFER_IN")]
    TransferIn,
    #[serde(rename = "TRANSFER_OUT")]
    TransferOut,
}

impl EnrollmentType {
    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentType::Grade1 => "Grade 1",
            EnrollmentType::TransferIn => "Transfer in",
            EnrollmentType::TransferOut => "Transfer out",
        }
    }
}

/// Catchment-area status of the household.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EnrollmentRoute {
    InRoute,
    OutOfRoute,
}

impl EnrollmentRoute {
    pub const fn label(self) -> &'static str {
        match self {
            EnrollmentRoute::InRoute => "In route",
            EnrollmentRoute::OutOfRoute => "Out of route",
        }
    }

    /// In-catchment households are placed ahead of out-of-catchment ones.
    pub(crate) const fn placement_rank(self) -> u8 {
        match self {
            EnrollmentRoute::InRoute => 0,
            EnrollmentRoute::OutOfRoute => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub const fn label(self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

/// Lifecycle of an admission application.
///
/// ```text
/// SUBMITTED -> PAID_FEE -> REVIEWING -> APPROVED -> ASSIGNED
///     \            \           \
///      +------------+-----------+--> REJECTED
/// ```
///
/// Fee confirmation is optional: a submitted application can go straight to
/// review.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApplicationStatus {
    Submitted,
    PaidFee,
    Reviewing,
    Approved,
    Rejected,
    Assigned,
}

impl ApplicationStatus {
    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::Submitted => "Submitted",
            ApplicationStatus::PaidFee => "Fee paid",
            ApplicationStatus::Reviewing => "Under review",
            ApplicationStatus::Approved => "Admitted",
            ApplicationStatus::Rejected => "Rejected",
            ApplicationStatus::Assigned => "Class assigned",
        }
    }

    pub const fn can_transition_to(self, next: ApplicationStatus) -> bool {
        use ApplicationStatus::*;
        matches!(
            (self, next),
            (Submitted, PaidFee)
                | (Submitted | PaidFee, Reviewing)
                | (Reviewing, Approved)
                | (Submitted | PaidFee | Reviewing, Rejected)
                | (Approved, Assigned)
        )
    }

    pub fn transition(self, next: ApplicationStatus) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusTransitionError {
                from: self,
                to: next,
            })
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, ApplicationStatus::Rejected | ApplicationStatus::Assigned)
    }

    /// Position on the parent-facing timeline
    /// (submitted, reviewing, admitted, assigned). A rejection is shown at
    /// the review step where it happened.
    pub const fn timeline_step(self) -> usize {
        match self {
            ApplicationStatus::Submitted | ApplicationStatus::PaidFee => 0,
            ApplicationStatus::Reviewing | ApplicationStatus::Rejected => 1,
            ApplicationStatus::Approved => 2,
            ApplicationStatus::Assigned => 3,
        }
    }
}

impl fmt::Display for ApplicationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("application cannot move from {from:?} to {to:?}")]
pub struct StatusTransitionError {
    pub from: ApplicationStatus,
    pub to: ApplicationStatus,
}

/// Student identity as captured on the enrollment form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentDetails {
    pub full_name: String,
    pub date_of_birth: NaiveDate,
    pub gender: Gender,
    #[serde(default)]
    pub personal_id: String,
    #[serde(default)]
    pub ethnicity: String,
    #[serde(default)]
    pub place_of_birth: String,
    #[serde(default)]
    pub hometown: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParentContact {
    pub full_name: String,
    pub phone: String,
    pub address: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportingDocuments {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_certificate: Option<StoredDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residence_proof: Option<StoredDocument>,
}

/// Payload submitted by a parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationSubmission {
    pub student: StudentDetails,
    pub parent: ParentContact,
    pub enrollment_type: EnrollmentType,
    pub enrollment_route: EnrollmentRoute,
    #[serde(default)]
    pub is_priority: bool,
    #[serde(default)]
    pub documents: SupportingDocuments,
}

/// Stored application with its review and placement state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationRecord {
    pub id: ApplicationId,
    pub student: StudentDetails,
    pub parent: ParentContact,
    pub enrollment_type: EnrollmentType,
    pub enrollment_route: EnrollmentRoute,
    pub is_priority: bool,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    #[serde(default)]
    pub documents: SupportingDocuments,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub class_id: Option<ClassId>,
}

impl ApplicationRecord {
    pub fn from_submission(
        id: ApplicationId,
        submission: ApplicationSubmission,
        submitted_at: DateTime<Utc>,
    ) -> Self {
        let ApplicationSubmission {
            student,
            parent,
            enrollment_type,
            enrollment_route,
            is_priority,
            documents,
        } = submission;

        Self {
            id,
            student,
            parent,
            enrollment_type,
            enrollment_route,
            is_priority,
            status: ApplicationStatus::Submitted,
            submitted_at,
            documents,
            rejection_reason: None,
            class_id: None,
        }
    }

    /// Whether this record currently occupies a seat in `class_id`.
    pub fn occupies(&self, class_id: &ClassId) -> bool {
        self.status == ApplicationStatus::Assigned && self.class_id.as_ref() == Some(class_id)
    }
}

/// A classroom with a fixed enrollment cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchoolClass {
    pub id: ClassId,
    pub name: String,
    pub max_size: u32,
}
