//! Admission applications: intake, review, class placement and reports.
//!
//! Applications move through the status machine in [`domain`]; admitted
//! students are seated by the [`placement`] engine, either automatically
//! (priority first, in-route before out-of-route, first class with room) or
//! through manual and bulk overrides that share the same capacity checks.

pub mod domain;
pub(crate) mod intake;
pub mod placement;
pub mod reports;
pub mod repository;
pub mod router;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    ApplicationId, ApplicationRecord, ApplicationStatus, ApplicationSubmission, ClassId,
    EnrollmentRoute, EnrollmentType, Gender, ParentContact, SchoolClass, StatusTransitionError,
    StudentDetails, SupportingDocuments,
};
pub use intake::{IntakeGuard, IntakeViolation};
pub use placement::{
    check_manual_assignment, plan_placements, verify_batch, ClassCapacity, OccupancyLedger,
    PlacementCandidate, PlacementError, PlacementInstruction, PlacementPlan,
};
pub use reports::{render_report, write_report, EnrollmentSnapshot, ReportError, ReportKind};
pub use repository::{
    ApplicationRepository, ApplicationStatusView, ClassOccupancyView, ClassRepository,
    RepositoryError,
};
pub use router::admissions_router;
pub use service::{
    AdmissionsService, AdmissionsServiceError, ClassDraft, PlacementReport, PlacementRequest,
};
