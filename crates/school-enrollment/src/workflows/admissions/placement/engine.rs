use std::collections::HashSet;

use serde::Serialize;

use super::{ClassCapacity, OccupancyLedger, PlacementCandidate, PlacementError, PlacementInstruction};
use crate::workflows::admissions::domain::{ApplicationId, ApplicationStatus, ClassId};

/// Result of one planning pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementPlan {
    /// One entry per placed applicant, in processing order.
    pub instructions: Vec<PlacementInstruction>,
    /// Eligible applicants for whom no class had room.
    pub unplaced: Vec<ApplicationId>,
    /// Entries that were not admitted-and-unassigned and were left untouched.
    pub skipped: Vec<ApplicationId>,
}

/// First-fit placement by priority, then route, then input order.
///
/// `classes` are tried in the order given; `occupancy` must reflect seats
/// already taken by applicants outside `applicants`. Applicants that are not
/// approved, or that already hold a class id, are reported in
/// [`PlacementPlan::skipped`] and never counted twice.
pub fn plan_placements(
    applicants: &[PlacementCandidate],
    classes: &[ClassCapacity],
    occupancy: &OccupancyLedger,
) -> PlacementPlan {
    let mut plan = PlacementPlan::default();

    let mut ordered = Vec::with_capacity(applicants.len());
    for candidate in applicants {
        if candidate.is_eligible() {
            ordered.push(candidate);
        } else {
            plan.skipped.push(candidate.application_id.clone());
        }
    }
    // sort_by_key is stable: equal keys keep their input order.
    ordered.sort_by_key(|candidate| candidate.sort_key());

    let mut ledger = occupancy.clone();
    for candidate in ordered {
        match classes.iter().find(|class| ledger.has_room(class)) {
            Some(class) => {
                ledger.increment(&class.class_id);
                plan.instructions.push(PlacementInstruction::assign(
                    candidate.application_id.clone(),
                    class.class_id.clone(),
                ));
            }
            None => plan.unplaced.push(candidate.application_id.clone()),
        }
    }

    plan
}

/// Validates a single override against the same occupancy rules as the planner.
pub fn check_manual_assignment(
    candidate: &PlacementCandidate,
    class_id: &ClassId,
    classes: &[ClassCapacity],
    occupancy: &OccupancyLedger,
) -> Result<PlacementInstruction, PlacementError> {
    let class = find_class(classes, class_id)?;
    ensure_eligible(candidate)?;

    if !occupancy.has_room(class) {
        return Err(PlacementError::ClassFull {
            class_id: class.class_id.clone(),
            max_size: class.max_size,
        });
    }

    Ok(PlacementInstruction::assign(
        candidate.application_id.clone(),
        class.class_id.clone(),
    ))
}

/// Checks a whole batch before anything is persisted: every instruction must
/// name a known class and an eligible applicant, and the batch as a whole must
/// fit in the remaining seats.
pub fn verify_batch(
    instructions: &[PlacementInstruction],
    candidates: &[PlacementCandidate],
    classes: &[ClassCapacity],
    occupancy: &OccupancyLedger,
) -> Result<(), PlacementError> {
    let mut ledger = occupancy.clone();
    let mut seen = HashSet::with_capacity(instructions.len());

    for instruction in instructions {
        if !seen.insert(&instruction.application_id) {
            return Err(PlacementError::DuplicateApplication(
                instruction.application_id.clone(),
            ));
        }

        let candidate = candidates
            .iter()
            .find(|candidate| candidate.application_id == instruction.application_id)
            .ok_or_else(|| PlacementError::UnknownApplication(instruction.application_id.clone()))?;
        let class = find_class(classes, &instruction.class_id)?;
        ensure_eligible(candidate)?;

        if !ledger.has_room(class) {
            return Err(PlacementError::ClassFull {
                class_id: class.class_id.clone(),
                max_size: class.max_size,
            });
        }
        ledger.increment(&class.class_id);
    }

    Ok(())
}

fn find_class<'a>(
    classes: &'a [ClassCapacity],
    class_id: &ClassId,
) -> Result<&'a ClassCapacity, PlacementError> {
    classes
        .iter()
        .find(|class| &class.class_id == class_id)
        .ok_or_else(|| PlacementError::UnknownClass(class_id.clone()))
}

fn ensure_eligible(candidate: &PlacementCandidate) -> Result<(), PlacementError> {
    if let Some(class_id) = &candidate.class_id {
        return Err(PlacementError::AlreadyPlaced {
            application_id: candidate.application_id.clone(),
            class_id: class_id.clone(),
        });
    }
    if candidate.status != ApplicationStatus::Approved {
        return Err(PlacementError::NotEligible {
            application_id: candidate.application_id.clone(),
            status: candidate.status,
        });
    }
    Ok(())
}
