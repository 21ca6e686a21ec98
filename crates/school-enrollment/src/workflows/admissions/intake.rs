use chrono::NaiveDate;

use super::domain::{ApplicationId, ApplicationSubmission};

/// Validation errors raised while accepting a submission.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IntakeViolation {
    #[error("{field} is required")]
    MissingField { field: &'static str },
    #[error("parent phone '{0}' must contain 10 or 11 digits")]
    InvalidPhone(String),
    #[error("date of birth {dob} is after the submission date {today}")]
    BirthDateInFuture { dob: NaiveDate, today: NaiveDate },
}

/// Guard that normalizes and checks submissions before they are stored.
#[derive(Debug, Clone)]
pub struct IntakeGuard {
    id_prefix: String,
}

impl Default for IntakeGuard {
    fn default() -> Self {
        Self::new("NH25")
    }
}

impl IntakeGuard {
    pub fn new(id_prefix: impl Into<String>) -> Self {
        Self {
            id_prefix: id_prefix.into(),
        }
    }

    /// Ids are sequential per prefix: `NH25001`, `NH25002`, ...
    pub fn application_id(&self, existing_applications: usize) -> ApplicationId {
        ApplicationId(format!("{}{:03}", self.id_prefix, existing_applications + 1))
    }

    pub fn validate(
        &self,
        mut submission: ApplicationSubmission,
        today: NaiveDate,
    ) -> Result<ApplicationSubmission, IntakeViolation> {
        trim_in_place(&mut submission.student.full_name);
        trim_in_place(&mut submission.student.personal_id);
        trim_in_place(&mut submission.student.ethnicity);
        trim_in_place(&mut submission.student.place_of_birth);
        trim_in_place(&mut submission.student.hometown);
        trim_in_place(&mut submission.parent.full_name);
        trim_in_place(&mut submission.parent.address);
        submission.parent.phone = normalize_phone(&submission.parent.phone)?;

        require(&submission.student.full_name, "student name")?;
        require(&submission.parent.full_name, "parent name")?;
        require(&submission.parent.address, "address")?;

        if submission.student.date_of_birth > today {
            return Err(IntakeViolation::BirthDateInFuture {
                dob: submission.student.date_of_birth,
                today,
            });
        }

        Ok(submission)
    }
}

fn trim_in_place(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

fn require(value: &str, field: &'static str) -> Result<(), IntakeViolation> {
    if value.is_empty() {
        Err(IntakeViolation::MissingField { field })
    } else {
        Ok(())
    }
}

/// Strips spaces, dots and dashes; keeps a leading `+`.
pub(crate) fn normalize_phone(raw: &str) -> Result<String, IntakeViolation> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(IntakeViolation::MissingField {
            field: "parent phone",
        });
    }

    let (prefix, rest) = match trimmed.strip_prefix('+') {
        Some(rest) => ("+", rest),
        None => ("", trimmed),
    };

    let mut digits = String::with_capacity(rest.len());
    for ch in rest.chars() {
        match ch {
            '0'..='9' => digits.push(ch),
            ' ' | '.' | '-' => {}
            _ => return Err(IntakeViolation::InvalidPhone(raw.to_string())),
        }
    }

    if !(10..=11).contains(&digits.len()) {
        return Err(IntakeViolation::InvalidPhone(raw.to_string()));
    }

    Ok(format!("{prefix}{digits}"))
}
