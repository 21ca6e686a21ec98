use std::io::Write;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::domain::{ApplicationRecord, ApplicationStatus, ClassId, EnrollmentRoute, SchoolClass};

const UNASSIGNED: &str = "Unassigned";

/// Applications and classes as loaded for reporting or aggregate reads.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrollmentSnapshot {
    pub applications: Vec<ApplicationRecord>,
    pub classes: Vec<SchoolClass>,
}

/// Exportable student lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportKind {
    /// Admitted students, placed or not.
    Admitted,
    /// Admitted students from outside the catchment area.
    OutOfRoute,
    /// Students seated in one class.
    Class(ClassId),
}

impl ReportKind {
    pub fn includes(&self, record: &ApplicationRecord) -> bool {
        let admitted = matches!(
            record.status,
            ApplicationStatus::Approved | ApplicationStatus::Assigned
        );
        match self {
            ReportKind::Admitted => admitted,
            ReportKind::OutOfRoute => {
                admitted && record.enrollment_route == EnrollmentRoute::OutOfRoute
            }
            ReportKind::Class(class_id) => record.class_id.as_ref() == Some(class_id),
        }
    }

    pub fn file_stem(&self) -> String {
        match self {
            ReportKind::Admitted => "admitted-students".to_string(),
            ReportKind::OutOfRoute => "out-of-route-students".to_string(),
            ReportKind::Class(class_id) => format!("class-{class_id}"),
        }
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let trimmed = value.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "approved" | "admitted" => Ok(ReportKind::Admitted),
            "out-of-route" | "out_of_route" => Ok(ReportKind::OutOfRoute),
            _ => match trimmed.strip_prefix("class:") {
                Some(id) if !id.trim().is_empty() => {
                    Ok(ReportKind::Class(ClassId(id.trim().to_string())))
                }
                _ => Err(ReportError::UnknownKind(value.to_string())),
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("unknown report '{0}' (expected approved, out-of-route or class:<id>)")]
    UnknownKind(String),
    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush CSV: {0}")]
    Io(#[from] std::io::Error),
    #[error("report is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Column headings, written even when no row matches.
pub const REPORT_HEADERS: [&str; 8] = [
    "Student ID",
    "Student Name",
    "Date of Birth",
    "Gender",
    "Parent Name",
    "Parent Phone",
    "Address",
    "Class",
];

#[derive(Debug, Serialize)]
struct ReportRow<'a> {
    student_id: &'a str,
    student_name: &'a str,
    date_of_birth: String,
    gender: &'static str,
    parent_name: &'a str,
    parent_phone: &'a str,
    address: &'a str,
    class_name: &'a str,
}

/// Writes the rows selected by `kind`, returning how many were written.
pub fn write_report<W: Write>(
    writer: W,
    kind: &ReportKind,
    snapshot: &EnrollmentSnapshot,
) -> Result<usize, ReportError> {
    let mut csv_writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    csv_writer.write_record(REPORT_HEADERS)?;
    let mut rows = 0;

    for record in snapshot.applications.iter().filter(|r| kind.includes(r)) {
        let class_name = record
            .class_id
            .as_ref()
            .and_then(|class_id| snapshot.classes.iter().find(|c| &c.id == class_id))
            .map(|class| class.name.as_str())
            .unwrap_or(UNASSIGNED);

        csv_writer.serialize(ReportRow {
            student_id: record.id.as_str(),
            student_name: &record.student.full_name,
            date_of_birth: record.student.date_of_birth.format("%Y-%m-%d").to_string(),
            gender: record.student.gender.label(),
            parent_name: &record.parent.full_name,
            parent_phone: &record.parent.phone,
            address: &record.parent.address,
            class_name,
        })?;
        rows += 1;
    }

    csv_writer.flush()?;
    Ok(rows)
}

pub fn render_report(kind: &ReportKind, snapshot: &EnrollmentSnapshot) -> Result<String, ReportError> {
    let mut buffer = Vec::new();
    write_report(&mut buffer, kind, snapshot)?;
    Ok(String::from_utf8(buffer)?)
}
