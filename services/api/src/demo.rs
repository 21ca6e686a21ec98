use crate::infra::{Admissions, InMemoryApplicationRepository, InMemoryClassRepository};
use chrono::NaiveDate;
use clap::Args;
use school_enrollment::config::AdmissionsConfig;
use school_enrollment::error::AppError;
use school_enrollment::workflows::admissions::{
    write_report, AdmissionsService, ApplicationRecord, ApplicationSubmission, ClassDraft,
    EnrollmentRoute, EnrollmentSnapshot, EnrollmentType, Gender, ParentContact, ReportKind,
    StudentDetails, SupportingDocuments,
};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

const DEMO_FAMILIES: &[(&str, &str, Gender, bool, EnrollmentRoute)] = &[
    ("Trần Gia Bảo", "Trần Văn Hùng", Gender::Male, false, EnrollmentRoute::OutOfRoute),
    ("Lê Ngọc Anh", "Lê Thị Hoa", Gender::Female, true, EnrollmentRoute::OutOfRoute),
    ("Phạm Minh Khang", "Phạm Quốc Việt", Gender::Male, false, EnrollmentRoute::InRoute),
    ("Hoàng Thảo Vy", "Hoàng Văn Nam", Gender::Female, true, EnrollmentRoute::InRoute),
    ("Đỗ Đức Huy", "Đỗ Thị Lan", Gender::Male, false, EnrollmentRoute::InRoute),
    ("Bùi Khánh Linh", "Bùi Văn Thắng", Gender::Female, false, EnrollmentRoute::OutOfRoute),
    ("Ngô Tuấn Kiệt", "Ngô Thị Mai", Gender::Male, true, EnrollmentRoute::InRoute),
    ("Vũ Bảo Ngọc", "Vũ Đình Long", Gender::Female, false, EnrollmentRoute::InRoute),
];

#[derive(Args, Debug)]
pub(crate) struct DemoArgs {
    /// Number of classes to open before placement.
    #[arg(long, default_value_t = 2)]
    pub(crate) classes: u32,
    /// Seats per class.
    #[arg(long, default_value_t = 3)]
    pub(crate) class_size: u32,
    /// Print the admitted-students CSV after placement.
    #[arg(long)]
    pub(crate) csv: bool,
}

#[derive(Args, Debug)]
pub(crate) struct ReportArgs {
    /// Report to render: approved, out-of-route or class:<id>.
    #[arg(long, default_value = "approved")]
    pub(crate) kind: String,
    /// JSON snapshot with `applications` and `classes`, as served by /api/data.
    #[arg(long)]
    pub(crate) input: PathBuf,
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let config = AdmissionsConfig::default();
    let service: Admissions = AdmissionsService::new(
        Arc::new(InMemoryApplicationRepository::default()),
        Arc::new(InMemoryClassRepository::default()),
        &config,
    );

    for index in 0..args.classes {
        service.create_class(ClassDraft {
            name: Some(format!("1A{}", index + 1)),
            max_size: Some(args.class_size),
        })?;
    }

    for (offset, family) in DEMO_FAMILIES.iter().enumerate() {
        let record = service.submit(demo_submission(offset, family))?;
        service.begin_review(&record.id)?;
        service.approve(&record.id)?;
    }

    let report = service.auto_assign()?;
    let classes = service.classes()?;
    let class_name = |record: &ApplicationRecord| {
        record
            .class_id
            .as_ref()
            .and_then(|id| classes.iter().find(|class| &class.id == id))
            .map(|class| class.name.clone())
            .unwrap_or_default()
    };

    println!("{} School Enrollment Demo {}", "=".repeat(12), "=".repeat(12));
    println!(
        "{} applications admitted, {} classes of {} seats",
        DEMO_FAMILIES.len(),
        args.classes,
        args.class_size
    );
    println!();
    println!("Placed ({}):", report.placed.len());
    for record in &report.placed {
        println!(
            "  {:<8} {:<20} {:<13} {:<8} -> {}",
            record.id.as_str(),
            record.student.full_name,
            record.enrollment_route.label(),
            if record.is_priority { "priority" } else { "" },
            class_name(record)
        );
    }

    if !report.unplaced.is_empty() {
        println!();
        println!("Waiting for a seat ({}):", report.unplaced.len());
        for id in &report.unplaced {
            println!("  {id}");
        }
    }

    println!();
    println!("Occupancy:");
    for view in service.class_occupancy()? {
        println!(
            "  {:<6} {:>2}/{}{}",
            view.name,
            view.occupancy,
            view.max_size,
            if view.is_full { " (full)" } else { "" }
        );
    }

    if args.csv {
        println!();
        print!("{}", service.report(&ReportKind::Admitted)?);
    }

    Ok(())
}

pub(crate) fn run_report(args: ReportArgs) -> Result<(), AppError> {
    let kind: ReportKind = args.kind.parse()?;
    let raw = std::fs::read_to_string(&args.input)?;
    let snapshot: EnrollmentSnapshot = serde_json::from_str(&raw)?;

    let stdout = std::io::stdout();
    let mut handle = stdout.lock();
    let rows = write_report(&mut handle, &kind, &snapshot)?;
    handle.flush()?;

    tracing::debug!(rows, report = %kind.file_stem(), "report rendered");
    Ok(())
}

fn demo_submission(
    offset: usize,
    (student, parent, gender, is_priority, route): &(&str, &str, Gender, bool, EnrollmentRoute),
) -> ApplicationSubmission {
    let day = u32::try_from(offset % 28).unwrap_or(0) + 1;
    ApplicationSubmission {
        student: StudentDetails {
            full_name: (*student).to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(2019, 6, day).unwrap_or_default(),
            gender: *gender,
            personal_id: String::new(),
            ethnicity: "Kinh".to_string(),
            place_of_birth: "Đà Nẵng".to_string(),
            hometown: "Quảng Nam".to_string(),
        },
        parent: ParentContact {
            full_name: (*parent).to_string(),
            phone: format!("09123456{offset:02}"),
            address: format!("{} Nguyễn Huệ, Hải Châu", offset + 10),
        },
        enrollment_type: EnrollmentType::Grade1,
        enrollment_route: *route,
        is_priority: *is_priority,
        documents: SupportingDocuments::default(),
    }
}
