use chrono::NaiveDate;

use super::common::*;
use crate::workflows::admissions::domain::ApplicationId;
use crate::workflows::admissions::intake::{normalize_phone, IntakeGuard, IntakeViolation};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date")
}

#[test]
fn application_ids_are_zero_padded() {
    let guard = IntakeGuard::default();
    assert_eq!(guard.application_id(0), ApplicationId("NH25001".to_string()));
    assert_eq!(guard.application_id(41), ApplicationId("NH25042".to_string()));
    assert_eq!(
        guard.application_id(1203),
        ApplicationId("NH251204".to_string())
    );
    assert_eq!(
        IntakeGuard::new("TH26").application_id(9),
        ApplicationId("TH26010".to_string())
    );
}

#[test]
fn validate_trims_fields_and_normalizes_phone() {
    let mut raw = submission();
    raw.student.full_name = "  Phạm Minh Khoa ".to_string();
    raw.parent.phone = "+84 912-345.678".to_string();

    let accepted = IntakeGuard::default()
        .validate(raw, today())
        .expect("valid submission");

    assert_eq!(accepted.student.full_name, "Phạm Minh Khoa");
    assert_eq!(accepted.parent.phone, "+84912345678");
}

#[test]
fn validate_rejects_future_birth_dates() {
    let mut raw = submission();
    raw.student.date_of_birth = NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date");

    match IntakeGuard::default().validate(raw, today()) {
        Err(IntakeViolation::BirthDateInFuture { dob, today: on }) => {
            assert_eq!(dob, NaiveDate::from_ymd_opt(2025, 6, 2).expect("valid date"));
            assert_eq!(on, today());
        }
        other => panic!("expected future birth date violation, got {other:?}"),
    }
}

#[test]
fn validate_requires_student_name_and_address() {
    let mut nameless = submission();
    nameless.student.full_name = String::new();
    assert_eq!(
        IntakeGuard::default().validate(nameless, today()),
        Err(IntakeViolation::MissingField {
            field: "student name"
        })
    );

    let mut homeless = submission();
    homeless.parent.address = " ".to_string();
    assert_eq!(
        IntakeGuard::default().validate(homeless, today()),
        Err(IntakeViolation::MissingField { field: "address" })
    );
}

#[test]
fn phone_numbers_need_ten_or_eleven_digits() {
    assert_eq!(normalize_phone("0912345678").as_deref(), Ok("0912345678"));
    assert_eq!(normalize_phone("091 2345 6789").as_deref(), Ok("09123456789"));
    assert!(matches!(
        normalize_phone("12345"),
        Err(IntakeViolation::InvalidPhone(_))
    ));
    assert!(matches!(
        normalize_phone("09123abc78"),
        Err(IntakeViolation::InvalidPhone(_))
    ));
    assert!(matches!(
        normalize_phone(""),
        Err(IntakeViolation::MissingField { .. })
    ));
}
