use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::domain::{ApplicationId, ApplicationSubmission, ClassId};
use super::placement::PlacementError;
use super::reports::{ReportError, ReportKind};
use super::repository::{ApplicationRepository, ClassRepository, RepositoryError};
use super::service::{AdmissionsService, AdmissionsServiceError, ClassDraft, PlacementRequest};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RejectBody {
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct AssignBody {
    class_id: ClassId,
}

#[derive(Debug, Deserialize)]
pub(crate) struct BulkUpdateBody {
    updates: Vec<PlacementRequest>,
}

/// Router exposing intake, review, class management, placement and reports.
pub fn admissions_router<R, C>(service: Arc<AdmissionsService<R, C>>) -> Router
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    Router::new()
        .route(
            "/api/applications",
            post(submit_handler::<R, C>).get(list_handler::<R, C>),
        )
        .route(
            "/api/applications/bulk-update",
            put(bulk_update_handler::<R, C>),
        )
        .route("/api/applications/:id", get(status_handler::<R, C>))
        .route("/api/applications/:id/review", post(review_handler::<R, C>))
        .route("/api/applications/:id/approve", post(approve_handler::<R, C>))
        .route("/api/applications/:id/reject", post(reject_handler::<R, C>))
        .route(
            "/api/applications/:id/confirm-payment",
            post(confirm_payment_handler::<R, C>),
        )
        .route("/api/applications/:id/assign", post(assign_handler::<R, C>))
        .route(
            "/api/classes",
            get(classes_handler::<R, C>).post(create_class_handler::<R, C>),
        )
        .route(
            "/api/classes/:id",
            put(update_class_handler::<R, C>).delete(delete_class_handler::<R, C>),
        )
        .route("/api/placements/auto", post(auto_assign_handler::<R, C>))
        .route("/api/reports/class/:id", get(class_report_handler::<R, C>))
        .route("/api/reports/:kind", get(report_handler::<R, C>))
        .with_state(service)
}

type SharedService<R, C> = State<Arc<AdmissionsService<R, C>>>;

pub(crate) async fn submit_handler<R, C>(
    State(service): SharedService<R, C>,
    Json(submission): Json<ApplicationSubmission>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match service.submit(submission) {
        Ok(record) => (StatusCode::CREATED, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn list_handler<R, C>(State(service): SharedService<R, C>) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match service.list() {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn status_handler<R, C>(
    State(service): SharedService<R, C>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match service.status_view(&application_id) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(AdmissionsServiceError::Repository(RepositoryError::NotFound)) => {
            let payload = json!({
                "error": format!("application {} not found", application_id.trim()),
            });
            (StatusCode::NOT_FOUND, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

pub(crate) async fn review_handler<R, C>(
    State(service): SharedService<R, C>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    record_response(service.begin_review(&ApplicationId(application_id)))
}

pub(crate) async fn approve_handler<R, C>(
    State(service): SharedService<R, C>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    record_response(service.approve(&ApplicationId(application_id)))
}

pub(crate) async fn reject_handler<R, C>(
    State(service): SharedService<R, C>,
    Path(application_id): Path<String>,
    Json(body): Json<RejectBody>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    record_response(service.reject(&ApplicationId(application_id), &body.reason))
}

pub(crate) async fn confirm_payment_handler<R, C>(
    State(service): SharedService<R, C>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    record_response(service.confirm_payment(&ApplicationId(application_id)))
}

pub(crate) async fn assign_handler<R, C>(
    State(service): SharedService<R, C>,
    Path(application_id): Path<String>,
    Json(body): Json<AssignBody>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    record_response(service.assign_manually(&ApplicationId(application_id), &body.class_id))
}

pub(crate) async fn bulk_update_handler<R, C>(
    State(service): SharedService<R, C>,
    Json(body): Json<BulkUpdateBody>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match service.apply_batch(body.updates) {
        Ok(records) => (StatusCode::OK, Json(records)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn classes_handler<R, C>(State(service): SharedService<R, C>) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match service.class_occupancy() {
        Ok(classes) => (StatusCode::OK, Json(classes)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn create_class_handler<R, C>(
    State(service): SharedService<R, C>,
    Json(draft): Json<ClassDraft>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match service.create_class(draft) {
        Ok(class) => (StatusCode::CREATED, Json(class)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn update_class_handler<R, C>(
    State(service): SharedService<R, C>,
    Path(class_id): Path<String>,
    Json(draft): Json<ClassDraft>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match service.update_class(&ClassId(class_id), draft) {
        Ok(class) => (StatusCode::OK, Json(class)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn delete_class_handler<R, C>(
    State(service): SharedService<R, C>,
    Path(class_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match service.delete_class(&ClassId(class_id)) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn auto_assign_handler<R, C>(State(service): SharedService<R, C>) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match service.auto_assign() {
        Ok(report) => (StatusCode::OK, Json(report)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn report_handler<R, C>(
    State(service): SharedService<R, C>,
    Path(kind): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match kind.parse::<ReportKind>() {
        Ok(kind) => csv_response(&service, &kind),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn class_report_handler<R, C>(
    State(service): SharedService<R, C>,
    Path(class_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    csv_response(&service, &ReportKind::Class(ClassId(class_id)))
}

fn csv_response<R, C>(service: &AdmissionsService<R, C>, kind: &ReportKind) -> Response
where
    R: ApplicationRepository + 'static,
    C: ClassRepository + 'static,
{
    match service.report(kind) {
        Ok(body) => {
            let disposition = format!("attachment; filename=\"{}.csv\"", kind.file_stem());
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, mime::TEXT_CSV_UTF_8.to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                body,
            )
                .into_response()
        }
        Err(error) => error_response(error),
    }
}

fn record_response<T: serde::Serialize>(result: Result<T, AdmissionsServiceError>) -> Response {
    match result {
        Ok(record) => (StatusCode::OK, Json(record)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) fn status_for(error: &AdmissionsServiceError) -> StatusCode {
    match error {
        AdmissionsServiceError::Intake(_)
        | AdmissionsServiceError::MissingClassName
        | AdmissionsServiceError::MissingRejectionReason => StatusCode::UNPROCESSABLE_ENTITY,
        AdmissionsServiceError::Transition(_)
        | AdmissionsServiceError::ClassOccupied { .. }
        | AdmissionsServiceError::CapacityBelowOccupancy { .. } => StatusCode::CONFLICT,
        AdmissionsServiceError::Placement(error) => match error {
            PlacementError::UnknownClass(_) | PlacementError::UnknownApplication(_) => {
                StatusCode::NOT_FOUND
            }
            PlacementError::DuplicateApplication(_) => StatusCode::BAD_REQUEST,
            PlacementError::ClassFull { .. }
            | PlacementError::NotEligible { .. }
            | PlacementError::AlreadyPlaced { .. } => StatusCode::CONFLICT,
        },
        AdmissionsServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
        AdmissionsServiceError::Repository(RepositoryError::Conflict) => StatusCode::CONFLICT,
        AdmissionsServiceError::Report(ReportError::UnknownKind(_)) => StatusCode::BAD_REQUEST,
        AdmissionsServiceError::Repository(RepositoryError::Unavailable(_))
        | AdmissionsServiceError::InconsistentPlan(_)
        | AdmissionsServiceError::Report(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(error: AdmissionsServiceError) -> Response {
    let status = status_for(&error);
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
