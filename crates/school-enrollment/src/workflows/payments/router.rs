use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

use super::qr::QrImageSource;
use super::service::PaymentService;
use super::PaymentError;
use crate::workflows::admissions::{ApplicationId, ApplicationRepository};

pub fn payment_router<R, Q>(service: Arc<PaymentService<R, Q>>) -> Router
where
    R: ApplicationRepository + 'static,
    Q: QrImageSource + 'static,
{
    Router::new()
        .route("/api/qr-code/:application_id", get(qr_handler::<R, Q>))
        .with_state(service)
}

pub(crate) async fn qr_handler<R, Q>(
    State(service): State<Arc<PaymentService<R, Q>>>,
    Path(application_id): Path<String>,
) -> Response
where
    R: ApplicationRepository + 'static,
    Q: QrImageSource + 'static,
{
    match service.qr_code(&ApplicationId(application_id)).await {
        Ok(qr) => (StatusCode::OK, Json(qr)).into_response(),
        Err(error) => {
            let status = match error {
                PaymentError::ApplicationNotFound(_) => StatusCode::NOT_FOUND,
                PaymentError::Upstream(_) => StatusCode::BAD_GATEWAY,
                PaymentError::InvalidUrl(_) | PaymentError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            };
            let payload = json!({
                "error": error.to_string(),
            });
            (status, Json(payload)).into_response()
        }
    }
}
