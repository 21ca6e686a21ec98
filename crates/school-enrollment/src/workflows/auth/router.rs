use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use super::otp::{OtpError, OtpRepository, OtpService};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SendOtpBody {
    #[serde(default)]
    phone_number: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct VerifyOtpBody {
    #[serde(default)]
    phone_number: String,
    #[serde(default)]
    otp: String,
}

/// Router for the parent phone login.
pub fn auth_router<R>(service: Arc<OtpService<R>>) -> Router
where
    R: OtpRepository + 'static,
{
    Router::new()
        .route("/api/auth/send-otp", post(send_handler::<R>))
        .route("/api/auth/verify-otp", post(verify_handler::<R>))
        .with_state(service)
}

pub(crate) async fn send_handler<R>(
    State(service): State<Arc<OtpService<R>>>,
    Json(body): Json<SendOtpBody>,
) -> Response
where
    R: OtpRepository + 'static,
{
    match service.send(&body.phone_number).await {
        Ok(dispatch) => (StatusCode::OK, Json(dispatch)).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn verify_handler<R>(
    State(service): State<Arc<OtpService<R>>>,
    Json(body): Json<VerifyOtpBody>,
) -> Response
where
    R: OtpRepository + 'static,
{
    match service.verify(&body.phone_number, &body.otp) {
        Ok(()) => {
            let payload = json!({
                "message": "Login successful",
                "phoneNumber": body.phone_number.trim(),
            });
            (StatusCode::OK, Json(payload)).into_response()
        }
        Err(error) => error_response(error),
    }
}

fn error_response(error: OtpError) -> Response {
    let status = match error {
        OtpError::MissingPhone
        | OtpError::InvalidCode
        | OtpError::Expired
        | OtpError::WrongCode => StatusCode::BAD_REQUEST,
        OtpError::Store(_) | OtpError::Delivery(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let payload = json!({
        "error": error.to_string(),
    });
    (status, Json(payload)).into_response()
}
