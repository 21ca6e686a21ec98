use crate::infra::{Admissions, AppState, Content, InMemoryApplicationRepository, InMemoryOtpRepository};
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse};
use axum::routing::get;
use axum::{Extension, Json, Router};
use school_enrollment::error::AppError;
use school_enrollment::workflows::admissions::{admissions_router, ApplicationRecord, SchoolClass};
use school_enrollment::workflows::auth::{auth_router, OtpService};
use school_enrollment::workflows::content::{
    content_router, Announcement, Guideline, SiteSettings,
};
use school_enrollment::workflows::payments::{
    payment_router, HttpQrImageSource, PaymentService,
};
use school_enrollment::workflows::uploads::{upload_router, LocalDocumentStore, PUBLIC_PREFIX};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;

pub(crate) struct Services {
    pub(crate) admissions: Arc<Admissions>,
    pub(crate) content: Arc<Content>,
    pub(crate) otp: Arc<OtpService<InMemoryOtpRepository>>,
    pub(crate) payments: Arc<PaymentService<InMemoryApplicationRepository, HttpQrImageSource>>,
    pub(crate) uploads: Arc<LocalDocumentStore>,
}

#[derive(Clone)]
pub(crate) struct DataState {
    admissions: Arc<Admissions>,
    content: Arc<Content>,
}

/// Everything the public site and the admin dashboard load on start-up.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DataResponse {
    pub(crate) applications: Vec<ApplicationRecord>,
    pub(crate) classes: Vec<SchoolClass>,
    pub(crate) announcement: Announcement,
    pub(crate) guidelines: Vec<Guideline>,
    pub(crate) settings: SiteSettings,
}

pub(crate) fn with_application_routes(services: Services) -> Router {
    let data_state = DataState {
        admissions: services.admissions.clone(),
        content: services.content.clone(),
    };
    let static_uploads = services.uploads.serve_dir();

    admissions_router(services.admissions)
        .merge(content_router(services.content))
        .merge(auth_router(services.otp))
        .merge(payment_router(services.payments))
        .merge(upload_router(services.uploads))
        .merge(
            Router::new()
                .route("/api/data", get(data_endpoint))
                .with_state(data_state),
        )
        .nest_service(PUBLIC_PREFIX, static_uploads)
        .route("/", get(index))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
}

pub(crate) async fn index(Extension(state): Extension<AppState>) -> Html<String> {
    let sms = if state.sms_enabled {
        "configured"
    } else {
        "dev mode (codes are logged)"
    };
    Html(format!(
        "<h1>School enrollment service</h1>\n<p>Status: Online</p>\n<p>SMS delivery: {sms}</p>\n<p>Version: {}</p>\n",
        env!("CARGO_PKG_VERSION")
    ))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

pub(crate) async fn data_endpoint(
    State(state): State<DataState>,
) -> Result<Json<DataResponse>, AppError> {
    let snapshot = state.admissions.snapshot()?;
    let content = state.content.site_content()?;
    let settings = state.content.settings()?;

    Ok(Json(DataResponse {
        applications: snapshot.applications,
        classes: snapshot.classes,
        announcement: content.announcement,
        guidelines: content.guidelines,
        settings,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::{InMemoryClassRepository, InMemoryContentRepository};
    use axum::body::Body;
    use axum::http::Request;
    use school_enrollment::config::{AdmissionsConfig, PaymentConfig};
    use school_enrollment::workflows::admissions::AdmissionsService;
    use school_enrollment::workflows::content::ContentService;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn services(uploads: &std::path::Path) -> Services {
        let applications = Arc::new(InMemoryApplicationRepository::default());
        let admissions_config = AdmissionsConfig::default();
        Services {
            admissions: Arc::new(AdmissionsService::new(
                applications.clone(),
                Arc::new(InMemoryClassRepository::default()),
                &admissions_config,
            )),
            content: Arc::new(ContentService::new(
                Arc::new(InMemoryContentRepository::default()),
                admissions_config.school_name.clone(),
            )),
            otp: Arc::new(OtpService::new(
                Arc::new(InMemoryOtpRepository::default()),
                None,
                300,
            )),
            payments: Arc::new(PaymentService::new(
                applications,
                Arc::new(HttpQrImageSource::new()),
                PaymentConfig {
                    bank_bin: "970405".to_string(),
                    account_no: "5304205050813".to_string(),
                    account_name: "HUA VAN THIEN".to_string(),
                    fee_amount: 200_000,
                    qr_base_url: "https://img.vietqr.io/image".to_string(),
                },
            )),
            uploads: Arc::new(LocalDocumentStore::new(uploads)),
        }
    }

    fn app_state(ready: bool) -> AppState {
        let recorder = metrics_exporter_prometheus::PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
            sms_enabled: false,
        }
    }

    async fn read_json(response: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    #[tokio::test]
    async fn data_endpoint_returns_defaults_for_fresh_store() {
        let dir = std::env::temp_dir();
        let app = with_application_routes(services(&dir)).layer(Extension(app_state(true)));

        let response = app
            .oneshot(
                Request::get("/api/data")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["applications"], json!([]));
        assert_eq!(body["announcement"]["title"], "Enrollment Announcement");
        assert_eq!(body["settings"]["schoolName"], "TRUONG TIEU HOC NGUYEN HUE");
    }

    #[tokio::test]
    async fn readiness_reflects_flag() {
        let dir = std::env::temp_dir();
        let app = with_application_routes(services(&dir)).layer(Extension(app_state(false)));

        let response = app
            .oneshot(
                Request::get("/ready")
                    .body(Body::empty())
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(read_json(response).await["status"], "initializing");
    }

    #[tokio::test]
    async fn otp_route_returns_dev_code_without_sms() {
        let dir = std::env::temp_dir();
        let app = with_application_routes(services(&dir)).layer(Extension(app_state(true)));

        let response = app
            .oneshot(
                Request::post("/api/auth/send-otp")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(json!({ "phoneNumber": "0912345678" }).to_string()))
                    .expect("request builds"),
            )
            .await
            .expect("route executes");

        assert_eq!(response.status(), StatusCode::OK);
        let body = read_json(response).await;
        assert_eq!(body["devOtp"].as_str().map(str::len), Some(6));
    }
}
