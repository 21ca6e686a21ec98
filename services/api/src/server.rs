use crate::cli::ServeArgs;
use crate::infra::{
    AppState, InMemoryApplicationRepository, InMemoryClassRepository, InMemoryContentRepository,
    InMemoryOtpRepository,
};
use crate::routes::{with_application_routes, Services};
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use school_enrollment::config::AppConfig;
use school_enrollment::error::AppError;
use school_enrollment::telemetry;
use school_enrollment::workflows::admissions::AdmissionsService;
use school_enrollment::workflows::auth::{OtpService, SmsGateway, TwilioSms};
use school_enrollment::workflows::content::ContentService;
use school_enrollment::workflows::payments::{HttpQrImageSource, PaymentService};
use school_enrollment::workflows::uploads::LocalDocumentStore;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));

    let sms: Option<Arc<dyn SmsGateway>> = match config.otp.twilio.clone() {
        Some(credentials) => {
            info!("twilio configured, one-time codes are sent by SMS");
            Some(Arc::new(TwilioSms::new(credentials)))
        }
        None => {
            warn!("twilio not configured, one-time codes are logged and returned to callers");
            None
        }
    };
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        sms_enabled: sms.is_some(),
    };

    let uploads = Arc::new(LocalDocumentStore::new(config.storage.uploads_dir.clone()));
    uploads.prepare().await?;

    let applications = Arc::new(InMemoryApplicationRepository::default());
    let services = Services {
        admissions: Arc::new(AdmissionsService::new(
            applications.clone(),
            Arc::new(InMemoryClassRepository::default()),
            &config.admissions,
        )),
        content: Arc::new(ContentService::new(
            Arc::new(InMemoryContentRepository::default()),
            config.admissions.school_name.clone(),
        )),
        otp: Arc::new(OtpService::new(
            Arc::new(InMemoryOtpRepository::default()),
            sms,
            config.otp.ttl_seconds,
        )),
        payments: Arc::new(PaymentService::new(
            applications,
            Arc::new(HttpQrImageSource::new()),
            config.payment.clone(),
        )),
        uploads,
    };

    let app = with_application_routes(services)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "school enrollment service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
