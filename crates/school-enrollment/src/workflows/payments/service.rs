use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::qr::{png_data_url, QrImageSource};
use super::transfer::TransferDetails;
use super::PaymentError;
use crate::config::PaymentConfig;
use crate::workflows::admissions::{ApplicationId, ApplicationRepository};

/// QR payload returned to the parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentQr {
    #[serde(rename = "qrDataURL")]
    pub qr_data_url: String,
    pub transfer: TransferDetails,
}

pub struct PaymentService<R, Q> {
    applications: Arc<R>,
    images: Arc<Q>,
    config: PaymentConfig,
}

impl<R, Q> PaymentService<R, Q>
where
    R: ApplicationRepository + 'static,
    Q: QrImageSource + 'static,
{
    pub fn new(applications: Arc<R>, images: Arc<Q>, config: PaymentConfig) -> Self {
        Self {
            applications,
            images,
            config,
        }
    }

    pub async fn qr_code(&self, application_id: &ApplicationId) -> Result<PaymentQr, PaymentError> {
        let record = self
            .applications
            .fetch(application_id)?
            .ok_or_else(|| PaymentError::ApplicationNotFound(application_id.clone()))?;

        let transfer =
            TransferDetails::for_application(&self.config, &record.id, &record.student.full_name);
        let url = transfer.qr_image_url(&self.config.qr_base_url)?;

        let image = self.images.fetch_png(&url).await.map_err(|error| {
            warn!(application_id = %record.id, error = %error, "qr image fetch failed");
            error
        })?;
        info!(application_id = %record.id, bytes = image.len(), "payment qr generated");

        Ok(PaymentQr {
            qr_data_url: png_data_url(&image),
            transfer,
        })
    }
}
