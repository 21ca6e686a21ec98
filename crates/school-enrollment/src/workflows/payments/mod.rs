//! Enrollment fee payment by VietQR bank transfer.

pub mod qr;
pub mod router;
pub mod service;
pub mod transfer;


pub use qr::{png_data_url, HttpQrImageSource, QrImageSource};
pub use router::payment_router;
pub use service::{PaymentQr, PaymentService};
pub use transfer::{strip_diacritics, TransferDetails};

use crate::workflows::admissions::{ApplicationId, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum PaymentError {
    #[error("application {0} not found")]
    ApplicationNotFound(ApplicationId),
    #[error("invalid QR service url: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("QR service failed: {0}")]
    Upstream(String),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
