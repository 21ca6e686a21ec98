use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use url::Url;

use super::PaymentError;

/// Source of rendered QR images.
#[async_trait]
pub trait QrImageSource: Send + Sync {
    async fn fetch_png(&self, url: &Url) -> Result<Vec<u8>, PaymentError>;
}

/// Downloads QR images over HTTP.
pub struct HttpQrImageSource {
    client: reqwest::Client,
}

impl HttpQrImageSource {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpQrImageSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl QrImageSource for HttpQrImageSource {
    async fn fetch_png(&self, url: &Url) -> Result<Vec<u8>, PaymentError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| PaymentError::Upstream(e.to_string()))?;

        if !response.status().is_success() {
            return Err(PaymentError::Upstream(format!(
                "QR service answered HTTP {}",
                response.status()
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| PaymentError::Upstream(e.to_string()))?;
        Ok(bytes.to_vec())
    }
}

pub fn png_data_url(bytes: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(bytes))
}
