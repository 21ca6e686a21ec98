use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::config::TwilioCredentials;

const TWILIO_API_BASE: &str = "https://api.twilio.com/2010-04-01";
/// Twilio error code for an unverified recipient on a trial account.
const UNVERIFIED_RECIPIENT: u32 = 21608;

/// Outbound text message delivery.
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SmsError {
    /// The provider refused this recipient; callers may fall back to showing the code.
    #[error("recipient rejected by SMS provider (code {code:?}): {message}")]
    Rejected { code: Option<u32>, message: String },
    #[error("SMS delivery failed: {0}")]
    Failed(String),
}

/// Rewrites local Vietnamese numbers (`0xxxxxxxxx`) to E.164 (`+84xxxxxxxxx`).
pub fn to_international(phone: &str) -> String {
    match phone.strip_prefix('0') {
        Some(rest) => format!("+84{rest}"),
        None => phone.to_string(),
    }
}

/// SMS delivery through the Twilio Messages REST API.
pub struct TwilioSms {
    client: reqwest::Client,
    credentials: TwilioCredentials,
    api_base: String,
}

#[derive(Debug, Deserialize)]
struct TwilioErrorBody {
    code: Option<u32>,
    message: Option<String>,
}

impl TwilioSms {
    pub fn new(credentials: TwilioCredentials) -> Self {
        Self::with_api_base(credentials, TWILIO_API_BASE)
    }

    pub fn with_api_base(credentials: TwilioCredentials, api_base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            credentials,
            api_base: api_base.into(),
        }
    }

    fn messages_url(&self) -> String {
        format!(
            "{}/Accounts/{}/Messages.json",
            self.api_base.trim_end_matches('/'),
            self.credentials.account_sid
        )
    }
}

#[async_trait]
impl SmsGateway for TwilioSms {
    async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
        let to = to_international(to);
        let form = [
            ("To", to.as_str()),
            ("From", self.credentials.from_number.as_str()),
            ("Body", body),
        ];

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.credentials.account_sid, Some(&self.credentials.auth_token))
            .form(&form)
            .send()
            .await
            .map_err(|e| SmsError::Failed(e.to_string()))?;

        if response.status().is_success() {
            return Ok(());
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let parsed = serde_json::from_str::<TwilioErrorBody>(&body).ok();
        let code = parsed.as_ref().and_then(|error| error.code);
        let message = parsed
            .and_then(|error| error.message)
            .unwrap_or_else(|| format!("HTTP {status}: {body}"));

        warn!(status = %status, code = ?code, "twilio rejected message");
        if code == Some(UNVERIFIED_RECIPIENT) || status == reqwest::StatusCode::BAD_REQUEST {
            Err(SmsError::Rejected { code, message })
        } else {
            Err(SmsError::Failed(message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn local_numbers_get_country_code() {
        assert_eq!(to_international("0912345678"), "+84912345678");
        assert_eq!(to_international("+84912345678"), "+84912345678");
    }

    #[test]
    fn messages_url_uses_account_sid() {
        let sms = TwilioSms::with_api_base(
            TwilioCredentials {
                account_sid: "AC123".to_string(),
                auth_token: "secret".to_string(),
                from_number: "+15005550006".to_string(),
            },
            "http://localhost:9999/",
        );
        assert_eq!(
            sms.messages_url(),
            "http://localhost:9999/Accounts/AC123/Messages.json"
        );
    }
}
