use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Serialize;
use tracing::{info, warn};

use super::sms::{SmsError, SmsGateway};

/// Pending one-time code for a phone number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpRecord {
    pub phone_number: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

/// One pending code per phone number; `upsert` replaces any previous code.
pub trait OtpRepository: Send + Sync {
    fn upsert(&self, record: OtpRecord) -> Result<(), OtpStoreError>;
    fn fetch(&self, phone_number: &str) -> Result<Option<OtpRecord>, OtpStoreError>;
    fn remove(&self, phone_number: &str) -> Result<(), OtpStoreError>;
}

#[derive(Debug, thiserror::Error)]
#[error("otp store unavailable: {0}")]
pub struct OtpStoreError(pub String);

/// Result of a send request. `dev_otp` carries the code when it was not texted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OtpDispatch {
    pub message: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dev_otp: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum OtpError {
    #[error("phone number is required")]
    MissingPhone,
    #[error("no pending code for this phone number")]
    InvalidCode,
    #[error("code has expired")]
    Expired,
    #[error("code does not match")]
    WrongCode,
    #[error(transparent)]
    Store(#[from] OtpStoreError),
    #[error(transparent)]
    Delivery(#[from] SmsError),
}

pub struct OtpService<R> {
    repository: Arc<R>,
    sms: Option<Arc<dyn SmsGateway>>,
    ttl: Duration,
}

impl<R> OtpService<R>
where
    R: OtpRepository + 'static,
{
    /// Without a gateway every code is logged and returned to the caller.
    pub fn new(repository: Arc<R>, sms: Option<Arc<dyn SmsGateway>>, ttl_seconds: u32) -> Self {
        Self {
            repository,
            sms,
            ttl: Duration::seconds(i64::from(ttl_seconds)),
        }
    }

    pub async fn send(&self, phone_number: &str) -> Result<OtpDispatch, OtpError> {
        self.send_at(phone_number, Utc::now()).await
    }

    pub fn verify(&self, phone_number: &str, code: &str) -> Result<(), OtpError> {
        self.verify_at(phone_number, code, Utc::now())
    }

    pub(crate) async fn send_at(
        &self,
        phone_number: &str,
        now: DateTime<Utc>,
    ) -> Result<OtpDispatch, OtpError> {
        let phone_number = phone_number.trim();
        if phone_number.is_empty() {
            return Err(OtpError::MissingPhone);
        }

        let code = generate_code();
        self.repository.upsert(OtpRecord {
            phone_number: phone_number.to_string(),
            code: code.clone(),
            expires_at: now + self.ttl,
        })?;

        let Some(sms) = &self.sms else {
            info!(phone = phone_number, otp = %code, "sms disabled, returning code to caller");
            return Ok(OtpDispatch {
                message: "Dev Mode",
                dev_otp: Some(code),
            });
        };

        match sms.send(phone_number, &format!("Verification code: {code}")).await {
            Ok(()) => {
                info!(phone = phone_number, "otp sent");
                Ok(OtpDispatch {
                    message: "OTP Sent",
                    dev_otp: None,
                })
            }
            Err(SmsError::Rejected { code: provider_code, message }) => {
                warn!(
                    phone = phone_number,
                    provider_code = ?provider_code,
                    reason = %message,
                    otp = %code,
                    "sms rejected, falling back to dev mode"
                );
                Ok(OtpDispatch {
                    message: "SMS Fallback",
                    dev_otp: Some(code),
                })
            }
            Err(error) => Err(error.into()),
        }
    }

    pub(crate) fn verify_at(
        &self,
        phone_number: &str,
        code: &str,
        now: DateTime<Utc>,
    ) -> Result<(), OtpError> {
        let phone_number = phone_number.trim();
        let record = self
            .repository
            .fetch(phone_number)?
            .ok_or(OtpError::InvalidCode)?;

        if now > record.expires_at {
            return Err(OtpError::Expired);
        }
        if record.code != code.trim() {
            return Err(OtpError::WrongCode);
        }

        self.repository.remove(phone_number)?;
        info!(phone = phone_number, "otp verified");
        Ok(())
    }
}

/// Six-digit code without a leading zero.
fn generate_code() -> String {
    rand::rng().random_range(100_000..1_000_000).to_string()
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    #[derive(Default)]
    struct MemoryOtp {
        records: Mutex<HashMap<String, OtpRecord>>,
    }

    impl OtpRepository for MemoryOtp {
        fn upsert(&self, record: OtpRecord) -> Result<(), OtpStoreError> {
            self.records
                .lock()
                .expect("otp mutex poisoned")
                .insert(record.phone_number.clone(), record);
            Ok(())
        }

        fn fetch(&self, phone_number: &str) -> Result<Option<OtpRecord>, OtpStoreError> {
            Ok(self
                .records
                .lock()
                .expect("otp mutex poisoned")
                .get(phone_number)
                .cloned())
        }

        fn remove(&self, phone_number: &str) -> Result<(), OtpStoreError> {
            self.records
                .lock()
                .expect("otp mutex poisoned")
                .remove(phone_number);
            Ok(())
        }
    }

    struct RejectingSms;

    #[async_trait]
    impl SmsGateway for RejectingSms {
        async fn send(&self, _to: &str, _body: &str) -> Result<(), SmsError> {
            Err(SmsError::Rejected {
                code: Some(21608),
                message: "unverified".to_string(),
            })
        }
    }

    struct BrokenSms;

    #[async_trait]
    impl SmsGateway for BrokenSms {
        async fn send(&self, _to: &str, _body: &str) -> Result<(), SmsError> {
            Err(SmsError::Failed("timeout".to_string()))
        }
    }

    #[derive(Default)]
    struct RecordingSms {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl SmsGateway for RecordingSms {
        async fn send(&self, to: &str, body: &str) -> Result<(), SmsError> {
            self.sent
                .lock()
                .expect("sms mutex poisoned")
                .push((to.to_string(), body.to_string()));
            Ok(())
        }
    }

    fn service(sms: Option<Arc<dyn SmsGateway>>) -> OtpService<MemoryOtp> {
        OtpService::new(Arc::new(MemoryOtp::default()), sms, 300)
    }

    #[tokio::test]
    async fn dev_mode_returns_six_digit_code() {
        let service = service(None);
        let dispatch = service.send("0912345678").await.expect("send succeeds");

        let code = dispatch.dev_otp.expect("code returned in dev mode");
        assert_eq!(code.len(), 6);
        assert!(code.chars().all(|ch| ch.is_ascii_digit()));
        assert_eq!(dispatch.message, "Dev Mode");
    }

    #[tokio::test]
    async fn verify_consumes_matching_code() {
        let service = service(None);
        let code = service
            .send("0912345678")
            .await
            .expect("send succeeds")
            .dev_otp
            .expect("dev code");

        assert!(matches!(
            service.verify("0912345678", "000000"),
            Err(OtpError::WrongCode)
        ));
        service.verify("0912345678", &code).expect("code matches");
        assert!(matches!(
            service.verify("0912345678", &code),
            Err(OtpError::InvalidCode)
        ));
    }

    #[tokio::test]
    async fn expired_codes_are_refused() {
        let service = service(None);
        let sent_at = Utc::now();
        let code = service
            .send_at("0912345678", sent_at)
            .await
            .expect("send succeeds")
            .dev_otp
            .expect("dev code");

        let later = sent_at + Duration::seconds(301);
        assert!(matches!(
            service.verify_at("0912345678", &code, later),
            Err(OtpError::Expired)
        ));
    }

    #[tokio::test]
    async fn widest_ttl_builds_without_overflow() {
        let service = OtpService::new(Arc::new(MemoryOtp::default()), None, u32::MAX);
        let sent_at = Utc::now();
        let code = service
            .send_at("0912345678", sent_at)
            .await
            .expect("send succeeds")
            .dev_otp
            .expect("dev code");

        service
            .verify_at("0912345678", &code, sent_at + Duration::days(365))
            .expect("code still valid");
    }

    #[tokio::test]
    async fn resending_replaces_previous_code() {
        let repository = Arc::new(MemoryOtp::default());
        let service = OtpService::new(repository.clone(), None, 300);
        service.send("0912345678").await.expect("first send");
        let second = service
            .send("0912345678")
            .await
            .expect("second send")
            .dev_otp
            .expect("dev code");

        let stored = repository
            .fetch("0912345678")
            .expect("fetch succeeds")
            .expect("record present");
        assert_eq!(stored.code, second);
        assert_eq!(repository.records.lock().expect("otp mutex poisoned").len(), 1);
    }

    #[tokio::test]
    async fn sms_delivery_hides_code() {
        let sms = Arc::new(RecordingSms::default());
        let service = service(Some(sms.clone()));

        let dispatch = service.send("0912345678").await.expect("send succeeds");

        assert_eq!(dispatch.dev_otp, None);
        let sent = sms.sent.lock().expect("sms mutex poisoned").clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "0912345678");
    }

    #[tokio::test]
    async fn rejected_recipient_falls_back_to_dev_mode() {
        let service = service(Some(Arc::new(RejectingSms)));
        let dispatch = service.send("0912345678").await.expect("fallback");
        assert!(dispatch.dev_otp.is_some());
    }

    #[tokio::test]
    async fn other_delivery_failures_surface() {
        let service = service(Some(Arc::new(BrokenSms)));
        assert!(matches!(
            service.send("0912345678").await,
            Err(OtpError::Delivery(SmsError::Failed(_)))
        ));
    }

    #[tokio::test]
    async fn blank_phone_is_rejected() {
        assert!(matches!(
            service(None).send("  ").await,
            Err(OtpError::MissingPhone)
        ));
    }
}
