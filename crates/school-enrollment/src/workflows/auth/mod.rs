//! Parent login by one-time code sent to a phone number.

pub mod otp;
pub mod router;
pub mod sms;

pub use otp::{OtpDispatch, OtpError, OtpRecord, OtpRepository, OtpService, OtpStoreError};
pub use router::auth_router;
pub use sms::{to_international, SmsError, SmsGateway, TwilioSms};
