use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the enrollment service.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub admissions: AdmissionsConfig,
    pub storage: StorageConfig,
    pub otp: OtpConfig,
    pub payment: PaymentConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3001".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let admissions = AdmissionsConfig {
            school_name: string_var("SCHOOL_NAME", DEFAULT_SCHOOL_NAME),
            application_id_prefix: string_var("APPLICATION_ID_PREFIX", "NH25"),
            default_class_size: numeric_var("DEFAULT_CLASS_SIZE", 35)?,
        };

        let storage = StorageConfig {
            uploads_dir: PathBuf::from(string_var("UPLOADS_DIR", "uploads")),
        };

        let otp = OtpConfig {
            ttl_seconds: otp_ttl_seconds()?,
            twilio: TwilioCredentials::from_env(),
        };

        let payment = PaymentConfig {
            bank_bin: string_var("PAYMENT_BANK_BIN", "970405"),
            account_no: string_var("PAYMENT_ACCOUNT_NO", "5304205050813"),
            account_name: string_var("PAYMENT_ACCOUNT_NAME", "HUA VAN THIEN"),
            fee_amount: numeric_var("PAYMENT_FEE_AMOUNT", 200_000)?,
            qr_base_url: string_var("PAYMENT_QR_BASE_URL", "https://img.vietqr.io/image"),
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig {
                log_level,
                ansi: environment == AppEnvironment::Development,
            },
            admissions,
            storage,
            otp,
            payment,
        })
    }
}

const DEFAULT_SCHOOL_NAME: &str = "TRUONG TIEU HOC NGUYEN HUE";

/// Upper bound for `OTP_TTL_SECONDS`: one day.
pub const MAX_OTP_TTL_SECONDS: u32 = 86_400;

fn otp_ttl_seconds() -> Result<u32, ConfigError> {
    let ttl = numeric_var::<u32>("OTP_TTL_SECONDS", 300)?;
    if ttl == 0 || ttl > MAX_OTP_TTL_SECONDS {
        return Err(ConfigError::InvalidNumber {
            variable: "OTP_TTL_SECONDS",
            value: ttl.to_string(),
        });
    }
    Ok(ttl)
}

fn string_var(name: &str, default: &str) -> String {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn numeric_var<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => {
            raw.trim()
                .parse::<T>()
                .map_err(|_| ConfigError::InvalidNumber {
                    variable: name,
                    value: raw,
                })
        }
        _ => Ok(default),
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
    pub ansi: bool,
}

/// Admissions defaults shared by intake and class management.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdmissionsConfig {
    pub school_name: String,
    pub application_id_prefix: String,
    pub default_class_size: u32,
}

impl Default for AdmissionsConfig {
    fn default() -> Self {
        Self {
            school_name: DEFAULT_SCHOOL_NAME.to_string(),
            application_id_prefix: "NH25".to_string(),
            default_class_size: 35,
        }
    }
}

/// Where uploaded documents are written.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub uploads_dir: PathBuf,
}

/// One-time password issuance settings.
#[derive(Debug, Clone)]
pub struct OtpConfig {
    pub ttl_seconds: u32,
    pub twilio: Option<TwilioCredentials>,
}

/// SMS credentials; present only when all three variables are set.
#[derive(Clone, PartialEq, Eq)]
pub struct TwilioCredentials {
    pub account_sid: String,
    pub auth_token: String,
    pub from_number: String,
}

impl TwilioCredentials {
    fn from_env() -> Option<Self> {
        let read = |name: &str| {
            env::var(name)
                .ok()
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        Some(Self {
            account_sid: read("TWILIO_ACCOUNT_SID")?,
            auth_token: read("TWILIO_AUTH_TOKEN")?,
            from_number: read("TWILIO_PHONE_NUMBER")?,
        })
    }
}

impl fmt::Debug for TwilioCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TwilioCredentials")
            .field("account_sid", &self.account_sid)
            .field("from_number", &self.from_number)
            .finish_non_exhaustive()
    }
}

/// Bank transfer details rendered into the enrollment fee QR code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfig {
    pub bank_bin: String,
    pub account_no: String,
    pub account_name: String,
    pub fee_amount: u64,
    pub qr_base_url: String,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidNumber { variable: &'static str, value: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidNumber { variable, value } => {
                write!(f, "{variable} must be a number in range (found '{value}')")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort | ConfigError::InvalidNumber { .. } => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}
