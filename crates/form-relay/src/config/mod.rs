use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use crate::workflows::submission::QuestionRole;

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

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub intake: IntakeConfig,
    pub ledger: LedgerConfig,
    pub dispatch: DispatchConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            intake: IntakeConfig::from_env()?,
            ledger: LedgerConfig {
                path: non_empty_var("LEDGER_PATH").map(PathBuf::from),
            },
            dispatch: DispatchConfig::from_env()?,
        })
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

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Deployment values consumed by the submission pipeline.
///
/// Token lists are stored lower-cased so matching never has to re-normalize them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntakeConfig {
    pub internal_recipient: String,
    pub form_title: String,
    pub case_prefix: String,
    pub status_label: String,
    pub agreement_token: String,
    pub contact_token: String,
    pub affirmative_values: Vec<String>,
    pub negative_values: Vec<String>,
    pub pii_keywords: Vec<String>,
    pub email_token: String,
    pub question_roles: BTreeMap<String, QuestionRole>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            internal_recipient: "intake@localhost".to_string(),
            form_title: "Customer Complaint Form".to_string(),
            case_prefix: "CMP".to_string(),
            status_label: "Received".to_string(),
            agreement_token: "agree".to_string(),
            contact_token: "contact".to_string(),
            affirmative_values: vec!["yes".to_string()],
            negative_values: vec!["no".to_string()],
            pii_keywords: token_list("name,email,phone,address"),
            email_token: "email".to_string(),
            question_roles: BTreeMap::new(),
        }
    }
}

impl IntakeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let question_roles = match non_empty_var("INTAKE_QUESTION_ROLES") {
            Some(raw) => parse_question_roles(&raw)?,
            None => defaults.question_roles,
        };

        Ok(Self {
            internal_recipient: non_empty_var("INTAKE_INTERNAL_RECIPIENT")
                .unwrap_or(defaults.internal_recipient),
            form_title: non_empty_var("INTAKE_FORM_TITLE").unwrap_or(defaults.form_title),
            case_prefix: non_empty_var("INTAKE_CASE_PREFIX").unwrap_or(defaults.case_prefix),
            status_label: non_empty_var("INTAKE_STATUS").unwrap_or(defaults.status_label),
            agreement_token: non_empty_var("INTAKE_CONSENT_AGREEMENT_TOKEN")
                .map(|value| value.to_lowercase())
                .unwrap_or(defaults.agreement_token),
            contact_token: non_empty_var("INTAKE_CONSENT_CONTACT_TOKEN")
                .map(|value| value.to_lowercase())
                .unwrap_or(defaults.contact_token),
            affirmative_values: non_empty_var("INTAKE_CONSENT_AFFIRMATIVE")
                .map(|raw| token_list(&raw))
                .unwrap_or(defaults.affirmative_values),
            negative_values: non_empty_var("INTAKE_CONSENT_NEGATIVE")
                .map(|raw| token_list(&raw))
                .unwrap_or(defaults.negative_values),
            pii_keywords: non_empty_var("INTAKE_PII_KEYWORDS")
                .map(|raw| token_list(&raw))
                .unwrap_or(defaults.pii_keywords),
            email_token: non_empty_var("INTAKE_EMAIL_TOKEN")
                .map(|value| value.to_lowercase())
                .unwrap_or(defaults.email_token),
            question_roles,
        })
    }
}

/// Location of the append-only status ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LedgerConfig {
    pub path: Option<PathBuf>,
}

/// Target of the document/mail dispatch webhook.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    pub url: Option<String>,
    pub token: Option<String>,
    pub event_type: String,
    pub timeout: Duration,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            url: None,
            token: None,
            event_type: "form_submission".to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl DispatchConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout = match non_empty_var("DISPATCH_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(
                raw.trim()
                    .parse::<u64>()
                    .map_err(|_| ConfigError::InvalidTimeout)?,
            ),
            None => defaults.timeout,
        };

        Ok(Self {
            url: non_empty_var("DISPATCH_URL"),
            token: non_empty_var("DISPATCH_TOKEN"),
            event_type: non_empty_var("DISPATCH_EVENT_TYPE").unwrap_or(defaults.event_type),
            timeout,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn token_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|token| token.trim().to_lowercase())
        .filter(|token| !token.is_empty())
        .collect()
}

/// Parses `question-id=role` pairs separated by commas.
fn parse_question_roles(raw: &str) -> Result<BTreeMap<String, QuestionRole>, ConfigError> {
    let mut roles = BTreeMap::new();
    for pair in raw.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        let (id, role) = pair
            .split_once('=')
            .ok_or_else(|| ConfigError::InvalidQuestionRole {
                entry: pair.to_string(),
            })?;
        let role = QuestionRole::parse(role).ok_or_else(|| ConfigError::InvalidQuestionRole {
            entry: pair.to_string(),
        })?;
        roles.insert(id.trim().to_string(), role);
    }
    Ok(roles)
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidTimeout,
    InvalidQuestionRole { entry: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidTimeout => {
                write!(f, "DISPATCH_TIMEOUT_SECS must be a whole number of seconds")
            }
            ConfigError::InvalidQuestionRole { entry } => write!(
                f,
                "INTAKE_QUESTION_ROLES entry '{}' must look like <question-id>=<consent|contact_email|pii>",
                entry
            ),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidHost { source } => Some(source),
            ConfigError::InvalidPort
            | ConfigError::InvalidTimeout
            | ConfigError::InvalidQuestionRole { .. } => None,
        }
    }
}
