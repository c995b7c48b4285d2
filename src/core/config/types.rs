use thiserror::Error;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(super) server: ServerSettings,
    pub(super) runtime: RuntimeSettings,
    pub(super) api: ApiSettings,
    pub(super) security: SecuritySettings,
    pub(super) cors: CorsSettings,
    pub(super) database: DatabaseSettings,
    pub(super) exam: ExamSettings,
    pub(super) notifications: NotificationSettings,
    pub(super) admin: AdminSettings,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct ServerSettings {
    pub(crate) host: String,
    pub(crate) port: u16,
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) environment: Environment,
    /// Refuse to start with empty secrets. Always on in production.
    pub(crate) strict_config: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct ApiSettings {
    pub(crate) project_name: String,
    pub(crate) version: String,
    pub(crate) api_v1_str: String,
}

#[derive(Debug, Clone)]
pub(crate) struct SecuritySettings {
    pub(crate) secret_key: String,
    pub(crate) access_token_expire_minutes: u64,
    pub(crate) algorithm: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CorsSettings {
    pub(crate) origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct DatabaseSettings {
    pub(crate) postgres_server: String,
    pub(crate) postgres_port: u16,
    pub(crate) postgres_user: String,
    pub(crate) postgres_password: String,
    pub(crate) postgres_db: String,
    /// Wins over the individual `POSTGRES_*` parts when set.
    pub(crate) database_url: Option<String>,
    pub(crate) max_connections: u32,
}

/// Exam engine knobs that are not part of the stored exam configuration.
#[derive(Debug, Clone)]
pub(crate) struct ExamSettings {
    /// Time limit used when no configuration row has been written yet.
    pub(crate) default_minutes_to_finish: i32,
    /// Form field carrying the anti-forgery token; skipped on submission.
    pub(crate) form_token_field: String,
}

/// Outbound result webhook. An empty URL turns delivery off.
#[derive(Debug, Clone)]
pub(crate) struct NotificationSettings {
    pub(crate) webhook_url: String,
    pub(crate) timeout_seconds: u64,
}

#[derive(Debug, Clone)]
pub(crate) struct AdminSettings {
    pub(crate) first_superuser_username: String,
    pub(crate) first_superuser_password: String,
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
    pub(crate) prometheus_enabled: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Environment {
    Development,
    Test,
    Production,
}

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("invalid cors origins: {0}")]
    InvalidCors(String),
    #[error("missing required secret for {0}")]
    MissingSecret(&'static str),
}

impl ServerSettings {
    pub(super) fn parse(host: String, port: String) -> Result<Self, ConfigError> {
        if host.trim().is_empty() {
            return Err(ConfigError::InvalidValue { field: "PORTAL_HOST", value: host });
        }
        match port.parse::<u16>() {
            Ok(port) if port > 0 => Ok(Self { host, port }),
            _ => Err(ConfigError::InvalidValue { field: "PORTAL_PORT", value: port }),
        }
    }
}

impl Environment {
    /// Unknown names fall back to development.
    pub(super) fn from_name(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("production" | "prod") => Self::Production,
            Some("test" | "testing") => Self::Test,
            _ => Self::Development,
        }
    }

    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Test => "test",
            Self::Production => "production",
        }
    }

    pub(super) fn is_production(self) -> bool {
        self == Self::Production
    }
}

impl DatabaseSettings {
    pub(crate) fn database_url(&self) -> String {
        match &self.database_url {
            Some(url) => url.clone(),
            None => format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.postgres_user,
                self.postgres_password,
                self.postgres_server,
                self.postgres_port,
                self.postgres_db
            ),
        }
    }
}

impl NotificationSettings {
    pub(crate) fn enabled(&self) -> bool {
        !self.webhook_url.is_empty()
    }
}
