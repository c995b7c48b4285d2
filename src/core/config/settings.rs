use super::parsing::{
    env_flag, env_optional, env_or_default, parse_cors_origins, parse_minutes, parse_number,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, Environment,
    ExamSettings, NotificationSettings, RuntimeSettings, SecuritySettings, ServerSettings,
    Settings, TelemetrySettings,
};

impl Settings {
    /// Reads every section from the environment, then checks cross-field rules.
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let environment = Environment::from_name(
            env_optional("PORTAL_ENV").or_else(|| env_optional("ENVIRONMENT")).as_deref(),
        );

        let settings = Self {
            server: ServerSettings::parse(
                env_or_default("PORTAL_HOST", "0.0.0.0"),
                env_or_default("PORTAL_PORT", "8000"),
            )?,
            runtime: RuntimeSettings {
                environment,
                strict_config: env_flag("PORTAL_STRICT_CONFIG") || environment.is_production(),
            },
            api: ApiSettings {
                project_name: env_or_default("PROJECT_NAME", "Exam Portal API"),
                version: env_or_default("VERSION", env!("CARGO_PKG_VERSION")),
                api_v1_str: env_or_default("API_V1_STR", "/api/v1"),
            },
            security: SecuritySettings {
                secret_key: env_optional("SECRET_KEY").unwrap_or_else(load_or_create_secret_key),
                access_token_expire_minutes: parse_number(
                    "ACCESS_TOKEN_EXPIRE_MINUTES",
                    env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "720"),
                )?,
                algorithm: env_or_default("ALGORITHM", "HS256"),
            },
            cors: CorsSettings {
                origins: parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?,
            },
            database: DatabaseSettings {
                postgres_server: env_or_default("POSTGRES_SERVER", "localhost"),
                postgres_port: parse_number(
                    "POSTGRES_PORT",
                    env_or_default("POSTGRES_PORT", "5432"),
                )?,
                postgres_user: env_or_default("POSTGRES_USER", "portal"),
                postgres_password: env_or_default("POSTGRES_PASSWORD", ""),
                postgres_db: env_or_default("POSTGRES_DB", "exam_portal"),
                database_url: env_optional("DATABASE_URL"),
                max_connections: parse_number(
                    "DB_MAX_CONNECTIONS",
                    env_or_default("DB_MAX_CONNECTIONS", "20"),
                )?,
            },
            exam: ExamSettings {
                default_minutes_to_finish: parse_minutes(
                    "EXAM_DEFAULT_MINUTES_TO_FINISH",
                    env_or_default("EXAM_DEFAULT_MINUTES_TO_FINISH", "120"),
                )?,
                form_token_field: env_or_default("EXAM_FORM_TOKEN_FIELD", "csrfmiddlewaretoken"),
            },
            notifications: NotificationSettings {
                webhook_url: env_or_default("NOTIFY_WEBHOOK_URL", ""),
                timeout_seconds: parse_number(
                    "NOTIFY_TIMEOUT_SECONDS",
                    env_or_default("NOTIFY_TIMEOUT_SECONDS", "10"),
                )?,
            },
            admin: AdminSettings {
                first_superuser_username: env_or_default("FIRST_SUPERUSER_USERNAME", "admin"),
                first_superuser_password: env_or_default("FIRST_SUPERUSER_PASSWORD", ""),
            },
            telemetry: TelemetrySettings {
                log_level: env_or_default("PORTAL_LOG_LEVEL", "info"),
                json: env_flag("PORTAL_LOG_JSON"),
                prometheus_enabled: env_flag("PROMETHEUS_ENABLED"),
            },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server(&self) -> &ServerSettings {
        &self.server
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn exam(&self) -> &ExamSettings {
        &self.exam
    }

    pub(crate) fn notifications(&self) -> &NotificationSettings {
        &self.notifications
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "DB_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        if self.exam.form_token_field.chars().all(|c| c.is_ascii_digit()) {
            // A numeric token field would collide with question keys.
            return Err(ConfigError::InvalidValue {
                field: "EXAM_FORM_TOKEN_FIELD",
                value: self.exam.form_token_field.clone(),
            });
        }

        if self.notifications.enabled()
            && !(self.notifications.webhook_url.starts_with("http://")
                || self.notifications.webhook_url.starts_with("https://"))
        {
            return Err(ConfigError::InvalidValue {
                field: "NOTIFY_WEBHOOK_URL",
                value: self.notifications.webhook_url.clone(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.admin.first_superuser_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_SUPERUSER_PASSWORD"));
        }

        Ok(())
    }
}
