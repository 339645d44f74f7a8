//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// JWT configuration.
    pub jwt: JwtConfig,
    /// Outgoing email configuration.
    #[serde(default)]
    pub email: EmailConfig,
    /// Approval engine tuning.
    #[serde(default)]
    pub approval: ApprovalConfig,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// JWT configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    /// Secret key for signing tokens.
    pub secret: String,
    /// Access token expiration in seconds.
    #[serde(default = "default_access_token_expiry")]
    pub access_token_expiry_secs: u64,
}

fn default_access_token_expiry() -> u64 {
    3600 // 1 hour
}

/// SMTP configuration for approval notifications.
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// When false, notifications are logged instead of sent.
    #[serde(default = "default_email_enabled")]
    pub enabled: bool,
    /// SMTP relay host.
    #[serde(default = "default_smtp_host")]
    pub smtp_host: String,
    /// SMTP relay port.
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    /// SMTP username.
    #[serde(default)]
    pub smtp_username: String,
    /// SMTP password.
    #[serde(default)]
    pub smtp_password: String,
    /// Sender address.
    #[serde(default = "default_from_email")]
    pub from_email: String,
    /// Sender display name.
    #[serde(default = "default_from_name")]
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            enabled: default_email_enabled(),
            smtp_host: default_smtp_host(),
            smtp_port: default_smtp_port(),
            smtp_username: String::new(),
            smtp_password: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
        }
    }
}

fn default_email_enabled() -> bool {
    false
}

fn default_smtp_host() -> String {
    "localhost".to_string()
}

fn default_smtp_port() -> u16 {
    1025
}

fn default_from_email() -> String {
    "noreply@hrflow.local".to_string()
}

fn default_from_name() -> String {
    "HRFlow".to_string()
}

/// Approval engine tuning knobs.
#[derive(Debug, Clone, Deserialize)]
pub struct ApprovalConfig {
    /// How many times a decision is re-applied after losing an optimistic write race.
    #[serde(default = "default_max_write_retries")]
    pub max_write_retries: u32,
    /// Time-to-live of cached approval flow definitions.
    #[serde(default = "default_flow_cache_ttl")]
    pub flow_cache_ttl_secs: u64,
    /// Delivery attempts per notification before it is dropped.
    #[serde(default = "default_notification_max_attempts")]
    pub notification_max_attempts: u32,
}

impl Default for ApprovalConfig {
    fn default() -> Self {
        Self {
            max_write_retries: default_max_write_retries(),
            flow_cache_ttl_secs: default_flow_cache_ttl(),
            notification_max_attempts: default_notification_max_attempts(),
        }
    }
}

fn default_max_write_retries() -> u32 {
    3
}

fn default_flow_cache_ttl() -> u64 {
    300
}

fn default_notification_max_attempts() -> u32 {
    3
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("HRFLOW").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_from_environment() {
        temp_env::with_vars(
            [
                ("HRFLOW__DATABASE__URL", Some("postgres://localhost/hrflow_test")),
                ("HRFLOW__JWT__SECRET", Some("secret")),
                ("HRFLOW__APPROVAL__MAX_WRITE_RETRIES", Some("5")),
            ],
            || {
                let config = AppConfig::load().unwrap();
                assert_eq!(config.database.url, "postgres://localhost/hrflow_test");
                assert_eq!(config.jwt.secret, "secret");
                assert_eq!(config.approval.max_write_retries, 5);
                assert_eq!(config.server.port, 8080);
                assert!(!config.email.enabled);
            },
        );
    }

    #[test]
    fn test_missing_database_url_fails() {
        temp_env::with_vars(
            [
                ("HRFLOW__DATABASE__URL", None::<&str>),
                ("HRFLOW__JWT__SECRET", Some("secret")),
            ],
            || {
                assert!(AppConfig::load().is_err());
            },
        );
    }

    #[test]
    fn test_approval_defaults() {
        let approval = ApprovalConfig::default();
        assert_eq!(approval.max_write_retries, 3);
        assert_eq!(approval.flow_cache_ttl_secs, 300);
        assert_eq!(approval.notification_max_attempts, 3);
    }
}
