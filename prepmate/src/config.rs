//! Application configuration.
//!
//! Configuration is loaded from a YAML file with environment variable
//! overrides. The file path defaults to `config.yaml` but can be set via the
//! `-f` flag or `PREPMATE_CONFIG`. Variables prefixed with `PREPMATE_`
//! override YAML values; use double underscores for nested fields, e.g.
//! `PREPMATE_QUOTA__PRO_DAILY_LIMIT=250`. `DATABASE_URL` overrides
//! `database.url` as a special case.

use clap::Parser;
use figment::{
    providers::{Env, Format, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::Error;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "PREPMATE_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Root configuration loaded from YAML and environment variables.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// Secret key for JWT signing (required to start the server)
    pub secret_key: Option<String>,
    /// Email address granted the admin role on registration
    pub admin_email: Option<String>,
    /// Overrides `database.url` when set (DATABASE_URL)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database_url: Option<String>,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub quota: QuotaConfig,
    pub providers: ProvidersConfig,
    pub ocr: OcrConfig,
    pub email: EmailConfig,
    pub google: GoogleConfig,
    pub reset: ResetConfig,
    pub cors: CorsConfig,
}

/// Database backend selection.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// In-process store, nothing persisted. For development and tests.
    Memory,
    /// External PostgreSQL database
    External {
        /// Connection string
        url: String,
    },
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        DatabaseConfig::Memory
    }
}

/// Session token settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct AuthConfig {
    /// JWT token expiry duration
    #[serde(with = "humantime_serde")]
    pub jwt_expiry: Duration,
    /// Length of the one-time password sent for email login
    pub otp_digits: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_expiry: Duration::from_secs(7 * 24 * 60 * 60),
            otp_digits: 6,
        }
    }
}

/// Paid plan limits and lifetime. The Free tier is fixed at three answers a
/// day and is not configurable.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct QuotaConfig {
    pub basic_daily_limit: i32,
    pub pro_daily_limit: i32,
    /// How long a paid plan lasts from purchase
    #[serde(with = "humantime_serde")]
    pub plan_duration: Duration,
}

impl Default for QuotaConfig {
    fn default() -> Self {
        Self {
            basic_daily_limit: 100,
            pro_daily_limit: 200,
            plan_duration: Duration::from_secs(30 * 24 * 60 * 60),
        }
    }
}

/// Upstream model provider settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProvidersConfig {
    /// API key for the OpenAI-compatible provider
    /// (or set PREPMATE_PROVIDERS__API_KEY)
    pub api_key: Option<String>,
    /// Override the provider base URL (e.g., a proxy or compatible server)
    pub api_base: Option<String>,
    /// Model used for answer generation
    pub answer_model: String,
    /// Model used to clean up speech transcripts into questions
    pub clarify_model: String,
    /// Model used for audio transcription
    pub transcribe_model: String,
    /// Vision-capable model used for screenshot text extraction
    pub extract_model: String,
    /// Per-call timeout for provider requests
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    pub max_answer_tokens: u32,
    pub temperature: f32,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: None,
            answer_model: "gpt-4o-mini".to_string(),
            clarify_model: "gpt-4o-mini".to_string(),
            transcribe_model: "whisper-1".to_string(),
            extract_model: "gpt-4o-mini".to_string(),
            request_timeout: Duration::from_secs(30),
            max_answer_tokens: 600,
            temperature: 0.6,
        }
    }
}

/// Screenshot question handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OcrConfig {
    /// Answer screenshot questions from their own content alone, without the
    /// resume context. Screenshots are usually coding problems where resume
    /// framing only adds noise.
    pub self_contained: bool,
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self { self_contained: true }
    }
}

/// Email configuration for OTP delivery.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
// Note: Cannot use deny_unknown_fields here due to #[serde(flatten)] on transport
pub struct EmailConfig {
    /// Email transport method
    #[serde(flatten)]
    pub transport: EmailTransportConfig,
    /// Sender email address
    pub from_email: String,
    /// Sender display name
    pub from_name: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            transport: EmailTransportConfig::default(),
            from_email: "noreply@example.com".to_string(),
            from_name: "PrepMate".to_string(),
        }
    }
}

/// Email transport configuration - either SMTP or file-based for testing.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum EmailTransportConfig {
    /// Send emails via SMTP server
    Smtp {
        host: String,
        port: u16,
        username: String,
        password: String,
        use_tls: bool,
    },
    /// Write emails to files (for development/testing)
    File {
        /// Directory path where email files will be written
        path: String,
    },
}

impl Default for EmailTransportConfig {
    fn default() -> Self {
        Self::File {
            path: "./emails".to_string(),
        }
    }
}

/// Google sign-in settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoogleConfig {
    /// OAuth client ID the ID token audience must match.
    /// Google login is disabled when unset.
    pub client_id: Option<String>,
}

/// Nightly usage sweep configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResetConfig {
    /// Enable the daily usage sweep daemon (default: true)
    pub enabled: bool,
    /// How often to run the sweep
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
}

impl Default for ResetConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval: Duration::from_secs(24 * 60 * 60),
        }
    }
}

/// CORS settings for browser clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct CorsConfig {
    /// Allowed origins; "*" allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origins: vec!["*".to_string()],
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            secret_key: None,
            admin_email: None,
            database_url: None,
            database: DatabaseConfig::default(),
            auth: AuthConfig::default(),
            quota: QuotaConfig::default(),
            providers: ProvidersConfig::default(),
            ocr: OcrConfig::default(),
            email: EmailConfig::default(),
            google: GoogleConfig::default(),
            reset: ResetConfig::default(),
            cors: CorsConfig::default(),
        }
    }
}

impl Config {
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let mut config: Self = Self::figment(args).extract()?;

        // DATABASE_URL wins over whatever the file says.
        if let Some(url) = config.database_url.take() {
            config.database = DatabaseConfig::External { url };
        }

        config.validate().map_err(|e| figment::Error::from(e.to_string()))?;
        Ok(config)
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            .merge(Yaml::file(&args.config))
            .merge(Env::prefixed("PREPMATE_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]))
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.secret_key.is_none() {
            return Err(Error::Internal {
                operation: "config validation: secret_key is not set. Set PREPMATE_SECRET_KEY \
                            or add secret_key to the config file."
                    .to_string(),
            });
        }

        if self.auth.jwt_expiry.as_secs() < 300 {
            return Err(Error::Internal {
                operation: "config validation: auth.jwt_expiry is too short (minimum 5 minutes)"
                    .to_string(),
            });
        }

        if self.auth.otp_digits < 4 || self.auth.otp_digits > 10 {
            return Err(Error::Internal {
                operation: "config validation: auth.otp_digits must be between 4 and 10"
                    .to_string(),
            });
        }

        for (name, limit) in [
            ("quota.basic_daily_limit", self.quota.basic_daily_limit),
            ("quota.pro_daily_limit", self.quota.pro_daily_limit),
        ] {
            if limit < 1 {
                return Err(Error::Internal {
                    operation: format!("config validation: {name} must be at least 1"),
                });
            }
        }

        if self.providers.request_timeout.is_zero() {
            return Err(Error::Internal {
                operation: "config validation: providers.request_timeout must be positive"
                    .to_string(),
            });
        }

        if self.cors.allowed_origins.is_empty() {
            return Err(Error::Internal {
                operation: "config validation: cors.allowed_origins cannot be empty".to_string(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    fn args(path: &str) -> Args {
        Args {
            config: path.to_string(),
            validate: false,
        }
    }

    #[test]
    fn defaults_fail_without_secret_key() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "")?;
            assert!(Config::load(&args("config.yaml")).is_err());
            Ok(())
        });
    }

    #[test]
    fn yaml_values_load() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                r#"
                secret_key: "test-secret"
                port: 9000
                quota:
                  basic_daily_limit: 150
                database:
                  type: external
                  url: "postgres://localhost/prepmate"
                "#,
            )?;
            let config = Config::load(&args("config.yaml")).expect("config should load");
            assert_eq!(config.port, 9000);
            assert_eq!(config.quota.basic_daily_limit, 150);
            assert!(matches!(config.database, DatabaseConfig::External { .. }));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_yaml() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "secret_key: \"test-secret\"\nport: 9000\n")?;
            jail.set_env("PREPMATE_PORT", "9001");
            jail.set_env("PREPMATE_QUOTA__PRO_DAILY_LIMIT", "250");
            let config = Config::load(&args("config.yaml")).expect("config should load");
            assert_eq!(config.port, 9001);
            assert_eq!(config.quota.pro_daily_limit, 250);
            Ok(())
        });
    }

    #[test]
    fn database_url_env_wins() {
        Jail::expect_with(|jail| {
            jail.create_file("config.yaml", "secret_key: \"test-secret\"\n")?;
            jail.set_env("DATABASE_URL", "postgres://db.internal/prepmate");
            let config = Config::load(&args("config.yaml")).expect("config should load");
            match config.database {
                DatabaseConfig::External { url } => {
                    assert_eq!(url, "postgres://db.internal/prepmate")
                }
                other => panic!("expected external database, got {other:?}"),
            }
            Ok(())
        });
    }

    #[test]
    fn short_jwt_expiry_is_rejected() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "config.yaml",
                "secret_key: \"test-secret\"\nauth:\n  jwt_expiry: \"1m\"\n",
            )?;
            assert!(Config::load(&args("config.yaml")).is_err());
            Ok(())
        });
    }
}
