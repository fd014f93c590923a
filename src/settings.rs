use std::env;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use anyhow::Context;

use config::{Config, Environment, File};

use lettre::message::Mailbox;
use lettre::Address;

use secrecy::Secret;

use serde::Deserialize;
use serde_aux::prelude::*;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use crate::client::SmtpCredentials;
use crate::cors::AllowedOrigins;

/// Flat environment variables accepted as overrides, and the setting each one maps to
const FLAT_ENV_OVERRIDES: [(&str, &str); 10] = [
    ("PORT", "app.port"),
    ("CLIENT_ORIGIN", "app.allowed_origins"),
    ("DATABASE_URL", "database.url"),
    ("SMTP_HOST", "email.smtp_host"),
    ("SMTP_PORT", "email.smtp_port"),
    ("SMTP_USER", "email.smtp_username"),
    ("SMTP_PASS", "email.smtp_password"),
    ("FROM_NAME", "email.from_name"),
    ("FROM_EMAIL", "email.from_email"),
    ("ADMIN_EMAIL", "email.admin_email"),
];

/// Runtime environment, either `Dev` for local development, or `Prod` for release
#[derive(Debug)]
pub enum Runtime {
    Dev,
    Prod,
}

impl Runtime {
    pub fn as_str(&self) -> &str {
        match self {
            Runtime::Dev => "dev",
            Runtime::Prod => "prod",
        }
    }
}

impl TryFrom<String> for Runtime {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Self::Dev),
            "prod" => Ok(Self::Prod),
            other => anyhow::bail!("{} is not a valid runtime environment", other),
        }
    }
}

/// Application settings wrapper
#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: ApplicationSettings,
    pub database: DatabaseSettings,
    pub email: EmailSettings,
}

impl Settings {
    /// Load application settings from the settings directory
    pub fn load() -> anyhow::Result<Self> {
        // Get the path to the settings directory
        let path = env::current_dir()?.join("settings");
        // Get the current environment based on the `APP_ENV` environment variable, default to `Dev`
        let runtime: Runtime = env::var("APP_ENV")
            .unwrap_or_else(|_| "dev".into())
            .try_into()?;

        Self::load_from(runtime, &path)
    }
    /// Load application settings from a specified path and runtime
    pub fn load_from(runtime: Runtime, base_path: &Path) -> anyhow::Result<Self> {
        let mut builder = Config::builder()
            // Include the base settings
            .add_source(File::from(base_path.join("base")).required(true))
            // Include the runtime settings
            .add_source(File::from(base_path.join(runtime.as_str())).required(true))
            // Override/include any settings from environment variables
            // NOTE: Should be used for any prod secrets. Takes the form `APP_<settings category>__<setting name>`.
            .add_source(
                Environment::with_prefix("app")
                    .prefix_separator("_")
                    .separator("__"),
            );
        // Flat variables (`PORT`, `SMTP_HOST`, ...) take precedence over everything else
        for (var, key) in FLAT_ENV_OVERRIDES {
            builder = builder.set_override_option(key, env::var(var).ok())?;
        }

        builder
            .build()?
            .try_deserialize()
            .context("Failed to load/deserialize settings")
    }
}

/// Treat empty strings from the environment as unset
fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[derive(Debug, Deserialize)]
pub struct ApplicationSettings {
    host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
    /// Comma-separated origins allowed in addition to the development ones
    #[serde(default)]
    allowed_origins: String,
}

impl ApplicationSettings {
    /// The application address to bind to
    pub fn addr(&self) -> (&str, u16) {
        (&self.host, self.port)
    }
    /// Origins permitted to make cross-origin requests
    pub fn allowed_origins(&self) -> AllowedOrigins {
        AllowedOrigins::with_extra(&self.allowed_origins)
    }
}

#[derive(Debug, Deserialize)]
pub struct DatabaseSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    port: u16,
    host: String,
    name: String,
    username: String,
    password: Secret<String>,
    require_ssl: bool,
    /// Full connection string, replaces the individual fields when set
    #[serde(default)]
    url: Option<Secret<String>>,
}

impl DatabaseSettings {
    /// The database connection options, without specifying the database name
    pub fn without_db(&self) -> PgConnectOptions {
        use secrecy::ExposeSecret;

        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .port(self.port)
            .host(&self.host)
            .ssl_mode(ssl_mode)
            .username(&self.username)
            .password(self.password.expose_secret())
    }
    /// The database connection options, with the database name
    pub fn with_db(&self) -> PgConnectOptions {
        self.without_db().database(&self.name)
    }
    /// The connection options to use, preferring the connection string if one is configured
    pub fn connect_options(&self) -> anyhow::Result<PgConnectOptions> {
        use secrecy::ExposeSecret;

        match self.url.as_ref().map(|url| url.expose_secret().trim()) {
            Some(url) if !url.is_empty() => {
                PgConnectOptions::from_str(url).context("Failed to parse database URL")
            }
            _ => Ok(self.with_db()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EmailSettings {
    organization: String,
    smtp_host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    smtp_port: u16,
    smtp_username: String,
    smtp_password: Secret<String>,
    #[serde(default)]
    from_name: Option<String>,
    #[serde(default)]
    from_email: Option<String>,
    #[serde(default)]
    admin_email: Option<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    timeout_milliseconds: u64,
}

impl EmailSettings {
    /// Organization name used in subjects and email bodies
    pub fn organization(&self) -> &str {
        &self.organization
    }
    /// The SMTP relay to connect to
    pub fn smtp_addr(&self) -> (&str, u16) {
        (&self.smtp_host, self.smtp_port)
    }
    pub fn smtp_username(&self) -> &str {
        &self.smtp_username
    }
    /// Whether an SMTP password has been configured at all
    pub fn has_smtp_password(&self) -> bool {
        use secrecy::ExposeSecret;

        !self.smtp_password.expose_secret().is_empty()
    }
    pub fn credentials(&self) -> SmtpCredentials {
        SmtpCredentials {
            username: self.smtp_username.clone(),
            password: self.smtp_password.clone(),
        }
    }
    /// The SMTP transport timeout duration
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_milliseconds)
    }
    /// The address emails are sent from, defaulting to the SMTP account
    pub fn from_email(&self) -> &str {
        non_empty(&self.from_email).unwrap_or(&self.smtp_username)
    }
    /// The administrator copied on every confirmation, defaulting to the sender
    pub fn admin_email(&self) -> &str {
        non_empty(&self.admin_email).unwrap_or_else(|| self.from_email())
    }
    /// The sender mailbox, e.g. `"TimTom Health Care" <bookings@timtom.ca>`
    pub fn sender(&self) -> anyhow::Result<Mailbox> {
        let name = non_empty(&self.from_name).unwrap_or(&self.organization);
        let address: Address = self
            .from_email()
            .parse()
            .with_context(|| format!("Failed to parse sender address {:?}", self.from_email()))?;

        Ok(Mailbox::new(Some(name.to_string()), address))
    }
}
