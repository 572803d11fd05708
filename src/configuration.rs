use std::fmt;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub auth: AuthSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

impl ApplicationSettings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("username", &self.username)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_name", &self.database_name)
            .finish()
    }
}

/// Authentication settings
#[derive(serde::Deserialize, Clone)]
pub struct AuthSettings {
    /// HMAC signing secret, constant for the process lifetime
    pub jwt_secret: String,
    /// Upper bound for a single storage call
    #[serde(default = "default_store_timeout_ms")]
    pub store_timeout_ms: u64,
    /// bcrypt cost for newly hashed passwords
    #[serde(default = "default_password_cost")]
    pub password_cost: u32,
}

/// Lowest bcrypt cost accepted for password hashing
pub const MIN_PASSWORD_COST: u32 = 4;
/// Highest bcrypt cost accepted for password hashing
pub const MAX_PASSWORD_COST: u32 = 31;

fn default_store_timeout_ms() -> u64 {
    5000
}

fn default_password_cost() -> u32 {
    bcrypt::DEFAULT_COST
}

impl AuthSettings {
    pub fn new(jwt_secret: impl Into<String>) -> Self {
        Self {
            jwt_secret: jwt_secret.into(),
            store_timeout_ms: default_store_timeout_ms(),
            password_cost: default_password_cost(),
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }

    /// Reject settings the auth core cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.trim().is_empty() {
            return Err(ConfigError::MissingRequired("auth.jwt_secret".to_string()));
        }
        if !(MIN_PASSWORD_COST..=MAX_PASSWORD_COST).contains(&self.password_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "auth.password_cost must be between {} and {}",
                MIN_PASSWORD_COST,
                MAX_PASSWORD_COST
            )));
        }
        if self.store_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "auth.store_timeout_ms must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

// The secret never reaches a log line
impl fmt::Debug for AuthSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthSettings")
            .field("jwt_secret", &"[redacted]")
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("password_cost", &self.password_cost)
            .finish()
    }
}

pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let settings = config::Config::builder()
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(config::Environment::with_prefix("APP").separator("__"))
        .build()?;
    settings.try_deserialize::<Settings>()
}
