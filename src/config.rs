use std::time::Duration;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment};
use serde::Deserialize;

#[derive(Deserialize, Clone)]
pub struct AppConfig {
    pub telegram_token: String,
    pub deepseek_api_key: String,
    pub deepseek_api_base: String,
    pub deepseek_model: String,
    database_url: Option<String>,
    postgres_user: Option<String>,
    postgres_password: Option<String>,
    postgres_db: Option<String>,
    postgres_host: String,
    postgres_port: u16,
    coaching_timeout_secs: u64,
    coaching_cooldown_secs: u64,
    pending_input_ttl_secs: u64,
}

impl AppConfig {
    /// Reads the process environment. Fails if a required variable is missing
    /// or no database connection string can be put together.
    pub fn load() -> Result<AppConfig, ConfigError> {
        Self::from_builder(Config::builder().add_source(Environment::default().try_parsing(true)))
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<AppConfig, ConfigError> {
        let config: AppConfig = builder
            .set_default("deepseek_api_base", "https://api.deepseek.com/v1")?
            .set_default("deepseek_model", "deepseek-chat")?
            .set_default("postgres_host", "localhost")?
            .set_default("postgres_port", 5432)?
            .set_default("coaching_timeout_secs", 30)?
            .set_default("coaching_cooldown_secs", 3600)?
            .set_default("pending_input_ttl_secs", 600)?
            .build()?
            .try_deserialize()?;

        config.database_url()?;
        Ok(config)
    }

    /// `DATABASE_URL` wins; otherwise the url is assembled from the `POSTGRES_*` credentials.
    pub fn database_url(&self) -> Result<String, ConfigError> {
        if let Some(url) = self.database_url.as_ref().filter(|u| !u.is_empty()) {
            return Ok(url.clone());
        }

        match (&self.postgres_user, &self.postgres_password, &self.postgres_db) {
            (Some(user), Some(password), Some(db)) => Ok(format!(
                "postgres://{}:{}@{}:{}/{}",
                user, password, self.postgres_host, self.postgres_port, db
            )),
            _ => Err(ConfigError::Message(
                "set DATABASE_URL or all of POSTGRES_USER, POSTGRES_PASSWORD and POSTGRES_DB"
                    .to_string(),
            )),
        }
    }

    pub fn coaching_timeout(&self) -> Duration {
        Duration::from_secs(self.coaching_timeout_secs)
    }

    pub fn coaching_cooldown(&self) -> Duration {
        Duration::from_secs(self.coaching_cooldown_secs)
    }

    pub fn pending_input_ttl(&self) -> Duration {
        Duration::from_secs(self.pending_input_ttl_secs)
    }
}
