//! Handles settings for the application. Configuration is read from an
//! optional `saldo.toml` next to the binary; every key has a default and the
//! database URL can also come from `DATABASE_URL` / `--database-url`.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database_url: String,
    pub log_level: String,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("database_url", "sqlite:./saldo.db?mode=rwc")?
            .set_default("log_level", "info")?
            .add_source(File::with_name("saldo").required(false))
            .build()?;

        settings.try_deserialize()
    }
}
