//! Handles settings for the application.
//!
//! Values come from an optional `settings.toml` in the working directory,
//! overridden by `COFFER__*` environment variables
//! (e.g. `COFFER__SERVER__PORT=3000`).
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct App {
    /// Log level applied to every workspace crate.
    pub level: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    /// Path of the SQLite file, created if missing.
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    /// Basic auth client credentials.
    pub username: String,
    pub password: String,
}

/// Currency seeded as default when the catalog is empty.
#[derive(Debug, Deserialize)]
pub struct DefaultCurrency {
    pub code: String,
    pub name: String,
    pub sign: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub database: Database,
    pub server: Option<Server>,
    pub currency: DefaultCurrency,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .set_default("app.level", "info")?
            .set_default("database", "memory")?
            .set_default("currency.code", "USD")?
            .set_default("currency.name", "US Dollar")?
            .set_default("currency.sign", "$")?
            .add_source(File::with_name("settings").required(false))
            .add_source(
                Environment::with_prefix("COFFER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}
