//! Handles settings for the application. Configuration is written in
//! `settings.toml`.

use config::{Config, ConfigError, File};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    Memory,
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
}

#[derive(Debug, Deserialize)]
pub struct Server {
    pub bind: Option<String>,
    pub port: u16,
    pub database: Database,
    /// Static bearer token expected from the gateway; open when unset.
    pub token: Option<String>,
}

/// Chat gateway the engine talks to for all outbound messaging.
#[derive(Debug, Deserialize)]
pub struct Gateway {
    pub url: String,
    pub link_base: String,
}

#[derive(Debug, Deserialize)]
pub struct Economy {
    pub starting_money: Option<i64>,
    pub weekly_money: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub app: App,
    pub server: Server,
    pub gateway: Gateway,
    pub economy: Option<Economy>,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("settings"))
            .build()?;

        settings.try_deserialize()
    }
}
