use crate::error::AppError;
use config::{Config as Cfg, File};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    5000
}

impl Config {
    /// Load the common section from `configuration.*`, `APP__*` variables and
    /// the bare `PORT` variable, in increasing order of precedence.
    pub fn load() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let config = Cfg::builder()
            .add_source(File::with_name("configuration").required(false))
            .add_source(config::Environment::with_prefix("APP").separator("__"))
            .set_override_option("port", env::var("PORT").ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
