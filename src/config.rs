use std::{env, path::PathBuf};

const DEFAULT_PORT: u16 = 5000;
const DEFAULT_DATA_PATH: &str = "data/crm.json";

/// Process settings read once from the environment.
///
/// | Env Var         | Default          |
/// |-----------------|------------------|
/// | `PORT`          | `5000`           |
/// | `CRM_DATA_PATH` | `data/crm.json`  |
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub data_path: PathBuf,
}

impl Config {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|value| value.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);

        let data_path = env::var("CRM_DATA_PATH")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DATA_PATH));

        Self { port, data_path }
    }
}
