use crate::error::PortalError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::LazyLock;

/// Process-wide configuration, read on first access.
pub static CONFIG: LazyLock<Config> = LazyLock::new(|| {
    Config::load().unwrap_or_else(|e| panic!("failed to load configuration: {e}"))
});

/// Runtime configuration.
///
/// Sources, lowest to highest precedence:
/// - built-in defaults
/// - unprefixed `DATABASE_URL` / `PORT`
/// - `PORTAL_*` environment variables (e.g. `PORTAL_UPLOAD_DIR`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database_url: String,
    pub upload_dir: PathBuf,
    pub host: String,
    pub port: u16,
    pub loglevel: String,
    pub max_upload_bytes: u64,
    /// Reject parts whose content type is not `application/pdf`.
    pub strict_pdf_uploads: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite:portal.sqlite".to_string(),
            upload_dir: PathBuf::from("uploads"),
            host: "0.0.0.0".to_string(),
            port: 5000,
            loglevel: "info".to_string(),
            max_upload_bytes: 5 * 1024 * 1024,
            strict_pdf_uploads: false,
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::raw().only(&["DATABASE_URL", "PORT"]))
            .merge(Env::prefixed("PORTAL_"))
    }

    pub fn load() -> Result<Self, PortalError> {
        Self::figment()
            .extract()
            .map_err(|e| PortalError::Config(Box::new(e)))
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
