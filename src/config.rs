use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::ConfigError;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub http: HttpSettings,
    pub enrichment: EnrichmentSettings,
    pub logging: LoggingSettings,
    pub run: RunSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    /// Merged over the built-in User-Agent / Accept-Language headers.
    pub headers: HashMap<String, String>,
    /// Per-request timeout in seconds.
    pub timeout: u64,
    /// Max fetches in flight.
    pub concurrency: usize,
}

impl Default for HttpSettings {
    fn default() -> Self {
        HttpSettings {
            headers: HashMap::new(),
            timeout: 20,
            concurrency: 8,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichmentSettings {
    pub enable_company_enrichment: bool,
}

impl Default for EnrichmentSettings {
    fn default() -> Self {
        EnrichmentSettings {
            enable_company_enrichment: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        LoggingSettings {
            level: "info".into(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RunSettings {
    /// Stop issuing new fetches after this many seconds.
    pub deadline_secs: Option<u64>,
}

impl Settings {
    /// Load the JSON settings file with `JOBS_` environment overrides
    /// (`JOBS_HTTP__TIMEOUT=30`). Never fails: a missing or broken file
    /// yields defaults plus the problem, so the caller can log it once
    /// logging is up.
    pub fn load(path: &Path) -> (Settings, Option<ConfigError>) {
        let missing = !path.exists();
        let built = Config::builder()
            .add_source(File::from(path).format(FileFormat::Json).required(false))
            .add_source(
                Environment::with_prefix("JOBS")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .and_then(|c| c.try_deserialize::<Settings>());

        match built {
            Ok(settings) if missing => (
                settings,
                Some(ConfigError::Missing(path.display().to_string())),
            ),
            Ok(settings) => (settings, None),
            Err(e) => (Settings::default(), Some(ConfigError::Invalid(e))),
        }
    }
}
