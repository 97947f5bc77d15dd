use std::{
    fs, io,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::Deserialize;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "doc_console.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub api_base: String,
    pub username: String,
    pub patient_id: String,
    pub download_dir: PathBuf,
    pub notification_duration_ms: u64,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:8000".into(),
            username: "alice".into(),
            patient_id: "patient-123".into(),
            download_dir: default_download_dir(),
            notification_duration_ms: 5000,
        }
    }
}

impl ClientSettings {
    pub fn notification_duration(&self) -> Duration {
        Duration::from_millis(self.notification_duration_ms)
    }

    pub fn api_base_url(&self) -> Result<Url, SettingsError> {
        parse_api_base(&self.api_base)
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("failed to read config file '{}'", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse config file '{}'", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid api base '{value}'")]
    InvalidApiBase {
        value: String,
        #[source]
        source: url::ParseError,
    },
    #[error("api base '{0}' must use http or https")]
    UnsupportedScheme(String),
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_base: Option<String>,
    username: Option<String>,
    patient_id: Option<String>,
    download_dir: Option<PathBuf>,
    notification_duration_ms: Option<u64>,
}

/// Defaults, then the config file (explicit path or `doc_console.toml` when
/// present), then environment overrides.
pub fn load_settings(config_path: Option<&Path>) -> Result<ClientSettings, SettingsError> {
    let mut settings = ClientSettings::default();

    let path = config_path.unwrap_or_else(|| Path::new(DEFAULT_CONFIG_FILE));
    match fs::read_to_string(path) {
        Ok(raw) => apply_file(&mut settings, path, &raw)?,
        Err(err) if err.kind() == io::ErrorKind::NotFound && config_path.is_none() => {}
        Err(source) => {
            return Err(SettingsError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    apply_env(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

fn apply_file(settings: &mut ClientSettings, path: &Path, raw: &str) -> Result<(), SettingsError> {
    let file_cfg: FileSettings = toml::from_str(raw).map_err(|source| SettingsError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    if let Some(v) = file_cfg.api_base {
        settings.api_base = v;
    }
    if let Some(v) = file_cfg.username {
        settings.username = v;
    }
    if let Some(v) = file_cfg.patient_id {
        settings.patient_id = v;
    }
    if let Some(v) = file_cfg.download_dir {
        settings.download_dir = v;
    }
    if let Some(v) = file_cfg.notification_duration_ms {
        settings.notification_duration_ms = v;
    }
    Ok(())
}

fn apply_env(settings: &mut ClientSettings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("DOCS_API_BASE") {
        settings.api_base = v;
    }
    if let Some(v) = lookup("APP__API_BASE") {
        settings.api_base = v;
    }

    if let Some(v) = lookup("DOCS_USERNAME") {
        settings.username = v;
    }
    if let Some(v) = lookup("DOCS_PATIENT_ID") {
        settings.patient_id = v;
    }
    if let Some(v) = lookup("DOCS_DOWNLOAD_DIR") {
        settings.download_dir = PathBuf::from(v);
    }

    if let Some(v) = lookup("DOCS_NOTIFICATION_MS") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.notification_duration_ms = parsed;
        }
    }
}

pub fn parse_api_base(raw: &str) -> Result<Url, SettingsError> {
    let raw = raw.trim();
    let url = Url::parse(raw).map_err(|source| SettingsError::InvalidApiBase {
        value: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(SettingsError::UnsupportedScheme(raw.to_string())),
    }
}

fn default_download_dir() -> PathBuf {
    dirs::download_dir()
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
