use crate::error::{Result, SkySettleError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000";
pub const BASE_URL_ENV: &str = "SKYSETTLE_BASE_URL";

/// Client settings loaded from ~/.config/skysettle/settings.json
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the compensation service
    pub base_url: String,
    /// Give up on a request after this many seconds. Unset means wait forever.
    pub request_timeout_secs: Option<u64>,
    /// Where one-shot commands keep the last submitted flight
    pub session_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: None,
            session_file: None,
        }
    }
}

impl Settings {
    /// Load settings from disk, then apply the environment and an optional
    /// command line override, in that order of precedence.
    pub fn load(base_url_override: Option<&str>) -> Result<Self> {
        let mut settings = match config_dir() {
            Ok(dir) => Self::load_from(&dir.join("settings.json"))?,
            Err(err) => {
                tracing::warn!("Using default settings: {err}");
                Self::default()
            }
        };

        if let Ok(base_url) = std::env::var(BASE_URL_ENV) {
            settings.base_url = base_url;
        }
        if let Some(base_url) = base_url_override {
            settings.base_url = base_url.to_string();
        }

        settings.validate()?;
        Ok(settings)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|err| {
            tracing::warn!("Failed to read settings from {}: {err}", path.display());
            err
        })?;
        let mut settings: Settings = serde_json::from_str(&contents).map_err(|err| {
            tracing::warn!("Failed to parse settings from {}: {err}", path.display());
            err
        })?;

        if let Some(resolved) = substitute_env_vars(&settings.base_url) {
            settings.base_url = resolved;
        }
        let session_file = settings
            .session_file
            .as_deref()
            .and_then(Path::to_str)
            .and_then(substitute_env_vars);
        if let Some(resolved) = session_file {
            settings.session_file = Some(PathBuf::from(resolved));
        }

        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url).map_err(|err| {
            SkySettleError::Config(format!("Invalid base URL '{}': {err}", self.base_url))
        })?;
        if self.request_timeout_secs == Some(0) {
            return Err(SkySettleError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn session_file(&self) -> PathBuf {
        self.session_file.clone().unwrap_or_else(default_session_file)
    }
}

/// Directory holding settings.json
pub fn config_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| {
        SkySettleError::Config("Could not determine home directory".to_string())
    })?;
    Ok(home.join(".config").join("skysettle"))
}

/// Directory for logs and the one-shot session file
pub fn cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("skysettle")
}

fn default_session_file() -> PathBuf {
    cache_dir().join("session.json")
}

/// Replace `${VAR}` references with environment values.
/// Returns None if nothing was substituted or a variable is unset.
fn substitute_env_vars(input: &str) -> Option<String> {
    let mut result = input.to_string();
    let mut changed = false;
    let mut search_from = 0;
    while let Some(offset) = result[search_from..].find("${") {
        let start = search_from + offset;
        let end = start + result[start..].find('}')?;
        let var_name = &result[start + 2..end];
        let var_value = std::env::var(var_name).ok()?;
        result.replace_range(start..=end, &var_value);
        // Substituted values are not scanned again
        search_from = start + var_value.len();
        changed = true;
    }

    if changed {
        Some(result)
    } else {
        None
    }
}
