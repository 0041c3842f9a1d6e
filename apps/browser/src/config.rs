use std::{fs, io, path::Path, time::Duration};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_API_URL: &str = "http://localhost:5000/api";
pub const SETTINGS_FILE: &str = "browser.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub api_url: String,
    pub page_size: u32,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            page_size: client_core::view::LISTING_PAGE_SIZE,
            request_timeout_secs: None,
            log_filter: "info".into(),
        }
    }
}

impl Settings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    api_url: Option<String>,
    page_size: Option<u32>,
    request_timeout_secs: Option<u64>,
    log_filter: Option<String>,
}

pub fn load_settings() -> anyhow::Result<Settings> {
    load_settings_from(Path::new(SETTINGS_FILE), |key| std::env::var(key).ok())
}

/// Defaults, then the settings file if present, then the environment.
pub fn load_settings_from(
    path: &Path,
    env: impl Fn(&str) -> Option<String>,
) -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    match fs::read_to_string(path) {
        Ok(raw) => {
            let file_cfg: FileSettings = toml::from_str(&raw)
                .with_context(|| format!("failed to parse settings file '{}'", path.display()))?;
            if let Some(v) = file_cfg.api_url {
                settings.api_url = v;
            }
            if let Some(v) = file_cfg.page_size {
                settings.page_size = v;
            }
            if let Some(v) = file_cfg.request_timeout_secs {
                settings.request_timeout_secs = Some(v);
            }
            if let Some(v) = file_cfg.log_filter {
                settings.log_filter = v;
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err)
                .with_context(|| format!("failed to read settings file '{}'", path.display()))
        }
    }

    if let Some(v) = env("CONTENT_API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__API_URL") {
        settings.api_url = v;
    }
    if let Some(v) = env("APP__PAGE_SIZE") {
        settings.page_size = v
            .trim()
            .parse()
            .with_context(|| format!("APP__PAGE_SIZE must be a positive integer, got '{v}'"))?;
    }
    if let Some(v) = env("APP__REQUEST_TIMEOUT_SECS") {
        settings.request_timeout_secs = Some(v.trim().parse().with_context(|| {
            format!("APP__REQUEST_TIMEOUT_SECS must be a number of seconds, got '{v}'")
        })?);
    }
    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    if settings.page_size == 0 {
        bail!("page size must be at least 1");
    }
    settings.api_url = normalize_api_url(&settings.api_url)?;
    Ok(settings)
}

pub fn normalize_api_url(raw_api_url: &str) -> anyhow::Result<String> {
    let raw_api_url = raw_api_url.trim();
    if raw_api_url.is_empty() {
        return Ok(DEFAULT_API_URL.to_string());
    }

    let with_scheme = if raw_api_url.contains("://") {
        raw_api_url.to_string()
    } else {
        format!("http://{raw_api_url}")
    };
    let normalized = with_scheme.trim_end_matches('/').to_string();

    let parsed = Url::parse(&normalized)
        .with_context(|| format!("invalid article store URL '{raw_api_url}'"))?;
    if parsed.cannot_be_a_base() || parsed.host_str().is_none() {
        bail!("article store URL '{raw_api_url}' has no host");
    }
    Ok(normalized)
}
