use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::debug;
use url::Url;

pub const ORIGIN_ENV: &str = "AIDBOARD_SITE_ORIGIN";
pub const SITE_NAME_ENV: &str = "AIDBOARD_SITE_NAME";

pub const DEFAULT_VALIDITY_DAYS: i64 = 30;
pub const VALIDITY_DAYS_RANGE: RangeInclusive<i64> = 1..=3650;

/// Site-wide settings for URL building and structured-data defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    /// Canonical origin, e.g. `https://aidboard.org`.
    pub origin: String,
    pub site_name: String,
    /// Aggregator hosts whose job URLs are used verbatim as `sameAs`.
    pub trusted_hosts: Vec<String>,
    pub default_industry: String,
    pub default_occupational_category: String,
    /// `validThrough` fallback when a job has no deadline.
    pub validity_days: i64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            origin: "https://aidboard.org".to_string(),
            site_name: "AidBoard".to_string(),
            trusted_hosts: vec![
                "reliefweb.int".to_string(),
                "unjobs.org".to_string(),
                "impactpool.org".to_string(),
                "devex.com".to_string(),
            ],
            default_industry: "Humanitarian Aid".to_string(),
            default_occupational_category: "Humanitarian Work".to_string(),
            validity_days: DEFAULT_VALIDITY_DAYS,
        }
    }
}

impl SiteConfig {
    /// Defaults, then the config file if one exists, then environment overrides.
    pub fn load() -> Result<Self> {
        let mut config = match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path)?,
            _ => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "aidboard")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        debug!(path = %path.display(), "loaded site config");
        Self::from_toml_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Failed to parse TOML")?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !VALIDITY_DAYS_RANGE.contains(&self.validity_days) {
            return Err(anyhow!(
                "validity_days must be between {} and {}, got {}",
                VALIDITY_DAYS_RANGE.start(),
                VALIDITY_DAYS_RANGE.end(),
                self.validity_days
            ));
        }
        Ok(())
    }

    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(origin) = lookup(ORIGIN_ENV).filter(|v| !v.trim().is_empty()) {
            self.origin = origin;
        }
        if let Some(name) = lookup(SITE_NAME_ENV).filter(|v| !v.trim().is_empty()) {
            self.site_name = name;
        }
    }

    pub fn with_origin(mut self, origin: String) -> Self {
        self.origin = origin;
        self
    }

    /// Origin without a trailing slash, ready for joining with a path.
    pub fn origin(&self) -> &str {
        self.origin.trim_end_matches('/')
    }

    pub fn absolute_url(&self, path: &str) -> String {
        format!("{}{}", self.origin(), path)
    }

    /// True when the URL's host is a trusted aggregator or a subdomain of one.
    pub fn is_trusted_url(&self, url: &str) -> bool {
        let Some(host) = url_host(url) else {
            return false;
        };
        self.trusted_hosts.iter().any(|trusted| {
            let trusted = trusted.to_lowercase();
            host == trusted || host.ends_with(&format!(".{}", trusted))
        })
    }
}

/// Lower-cased host of an http(s) URL, parsed the way browsers do, so a
/// backslash ends the authority. A trailing root dot is dropped.
pub fn url_host(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return None;
    }
    let host = parsed.host_str()?.trim_end_matches('.');
    (!host.is_empty()).then(|| host.to_lowercase())
}
