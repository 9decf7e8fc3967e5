//! Uploader configuration.
//!
//! Values come from built-in defaults, then an optional JSON file named by
//! `PIXFLY_CONFIG`, then individual `PIXFLY_*` environment variables.

use crate::logging::redact_secret;
use crate::upload::{Credentials, DEFAULT_MAX_IMAGES};
use reqwest::Url;
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

pub const CONFIG_PATH_VAR: &str = "PIXFLY_CONFIG";
const API_BASE_URL_VAR: &str = "PIXFLY_API_BASE_URL";
const PROJ_VAR: &str = "PIXFLY_PROJ";
const SIGN_VAR: &str = "PIXFLY_SIGN";
const MAX_IMAGES_VAR: &str = "PIXFLY_MAX_IMAGES";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{var} must be a positive integer, got '{value}'")]
    InvalidNumber { var: &'static str, value: String },
    #[error("API base URL is not a valid http(s) URL: '{0}'")]
    InvalidBaseUrl(String),
    #[error("{0} must not be empty")]
    Missing(&'static str),
    #[error("max_images must be at least 1")]
    NoImagesAllowed,
}

#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UploaderConfig {
    pub api_base_url: String,
    pub proj: String,
    pub sign: String,
    pub max_images: usize,
    pub button_text: String,
    pub accent_color: String,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            api_base_url: String::new(),
            proj: String::new(),
            sign: String::new(),
            max_images: DEFAULT_MAX_IMAGES,
            button_text: "Upload Images".to_string(),
            accent_color: "#A159E1".to_string(),
        }
    }
}

impl fmt::Debug for UploaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploaderConfig")
            .field("api_base_url", &self.api_base_url)
            .field("proj", &self.proj)
            .field("sign", &redact_secret(&self.sign))
            .field("max_images", &self.max_images)
            .field("button_text", &self.button_text)
            .field("accent_color", &self.accent_color)
            .finish()
    }
}

impl UploaderConfig {
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&std::env::vars().collect())
    }

    /// Same as [`UploaderConfig::load`] with an explicit variable map.
    pub fn load_from(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let mut config = match vars.get(CONFIG_PATH_VAR).filter(|p| !p.is_empty()) {
            Some(path) => Self::from_file(PathBuf::from(path))?,
            None => Self::default(),
        };
        config.apply_env(vars)?;
        Ok(config)
    }

    pub fn from_file(path: PathBuf) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse { path, source })
    }

    fn apply_env(&mut self, vars: &HashMap<String, String>) -> Result<(), ConfigError> {
        if let Some(value) = vars.get(API_BASE_URL_VAR) {
            self.api_base_url = value.clone();
        }
        if let Some(value) = vars.get(PROJ_VAR) {
            self.proj = value.clone();
        }
        if let Some(value) = vars.get(SIGN_VAR) {
            self.sign = value.clone();
        }
        if let Some(value) = vars.get(MAX_IMAGES_VAR) {
            self.max_images = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidNumber {
                    var: MAX_IMAGES_VAR,
                    value: value.clone(),
                })?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let base_ok = Url::parse(&self.api_base_url)
            .map(|url| matches!(url.scheme(), "http" | "https"))
            .unwrap_or(false);
        if !base_ok {
            return Err(ConfigError::InvalidBaseUrl(self.api_base_url.clone()));
        }
        if self.proj.trim().is_empty() {
            return Err(ConfigError::Missing("proj"));
        }
        if self.sign.trim().is_empty() {
            return Err(ConfigError::Missing("sign"));
        }
        if self.max_images == 0 {
            return Err(ConfigError::NoImagesAllowed);
        }
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            proj: self.proj.clone(),
            sign: self.sign.clone(),
        }
    }
}
