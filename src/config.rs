//! Run configuration: service endpoint, template files, authorization token,
//! and overrides for the conversion constants.
//!
//! ```toml
//! [service]
//! url = "http://localhost:8080/52n-sos-webapp/service"
//! timeout_secs = 30
//!
//! [templates]
//! insert_sensor = "templates/InsertSensor_template.xml"
//! insert_observation = "templates/InsertObservation_template.xml"
//!
//! [authorization]
//! token_file = "authorization.properties"
//!
//! [constants]
//! offering_name = "TalsimResult"
//! ```
//!
//! Relative paths are resolved against the directory holding the config file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::model::ConversionConstants;
use crate::request::RequestTemplates;
use crate::transport::{DEFAULT_ACCEPT_LANGUAGE, RequestHeaders};

/// Environment variable that overrides `[authorization] token_file`.
pub const TOKEN_ENV_VAR: &str = "SOS_AUTHORIZATION_TOKEN";

/// Key looked up in the token properties file.
pub const TOKEN_PROPERTY: &str = "token";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid configuration {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("no authorization token: set SOS_AUTHORIZATION_TOKEN or [authorization] token_file")]
    MissingToken,
    #[error("token file {} has no 'token=' entry", .0.display())]
    TokenNotInFile(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServiceConfig {
    pub url: String,
    #[serde(default = "default_accept_language")]
    pub accept_language: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_accept_language() -> String {
    DEFAULT_ACCEPT_LANGUAGE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

impl ServiceConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TemplatePaths {
    pub insert_sensor: PathBuf,
    pub insert_observation: PathBuf,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AuthorizationConfig {
    #[serde(default)]
    pub token_file: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Config {
    pub service: ServiceConfig,
    pub templates: TemplatePaths,
    #[serde(default)]
    pub authorization: AuthorizationConfig,
    #[serde(default)]
    pub constants: ConversionConstants,
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = read(path)?;
        let mut config = Self::from_toml(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.rebase_paths(path);
        Ok(config)
    }

    /// Parse without touching the filesystem; paths stay as written.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    fn rebase_paths(&mut self, path: &Path) {
        let base = path.parent().unwrap_or_else(|| Path::new("."));
        self.templates.insert_sensor = join_base(base, &self.templates.insert_sensor);
        self.templates.insert_observation = join_base(base, &self.templates.insert_observation);
        if let Some(token_file) = &mut self.authorization.token_file {
            *token_file = join_base(base, token_file);
        }
    }

    /// Read both template files. Content is kept byte-for-byte.
    pub fn load_templates(&self) -> Result<RequestTemplates, ConfigError> {
        Ok(RequestTemplates {
            insert_sensor: read(&self.templates.insert_sensor)?,
            insert_observation: read(&self.templates.insert_observation)?,
        })
    }

    /// Token from `SOS_AUTHORIZATION_TOKEN` (a `.env` file counts), falling
    /// back to the configured token file.
    pub fn resolve_token(&self) -> Result<String, ConfigError> {
        dotenv::dotenv().ok();
        self.resolve_token_with(env::var(TOKEN_ENV_VAR).ok())
    }

    pub fn resolve_token_with(&self, from_env: Option<String>) -> Result<String, ConfigError> {
        if let Some(token) = from_env.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            return Ok(token);
        }
        match &self.authorization.token_file {
            Some(path) => {
                let text = read(path)?;
                token_from_properties(&text).ok_or_else(|| ConfigError::TokenNotInFile(path.clone()))
            }
            None => Err(ConfigError::MissingToken),
        }
    }

    pub fn request_headers(&self, token: String) -> RequestHeaders {
        RequestHeaders {
            authorization: token,
            accept_language: self.service.accept_language.clone(),
        }
    }
}

fn join_base(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Value of the `token` key in Java-style properties text.
///
/// Accepts `=` or `:` as separator and skips `#`/`!` comment lines. An empty
/// value counts as absent.
pub fn token_from_properties(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#') && !line.starts_with('!'))
        .find_map(|line| {
            let (key, value) = line.split_once(['=', ':'])?;
            (key.trim() == TOKEN_PROPERTY).then(|| value.trim().to_string())
        })
        .filter(|token| !token.is_empty())
}
