// Configuration module

pub mod optimizer;

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::constants::{
    CONFIG_FILE_NAME, DEFAULT_COLOR, DEFAULT_EXTENSIONS, DEFAULT_OPACITY, DEFAULT_TEXT,
    MAX_RETRY_BUDGET, PRODUCT,
};
use crate::watermark::default_font;

pub use optimizer::OptimizerConfig;

/// Errors raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Environment variable '{0}' is referenced but not set")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

fn default_extensions() -> Vec<String> {
    DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect()
}

/// User preferences shared by every run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Extensions (lowercase, no dot) picked up inside directories
    pub extensions: Vec<String>,
    /// Outline font used for text watermarks
    pub font: PathBuf,
    /// Watermark opacity, 0.0 to 1.0
    pub opacity: f32,
    /// Picture watermark, empty for none
    pub picture: PathBuf,
    /// Text watermark, empty for none
    pub text: String,
    /// Text colour, `#RGB` or `#RRGGBB`
    pub color: String,
    /// Send watermarked pictures to the compression service
    pub optimize: bool,
    /// API key of the compression service
    pub tinify_key: String,
    pub optimizer: OptimizerConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extensions: default_extensions(),
            font: default_font(),
            opacity: DEFAULT_OPACITY,
            picture: PathBuf::new(),
            text: DEFAULT_TEXT.to_string(),
            color: DEFAULT_COLOR.to_string(),
            optimize: false,
            tinify_key: String::new(),
            optimizer: OptimizerConfig::default(),
        }
    }
}

impl Config {
    /// Parse YAML after substituting `${VAR}` references from the
    /// environment. An empty document, or one that is not a mapping, yields
    /// the defaults. The result is normalized but not validated.
    pub fn from_yaml_with_env(yaml: &str) -> Result<Self, ConfigError> {
        let substituted = substitute_env(yaml)?;

        if substituted.trim().is_empty() {
            return Ok(Self::default());
        }

        let value: serde_yaml::Value = serde_yaml::from_str(&substituted)?;
        if !value.is_mapping() {
            tracing::warn!("Configuration is not a mapping, using defaults");
            return Ok(Self::default());
        }

        let mut config: Config = serde_yaml::from_value(value)?;
        config.normalize();
        Ok(config)
    }

    /// Read a configuration file. A missing file yields the defaults.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No configuration file, using defaults");
            return Ok(Self::default());
        }

        let yaml = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml_with_env(&yaml)
    }

    /// Read and validate `path`, or the file of the platform configuration
    /// directory when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_path() {
                Some(path) => Self::from_file(path)?,
                None => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    /// Replace references to files that do not exist: the font falls back
    /// to the default font, the picture is cleared.
    pub fn normalize(&mut self) {
        if !self.font.is_file() {
            if !self.font.as_os_str().is_empty() {
                tracing::warn!(font = %self.font.display(), "Font not found, using default font");
            }
            self.font = default_font();
        }

        if !self.picture.as_os_str().is_empty() && !self.picture.is_file() {
            tracing::warn!(picture = %self.picture.display(), "Watermark picture not found, ignoring it");
            self.picture = PathBuf::new();
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(ConfigError::Invalid(format!(
                "opacity must be between 0.0 and 1.0, got {}",
                self.opacity
            )));
        }

        let extension_re = Regex::new(r"^[a-z0-9]+$").map_err(|e| ConfigError::Invalid(e.to_string()))?;
        for extension in &self.extensions {
            if !extension_re.is_match(extension) {
                return Err(ConfigError::Invalid(format!(
                    "extension '{}' must be lowercase alphanumerics without dot",
                    extension
                )));
            }
        }

        let color_re = Regex::new(r"^#([0-9a-fA-F]{3}|[0-9a-fA-F]{6})$")
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !color_re.is_match(&self.color) {
            return Err(ConfigError::Invalid(format!(
                "color '{}' is not a #RGB or #RRGGBB value",
                self.color
            )));
        }

        let key_re = Regex::new(r"^[A-Za-z0-9_-]*$").map_err(|e| ConfigError::Invalid(e.to_string()))?;
        if !key_re.is_match(&self.tinify_key) {
            return Err(ConfigError::Invalid(
                "tinify_key contains invalid characters".to_string(),
            ));
        }

        if self.optimizer.retry_budget > MAX_RETRY_BUDGET {
            return Err(ConfigError::Invalid(format!(
                "optimizer.retry_budget must be at most {}, got {}",
                MAX_RETRY_BUDGET, self.optimizer.retry_budget
            )));
        }

        if self.optimizer.endpoint.is_empty() {
            return Err(ConfigError::Invalid(
                "optimizer.endpoint cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}

/// Replace `${VAR_NAME}` with environment variable values.
fn substitute_env(yaml: &str) -> Result<String, ConfigError> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").map_err(|e| ConfigError::Invalid(e.to_string()))?;

    // First, check that all referenced environment variables exist
    for caps in re.captures_iter(yaml) {
        let var_name = &caps[1];
        if std::env::var(var_name).is_err() {
            return Err(ConfigError::MissingEnvVar(var_name.to_string()));
        }
    }

    let substituted = re.replace_all(yaml, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    });
    Ok(substituted.into_owned())
}

/// Platform configuration directory of the application.
pub fn config_dir() -> Option<PathBuf> {
    let env_path = |name: &str| {
        std::env::var_os(name)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    };

    if cfg!(target_os = "windows") {
        env_path("LOCALAPPDATA").map(|p| p.join(PRODUCT))
    } else if cfg!(target_os = "macos") {
        env_path("HOME").map(|p| p.join(format!(".{}", PRODUCT)))
    } else {
        env_path("XDG_CONFIG_HOME")
            .or_else(|| env_path("HOME").map(|p| p.join(".config")))
            .map(|p| p.join(PRODUCT))
    }
}

/// Default location of the configuration file.
pub fn default_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join(CONFIG_FILE_NAME))
}
