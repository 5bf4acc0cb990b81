use crate::error::ConfigError;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const DEFAULT_CONFIG_FILE: &str = "classroom-sentinel";
const ENV_PREFIX: &str = "SENTINEL";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Configuration {
    pub period_ms: u64,
    pub classifier_timeout_ms: Option<u64>,
    pub distance_threshold: f32,
    pub gallery_dir: PathBuf,
    pub gallery_labels: Vec<String>,
    pub unrecognized_object_label: String,
    pub object_labels: HashMap<String, String>,
    pub still_image: Option<PathBuf>,
    pub log_level: String,
}

impl Default for Configuration {
    fn default() -> Self {
        Self {
            period_ms: 500,
            classifier_timeout_ms: None,
            distance_threshold: 0.5,
            gallery_dir: PathBuf::from("labels"),
            gallery_labels: Vec::new(),
            unrecognized_object_label: "Unrecognized object".to_string(),
            object_labels: HashMap::new(),
            still_image: None,
            log_level: "info".to_string(),
        }
    }
}

impl Configuration {
    /// Layers an optional TOML file and `SENTINEL__*` environment variables
    /// over the built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path.to_path_buf()).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };

        let configuration: Configuration = Config::builder()
            .add_source(file)
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("gallery_labels")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        configuration.validate()?;
        Ok(configuration)
    }

    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    /// Per-classifier deadline; one scheduler period unless configured.
    pub fn classifier_timeout(&self) -> Duration {
        Duration::from_millis(self.classifier_timeout_ms.unwrap_or(self.period_ms))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.period_ms == 0 {
            return Err(ConfigError::Invalid(
                "Cycle period must be greater than 0".to_string(),
            ));
        }

        if self.classifier_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "Classifier timeout must be greater than 0".to_string(),
            ));
        }

        if !self.distance_threshold.is_finite() || self.distance_threshold <= 0.0 {
            return Err(ConfigError::Invalid(
                "Distance threshold must be a positive number".to_string(),
            ));
        }

        if self.unrecognized_object_label.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "Unrecognized object label must not be empty".to_string(),
            ));
        }

        Ok(())
    }
}
