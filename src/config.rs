use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::attachments::AttachmentLimits;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub backend: BackendConfig,
    pub uploads: UploadsConfig,
    #[serde(default)]
    pub form: FormConfig,
    pub ui: UiConfig,
    pub paths: PathsConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Where the assembled application is posted
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Form action URL receiving the multipart payload
    pub endpoint: String,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_user_agent() -> String {
    format!("hireform/{}", env!("CARGO_PKG_VERSION"))
}

/// Remote attachment staging and selection limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadsConfig {
    /// Stage attachments on the upload service before submitting.
    /// When false, raw files are posted to the backend directly.
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_upload_base_url")]
    pub base_url: String,
    /// Account (cloud) identifier forming part of the upload URL
    #[serde(default)]
    pub account_id: String,
    /// Unsigned upload preset sent with every file
    #[serde(default)]
    pub upload_preset: String,
    /// Text field carrying the newline-joined reference URLs
    #[serde(default = "default_reference_field")]
    pub reference_field: String,
    /// Name of the file input whose raw entries are replaced by references
    #[serde(default = "default_file_field")]
    pub file_field: String,
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    /// Enforce `max_total_bytes`; when false only the file count is checked
    #[serde(default = "default_true")]
    pub enforce_total_size: bool,
    #[serde(default = "default_max_total_bytes")]
    pub max_total_bytes: u64,
}

fn default_true() -> bool {
    true
}

fn default_upload_base_url() -> String {
    "https://api.cloudinary.com".to_string()
}

fn default_reference_field() -> String {
    "Attached Documents".to_string()
}

fn default_file_field() -> String {
    "attachment[]".to_string()
}

fn default_max_files() -> usize {
    10
}

fn default_max_total_bytes() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

impl UploadsConfig {
    /// Full upload URL: `<base>/v1_1/<account>/upload`
    pub fn upload_url(&self) -> String {
        format!(
            "{}/v1_1/{}/upload",
            self.base_url.trim_end_matches('/'),
            self.account_id
        )
    }

    pub fn limits(&self) -> AttachmentLimits {
        AttachmentLimits {
            max_files: self.max_files,
            max_total_bytes: self
                .enforce_total_size
                .then_some(self.max_total_bytes),
        }
    }
}

impl Default for UploadsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: default_upload_base_url(),
            account_id: String::new(),
            upload_preset: String::new(),
            reference_field: default_reference_field(),
            file_field: default_file_field(),
            max_files: default_max_files(),
            enforce_total_size: true,
            max_total_bytes: default_max_total_bytes(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormConfig {
    /// Path to a TOML form definition; the embedded application is used when unset
    #[serde(default)]
    pub definition: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiConfig {
    pub tick_rate_ms: u64,
    /// Label of the submit control when idle
    #[serde(default = "default_submit_label")]
    pub submit_label: String,
}

fn default_submit_label() -> String {
    "Submit Application".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    pub state: String,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to log to file in TUI mode (false = stderr for debugging)
    #[serde(default = "default_log_to_file")]
    pub to_file: bool,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_to_file() -> bool {
    true
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            to_file: default_log_to_file(),
        }
    }
}

impl Config {
    /// Project-local config file, picked up from the working directory
    pub fn local_config_path() -> PathBuf {
        PathBuf::from("hireform.toml")
    }

    pub fn load(config_path: Option<&str>) -> Result<Self> {
        // Start with embedded defaults so hireform works without config files
        let defaults = Config::default();
        let defaults_json =
            serde_json::to_string(&defaults).context("Failed to serialize default config")?;

        let mut builder = config::Config::builder().add_source(config::File::from_str(
            &defaults_json,
            config::FileFormat::Json,
        ));

        let local_config = Self::local_config_path();
        if local_config.exists() {
            builder = builder.add_source(config::File::from(local_config));
        }

        // User config in ~/.config/hireform/ (optional global overrides)
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("hireform").join("config.toml");
            if user_config.exists() {
                builder = builder.add_source(config::File::from(user_config));
            }
        }

        // Explicit config file (CLI override)
        if let Some(path) = config_path {
            builder = builder.add_source(config::File::with_name(path));
        }

        // Environment variables with HIREFORM_ prefix
        builder = builder.add_source(
            config::Environment::with_prefix("HIREFORM")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to load configuration")?;
        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Get absolute path to state directory
    pub fn state_path(&self) -> PathBuf {
        let path = PathBuf::from(&self.paths.state);
        if path.is_absolute() {
            path
        } else {
            std::env::current_dir().unwrap_or_default().join(path)
        }
    }

    /// Get absolute path to logs directory
    pub fn logs_path(&self) -> PathBuf {
        self.state_path().join("logs")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig {
                endpoint: "http://localhost:8080/applications".to_string(),
                user_agent: default_user_agent(),
            },
            uploads: UploadsConfig::default(),
            form: FormConfig::default(),
            ui: UiConfig {
                tick_rate_ms: 100,
                submit_label: default_submit_label(),
            },
            paths: PathsConfig {
                state: ".hireform".to_string(),
            },
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_limits_enforce_size() {
        let config = Config::default();
        let limits = config.uploads.limits();
        assert_eq!(limits.max_files, 10);
        assert_eq!(limits.max_total_bytes, Some(10 * 1024 * 1024));
    }

    #[test]
    fn test_count_only_limits() {
        let uploads = UploadsConfig {
            enforce_total_size: false,
            ..UploadsConfig::default()
        };
        assert_eq!(uploads.limits().max_total_bytes, None);
    }

    #[test]
    fn test_upload_url_format() {
        let uploads = UploadsConfig {
            base_url: "https://api.example.com/".to_string(),
            account_id: "acme".to_string(),
            ..UploadsConfig::default()
        };
        assert_eq!(uploads.upload_url(), "https://api.example.com/v1_1/acme/upload");
    }

    #[test]
    fn test_load_explicit_file_overrides_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[backend]
endpoint = "https://forms.example.com/f/abc"

[uploads]
enabled = false
max_files = 3
"#,
        )
        .unwrap();

        let config = Config::load(Some(path.to_str().unwrap())).unwrap();
        assert_eq!(config.backend.endpoint, "https://forms.example.com/f/abc");
        assert!(!config.uploads.enabled);
        assert_eq!(config.uploads.max_files, 3);
        // Untouched keys keep their defaults
        assert_eq!(config.uploads.reference_field, "Attached Documents");
        assert_eq!(config.ui.submit_label, "Submit Application");
    }

    #[test]
    fn test_logs_path_under_state() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.paths.state = temp_dir.path().to_string_lossy().to_string();
        assert!(config.logs_path().starts_with(temp_dir.path()));
        assert!(config.logs_path().ends_with("logs"));
    }
}
