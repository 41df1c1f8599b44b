//! Layered configuration: defaults, optional TOML file, environment.
//!
//! Resolution order (later wins):
//! 1. built-in defaults (`/tmp` paths, `http://ollama:11434`, `mistral:7b-instruct`)
//! 2. TOML file: explicit path, `TAPSCRIBE_CONFIG`, or `<config_dir>/tapscribe/config.toml`
//! 3. `OLLAMA_URL` / `OLLAMA_MODEL`
//!
//! CLI flags are applied on top by the binary.

pub mod schema;

pub use schema::{
    Config, DaemonConfig, GestureConfig, OllamaConfig, PathsConfig, DEFAULT_OLLAMA_MODEL,
    DEFAULT_OLLAMA_URL,
};

use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming an explicit config file.
pub const CONFIG_PATH_ENV: &str = "TAPSCRIBE_CONFIG";
pub const OLLAMA_URL_ENV: &str = "OLLAMA_URL";
pub const OLLAMA_MODEL_ENV: &str = "OLLAMA_MODEL";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}

impl Config {
    /// Load from the process environment.
    ///
    /// A missing default config file is not an error; a missing *explicit*
    /// file is.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(explicit, |key| std::env::var(key).ok())
    }

    /// Same as [`Config::load`], with an injectable environment lookup.
    pub fn load_with_env<F>(explicit: Option<&Path>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let explicit = explicit
            .map(Path::to_path_buf)
            .or_else(|| env(CONFIG_PATH_ENV).filter(|p| !p.trim().is_empty()).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_file(&path)?,
            None => match default_config_path().filter(|p| p.is_file()) {
                Some(path) => Self::from_file(&path)?,
                None => Self::default(),
            },
        };

        config.apply_env(env);
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file. Sections and keys that are absent keep their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    fn apply_env<F>(&mut self, env: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = env(OLLAMA_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self.ollama.url = url;
        }
        if let Some(model) = env(OLLAMA_MODEL_ENV).filter(|v| !v.trim().is_empty()) {
            self.ollama.model = model;
        }
    }

    /// Reject settings the pipeline cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ollama.url.trim().is_empty() {
            return Err(ConfigError::Invalid("ollama.url cannot be empty".into()));
        }
        if self.ollama.model.trim().is_empty() {
            return Err(ConfigError::Invalid("ollama.model cannot be empty".into()));
        }
        for (key, value) in [
            ("gesture.debounce_secs", self.gesture.debounce_secs),
            ("gesture.window_secs", self.gesture.window_secs),
            ("ollama.temperature", self.ollama.temperature),
        ] {
            if !value.is_finite() {
                return Err(ConfigError::Invalid(format!("{key} must be a finite number")));
            }
        }
        if self.gesture.debounce_secs < 0.0 || self.gesture.window_secs <= self.gesture.debounce_secs {
            return Err(ConfigError::Invalid(format!(
                "gesture.window_secs ({}) must be greater than gesture.debounce_secs ({})",
                self.gesture.window_secs, self.gesture.debounce_secs
            )));
        }
        if self.daemon.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "daemon.poll_interval_ms must be at least 1".into(),
            ));
        }
        if self.daemon.health_retry_secs == 0 {
            return Err(ConfigError::Invalid(
                "daemon.health_retry_secs must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.daemon.poll_interval_ms)
    }

    pub fn health_retry_interval(&self) -> Duration {
        Duration::from_secs(self.daemon.health_retry_secs)
    }
}

/// `<config_dir>/tapscribe/config.toml`, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "tapscribe")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_shared_paths() {
        let config = Config::default();
        assert_eq!(config.ollama.url, "http://ollama:11434");
        assert_eq!(config.ollama.model, "mistral:7b-instruct");
        assert_eq!(config.paths.trigger, PathBuf::from("/tmp/writing_assistant_trigger"));
        assert_eq!(config.paths.manual_trigger, PathBuf::from("/tmp/manual_trigger"));
        assert_eq!(config.paths.shared_input, PathBuf::from("/tmp/shared_input.txt"));
        assert_eq!(config.paths.shared_output, PathBuf::from("/tmp/shared_output.txt"));
        assert_eq!(config.poll_interval(), Duration::from_millis(100));
        assert_eq!(config.health_retry_interval(), Duration::from_secs(2));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_url_and_model() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config = Config::load_with_env(
            Some(path.as_path()),
            env_from(&[
                (OLLAMA_URL_ENV, "http://127.0.0.1:11434"),
                (OLLAMA_MODEL_ENV, "llama3:latest"),
            ]),
        )
        .unwrap();
        assert_eq!(config.ollama.url, "http://127.0.0.1:11434");
        assert_eq!(config.ollama.model, "llama3:latest");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let config =
            Config::load_with_env(Some(path.as_path()), env_from(&[(OLLAMA_MODEL_ENV, "  ")])).unwrap();
        assert_eq!(config.ollama.model, DEFAULT_OLLAMA_MODEL);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[ollama]
model = "qwen3:0.6b"

[daemon]
poll_interval_ms = 250
"#,
        )
        .unwrap();

        let config = Config::load_with_env(Some(path.as_path()), env_from(&[])).unwrap();
        assert_eq!(config.ollama.model, "qwen3:0.6b");
        assert_eq!(config.ollama.url, DEFAULT_OLLAMA_URL);
        assert_eq!(config.daemon.poll_interval_ms, 250);
        assert_eq!(config.daemon.health_retry_secs, 2);
        assert_eq!(config.gesture, GestureConfig::default());
    }

    #[test]
    fn config_path_env_is_honoured() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("custom.toml");
        std::fs::write(&path, "[ollama]\nurl = \"http://10.0.0.1:11434\"\n").unwrap();

        let config = Config::load_with_env(
            None,
            env_from(&[(CONFIG_PATH_ENV, path.to_str().unwrap())]),
        )
        .unwrap();
        assert_eq!(config.ollama.url, "http://10.0.0.1:11434");
    }

    #[test]
    fn missing_explicit_file_errors() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load_with_env(Some(tmp.path().join("nope.toml").as_path()), env_from(&[]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn malformed_file_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        std::fs::write(&path, "[ollama\nurl = ").unwrap();
        let err = Config::load_with_env(Some(path.as_path()), env_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn window_must_exceed_debounce() {
        let mut config = Config::default();
        config.gesture.window_secs = 0.05;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("window_secs"));
    }

    #[test]
    fn zero_poll_interval_rejected() {
        let mut config = Config::default();
        config.daemon.poll_interval_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn empty_model_rejected() {
        let mut config = Config::default();
        config.ollama.model = String::new();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("cannot be empty"));
    }

    #[test]
    fn nan_timing_from_file_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[gesture]\ndebounce_secs = nan\n").unwrap();
        let err = Config::load_with_env(Some(path.as_path()), env_from(&[])).unwrap_err();
        assert!(err.to_string().contains("gesture.debounce_secs must be a finite number"));
    }

    #[test]
    fn infinite_window_rejected() {
        let mut config = Config::default();
        config.gesture.window_secs = f64::INFINITY;
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_health_retry_rejected() {
        let mut config = Config::default();
        config.daemon.health_retry_secs = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("health_retry_secs"));
    }
}
