use anyhow::{Context, anyhow};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::{Error, Result};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BIND: &str = "0.0.0.0:8080";

pub const ENV_API_KEY: &str = "OPENWEATHER_API_KEY";
pub const ENV_BASE_URL: &str = "OPENWEATHER_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "WEATHER_TIMEOUT_SECS";
pub const ENV_CONCURRENT_FETCH: &str = "WEATHER_CONCURRENT_FETCH";
pub const ENV_BIND: &str = "WEATHER_BIND";

/// Optional on-disk settings. Every field may be omitted.
///
/// Example TOML:
/// ```toml
/// api_key = "..."
/// base_url = "https://api.openweathermap.org/data/2.5"
/// timeout_secs = 30
/// concurrent_fetch = false
/// bind = "127.0.0.1:8080"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub timeout_secs: Option<u64>,
    pub concurrent_fetch: Option<bool>,
    pub bind: Option<String>,
}

impl FileConfig {
    /// Load a config file, or return an empty one if it doesn't exist.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Platform default location of the config file.
    pub fn default_path() -> anyhow::Result<PathBuf> {
        let dirs = ProjectDirs::from("dev", "weather-air-quality", "weather-server")
            .ok_or_else(|| anyhow!("Could not determine platform config directory"))?;

        Ok(dirs.config_dir().join("config.toml"))
    }
}

/// Resolved runtime settings.
#[derive(Clone)]
pub struct Config {
    pub api_key: String,
    pub base_url: String,
    pub timeout_secs: u64,
    pub concurrent_fetch: bool,
    pub bind: SocketAddr,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("timeout_secs", &self.timeout_secs)
            .field("concurrent_fetch", &self.concurrent_fetch)
            .field("bind", &self.bind)
            .finish()
    }
}

impl Config {
    /// Load from the given file (or the platform default) and the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => FileConfig::default_path().map_err(configuration)?,
        };
        let file = FileConfig::load(&path).map_err(configuration)?;

        Self::resolve(file, |key| std::env::var(key).ok())
    }

    /// Layer environment values from `env` over `file` and apply defaults.
    pub fn resolve<F>(file: FileConfig, env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = env(ENV_API_KEY)
            .or(file.api_key)
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!("{ENV_API_KEY} environment variable is not set"))
            })?;

        let base_url = env(ENV_BASE_URL)
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        if base_url.is_empty() {
            return Err(Error::Configuration("base URL must not be empty".into()));
        }

        let timeout_secs = match env(ENV_TIMEOUT_SECS) {
            Some(raw) => parse_value::<u64>(ENV_TIMEOUT_SECS, &raw)?,
            None => file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
        };
        if timeout_secs == 0 {
            return Err(Error::Configuration("timeout must be at least one second".into()));
        }

        let concurrent_fetch = match env(ENV_CONCURRENT_FETCH) {
            Some(raw) => parse_value::<bool>(ENV_CONCURRENT_FETCH, &raw)?,
            None => file.concurrent_fetch.unwrap_or(false),
        };

        let bind = env(ENV_BIND)
            .or(file.bind)
            .unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = parse_value::<SocketAddr>(ENV_BIND, &bind)?;

        Ok(Self {
            api_key,
            base_url,
            timeout_secs,
            concurrent_fetch,
            bind,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn parse_value<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse()
        .map_err(|_| Error::Configuration(format!("invalid value for {name}: '{raw}'")))
}

fn configuration(err: anyhow::Error) -> Error {
    Error::Configuration(format!("{err:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_api_key_is_a_configuration_error() {
        let err = Config::resolve(FileConfig::default(), env_of(&[])).unwrap_err();

        assert!(matches!(err, Error::Configuration(_)));
        assert!(err.to_string().contains(ENV_API_KEY));
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let err = Config::resolve(FileConfig::default(), env_of(&[(ENV_API_KEY, "  ")]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let cfg = Config::resolve(FileConfig::default(), env_of(&[(ENV_API_KEY, "KEY")]))
            .expect("config must resolve");

        assert_eq!(cfg.api_key, "KEY");
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.timeout(), Duration::from_secs(30));
        assert!(!cfg.concurrent_fetch);
        assert_eq!(cfg.bind.to_string(), DEFAULT_BIND);
    }

    #[test]
    fn environment_overrides_file() {
        let file = FileConfig {
            api_key: Some("FILE_KEY".into()),
            base_url: Some("http://file.example".into()),
            timeout_secs: Some(5),
            concurrent_fetch: Some(false),
            bind: Some("127.0.0.1:9000".into()),
        };
        let env = env_of(&[
            (ENV_API_KEY, "ENV_KEY"),
            (ENV_BASE_URL, "http://env.example/"),
            (ENV_CONCURRENT_FETCH, "true"),
        ]);

        let cfg = Config::resolve(file, env).expect("config must resolve");

        assert_eq!(cfg.api_key, "ENV_KEY");
        assert_eq!(cfg.base_url, "http://env.example");
        assert_eq!(cfg.timeout_secs, 5);
        assert!(cfg.concurrent_fetch);
        assert_eq!(cfg.bind.to_string(), "127.0.0.1:9000");
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let env = env_of(&[(ENV_API_KEY, "KEY"), (ENV_TIMEOUT_SECS, "soon")]);
        let err = Config::resolve(FileConfig::default(), env).unwrap_err();
        assert!(err.to_string().contains(ENV_TIMEOUT_SECS));

        let env = env_of(&[(ENV_API_KEY, "KEY"), (ENV_TIMEOUT_SECS, "0")]);
        assert!(Config::resolve(FileConfig::default(), env).is_err());
    }

    #[test]
    fn debug_output_hides_api_key() {
        let cfg = Config::resolve(FileConfig::default(), env_of(&[(ENV_API_KEY, "SECRET")]))
            .expect("config must resolve");

        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("SECRET"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn file_config_parses_partial_toml() {
        let file: FileConfig = toml::from_str("api_key = \"FROM_FILE\"\ntimeout_secs = 12\n")
            .expect("valid toml");

        assert_eq!(file.api_key.as_deref(), Some("FROM_FILE"));
        assert_eq!(file.timeout_secs, Some(12));
        assert!(file.base_url.is_none());
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let path = std::env::temp_dir().join("weather-core-definitely-missing.toml");
        let file = FileConfig::load(&path).expect("missing file is not an error");
        assert!(file.api_key.is_none());
    }
}
