//! Configuration loading and fetcher factory.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use keyscore_core::traits::{BROWSER_USER_AGENT, DEFAULT_REFERER};

use crate::http::HttpFetcher;

/// Environment variable that overrides `store_path`.
pub const STORE_ENV_VAR: &str = "KEYSCORE_STORE";

/// Sample configuration written by `keyscore init`.
pub const SAMPLE_CONFIG: &str = r#"# keyscore configuration

# Where submitted candidates and results are kept.
# Overridden by the KEYSCORE_STORE environment variable.
store_path = "./keyscore-data/population.json"

# Headers sent when fetching answer-key pages. ${VAR} references are expanded.
# user_agent = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) ..."
# referer = "https://ssc.digialm.com/"

# Category used when `keyscore submit` is run without --category.
# default_category = "General"
"#;

/// Top-level keyscore configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyscoreConfig {
    /// Population store location.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
    /// `User-Agent` sent with page fetches.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// `Referer` sent with page fetches.
    #[serde(default = "default_referer")]
    pub referer: String,
    #[serde(default)]
    pub default_category: Option<String>,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./keyscore-data/population.json")
}
fn default_user_agent() -> String {
    BROWSER_USER_AGENT.to_string()
}
fn default_referer() -> String {
    DEFAULT_REFERER.to_string()
}

impl Default for KeyscoreConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            user_agent: default_user_agent(),
            referer: default_referer(),
            default_category: None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
/// Unset variables expand to nothing.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        let Some(end) = result[start..].find('}') else {
            break;
        };
        let var_name = &result[start + 2..start + end];
        let value = std::env::var(var_name).unwrap_or_default();
        result = format!("{}{}{}", &result[..start], value, &result[start + end + 1..]);
    }
    result
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `keyscore.toml` in the current directory
/// 2. `~/.config/keyscore/config.toml`
///
/// `KEYSCORE_STORE` overrides the store path.
pub fn load_config() -> Result<KeyscoreConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<KeyscoreConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("keyscore.toml");
            if local.exists() {
                Some(local)
            } else {
                dirs_path()
                    .map(|dir| dir.join("config.toml"))
                    .filter(|global| global.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => {
            tracing::debug!("loading config from {}", path.display());
            parse_config(&path)?
        }
        None => KeyscoreConfig::default(),
    };

    if let Ok(store) = std::env::var(STORE_ENV_VAR) {
        if !store.is_empty() {
            config.store_path = PathBuf::from(store);
        }
    }

    Ok(config)
}

fn parse_config(path: &Path) -> Result<KeyscoreConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    let mut config = toml::from_str::<KeyscoreConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))?;

    config.store_path = PathBuf::from(resolve_env_vars(&config.store_path.to_string_lossy()));
    config.user_agent = resolve_env_vars(&config.user_agent);
    config.referer = resolve_env_vars(&config.referer);
    config.default_category = config.default_category.as_deref().map(resolve_env_vars);
    Ok(config)
}

fn dirs_path() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(|h| PathBuf::from(h).join(".config").join("keyscore"))
}

/// Create an HTTP fetcher carrying the configured headers.
pub fn create_fetcher(config: &KeyscoreConfig) -> Result<HttpFetcher> {
    HttpFetcher::with_headers(&config.user_agent, &config.referer)
        .context("failed to create HTTP fetcher")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_KEYSCORE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_KEYSCORE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_KEYSCORE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        assert_eq!(resolve_env_vars("${_KEYSCORE_UNSET_VAR}x"), "x");
        assert_eq!(resolve_env_vars("${unterminated"), "${unterminated");
        std::env::remove_var("_KEYSCORE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = KeyscoreConfig::default();
        assert_eq!(config.user_agent, BROWSER_USER_AGENT);
        assert_eq!(config.referer, DEFAULT_REFERER);
        assert!(config.default_category.is_none());
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyscore.toml");
        std::fs::write(&path, "default_category = \"OBC\"\n").unwrap();

        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.default_category.as_deref(), Some("OBC"));
        assert_eq!(config.referer, DEFAULT_REFERER);
    }

    #[test]
    fn sample_config_parses() {
        let config: KeyscoreConfig = toml::from_str(SAMPLE_CONFIG).unwrap();
        assert_eq!(config.store_path, default_store_path());
        assert_eq!(config.user_agent, BROWSER_USER_AGENT);
    }

    #[test]
    fn missing_explicit_path_errors() {
        let err = load_config_from(Some(Path::new("/nonexistent/keyscore.toml"))).unwrap_err();
        assert!(err.to_string().contains("config file not found"));
    }

    #[test]
    fn malformed_file_errors_with_context() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "store_path = [").unwrap();
        let err = load_config_from(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("failed to parse config"));
    }

    #[test]
    fn fetcher_from_config() {
        use keyscore_core::traits::PageFetcher;

        let fetcher = create_fetcher(&KeyscoreConfig::default()).unwrap();
        assert_eq!(fetcher.name(), "http");
    }
}
