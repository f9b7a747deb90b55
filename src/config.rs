use crate::formatter::EscapePolicy;
use config::ConfigError;
use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "config/default.toml";
pub const DEFAULT_SITE_TITLE: &str = "Blog";
pub const DEFAULT_EXCERPT_LENGTH: usize = 150;

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct WebConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    pub web: WebConfig,
    // The fields below come from the environment (or the .env file).
    pub posts_path: PathBuf,
    pub output_path: PathBuf,
    pub static_path: PathBuf,
    pub site_title: String,
    pub excerpt_length: usize,
    pub escape_policy: EscapePolicy,
    pub allowed_origins: String,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            web: WebConfig {
                host: "127.0.0.1".to_string(),
                port: 8080,
            },
            posts_path: PathBuf::from("posts.json"),
            output_path: PathBuf::from("public"),
            static_path: PathBuf::from("static"),
            site_title: DEFAULT_SITE_TITLE.to_string(),
            excerpt_length: DEFAULT_EXCERPT_LENGTH,
            escape_policy: EscapePolicy::default(),
            allowed_origins: String::new(),
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Loads configuration from the process environment.
    ///
    /// When `env_file` is given it must exist; otherwise a `.env` in the
    /// working directory is picked up if present.
    pub fn load(env_file: Option<&Path>) -> Result<Self, ConfigError> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path).map_err(|e| {
                    ConfigError::Message(format!(
                        "Failed to load .env file from '{}'. Error: {}",
                        path.display(),
                        e
                    ))
                })?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds the configuration from a variable lookup, validating each value.
    pub fn from_vars<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let posts_path = lookup("BLOG_POSTS_PATH").unwrap_or_else(|| path_string(&defaults.posts_path));
        let output_path = lookup("BLOG_OUTPUT_PATH").unwrap_or_else(|| path_string(&defaults.output_path));
        let static_path = lookup("BLOG_STATIC_PATH").unwrap_or_else(|| path_string(&defaults.static_path));

        let site_title = lookup("BLOG_SITE_TITLE").unwrap_or(defaults.site_title);
        if site_title.trim().is_empty() {
            return Err(ConfigError::Message(
                "'BLOG_SITE_TITLE' must not be empty.".to_string(),
            ));
        }

        let excerpt_length = match lookup("BLOG_EXCERPT_LENGTH") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    ConfigError::Message(format!(
                        "'BLOG_EXCERPT_LENGTH' must be a positive whole number, got '{}'.",
                        raw
                    ))
                })?,
            None => defaults.excerpt_length as u32,
        };

        let escape_policy = match lookup("BLOG_ESCAPE_POLICY") {
            Some(raw) => raw
                .parse::<EscapePolicy>()
                .map_err(|e| ConfigError::Message(e.to_string()))?,
            None => defaults.escape_policy,
        };

        let allowed_origins = lookup("ALLOWED_ORIGINS").unwrap_or_default();
        let log_level = lookup("LOG_LEVEL").unwrap_or(defaults.log_level);
        let config_file = lookup("BLOG_CONFIG_FILE").unwrap_or_else(|| DEFAULT_CONFIG_FILE.to_string());

        let builder = config::Config::builder()
            .set_default("web.host", defaults.web.host)?
            .set_default("web.port", i64::from(defaults.web.port))?
            // Host and port may be overridden by the TOML file.
            .add_source(config::File::new(&config_file, config::FileFormat::Toml).required(false))
            .set_override("posts_path", posts_path)?
            .set_override("output_path", output_path)?
            .set_override("static_path", static_path)?
            .set_override("site_title", site_title)?
            .set_override("excerpt_length", i64::from(excerpt_length))?
            .set_override("escape_policy", escape_policy.to_string())?
            .set_override("allowed_origins", allowed_origins)?
            .set_override("log_level", log_level)?
            .build()?;

        builder.try_deserialize()
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::tempdir;

    fn from_map(vars: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        Config::from_vars(|key| map.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = from_map(&[("BLOG_CONFIG_FILE", "does/not/exist.toml")]).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_overrides() {
        let config = from_map(&[
            ("BLOG_CONFIG_FILE", "does/not/exist.toml"),
            ("BLOG_POSTS_PATH", "/data/posts"),
            ("BLOG_SITE_TITLE", "Notes"),
            ("BLOG_EXCERPT_LENGTH", "80"),
            ("BLOG_ESCAPE_POLICY", "Sanitize"),
            ("LOG_LEVEL", "debug"),
        ])
        .unwrap();

        assert_eq!(config.posts_path, PathBuf::from("/data/posts"));
        assert_eq!(config.site_title, "Notes");
        assert_eq!(config.excerpt_length, 80);
        assert_eq!(config.escape_policy, EscapePolicy::Sanitize);
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_web_section_from_toml() {
        let dir = tempdir().unwrap();
        let file = dir.path().join("site.toml");
        fs::write(&file, "[web]\nhost = \"0.0.0.0\"\nport = 3000\n").unwrap();

        let config = from_map(&[("BLOG_CONFIG_FILE", file.to_str().unwrap())]).unwrap();
        assert_eq!(config.web.host, "0.0.0.0");
        assert_eq!(config.web.port, 3000);
    }

    #[test]
    fn test_invalid_values() {
        assert!(from_map(&[("BLOG_EXCERPT_LENGTH", "0")]).is_err());
        assert!(from_map(&[("BLOG_EXCERPT_LENGTH", "many")]).is_err());
        assert!(from_map(&[("BLOG_ESCAPE_POLICY", "strict")]).is_err());
        assert!(from_map(&[("BLOG_SITE_TITLE", "  ")]).is_err());
    }

    #[test]
    fn test_missing_env_file() {
        let dir = tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("missing.env"))).is_err());
    }
}
