use std::path::Path;

use anyhow::{bail, Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "admin.toml";
const ENV_PREFIX: &str = "ORDERS";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub api_base_url: String,
    pub session_db_url: String,
    pub request_timeout_secs: u64,
    pub page_size: usize,
    pub accept_invalid_certs: bool,
    pub strict_activity_flags: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "https://localhost:7202/api".into(),
            session_db_url: "sqlite://./data/session.db".into(),
            request_timeout_secs: 30,
            page_size: 10,
            accept_invalid_certs: false,
            strict_activity_flags: false,
        }
    }
}

/// Defaults, then `config_file` if it exists, then `ORDERS__*` variables.
pub fn load_settings(config_file: &Path) -> Result<Settings> {
    load_settings_with(
        config_file,
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true),
    )
}

fn load_settings_with(config_file: &Path, environment: Environment) -> Result<Settings> {
    Config::builder()
        .add_source(File::from(config_file).required(false))
        .add_source(environment)
        .build()
        .with_context(|| format!("failed to read settings from '{}'", config_file.display()))?
        .try_deserialize()
        .context("invalid settings")
}

impl Settings {
    /// Checks the final values and normalises the session database URL.
    pub fn validated(mut self) -> Result<Self> {
        let base_url = Url::parse(self.api_base_url.trim())
            .with_context(|| format!("invalid api_base_url '{}'", self.api_base_url))?;
        if !matches!(base_url.scheme(), "http" | "https") {
            bail!("api_base_url must use http or https, got '{}'", base_url.scheme());
        }
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be positive");
        }
        if self.page_size == 0 {
            bail!("page_size must be positive");
        }

        self.api_base_url = self.api_base_url.trim().trim_end_matches('/').to_string();
        self.session_db_url = normalize_database_url(&self.session_db_url);
        Ok(self)
    }
}

fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().session_db_url;
    }

    if raw_database_url.starts_with("sqlite::memory:") || raw_database_url.contains("://") {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        return format!("sqlite://{}", path.replace('\\', "/"));
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        env, fs,
        time::{SystemTime, UNIX_EPOCH},
    };

    use super::*;

    fn env_source(vars: &[(&str, &str)]) -> Environment {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Environment::with_prefix(ENV_PREFIX)
            .separator("__")
            .try_parsing(true)
            .source(Some(vars))
    }

    #[test]
    fn missing_file_and_empty_env_give_defaults() {
        let settings =
            load_settings_with(Path::new("does-not-exist.toml"), env_source(&[])).expect("settings");
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn file_is_overridden_by_environment() {
        let suffix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos();
        let path = env::temp_dir().join(format!("orders_admin_settings_{suffix}.toml"));
        fs::write(
            &path,
            "api_base_url = \"http://orders.internal/api\"\npage_size = 25\n",
        )
        .expect("write settings");

        let settings = load_settings_with(
            &path,
            env_source(&[
                ("ORDERS__PAGE_SIZE", "50"),
                ("ORDERS__STRICT_ACTIVITY_FLAGS", "true"),
            ]),
        )
        .expect("settings");
        fs::remove_file(&path).expect("cleanup");

        assert_eq!(settings.api_base_url, "http://orders.internal/api");
        assert_eq!(settings.page_size, 50);
        assert!(settings.strict_activity_flags);
        assert_eq!(settings.request_timeout_secs, 30);
    }

    #[test]
    fn validation_rejects_bad_base_urls() {
        for api_base_url in ["not a url", "ftp://orders.internal/api"] {
            let settings = Settings {
                api_base_url: api_base_url.into(),
                ..Settings::default()
            };
            assert!(settings.validated().is_err(), "{api_base_url} accepted");
        }
    }

    #[test]
    fn validation_trims_base_url_and_normalizes_database_path() {
        let settings = Settings {
            api_base_url: " https://localhost:7202/api/ ".into(),
            session_db_url: "./data/test.db".into(),
            ..Settings::default()
        }
        .validated()
        .expect("valid");

        assert_eq!(settings.api_base_url, "https://localhost:7202/api");
        assert_eq!(settings.session_db_url, "sqlite://./data/test.db");
    }

    #[test]
    fn normalizes_database_urls() {
        assert_eq!(normalize_database_url(""), "sqlite://./data/session.db");
        assert_eq!(normalize_database_url("sqlite::memory:"), "sqlite::memory:");
        assert_eq!(normalize_database_url("sqlite:data\\s.db"), "sqlite://data/s.db");
        assert_eq!(
            normalize_database_url("sqlite://./data/s.db"),
            "sqlite://./data/s.db"
        );
    }
}
