use crate::error::SeedError;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

pub const DEFAULT_CONFIG_FILE: &str = "refseed.toml";
pub const ENV_PREFIX: &str = "REFSEED_";

/// Value of the `Prefer` header sent with every request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferReturn {
    #[default]
    Minimal,
    Representation,
}

impl PreferReturn {
    pub fn header_value(self) -> &'static str {
        match self {
            Self::Minimal => "return=minimal",
            Self::Representation => "return=representation",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_times: usize,
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_times: 3,
            min_delay_ms: 500,
            max_delay_ms: 3000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Project base URL; `/rest/v1/` is appended by the client.
    pub rest_url: Url,
    /// Service-role key, sent both as `apikey` and as the bearer token.
    pub service_key: String,
    pub loglevel: String,
    pub prefer: PreferReturn,
    pub request_delay_ms: u64,
    pub table_pause_ms: u64,
    pub connect_timeout_secs: u64,
    pub timeout_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proxy: Option<Url>,
    pub retry: RetryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rest_url: Url::parse("http://localhost:54321").expect("default rest_url is valid"),
            service_key: String::new(),
            loglevel: "info".to_string(),
            prefer: PreferReturn::default(),
            request_delay_ms: 100,
            table_pause_ms: 500,
            connect_timeout_secs: 5,
            timeout_secs: 15,
            proxy: None,
            retry: RetryConfig::default(),
        }
    }
}

impl Config {
    /// Layered load: defaults, then the TOML file (if present), then
    /// `REFSEED_*` environment variables. Nested keys use `__`,
    /// e.g. `REFSEED_RETRY__MAX_TIMES`.
    pub fn load(path: Option<&Path>) -> Result<Self, SeedError> {
        let path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let cfg: Config = Self::figment(&path).extract()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    pub fn validate(&self) -> Result<(), SeedError> {
        if self.service_key.trim().is_empty() {
            return Err(SeedError::InvalidConfig(format!(
                "service_key is empty; set {ENV_PREFIX}SERVICE_KEY"
            )));
        }
        if !matches!(self.rest_url.scheme(), "http" | "https") {
            return Err(SeedError::InvalidConfig(format!(
                "rest_url must be http(s), got {}",
                self.rest_url
            )));
        }
        Ok(())
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn table_pause(&self) -> Duration {
        Duration::from_millis(self.table_pause_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn env_overrides_file_and_defaults() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "refseed.toml",
                r#"
                rest_url = "https://example.supabase.co"
                service_key = "from-file"
                request_delay_ms = 250

                [retry]
                max_times = 5
                "#,
            )?;
            jail.set_env("REFSEED_SERVICE_KEY", "from-env");
            jail.set_env("REFSEED_RETRY__MIN_DELAY_MS", "10");

            let cfg = Config::load(None).expect("config should load");
            assert_eq!(cfg.rest_url.as_str(), "https://example.supabase.co/");
            assert_eq!(cfg.service_key, "from-env");
            assert_eq!(cfg.request_delay(), Duration::from_millis(250));
            assert_eq!(cfg.table_pause(), Duration::from_millis(500));
            assert_eq!(cfg.retry.max_times, 5);
            assert_eq!(cfg.retry.min_delay_ms, 10);
            assert_eq!(cfg.prefer, PreferReturn::Minimal);
            Ok(())
        });
    }

    #[test]
    fn prefer_is_parsed_from_env() {
        Jail::expect_with(|jail| {
            jail.set_env("REFSEED_SERVICE_KEY", "k");
            jail.set_env("REFSEED_PREFER", "representation");
            let cfg = Config::load(None).expect("config should load");
            assert_eq!(cfg.prefer.header_value(), "return=representation");
            Ok(())
        });
    }

    #[test]
    fn missing_service_key_is_rejected() {
        Jail::expect_with(|_jail| {
            let err = Config::load(None).unwrap_err();
            assert!(matches!(err, SeedError::InvalidConfig(_)));
            Ok(())
        });
    }

    #[test]
    fn non_http_url_is_rejected() {
        let cfg = Config {
            rest_url: Url::parse("ftp://example.com").unwrap(),
            service_key: "k".into(),
            ..Config::default()
        };
        assert!(cfg.validate().is_err());
    }
}
