//! Process configuration from the environment (and an optional `.env`).

use std::net::SocketAddr;

use adminhub_events::DispatchMode;
use adminhub_observability::LogFormat;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_APP_URL: &str = "http://localhost:8080";
const DEV_APP_KEY: &str = "adminhub-insecure-development-key";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub listen_addr: SocketAddr,
    /// Public base URL used in links sent to users.
    pub app_url: String,
    /// Signing key for email-verification links.
    pub app_key: String,
    /// Lifetime of newly issued access tokens; `None` means they never expire.
    pub token_ttl: Option<chrono::Duration>,
    pub dispatch_mode: DispatchMode,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            app_url: DEFAULT_APP_URL.to_string(),
            app_key: DEV_APP_KEY.to_string(),
            token_ttl: None,
            dispatch_mode: DispatchMode::default(),
            log_format: LogFormat::default(),
        }
    }
}

/// A variable that could not be used as given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigWarning {
    pub variable: &'static str,
    pub value: String,
    /// What is used instead.
    pub fallback: &'static str,
}

/// Configuration plus the problems found while reading it.
///
/// Reading happens before the subscriber is installed, so warnings are
/// collected and reported with [`LoadedConfig::log_warnings`].
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    pub warnings: Vec<ConfigWarning>,
}

impl LoadedConfig {
    pub fn log_warnings(&self) {
        for w in &self.warnings {
            tracing::warn!(variable = w.variable, value = %w.value, fallback = w.fallback, "invalid configuration value");
        }
    }
}

impl AppConfig {
    pub fn from_env() -> LoadedConfig {
        // Variables already in the environment win over `.env`.
        let _ = dotenvy::dotenv();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source. Bad values fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> LoadedConfig
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut warnings = Vec::new();

        let listen_addr = parse_or(
            &mut warnings,
            "ADMINHUB_LISTEN_ADDR",
            lookup("ADMINHUB_LISTEN_ADDR"),
            DEFAULT_LISTEN_ADDR,
            defaults.listen_addr,
        );

        let app_url = lookup("ADMINHUB_APP_URL")
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.app_url);

        let app_key = match lookup("ADMINHUB_APP_KEY").filter(|v| !v.trim().is_empty()) {
            Some(key) => key,
            None => {
                warnings.push(ConfigWarning {
                    variable: "ADMINHUB_APP_KEY",
                    value: String::new(),
                    fallback: "insecure development key",
                });
                defaults.app_key
            }
        };

        let token_ttl = lookup("ADMINHUB_TOKEN_TTL_MINUTES").and_then(|raw| match raw.trim().parse::<i64>() {
            Ok(minutes) if minutes > 0 => Some(chrono::Duration::minutes(minutes)),
            _ => {
                warnings.push(ConfigWarning {
                    variable: "ADMINHUB_TOKEN_TTL_MINUTES",
                    value: raw,
                    fallback: "tokens never expire",
                });
                None
            }
        });

        let dispatch_mode = parse_or(
            &mut warnings,
            "ADMINHUB_DISPATCH_MODE",
            lookup("ADMINHUB_DISPATCH_MODE"),
            "sync",
            defaults.dispatch_mode,
        );
        let log_format = parse_or(
            &mut warnings,
            "ADMINHUB_LOG_FORMAT",
            lookup("ADMINHUB_LOG_FORMAT"),
            "json",
            defaults.log_format,
        );

        LoadedConfig {
            config: Self {
                listen_addr,
                app_url,
                app_key,
                token_ttl,
                dispatch_mode,
                log_format,
            },
            warnings,
        }
    }
}

fn parse_or<T: std::str::FromStr>(
    warnings: &mut Vec<ConfigWarning>,
    variable: &'static str,
    raw: Option<String>,
    fallback: &'static str,
    default: T,
) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            warnings.push(ConfigWarning {
                variable,
                value: raw,
                fallback,
            });
            default
        }
    }
}
