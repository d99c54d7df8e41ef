//! Server settings read from the environment.

use std::str::FromStr;

use chrono::TimeDelta;
use worm_watch_rate_limit::{DEFAULT_MAX_TRACKED_KEYS, RateLimitConfig};

/// Runtime settings for [`crate::run_server`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    /// Interface to bind (`BIND_ADDR`).
    pub bind_addr: String,
    /// Port to listen on (`PORT`).
    pub port: u16,
    /// Shared admin secret (`ADMIN_SECRET`). Unset or empty disables the
    /// admin endpoint.
    pub admin_secret: Option<String>,
    /// Trust `X-Forwarded-For` when resolving the client address
    /// (`TRUST_PROXY`).
    pub trust_proxy: bool,
    /// Submission limits (`RATE_LIMIT_MAX`, `RATE_LIMIT_WINDOW_SECS`).
    pub rate_limit: RateLimitConfig,
    /// Most clients tracked by the limiter at once (`RATE_LIMIT_MAX_KEYS`).
    pub rate_limit_max_keys: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1".to_string(),
            port: 8080,
            admin_secret: None,
            trust_proxy: false,
            rate_limit: RateLimitConfig::default(),
            rate_limit_max_keys: DEFAULT_MAX_TRACKED_KEYS,
        }
    }
}

impl ServerConfig {
    /// Reads every setting from the process environment, falling back to
    /// [`ServerConfig::default`] for anything unset or unparseable.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let parsed = |name: &str| -> Option<u64> {
            let raw = lookup(name)?;
            raw.trim()
                .parse()
                .map_err(|_| log::warn!("Ignoring invalid {name}={raw:?}"))
                .ok()
        };

        let window = parsed("RATE_LIMIT_WINDOW_SECS")
            .and_then(|secs| i64::try_from(secs).ok())
            .and_then(TimeDelta::try_seconds)
            .unwrap_or(defaults.rate_limit.window);

        Self {
            bind_addr: lookup("BIND_ADDR").unwrap_or(defaults.bind_addr),
            port: parse_or(&lookup, "PORT", defaults.port),
            admin_secret: lookup("ADMIN_SECRET").filter(|s| !s.is_empty()),
            trust_proxy: lookup("TRUST_PROXY").is_some_and(|v| is_truthy(&v)),
            rate_limit: RateLimitConfig {
                max_submissions: parse_or(
                    &lookup,
                    "RATE_LIMIT_MAX",
                    defaults.rate_limit.max_submissions,
                ),
                window,
                ..defaults.rate_limit
            },
            rate_limit_max_keys: parse_or(
                &lookup,
                "RATE_LIMIT_MAX_KEYS",
                defaults.rate_limit_max_keys,
            ),
        }
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    lookup(name)
        .and_then(|raw| raw.trim().parse().ok())
        .unwrap_or(default)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config(&[]), ServerConfig::default());
    }

    #[test]
    fn reads_all_settings() {
        let cfg = config(&[
            ("BIND_ADDR", "0.0.0.0"),
            ("PORT", "3000"),
            ("ADMIN_SECRET", "hunter2"),
            ("TRUST_PROXY", "true"),
            ("RATE_LIMIT_MAX", "10"),
            ("RATE_LIMIT_WINDOW_SECS", "60"),
            ("RATE_LIMIT_MAX_KEYS", "100"),
        ]);

        assert_eq!(cfg.bind_addr, "0.0.0.0");
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.admin_secret.as_deref(), Some("hunter2"));
        assert!(cfg.trust_proxy);
        assert_eq!(cfg.rate_limit.max_submissions, 10);
        assert_eq!(cfg.rate_limit.window, TimeDelta::seconds(60));
        assert_eq!(cfg.rate_limit_max_keys, 100);
    }

    #[test]
    fn empty_secret_and_garbage_fall_back() {
        let cfg = config(&[
            ("ADMIN_SECRET", ""),
            ("PORT", "http"),
            ("TRUST_PROXY", "nope"),
            ("RATE_LIMIT_WINDOW_SECS", "-5"),
        ]);

        assert_eq!(cfg.admin_secret, None);
        assert_eq!(cfg.port, 8080);
        assert!(!cfg.trust_proxy);
        assert_eq!(cfg.rate_limit.window, TimeDelta::hours(1));
    }
}
