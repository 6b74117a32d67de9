use std::{env, fmt::Display, str::FromStr};

use anyhow::{Context, anyhow};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub admin_ids: Vec<String>,
    pub email_function_url: Option<String>,
    pub mock_latency_min_ms: u64,
    pub mock_latency_max_ms: u64,
    pub session_idle_minutes: i64,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Ok(Self {
            port: try_load("PORT", "8080")?,
            database_url: try_load("DATABASE_URL", "sqlite://sponsormatch.db?mode=rwc")?,
            admin_ids: var("ADMIN_IDS")
                .map(|ids| split_list(&ids))
                .unwrap_or_default(),
            email_function_url: var("EMAIL_FUNCTION_URL").filter(|url| !url.trim().is_empty()),
            mock_latency_min_ms: try_load("MOCK_LATENCY_MIN_MS", "300")?,
            mock_latency_max_ms: try_load("MOCK_LATENCY_MAX_MS", "500")?,
            session_idle_minutes: try_load("SESSION_IDLE_MINUTES", "30")?,
        })
    }

    pub fn is_admin(&self, profile_id: &str) -> bool {
        self.admin_ids.iter().any(|id| id == profile_id)
    }
}

fn var(key: &str) -> Option<String> {
    env::var(key)
        .map_err(|_| warn!("Environment variable {key} not found"))
        .ok()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> anyhow::Result<T>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| anyhow!("{e}"))
        .with_context(|| format!("invalid {key}"))
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_list_ignores_blanks() {
        assert_eq!(split_list(" a, ,b ,"), vec!["a", "b"]);
    }

    #[test]
    fn admin_check() {
        let config = Config {
            port: 8080,
            database_url: String::new(),
            admin_ids: vec!["p1".to_owned()],
            email_function_url: None,
            mock_latency_min_ms: 0,
            mock_latency_max_ms: 0,
            session_idle_minutes: 30,
        };
        assert!(config.is_admin("p1"));
        assert!(!config.is_admin("p2"));
    }
}
