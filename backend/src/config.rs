use std::{env, num::NonZeroUsize, path::PathBuf};

use anyhow::{Context, Result};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_CONTENT_DIR: &str = "../content";
const DEFAULT_PAGE_SIZE: usize = 10;

/// Server settings, read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    pub port: u16,
    pub content_dir: PathBuf,
    /// Posts per listing page.
    pub page_size: NonZeroUsize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let port = match non_empty("PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("PORT must be a port number, got `{raw}`"))?,
            None => DEFAULT_PORT,
        };

        let page_size = match non_empty("PAGE_SIZE") {
            Some(raw) => raw
                .parse::<NonZeroUsize>()
                .with_context(|| format!("PAGE_SIZE must be a positive integer, got `{raw}`"))?,
            None => NonZeroUsize::new(DEFAULT_PAGE_SIZE).context("default page size is zero")?,
        };

        Ok(Self {
            bind_addr: non_empty("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            port,
            content_dir: non_empty("CONTENT_DIR")
                .unwrap_or_else(|| DEFAULT_CONTENT_DIR.to_string())
                .into(),
            page_size,
        })
    }

    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig> {
        let vars = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect::<HashMap<_, _>>();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).expect("default config");
        assert_eq!(config.listen_addr(), "0.0.0.0:3000");
        assert_eq!(config.content_dir, PathBuf::from("../content"));
        assert_eq!(config.page_size.get(), 10);
    }

    #[test]
    fn overrides_are_trimmed() {
        let config = config_from(&[
            ("BIND_ADDR", "127.0.0.1"),
            ("PORT", " 8080 "),
            ("CONTENT_DIR", "/srv/posts"),
            ("PAGE_SIZE", "7"),
        ])
        .expect("config");
        assert_eq!(config.listen_addr(), "127.0.0.1:8080");
        assert_eq!(config.content_dir, PathBuf::from("/srv/posts"));
        assert_eq!(config.page_size.get(), 7);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[("PORT", "  "), ("PAGE_SIZE", "")]).expect("config");
        assert_eq!(config.port, 3000);
        assert_eq!(config.page_size.get(), 10);
    }

    #[test]
    fn invalid_page_size_is_rejected() {
        let err = config_from(&[("PAGE_SIZE", "0")]).expect_err("zero page size");
        assert!(err.to_string().contains("PAGE_SIZE"));
        assert!(config_from(&[("PAGE_SIZE", "ten")]).is_err());
        assert!(config_from(&[("PORT", "70000")]).is_err());
    }
}
