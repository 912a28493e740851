use std::net::SocketAddr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub max_page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 8080,
            max_page_size: 100,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();
        let port = match var("APP_PORT") {
            Some(v) => v.parse::<u16>().context("parse APP_PORT")?,
            None => defaults.port,
        };
        let max_page_size = match var("MAX_PAGE_SIZE") {
            Some(v) => v.parse::<usize>().context("parse MAX_PAGE_SIZE")?,
            None => defaults.max_page_size,
        };
        Ok(Self {
            host: var("APP_HOST").unwrap_or(defaults.host),
            port,
            max_page_size,
        })
    }

    pub fn addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid listen address {}:{}", self.host, self.port))
    }
}
