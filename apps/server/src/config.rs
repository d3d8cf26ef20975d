use std::{net::SocketAddr, time::Duration};

use anyhow::Context;

const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_DB_PATH: &str = "./db/ledger.db";
const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub struct Config {
    pub listen_addr: SocketAddr,
    pub db_path: String,
    pub cors_allow: Vec<String>,
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from(([0, 0, 0, 0], 8080)),
            db_path: DEFAULT_DB_PATH.to_string(),
            cors_allow: vec!["*".to_string()],
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
        }
    }
}

impl Config {
    /// Reads `SL_*` variables, after loading a `.env` file if one exists.
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let raw_addr =
            std::env::var("SL_LISTEN_ADDR").unwrap_or_else(|_| DEFAULT_LISTEN_ADDR.to_string());
        let listen_addr: SocketAddr = raw_addr
            .parse()
            .with_context(|| format!("Invalid SL_LISTEN_ADDR '{}'", raw_addr))?;
        let db_path = std::env::var("SL_DB_PATH").unwrap_or_else(|_| DEFAULT_DB_PATH.into());
        let cors_allow = std::env::var("SL_CORS_ALLOW_ORIGINS")
            .unwrap_or_else(|_| "*".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        let timeout_ms: u64 = std::env::var("SL_REQUEST_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TIMEOUT_MS);
        Ok(Self {
            listen_addr,
            db_path,
            cors_allow,
            request_timeout: Duration::from_millis(timeout_ms),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Single test so the env mutations below never race each other.
    #[test]
    fn test_from_env() {
        std::env::set_var("SL_LISTEN_ADDR", "127.0.0.1:9000");
        std::env::set_var("SL_CORS_ALLOW_ORIGINS", "http://a.test, ,http://b.test");
        std::env::set_var("SL_REQUEST_TIMEOUT_MS", "not-a-number");
        let config = Config::from_env().unwrap();
        assert_eq!(config.listen_addr.port(), 9000);
        assert_eq!(config.cors_allow, vec!["http://a.test", "http://b.test"]);
        assert_eq!(config.request_timeout, Duration::from_millis(30_000));

        std::env::set_var("SL_LISTEN_ADDR", "nowhere");
        let err = Config::from_env().err().unwrap();
        assert!(err.to_string().contains("SL_LISTEN_ADDR"));

        for key in ["SL_LISTEN_ADDR", "SL_CORS_ALLOW_ORIGINS", "SL_REQUEST_TIMEOUT_MS"] {
            std::env::remove_var(key);
        }
    }
}
