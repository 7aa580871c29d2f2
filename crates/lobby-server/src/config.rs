use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me", "dev-secret-change-me", "secret"];

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub addr: SocketAddr,
    pub cors_origin: String,
    pub sweep_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup so tests need not touch the process env.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let jwt_secret = lookup("LOBBY_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("LOBBY_JWT_SECRET is unset or still a placeholder");
        }

        let host = lookup("LOBBY_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port: u16 = lookup("LOBBY_PORT")
            .unwrap_or_else(|| "8000".into())
            .parse()
            .context("LOBBY_PORT must be a port number")?;
        let addr: SocketAddr = format!("{}:{}", host, port)
            .parse()
            .with_context(|| format!("invalid bind address {}:{}", host, port))?;

        let sweep_interval_secs: u64 = lookup("LOBBY_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|| "60".into())
            .parse()
            .context("LOBBY_SWEEP_INTERVAL_SECS must be a whole number of seconds")?;
        if sweep_interval_secs == 0 {
            bail!("LOBBY_SWEEP_INTERVAL_SECS must be greater than zero");
        }

        Ok(Self {
            jwt_secret,
            db_path: lookup("LOBBY_DB_PATH")
                .unwrap_or_else(|| "lobby.db".into())
                .into(),
            addr,
            cors_origin: lookup("LOBBY_CORS_ORIGIN")
                .unwrap_or_else(|| "http://localhost:5173".into()),
            sweep_interval_secs,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_apply() {
        let config = load(&[("LOBBY_JWT_SECRET", "a-real-secret")]).unwrap();
        assert_eq!(config.addr, "0.0.0.0:8000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.db_path, PathBuf::from("lobby.db"));
        assert_eq!(config.cors_origin, "http://localhost:5173");
        assert_eq!(config.sweep_interval_secs, 60);
    }

    #[test]
    fn missing_or_placeholder_secret_is_fatal() {
        assert!(load(&[]).is_err());
        assert!(load(&[("LOBBY_JWT_SECRET", "dev-secret-change-me")]).is_err());
    }

    #[test]
    fn overrides_are_parsed() {
        let config = load(&[
            ("LOBBY_JWT_SECRET", "a-real-secret"),
            ("LOBBY_HOST", "127.0.0.1"),
            ("LOBBY_PORT", "9000"),
            ("LOBBY_SWEEP_INTERVAL_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:9000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.sweep_interval_secs, 5);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        assert!(load(&[("LOBBY_JWT_SECRET", "s3cret!"), ("LOBBY_PORT", "http")]).is_err());
        assert!(
            load(&[("LOBBY_JWT_SECRET", "s3cret!"), ("LOBBY_SWEEP_INTERVAL_SECS", "0")]).is_err()
        );
    }
}
