use std::net::SocketAddr;

use anyhow::Context;

pub const ADDR_VAR: &str = "LOAN_DESK_ADDR";
pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOG_FILTER: &str = "loan_desk=info";

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let raw = lookup(ADDR_VAR).unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr = raw
            .trim()
            .parse()
            .with_context(|| format!("{ADDR_VAR} is not a socket address: {raw:?}"))?;
        Ok(Self { addr })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_port_3000() {
        let config = Config::from_lookup(|_| None).unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert!(config.addr.ip().is_unspecified());
    }

    #[test]
    fn test_reads_the_address_override() {
        let config = Config::from_lookup(|key| {
            (key == ADDR_VAR).then(|| " 127.0.0.1:8080 ".to_string())
        })
        .unwrap();
        assert_eq!(config.addr, "127.0.0.1:8080".parse().unwrap());
    }

    #[test]
    fn test_rejects_a_malformed_address() {
        let err = Config::from_lookup(|_| Some("localhost".to_string())).unwrap_err();
        assert!(err.to_string().contains(ADDR_VAR));
    }
}
