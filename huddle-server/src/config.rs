use huddle_core::IceServerConfig;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_STATIC_DIR: &str = "public";
pub const DEFAULT_STUN_URL: &str = "stun:stun.l.google.com:19302";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("HUDDLE_ADDR is not a socket address: {value}")]
    InvalidAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("{set} is set but {missing} is not; TLS needs both")]
    PartialTls {
        set: &'static str,
        missing: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsConfig {
    pub cert_path: PathBuf,
    pub key_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub addr: SocketAddr,
    pub static_dir: PathBuf,
    pub tls: Option<TlsConfig>,
    pub ice_servers: Vec<IceServerConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            tls: None,
            ice_servers: vec![IceServerConfig::stun(DEFAULT_STUN_URL)],
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| normalize_opt(lookup(key));

        let addr_raw = get("HUDDLE_ADDR").unwrap_or_else(|| DEFAULT_ADDR.to_string());
        let addr: SocketAddr = addr_raw
            .parse()
            .map_err(|source| ConfigError::InvalidAddr {
                value: addr_raw.clone(),
                source,
            })?;

        let static_dir = get("HUDDLE_STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let tls = match (get("HUDDLE_TLS_CERT"), get("HUDDLE_TLS_KEY")) {
            (Some(cert), Some(key)) => Some(TlsConfig {
                cert_path: cert.into(),
                key_path: key.into(),
            }),
            (None, None) => None,
            (Some(_), None) => {
                return Err(ConfigError::PartialTls {
                    set: "HUDDLE_TLS_CERT",
                    missing: "HUDDLE_TLS_KEY",
                });
            }
            (None, Some(_)) => {
                return Err(ConfigError::PartialTls {
                    set: "HUDDLE_TLS_KEY",
                    missing: "HUDDLE_TLS_CERT",
                });
            }
        };

        let mut ice_servers: Vec<IceServerConfig> = get("HUDDLE_STUN_URLS")
            .unwrap_or_else(|| DEFAULT_STUN_URL.to_string())
            .split(',')
            .filter_map(|url| normalize_opt(Some(url.to_string())))
            .map(IceServerConfig::stun)
            .collect();

        if let Some(turn_url) = get("TURN_URL") {
            ice_servers.push(IceServerConfig {
                urls: vec![turn_url],
                username: get("TURN_USERNAME"),
                credential: get("TURN_CREDENTIAL"),
            });
        }

        Ok(Self {
            addr,
            static_dir,
            tls,
            ice_servers,
        })
    }
}

fn normalize_opt(value: Option<String>) -> Option<String> {
    value.and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}
