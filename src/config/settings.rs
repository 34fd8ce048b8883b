/// Environment-backed settings
///
/// Wallet address and API key are optional at load time. They are checked
/// on every poll and query through [`Settings::credentials`], so a missing or
/// malformed value degrades those calls instead of failing startup. Numeric
/// and address settings, by contrast, must parse or startup is aborted.

use std::fmt;
use std::net::SocketAddr;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::time::Duration;

use helius_watch_core::is_valid_wallet_address;
use thiserror::Error;
use url::Url;

pub const WALLET_ADDRESS: &str = "WALLET_ADDRESS";
pub const HELIUS_API_KEY: &str = "HELIUS_API_KEY";
pub const HELIUS_BASE_URL: &str = "HELIUS_BASE_URL";
pub const POLL_INTERVAL_SECS: &str = "POLL_INTERVAL_SECS";
pub const POLL_LIMIT: &str = "POLL_LIMIT";
pub const HTTP_TIMEOUT_SECS: &str = "HTTP_TIMEOUT_SECS";
pub const BIND_ADDR: &str = "BIND_ADDR";
pub const LOG_DIR: &str = "LOG_DIR";

const DEFAULT_BASE_URL: &str = "https://api.helius.xyz/v0";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;
const DEFAULT_POLL_LIMIT: u32 = 10;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 15;
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOG_DIR: &str = "logs";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("WALLET_ADDRESS is not defined in the environment variables")]
    MissingWalletAddress,

    #[error("WALLET_ADDRESS '{0}' is not a valid Solana address")]
    InvalidWalletAddress(String),

    #[error("HELIUS_API_KEY is not defined in the environment variables")]
    MissingApiKey,

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

/// Wallet and API key that passed the per-call checks.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub wallet_address: String,
    pub api_key: String,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("wallet_address", &self.wallet_address)
            .field("api_key", &"***")
            .finish()
    }
}

#[derive(Clone)]
pub struct Settings {
    pub wallet_address: Option<String>,
    pub api_key: Option<String>,
    pub base_url: Url,
    pub poll_interval: Duration,
    pub poll_limit: NonZeroU32,
    pub http_timeout: Duration,
    pub bind_addr: SocketAddr,
    pub log_dir: PathBuf,
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("wallet_address", &self.wallet_address)
            .field("api_key", &self.api_key.as_ref().map(|_| "***"))
            .field("base_url", &self.base_url.as_str())
            .field("poll_interval", &self.poll_interval)
            .field("poll_limit", &self.poll_limit)
            .field("http_timeout", &self.http_timeout)
            .field("bind_addr", &self.bind_addr)
            .field("log_dir", &self.log_dir)
            .finish()
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read settings through an arbitrary key lookup. Blank values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = match get(HELIUS_BASE_URL) {
            Some(raw) => parse_base_url(&raw)?,
            None => parse_base_url(DEFAULT_BASE_URL)?,
        };

        let poll_interval_secs = parse_positive(POLL_INTERVAL_SECS, get(POLL_INTERVAL_SECS), DEFAULT_POLL_INTERVAL_SECS)?;
        let http_timeout_secs = parse_positive(HTTP_TIMEOUT_SECS, get(HTTP_TIMEOUT_SECS), DEFAULT_HTTP_TIMEOUT_SECS)?;

        let poll_limit = match get(POLL_LIMIT) {
            Some(raw) => raw
                .parse::<NonZeroU32>()
                .map_err(|_| ConfigError::InvalidValue { key: POLL_LIMIT, value: raw })?,
            None => NonZeroU32::MIN.saturating_add(DEFAULT_POLL_LIMIT - 1),
        };

        let bind_raw = get(BIND_ADDR).unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidValue { key: BIND_ADDR, value: bind_raw.clone() })?;

        Ok(Self {
            wallet_address: get(WALLET_ADDRESS),
            api_key: get(HELIUS_API_KEY),
            base_url,
            poll_interval: Duration::from_secs(poll_interval_secs),
            poll_limit,
            http_timeout: Duration::from_secs(http_timeout_secs),
            bind_addr,
            log_dir: PathBuf::from(get(LOG_DIR).unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())),
        })
    }

    /// Wallet address and API key, checked in that order.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        let wallet_address = self
            .wallet_address
            .as_deref()
            .ok_or(ConfigError::MissingWalletAddress)?;

        if !is_valid_wallet_address(wallet_address) {
            return Err(ConfigError::InvalidWalletAddress(wallet_address.to_string()));
        }

        let api_key = self.api_key.as_deref().ok_or(ConfigError::MissingApiKey)?;

        Ok(Credentials {
            wallet_address: wallet_address.to_string(),
            api_key: api_key.to_string(),
        })
    }
}

fn parse_base_url(raw: &str) -> Result<Url, ConfigError> {
    let invalid = || ConfigError::InvalidValue { key: HELIUS_BASE_URL, value: raw.to_string() };
    let url = Url::parse(raw).map_err(|_| invalid())?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid());
    }
    Ok(url)
}

fn parse_positive(key: &'static str, raw: Option<String>, default: u64) -> Result<u64, ConfigError> {
    match raw {
        None => Ok(default),
        Some(raw) => match raw.parse::<u64>() {
            Ok(value) if value > 0 => Ok(value),
            _ => Err(ConfigError::InvalidValue { key, value: raw }),
        },
    }
}
