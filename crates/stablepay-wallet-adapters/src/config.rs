use std::time::Duration;

use thiserror::Error;

pub const ENV_API_BASE_URL: &str = "STABLEPAY_API_BASE_URL";
pub const ENV_API_TIMEOUT_MS: &str = "STABLEPAY_API_TIMEOUT_MS";
pub const ENV_BALANCE_POLL_MS: &str = "STABLEPAY_BALANCE_POLL_MS";
pub const ENV_RUNTIME_PROFILE: &str = "STABLEPAY_RUNTIME_PROFILE";
pub const ENV_CREATE_WALLET_PATH: &str = "STABLEPAY_CREATE_WALLET_PATH";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be a positive integer, got {value:?}")]
    InvalidNumber { key: &'static str, value: String },
    #[error("STABLEPAY_RUNTIME_PROFILE must be `development` or `production`, got {0:?}")]
    InvalidRuntimeProfile(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RuntimeProfile {
    /// Falls back to the in-memory ledger when no API is configured.
    #[default]
    Development,
    /// Refuses to run without a real custody API.
    Production,
}

impl RuntimeProfile {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Some(Self::Development),
            "production" | "prod" => Some(Self::Production),
            _ => None,
        }
    }
}

/// Request paths relative to the API base URL. `{address}` in `balance` is
/// replaced with the wallet address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustodyEndpoints {
    pub create_owner_address: String,
    pub owner_lookup: String,
    pub balance: String,
    pub mint: String,
    pub approve: String,
    pub transfer_from: String,
    pub customers: String,
}

impl Default for CustodyEndpoints {
    fn default() -> Self {
        Self {
            create_owner_address: "/api/wallet/createOwnerAddress".to_owned(),
            owner_lookup: "/api/bankAdmin/getOwnerAddress".to_owned(),
            balance: "/api/{address}/balance".to_owned(),
            mint: "/api/mint".to_owned(),
            approve: "/api/wallet/approve".to_owned(),
            transfer_from: "/api/dex/transferFrom".to_owned(),
            customers: "/api/customers".to_owned(),
        }
    }
}

impl CustodyEndpoints {
    /// The address is percent-encoded as a single path segment.
    pub fn balance_path(&self, address: &str) -> String {
        self.balance.replace("{address}", &urlencoding::encode(address))
    }
}

#[derive(Debug, Clone)]
pub struct CustodyAdapterConfig {
    pub runtime_profile: RuntimeProfile,
    pub base_url: Option<String>,
    pub timeout_ms: u64,
    pub balance_poll_interval_ms: u64,
    pub endpoints: CustodyEndpoints,
}

impl Default for CustodyAdapterConfig {
    fn default() -> Self {
        Self {
            runtime_profile: RuntimeProfile::Development,
            base_url: None,
            timeout_ms: 30_000,
            balance_poll_interval_ms: 30_000,
            endpoints: CustodyEndpoints::default(),
        }
    }
}

impl CustodyAdapterConfig {
    /// Reads the process environment. Invalid values are logged and the
    /// defaults are used instead.
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_else(|err| {
            tracing::warn!(error = %err, "invalid custody configuration, using defaults");
            Self::default()
        })
    }

    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        };

        let mut config = Self::default();
        if let Some(url) = get(ENV_API_BASE_URL) {
            config.base_url = Some(url.trim_end_matches('/').to_owned());
        }
        if let Some(raw) = get(ENV_API_TIMEOUT_MS) {
            config.timeout_ms = parse_millis(ENV_API_TIMEOUT_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_BALANCE_POLL_MS) {
            config.balance_poll_interval_ms = parse_millis(ENV_BALANCE_POLL_MS, &raw)?;
        }
        if let Some(raw) = get(ENV_RUNTIME_PROFILE) {
            config.runtime_profile = RuntimeProfile::parse(&raw)
                .ok_or(ConfigError::InvalidRuntimeProfile(raw))?;
        }
        if let Some(path) = get(ENV_CREATE_WALLET_PATH) {
            config.endpoints.create_owner_address = path;
        }
        Ok(config)
    }

    pub fn strict_runtime_required(&self) -> bool {
        self.runtime_profile == RuntimeProfile::Production
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn balance_poll_interval(&self) -> Duration {
        Duration::from_millis(self.balance_poll_interval_ms)
    }
}

fn parse_millis(key: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(ms),
        _ => Err(ConfigError::InvalidNumber {
            key,
            value: raw.to_owned(),
        }),
    }
}
