/*
[INPUT]:  Optional configuration file + process environment
[OUTPUT]: Validated manager configuration
[POS]:    Configuration layer - loaded once at startup, passed to components
[UPDATE]: When adding new configuration options
*/

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, Environment, File, Value};
use rendr_vps_adapter::{DEFAULT_API_URL, Platform};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Loaded from the working directory when `--config` is not given
pub const DEFAULT_CONFIG_FILE: &str = "config.ini";

const REGISTER_SUFFIX: &str = "/api/trades/register";
const TRADES_SUFFIX: &str = "/api/trades";

/// Sectioned keys of the INI layout and the flat key each one feeds
const SECTION_KEYS: [(&str, &str); 8] = [
    ("api.url", "api_url"),
    ("api.api_key", "vps_api_key"),
    ("api.polling_interval", "polling_interval"),
    ("mt4.path", "mt4_path"),
    ("mt4.ea_path", "mt4_ea_path"),
    ("mt5.path", "mt5_path"),
    ("mt5.ea_path", "mt5_ea_path"),
    ("paths.terminals_base", "terminals_base_path"),
];

/// Fatal startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] ::config::ConfigError),

    #[error("VPS_API_KEY must be set (environment or config file)")]
    MissingApiKey,

    #[error("invalid api_url {url:?}: {reason}")]
    InvalidApiUrl { url: String, reason: String },

    #[error("polling_interval must be a positive number of seconds")]
    ZeroPollingInterval,
}

/// Top-level configuration for the VPS manager.
///
/// Keys match the environment variable names lowercased, so `VPS_API_KEY`
/// in the environment overrides `vps_api_key` from the file.
#[derive(Clone, Deserialize, Serialize)]
pub struct ManagerConfig {
    /// Backend base URL
    #[serde(default = "default_api_url")]
    pub api_url: String,
    /// Pre-shared key sent as `X-VPS-API-Key`
    #[serde(default)]
    pub vps_api_key: String,
    /// Seconds between two polling cycles
    #[serde(default = "default_polling_interval")]
    pub polling_interval: u64,
    /// MT4 template installation
    #[serde(default = "default_mt4_path")]
    pub mt4_path: PathBuf,
    /// MT5 template installation
    #[serde(default = "default_mt5_path")]
    pub mt5_path: PathBuf,
    /// MT4 integration binary (EA) copied into each instance
    #[serde(default = "default_mt4_ea_path")]
    pub mt4_ea_path: PathBuf,
    /// MT5 integration binary (EA) copied into each instance
    #[serde(default = "default_mt5_ea_path")]
    pub mt5_ea_path: PathBuf,
    /// Directory holding one instance directory per account
    #[serde(default = "default_terminals_base_path")]
    pub terminals_base_path: PathBuf,
    /// Seconds a freshly spawned terminal must survive
    #[serde(default = "default_launch_grace_period_secs")]
    pub launch_grace_period_secs: u64,
    /// Profile name written into the connection file
    #[serde(default = "default_profile")]
    pub profile: String,
    /// Shared secret written for the EA; the account id is used when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration_secret: Option<String>,
}

/// Template and integration-binary sources for one platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlatformPaths<'a> {
    pub template_root: &'a Path,
    pub integration_binary: &'a Path,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            vps_api_key: String::new(),
            polling_interval: default_polling_interval(),
            mt4_path: default_mt4_path(),
            mt5_path: default_mt5_path(),
            mt4_ea_path: default_mt4_ea_path(),
            mt5_ea_path: default_mt5_ea_path(),
            terminals_base_path: default_terminals_base_path(),
            launch_grace_period_secs: default_launch_grace_period_secs(),
            profile: default_profile(),
            integration_secret: None,
        }
    }
}

impl fmt::Debug for ManagerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagerConfig")
            .field("api_url", &self.api_url)
            .field("vps_api_key", &"<redacted>")
            .field("polling_interval", &self.polling_interval)
            .field("mt4_path", &self.mt4_path)
            .field("mt5_path", &self.mt5_path)
            .field("mt4_ea_path", &self.mt4_ea_path)
            .field("mt5_ea_path", &self.mt5_ea_path)
            .field("terminals_base_path", &self.terminals_base_path)
            .field("launch_grace_period_secs", &self.launch_grace_period_secs)
            .field("profile", &self.profile)
            .field(
                "integration_secret",
                &self.integration_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_polling_interval() -> u64 {
    30
}

fn default_mt4_path() -> PathBuf {
    PathBuf::from(r"C:\Program Files\MetaTrader 4")
}

fn default_mt5_path() -> PathBuf {
    PathBuf::from(r"C:\Program Files\MetaTrader 5")
}

fn default_mt4_ea_path() -> PathBuf {
    PathBuf::from(r"C:\RendR\EA\RendR.mq4")
}

fn default_mt5_ea_path() -> PathBuf {
    PathBuf::from(r"C:\RendR\EA\RendR.mq5")
}

fn default_terminals_base_path() -> PathBuf {
    PathBuf::from(r"C:\MT_Terminals")
}

fn default_launch_grace_period_secs() -> u64 {
    5
}

fn default_profile() -> String {
    "default".to_string()
}

impl ManagerConfig {
    /// Load configuration from a file, then the environment.
    ///
    /// Without an explicit path, `config.ini` in the working directory is
    /// used when present.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };
        Self::from_builder(
            Config::builder()
                .add_source(file)
                .add_source(Environment::default().try_parsing(true)),
        )
    }

    pub(crate) fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: Self = resolve_section_keys(builder.build()?)?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations the manager cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.vps_api_key.trim().is_empty() {
            return Err(ConfigError::MissingApiKey);
        }
        url::Url::parse(self.api_url.trim()).map_err(|err| ConfigError::InvalidApiUrl {
            url: self.api_url.clone(),
            reason: err.to_string(),
        })?;
        if self.polling_interval == 0 {
            return Err(ConfigError::ZeroPollingInterval);
        }
        Ok(())
    }

    pub fn polling_duration(&self) -> Duration {
        Duration::from_secs(self.polling_interval)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_secs(self.launch_grace_period_secs)
    }

    pub fn platform_paths(&self, platform: Platform) -> PlatformPaths<'_> {
        match platform {
            Platform::Mt4 => PlatformPaths {
                template_root: &self.mt4_path,
                integration_binary: &self.mt4_ea_path,
            },
            Platform::Mt5 => PlatformPaths {
                template_root: &self.mt5_path,
                integration_binary: &self.mt5_ea_path,
            },
        }
    }

    /// Endpoint the EA uses to register its trading account
    pub fn registration_url(&self) -> String {
        format!("{}{REGISTER_SUFFIX}", self.api_base())
    }

    /// Endpoint the EA submits closed trades to
    pub fn trades_url(&self) -> String {
        format!("{}{TRADES_SUFFIX}", self.api_base())
    }

    fn api_base(&self) -> &str {
        self.api_url.trim().trim_end_matches('/')
    }
}

/// Fill flat keys from `[api]`, `[mt4]`, `[mt5]` and `[paths]` sections.
///
/// A flat key already set by any source (environment included) wins.
fn resolve_section_keys(raw: Config) -> Result<Config, ConfigError> {
    let mut resolved = Config::builder().add_source(raw.clone());
    for (section_key, flat_key) in SECTION_KEYS {
        if raw.get::<Value>(flat_key).is_ok() {
            continue;
        }
        if let Ok(value) = raw.get::<Value>(section_key) {
            resolved = resolved.set_override(flat_key, value)?;
        }
    }
    Ok(resolved.build()?)
}
