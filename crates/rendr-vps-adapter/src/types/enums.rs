/*
[INPUT]:  Registry schema definitions and serde requirements
[OUTPUT]: Typed Rust enums with serialization support
[POS]:    Data layer - type definitions for registry communication
[UPDATE]: When the registry schema changes or new platforms are supported
*/

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported terminal platform variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    #[serde(rename = "MT4", alias = "mt4")]
    Mt4,
    #[serde(rename = "MT5", alias = "mt5")]
    Mt5,
}

impl Platform {
    pub const ALL: [Platform; 2] = [Platform::Mt4, Platform::Mt5];

    /// Wire/directory tag, e.g. `MT4`
    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Mt4 => "MT4",
            Platform::Mt5 => "MT5",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_uppercase().as_str() {
            "MT4" => Ok(Platform::Mt4),
            "MT5" => Ok(Platform::Mt5),
            other => Err(format!("unsupported platform: {other}")),
        }
    }
}

/// Provisioning status persisted by the registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Connected,
    Error,
    Disconnected,
}

impl AccountStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AccountStatus::Connected => "connected",
            AccountStatus::Error => "error",
            AccountStatus::Disconnected => "disconnected",
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
