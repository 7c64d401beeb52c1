/*
[INPUT]:  Pending-account payloads returned by the registry
[OUTPUT]: Lenient wire model and validated provisioning request
[POS]:    Data layer - account payload validation at the client boundary
[UPDATE]: When the pending-account schema or validation rules change
*/

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

use super::enums::Platform;

/// Pending account exactly as the registry sends it.
///
/// Every field is optional and entries are decoded one by one through
/// [`PendingAccount::from_value`], so one malformed entry never fails the
/// whole list; [`PendingAccount::validate`] decides whether it can be
/// provisioned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingAccount {
    #[serde(default)]
    pub external_account_id: Option<String>,
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub broker: Option<String>,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub login: Option<String>,
    #[serde(default)]
    pub investor_password: Option<String>,
    /// Set when the entry did not match the expected shape
    #[serde(skip)]
    pub decode_error: Option<String>,
}

/// Reasons a pending account cannot be provisioned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("unsupported platform: {0}")]
    UnsupportedPlatform(String),

    #[error("invalid account identifier: {0:?}")]
    InvalidIdentifier(String),

    #[error("malformed account payload: {0}")]
    Malformed(String),
}

/// Account validated and ready for provisioning
#[derive(Clone, PartialEq, Eq)]
pub struct ProvisioningRequest {
    pub external_account_id: String,
    pub platform: Platform,
    pub broker: Option<String>,
    pub server: String,
    pub login: String,
    pub investor_password: String,
}

impl fmt::Debug for ProvisioningRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisioningRequest")
            .field("external_account_id", &self.external_account_id)
            .field("platform", &self.platform)
            .field("broker", &self.broker)
            .field("server", &self.server)
            .field("login", &self.login)
            .field("investor_password", &"<redacted>")
            .finish()
    }
}

impl PendingAccount {
    /// Decode one registry entry.
    ///
    /// Never fails: an entry of the wrong shape keeps its identifier (when it
    /// is a string) and carries the decode error, so it can still be reported.
    pub fn from_value(value: serde_json::Value) -> Self {
        let external_account_id = value
            .get("external_account_id")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string);
        serde_json::from_value(value).unwrap_or_else(|err| Self {
            external_account_id,
            decode_error: Some(err.to_string()),
            ..Self::default()
        })
    }

    /// Identifier usable for a status report, if any
    pub fn account_id(&self) -> Option<&str> {
        non_empty(&self.external_account_id)
    }

    /// Convert into a typed request, rejecting incomplete payloads
    pub fn validate(&self) -> Result<ProvisioningRequest, ValidationError> {
        if let Some(err) = &self.decode_error {
            return Err(ValidationError::Malformed(err.clone()));
        }
        let external_account_id = required(&self.external_account_id, "external_account_id")?;
        if !is_safe_identifier(external_account_id) {
            return Err(ValidationError::InvalidIdentifier(
                external_account_id.to_string(),
            ));
        }

        let platform = required(&self.platform, "platform")?;
        let platform = platform
            .parse::<Platform>()
            .map_err(|_| ValidationError::UnsupportedPlatform(platform.to_string()))?;

        Ok(ProvisioningRequest {
            external_account_id: external_account_id.to_string(),
            platform,
            broker: non_empty(&self.broker).map(str::to_string),
            server: required(&self.server, "server")?.to_string(),
            login: required(&self.login, "login")?.to_string(),
            investor_password: required(&self.investor_password, "investor_password")?
                .to_string(),
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn required<'a>(value: &'a Option<String>, field: &'static str) -> Result<&'a str, ValidationError> {
    non_empty(value).ok_or(ValidationError::MissingField(field))
}

// The identifier becomes a directory name, so it must not leave the base dir.
fn is_safe_identifier(id: &str) -> bool {
    id != "." && id != ".." && !id.contains(['/', '\\']) && !id.contains('\0')
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<serde_json::Value>::deserialize(deserializer)? {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(value)) => Ok(Some(value)),
        Some(serde_json::Value::Number(value)) => Ok(Some(value.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}
