/*
[INPUT]:  Registry schema definitions and serde requirements
[OUTPUT]: Typed Rust request structs with serialization support
[POS]:    Data layer - type definitions for registry communication
[UPDATE]: When the registry schema changes or new types added
*/

use serde::{Deserialize, Serialize};

use super::enums::AccountStatus;

/// Body of POST /api/vps/account-status
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountStatusRequest {
    pub external_account_id: String,
    pub status: AccountStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl AccountStatusRequest {
    pub fn connected(external_account_id: impl Into<String>) -> Self {
        Self {
            external_account_id: external_account_id.into(),
            status: AccountStatus::Connected,
            error_message: None,
        }
    }

    pub fn error(external_account_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            external_account_id: external_account_id.into(),
            status: AccountStatus::Error,
            error_message: Some(message.into()),
        }
    }
}
