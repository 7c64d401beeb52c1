/*
[INPUT]:  Validated provisioning request
[OUTPUT]: Shared secret the EA uses to sign trade submissions
[POS]:    Integration layer - pluggable secret source for the EA config file
[UPDATE]: When the backend's signature verification changes
*/

use rendr_vps_adapter::ProvisioningRequest;
use std::fmt;
use std::sync::Arc;

use crate::config::ManagerConfig;

/// Source of the shared secret written into each instance's integration config.
pub trait SecretProvider: Send + Sync {
    fn secret_for(&self, request: &ProvisioningRequest) -> String;
}

/// Uses the account identifier as the secret.
///
/// This is what the backend's trade signature guard verifies against today.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountIdSecret;

impl SecretProvider for AccountIdSecret {
    fn secret_for(&self, request: &ProvisioningRequest) -> String {
        request.external_account_id.clone()
    }
}

/// One configured secret shared by every instance
#[derive(Clone)]
pub struct StaticSecret(String);

impl StaticSecret {
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }
}

impl fmt::Debug for StaticSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticSecret(<redacted>)")
    }
}

impl SecretProvider for StaticSecret {
    fn secret_for(&self, _request: &ProvisioningRequest) -> String {
        self.0.clone()
    }
}

/// Pick the provider matching `integration_secret`
pub fn from_config(config: &ManagerConfig) -> Arc<dyn SecretProvider> {
    match config.integration_secret.as_deref().map(str::trim) {
        Some(secret) if !secret.is_empty() => Arc::new(StaticSecret::new(secret)),
        _ => Arc::new(AccountIdSecret),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rendr_vps_adapter::Platform;

    fn request() -> ProvisioningRequest {
        ProvisioningRequest {
            external_account_id: "abc-123".to_string(),
            platform: Platform::Mt4,
            broker: None,
            server: "Broker-Live".to_string(),
            login: "12345".to_string(),
            investor_password: "secretpw".to_string(),
        }
    }

    #[test]
    fn test_default_provider_uses_account_id() {
        let provider = from_config(&ManagerConfig::default());
        assert_eq!(provider.secret_for(&request()), "abc-123");
    }

    #[test]
    fn test_configured_secret_wins() {
        let mut config = ManagerConfig::default();
        config.integration_secret = Some("  shared  ".to_string());
        assert_eq!(from_config(&config).secret_for(&request()), "shared");

        config.integration_secret = Some("   ".to_string());
        assert_eq!(from_config(&config).secret_for(&request()), "abc-123");
    }
}
