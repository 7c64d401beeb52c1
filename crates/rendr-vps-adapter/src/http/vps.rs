/*
[INPUT]:  VPS API key and account status updates
[OUTPUT]: Pending accounts and status-write acknowledgements
[POS]:    HTTP layer - VPS provisioning endpoints
[UPDATE]: When the pending-accounts or account-status contract changes
*/

use crate::http::{RegistryClient, Result};
use crate::types::{AccountStatusRequest, PendingAccount};
use reqwest::Method;
use tracing::{debug, error, info, warn};

const PENDING_ACCOUNTS_ENDPOINT: &str = "/api/vps/pending-accounts";
const ACCOUNT_STATUS_ENDPOINT: &str = "/api/vps/account-status";

impl RegistryClient {
    /// Fetch accounts awaiting terminal setup
    ///
    /// GET /api/vps/pending-accounts
    ///
    /// Only a body that is not a JSON array fails; each element is decoded on
    /// its own, see [`PendingAccount::from_value`].
    pub async fn fetch_pending_accounts(&self) -> Result<Vec<PendingAccount>> {
        let builder = self.request(Method::GET, PENDING_ACCOUNTS_ENDPOINT)?;
        let entries: Vec<serde_json::Value> = self.send_json(builder).await?;
        let accounts: Vec<PendingAccount> =
            entries.into_iter().map(PendingAccount::from_value).collect();
        for account in accounts.iter().filter(|account| account.decode_error.is_some()) {
            warn!(
                account_id = ?account.external_account_id,
                error = ?account.decode_error,
                "pending account entry has an unexpected shape"
            );
        }
        Ok(accounts)
    }

    /// Same as [`fetch_pending_accounts`](Self::fetch_pending_accounts), but
    /// any failure is logged and degraded to an empty list.
    pub async fn pending_accounts(&self) -> Vec<PendingAccount> {
        match self.fetch_pending_accounts().await {
            Ok(accounts) => {
                debug!(count = accounts.len(), "fetched pending accounts");
                accounts
            }
            Err(err) => {
                error!(
                    endpoint = PENDING_ACCOUNTS_ENDPOINT,
                    status = ?err.status(),
                    transport = err.is_transport(),
                    error = %err,
                    "failed to fetch pending accounts"
                );
                Vec::new()
            }
        }
    }

    /// Overwrite the provisioning status of an account
    ///
    /// POST /api/vps/account-status
    pub async fn post_account_status(&self, request: &AccountStatusRequest) -> Result<()> {
        let builder = self.request(Method::POST, ACCOUNT_STATUS_ENDPOINT)?;
        self.send(builder.json(request)).await?;
        Ok(())
    }

    /// Report a status, returning `false` instead of an error on failure.
    pub async fn report_account_status(&self, request: &AccountStatusRequest) -> bool {
        match self.post_account_status(request).await {
            Ok(()) => {
                info!(
                    account_id = %request.external_account_id,
                    status = %request.status,
                    "account status updated"
                );
                true
            }
            Err(err) => {
                error!(
                    endpoint = ACCOUNT_STATUS_ENDPOINT,
                    account_id = %request.external_account_id,
                    status = %request.status,
                    http_status = ?err.status(),
                    error = %err,
                    "failed to update account status"
                );
                false
            }
        }
    }
}
