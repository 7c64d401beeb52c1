/*
[INPUT]:  Account registry, terminal provisioner, polling interval, CancellationToken
[OUTPUT]: One status write per processed account, cycle after cycle
[POS]:    Orchestration layer - sequential polling loop with per-account error boundary
[UPDATE]: When changing cycle semantics, status reporting, or shutdown handling
*/

use async_trait::async_trait;
use futures_util::FutureExt as _;
use rendr_vps_adapter::{AccountStatusRequest, PendingAccount, ProvisioningRequest, RegistryClient};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::ProvisionError;
use crate::launcher::{LaunchedTerminal, TerminalLauncher};
use crate::materializer::Materializer;

/// Upper bound on the diagnostic sent with an `error` status
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// Remote ledger of pending accounts and their provisioning status
#[async_trait]
pub trait AccountRegistry: Send + Sync {
    /// Accounts awaiting setup; empty when the registry is unreachable
    async fn pending_accounts(&self) -> Vec<PendingAccount>;

    /// Overwrite an account's status; `false` when the write failed
    async fn report_status(&self, request: &AccountStatusRequest) -> bool;
}

#[async_trait]
impl AccountRegistry for RegistryClient {
    async fn pending_accounts(&self) -> Vec<PendingAccount> {
        RegistryClient::pending_accounts(self).await
    }

    async fn report_status(&self, request: &AccountStatusRequest) -> bool {
        self.report_account_status(request).await
    }
}

/// Turns a validated request into a running terminal
#[async_trait]
pub trait TerminalProvisioner: Send + Sync {
    async fn provision(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<LaunchedTerminal, ProvisionError>;
}

/// Materializer followed by launcher
pub struct TerminalSetup<L> {
    materializer: Arc<Materializer>,
    launcher: L,
}

impl<L: TerminalLauncher> TerminalSetup<L> {
    pub fn new(materializer: Materializer, launcher: L) -> Self {
        Self {
            materializer: Arc::new(materializer),
            launcher,
        }
    }
}

#[async_trait]
impl<L: TerminalLauncher> TerminalProvisioner for TerminalSetup<L> {
    async fn provision(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<LaunchedTerminal, ProvisionError> {
        // Copying a template is heavy blocking I/O; keep it off the runtime workers.
        let materializer = self.materializer.clone();
        let owned = request.clone();
        let materialized = tokio::task::spawn_blocking(move || materializer.materialize(&owned))
            .await
            .map_err(|err| ProvisionError::Internal(format!("materializer task failed: {err}")))??;
        self.launcher.launch(&materialized.instance).await
    }
}

/// Counters for one polling cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub fetched: usize,
    pub connected: usize,
    pub failed: usize,
    /// Entries without an identifier to report against
    pub skipped: usize,
    /// Status writes the registry did not accept
    pub unreported: usize,
}

enum AccountOutcome {
    Connected { reported: bool },
    Failed { reported: bool },
    Skipped,
}

/// Polls the registry and provisions pending accounts one at a time
pub struct ProvisioningLoop<R, P> {
    registry: R,
    provisioner: P,
    interval: Duration,
}

impl<R: AccountRegistry, P: TerminalProvisioner> ProvisioningLoop<R, P> {
    pub fn new(registry: R, provisioner: P, interval: Duration) -> Self {
        Self {
            registry,
            provisioner,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run cycles until `shutdown` is cancelled.
    ///
    /// Cancellation is only observed between cycles; an account being
    /// provisioned always runs to completion.
    pub async fn run(&self, shutdown: CancellationToken) {
        info!(interval_secs = self.interval.as_secs(), "provisioning loop starting");

        while !shutdown.is_cancelled() {
            if let Err(panic) = AssertUnwindSafe(self.run_cycle()).catch_unwind().await {
                error!(panic = %panic_message(&*panic), "provisioning cycle panicked");
            }

            tokio::select! {
                _ = shutdown.cancelled() => break,
                _ = tokio::time::sleep(self.interval) => {}
            }
        }

        info!("provisioning loop stopped");
    }

    /// Fetch pending accounts and provision each of them once
    pub async fn run_cycle(&self) -> CycleSummary {
        let accounts = self.registry.pending_accounts().await;
        let mut summary = CycleSummary {
            fetched: accounts.len(),
            ..CycleSummary::default()
        };
        if accounts.is_empty() {
            info!("no pending accounts");
            return summary;
        }
        info!(count = accounts.len(), "processing pending accounts");

        for account in &accounts {
            let outcome = AssertUnwindSafe(self.process_account(account))
                .catch_unwind()
                .await;
            match outcome {
                Ok(AccountOutcome::Connected { reported }) => {
                    summary.connected += 1;
                    summary.unreported += usize::from(!reported);
                }
                Ok(AccountOutcome::Failed { reported }) => {
                    summary.failed += 1;
                    summary.unreported += usize::from(!reported);
                }
                Ok(AccountOutcome::Skipped) => summary.skipped += 1,
                Err(panic) => {
                    summary.failed += 1;
                    let message = format!("internal panic: {}", panic_message(&*panic));
                    error!(account_id = ?account.account_id(), %message, "account provisioning panicked");
                    let reported = match account.account_id() {
                        Some(account_id) => self.report_error(account_id, &message).await,
                        None => false,
                    };
                    summary.unreported += usize::from(!reported);
                }
            }
        }

        info!(
            fetched = summary.fetched,
            connected = summary.connected,
            failed = summary.failed,
            skipped = summary.skipped,
            unreported = summary.unreported,
            "provisioning cycle complete"
        );
        summary
    }

    async fn process_account(&self, account: &PendingAccount) -> AccountOutcome {
        let Some(account_id) = account.account_id() else {
            warn!(
                platform = ?account.platform,
                "pending account without external_account_id; skipping"
            );
            return AccountOutcome::Skipped;
        };
        info!(account_id = %account_id, "provisioning account");

        let result = match account.validate() {
            Ok(request) => self.provisioner.provision(&request).await,
            Err(err) => Err(ProvisionError::from(err)),
        };

        match result {
            Ok(launched) => {
                info!(account_id = %account_id, pid = ?launched.pid, "terminal connected");
                let reported = self
                    .registry
                    .report_status(&AccountStatusRequest::connected(account_id))
                    .await;
                AccountOutcome::Connected { reported }
            }
            Err(err) => {
                error!(
                    account_id = %account_id,
                    kind = err.kind(),
                    error = %err,
                    "account provisioning failed"
                );
                let reported = self.report_error(account_id, &err.to_string()).await;
                AccountOutcome::Failed { reported }
            }
        }
    }

    async fn report_error(&self, account_id: &str, message: &str) -> bool {
        let message = truncate_message(message, MAX_ERROR_MESSAGE_CHARS);
        self.registry
            .report_status(&AccountStatusRequest::error(account_id, message))
            .await
    }
}

/// Cut `message` to at most `max_chars` characters
pub fn truncate_message(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((end, _)) => message[..end].to_string(),
        None => message.to_string(),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_message_unchanged() {
        assert_eq!(truncate_message("boom", 500), "boom");
        assert_eq!(truncate_message("", 500), "");
    }

    #[test]
    fn test_truncate_counts_characters() {
        let message = "é".repeat(600);
        let truncated = truncate_message(&message, MAX_ERROR_MESSAGE_CHARS);
        assert_eq!(truncated.chars().count(), 500);
        assert!(message.starts_with(&truncated));

        let exact = "x".repeat(500);
        assert_eq!(truncate_message(&exact, 500), exact);
    }

    #[test]
    fn test_panic_message_payloads() {
        let static_str: Box<dyn std::any::Any + Send> = Box::new("static");
        assert_eq!(panic_message(&*static_str), "static");
        let owned: Box<dyn std::any::Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(&*owned), "owned");
        let other: Box<dyn std::any::Any + Send> = Box::new(7_u8);
        assert_eq!(panic_message(&*other), "unknown panic payload");
    }
}
