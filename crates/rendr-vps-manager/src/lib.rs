/*
[INPUT]:  Public API exports for rendr-vps-manager crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod error;
pub mod instance;
pub mod launcher;
pub mod materializer;
pub mod provisioner;
pub mod secret;

// Re-export main types for convenience
pub use config::{ConfigError, ManagerConfig};
pub use error::ProvisionError;
pub use instance::TerminalInstance;
pub use launcher::{LaunchedTerminal, ProcessLauncher, TerminalLauncher};
pub use materializer::{Materialized, Materializer};
pub use provisioner::{
    AccountRegistry, CycleSummary, MAX_ERROR_MESSAGE_CHARS, ProvisioningLoop, TerminalProvisioner,
    TerminalSetup,
};
pub use secret::{AccountIdSecret, SecretProvider, StaticSecret};
