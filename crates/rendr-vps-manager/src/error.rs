/*
[INPUT]:  Failures from validation, filesystem, and process launch
[OUTPUT]: Per-account provisioning error with a stable kind tag
[POS]:    Error handling layer - everything the loop turns into an `error` status
[UPDATE]: When adding a new provisioning failure mode
*/

use rendr_vps_adapter::{Platform, ValidationError};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// A single account's provisioning failure
#[derive(Error, Debug)]
pub enum ProvisionError {
    #[error("invalid account: {0}")]
    Validation(#[from] ValidationError),

    #[error("{platform} template not found: {}", .path.display())]
    TemplateMissing { platform: Platform, path: PathBuf },

    #[error("integration binary not found: {}", .path.display())]
    IntegrationBinaryMissing { path: PathBuf },

    #[error("connection field {0} is empty")]
    EmptyConnectionField(&'static str),

    #[error("connection field {0} contains a line break")]
    MalformedConnectionField(&'static str),

    #[error("failed to {action} {}: {source}", .path.display())]
    Filesystem {
        action: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("terminal executable not found: {}", .path.display())]
    ExecutableMissing { path: PathBuf },

    #[error("connection config not found: {}", .path.display())]
    ConnectionConfigMissing { path: PathBuf },

    #[error("failed to start {}: {source}", .path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("terminal exited during startup ({})", exit_description(.code))]
    ExitedEarly { code: Option<i32> },

    #[error("failed to probe terminal process: {0}")]
    Probe(#[source] io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ProvisionError {
    /// Short classification used in structured logs
    pub fn kind(&self) -> &'static str {
        match self {
            ProvisionError::Validation(_) => "validation",
            ProvisionError::TemplateMissing { .. }
            | ProvisionError::IntegrationBinaryMissing { .. }
            | ProvisionError::ExecutableMissing { .. }
            | ProvisionError::ConnectionConfigMissing { .. } => "precondition",
            ProvisionError::EmptyConnectionField(_)
            | ProvisionError::MalformedConnectionField(_) => "connection_config",
            ProvisionError::Filesystem { .. } => "filesystem",
            ProvisionError::Spawn { .. }
            | ProvisionError::ExitedEarly { .. }
            | ProvisionError::Probe(_) => "launch",
            ProvisionError::Internal(_) => "internal",
        }
    }

    pub(crate) fn filesystem(action: &'static str, path: &Path) -> impl FnOnce(io::Error) -> Self {
        let path = path.to_path_buf();
        move |source| ProvisionError::Filesystem {
            action,
            path,
            source,
        }
    }
}

fn exit_description(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exited_early_message_carries_code() {
        let err = ProvisionError::ExitedEarly { code: Some(3) };
        assert_eq!(err.to_string(), "terminal exited during startup (exit code 3)");
        assert_eq!(err.kind(), "launch");

        let signalled = ProvisionError::ExitedEarly { code: None };
        assert!(signalled.to_string().contains("terminated by signal"));
    }

    #[test]
    fn test_kinds() {
        let missing = ProvisionError::TemplateMissing {
            platform: Platform::Mt4,
            path: PathBuf::from("/opt/mt4"),
        };
        assert_eq!(missing.kind(), "precondition");
        assert_eq!(missing.to_string(), "MT4 template not found: /opt/mt4");

        let validation = ProvisionError::from(ValidationError::MissingField("server"));
        assert_eq!(validation.kind(), "validation");
        assert_eq!(
            validation.to_string(),
            "invalid account: missing required field: server"
        );
    }

    #[test]
    fn test_filesystem_helper() {
        let make = ProvisionError::filesystem("write", Path::new("/tmp/x.ini"));
        let err = make(io::Error::new(io::ErrorKind::PermissionDenied, "denied"));
        assert_eq!(err.kind(), "filesystem");
        assert_eq!(err.to_string(), "failed to write /tmp/x.ini: denied");
    }
}
