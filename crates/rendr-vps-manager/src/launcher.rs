/*
[INPUT]:  Materialized terminal instance, grace period
[OUTPUT]: Detached terminal process that survived the startup probe
[POS]:    Execution layer - process spawn + one-shot liveness check
[UPDATE]: When launch arguments, detachment, or the liveness probe change
*/

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::ProvisionError;
use crate::instance::TerminalInstance;

#[cfg(windows)]
const CREATE_NO_WINDOW: u32 = 0x0800_0000;
#[cfg(windows)]
const DETACHED_PROCESS: u32 = 0x0000_0008;

/// Terminal that was still running after the grace period.
///
/// The process is not supervised afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedTerminal {
    pub pid: Option<u32>,
    pub executable: PathBuf,
}

/// Starts a materialized instance
#[async_trait]
pub trait TerminalLauncher: Send + Sync {
    async fn launch(&self, instance: &TerminalInstance) -> Result<LaunchedTerminal, ProvisionError>;
}

/// Spawns the instance executable as a detached OS process
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    grace_period: Duration,
}

impl ProcessLauncher {
    pub fn new(grace_period: Duration) -> Self {
        Self { grace_period }
    }

    pub fn grace_period(&self) -> Duration {
        self.grace_period
    }

    fn command(&self, instance: &TerminalInstance, executable: &Path) -> Command {
        let mut command = Command::new(executable);
        command
            .arg(instance.connection_config_arg())
            .current_dir(instance.root())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(false);

        // Own process group: a Ctrl-C aimed at the manager must not reach terminals.
        #[cfg(unix)]
        command.process_group(0);

        #[cfg(windows)]
        command.creation_flags(CREATE_NO_WINDOW | DETACHED_PROCESS);

        command
    }
}

#[async_trait]
impl TerminalLauncher for ProcessLauncher {
    async fn launch(&self, instance: &TerminalInstance) -> Result<LaunchedTerminal, ProvisionError> {
        let executable = instance.executable_path();
        if !executable.is_file() {
            return Err(ProvisionError::ExecutableMissing { path: executable });
        }
        let connection = instance.connection_config_path();
        if !connection.is_file() {
            return Err(ProvisionError::ConnectionConfigMissing { path: connection });
        }

        let mut child = self
            .command(instance, &executable)
            .spawn()
            .map_err(|source| ProvisionError::Spawn {
                path: executable.clone(),
                source,
            })?;
        let pid = child.id();
        info!(
            account_id = %instance.account_id(),
            executable = %executable.display(),
            pid = ?pid,
            grace_ms = self.grace_period.as_millis() as u64,
            "terminal started; waiting for grace period"
        );

        tokio::time::sleep(self.grace_period).await;

        match child.try_wait() {
            Ok(None) => {
                info!(account_id = %instance.account_id(), pid = ?pid, "terminal survived startup");
                Ok(LaunchedTerminal { pid, executable })
            }
            Ok(Some(status)) => {
                warn!(
                    account_id = %instance.account_id(),
                    exit_code = ?status.code(),
                    "terminal exited during grace period"
                );
                Err(ProvisionError::ExitedEarly {
                    code: status.code(),
                })
            }
            Err(err) => Err(ProvisionError::Probe(err)),
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use rendr_vps_adapter::Platform;
    use std::fs;
    use std::os::unix::fs::symlink;
    use uuid::Uuid;

    const GRACE: Duration = Duration::from_millis(300);

    struct Scratch(PathBuf);

    impl Drop for Scratch {
        fn drop(&mut self) {
            let _ = fs::remove_dir_all(&self.0);
        }
    }

    fn scratch() -> Scratch {
        let path = std::env::temp_dir().join(format!("rendr-launcher-{}", Uuid::new_v4()));
        fs::create_dir_all(&path).unwrap();
        Scratch(path)
    }

    /// The executable is `/bin/sh`, so the connection file it receives as its
    /// only argument is run as a script.
    fn prepare(base: &Path, script: Option<&str>) -> TerminalInstance {
        let instance = TerminalInstance::new(base, Platform::Mt4, "abc-123");
        fs::create_dir_all(instance.root()).unwrap();
        symlink("/bin/sh", instance.executable_path()).unwrap();
        if let Some(script) = script {
            let connection = instance.connection_config_path();
            fs::create_dir_all(connection.parent().unwrap()).unwrap();
            fs::write(connection, script).unwrap();
        }
        instance
    }

    #[tokio::test]
    async fn test_surviving_process_is_success() {
        let dir = scratch();
        let instance = prepare(&dir.0, Some("sleep 3\n"));
        let launched = ProcessLauncher::new(GRACE).launch(&instance).await.unwrap();
        assert!(launched.pid.is_some());
        assert_eq!(launched.executable, instance.executable_path());
    }

    #[tokio::test]
    async fn test_early_exit_reports_exit_code() {
        let dir = scratch();
        let instance = prepare(&dir.0, Some("exit 3\n"));
        let err = ProcessLauncher::new(GRACE).launch(&instance).await.unwrap_err();
        assert!(matches!(err, ProvisionError::ExitedEarly { code: Some(3) }));
    }

    #[tokio::test]
    async fn test_runs_in_instance_directory() {
        let dir = scratch();
        let instance = prepare(&dir.0, Some("pwd > cwd.txt\nsleep 3\n"));
        ProcessLauncher::new(GRACE).launch(&instance).await.unwrap();
        let cwd = fs::read_to_string(instance.root().join("cwd.txt")).unwrap();
        assert_eq!(
            fs::canonicalize(cwd.trim()).unwrap(),
            fs::canonicalize(instance.root()).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_executable() {
        let dir = scratch();
        let instance = TerminalInstance::new(&dir.0, Platform::Mt5, "abc-123");
        fs::create_dir_all(instance.root()).unwrap();
        let err = ProcessLauncher::new(GRACE).launch(&instance).await.unwrap_err();
        assert!(matches!(err, ProvisionError::ExecutableMissing { .. }));
    }

    #[tokio::test]
    async fn test_missing_connection_config() {
        let dir = scratch();
        let instance = prepare(&dir.0, None);
        let err = ProcessLauncher::new(GRACE).launch(&instance).await.unwrap_err();
        assert!(matches!(err, ProvisionError::ConnectionConfigMissing { .. }));
    }
}
