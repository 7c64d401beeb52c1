/*
[INPUT]:  Terminals base directory, platform, account identifier
[OUTPUT]: Deterministic on-disk layout of one terminal instance
[POS]:    Instance layer - shared by materializer and launcher
[UPDATE]: When the terminal directory layout or file names change
*/

use rendr_vps_adapter::Platform;
use std::path::{Path, PathBuf};

/// EA configuration file written into the instance root
pub const INTEGRATION_CONFIG_FILE: &str = "rendr_ea_config.ini";
/// Directory (relative to the instance root) holding the connection file
pub const CONNECTION_CONFIG_DIR: &str = "config";
/// Connection file read by the terminal at startup
pub const CONNECTION_CONFIG_FILE: &str = "start.ini";

/// Executable launched inside an instance
pub fn executable_name(platform: Platform) -> &'static str {
    match platform {
        Platform::Mt4 => "terminal.exe",
        Platform::Mt5 => "terminal64.exe",
    }
}

/// Directory (relative to the instance root) the EA is copied into
pub fn integration_binary_dir(platform: Platform) -> PathBuf {
    match platform {
        Platform::Mt4 => Path::new("MQL4").join("Experts"),
        Platform::Mt5 => Path::new("MQL5").join("Experts"),
    }
}

/// Directory name for an account, e.g. `MT4-abc-123`
pub fn instance_dir_name(platform: Platform, account_id: &str) -> String {
    format!("{platform}-{account_id}")
}

/// One account's terminal installation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalInstance {
    platform: Platform,
    account_id: String,
    root: PathBuf,
}

impl TerminalInstance {
    pub fn new(terminals_base: &Path, platform: Platform, account_id: &str) -> Self {
        Self {
            platform,
            account_id: account_id.to_string(),
            root: terminals_base.join(instance_dir_name(platform, account_id)),
        }
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn account_id(&self) -> &str {
        &self.account_id
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn exists(&self) -> bool {
        self.root.is_dir()
    }

    pub fn executable_path(&self) -> PathBuf {
        self.root.join(executable_name(self.platform))
    }

    pub fn integration_binary_dir(&self) -> PathBuf {
        self.root.join(integration_binary_dir(self.platform))
    }

    pub fn integration_config_path(&self) -> PathBuf {
        self.root.join(INTEGRATION_CONFIG_FILE)
    }

    pub fn connection_config_path(&self) -> PathBuf {
        self.root.join(self.connection_config_arg())
    }

    /// Connection file path relative to the instance root; passed as the
    /// terminal's only argument.
    pub fn connection_config_arg(&self) -> PathBuf {
        Path::new(CONNECTION_CONFIG_DIR).join(CONNECTION_CONFIG_FILE)
    }
}
