/*
[INPUT]:  Mock registry server, scratch directories
[OUTPUT]: Shared fixtures for provisioning-loop tests
[POS]:    Test infrastructure - shared across manager test modules
[UPDATE]: When adding new test patterns or fixtures
*/

#![allow(dead_code)]

use async_trait::async_trait;
use rendr_vps_adapter::{ProvisioningRequest, RegistryClient};
use rendr_vps_manager::{
    LaunchedTerminal, ProvisionError, TerminalInstance, TerminalLauncher, TerminalProvisioner,
};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_API_KEY: &str = "test-vps-key";
pub const PENDING_PATH: &str = "/api/vps/pending-accounts";
pub const STATUS_PATH: &str = "/api/vps/account-status";

pub fn client_for(server: &MockServer) -> RegistryClient {
    RegistryClient::new(&server.uri(), TEST_API_KEY).expect("client init")
}

pub fn account(id: &str, platform: &str) -> Value {
    serde_json::json!({
        "external_account_id": id,
        "broker": "IC Markets",
        "platform": platform,
        "server": "Broker-Live",
        "login": "12345",
        "investor_password": "secretpw"
    })
}

pub async fn mount_pending(server: &MockServer, accounts: Value) {
    Mock::given(method("GET"))
        .and(path(PENDING_PATH))
        .and(header("X-VPS-API-Key", TEST_API_KEY))
        .respond_with(ResponseTemplate::new(200).set_body_json(accounts))
        .mount(server)
        .await;
}

pub async fn mount_status_ok(server: &MockServer, expected: u64) {
    Mock::given(method("POST"))
        .and(path(STATUS_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
        .expect(expected)
        .mount(server)
        .await;
}

/// Bodies of every status write the server received, in order
pub async fn status_writes(server: &MockServer) -> Vec<Value> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.method.as_str() == "POST" && request.url.path() == STATUS_PATH)
        .map(|request| serde_json::from_slice(&request.body).expect("status body is json"))
        .collect()
}

/// Provisioner that records every request and fails on chosen ids
#[derive(Default)]
pub struct RecordingProvisioner {
    pub calls: Mutex<Vec<String>>,
    pub failures: Vec<(String, String)>,
    pub panics_on: Option<String>,
}

impl RecordingProvisioner {
    pub fn failing(id: &str, message: &str) -> Self {
        Self {
            failures: vec![(id.to_string(), message.to_string())],
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().expect("calls lock").clone()
    }
}

#[async_trait]
impl TerminalProvisioner for RecordingProvisioner {
    async fn provision(
        &self,
        request: &ProvisioningRequest,
    ) -> Result<LaunchedTerminal, ProvisionError> {
        let id = request.external_account_id.clone();
        self.calls.lock().expect("calls lock").push(id.clone());
        if self.panics_on.as_deref() == Some(id.as_str()) {
            panic!("provisioner blew up on {id}");
        }
        if let Some((_, message)) = self.failures.iter().find(|(failing, _)| *failing == id) {
            return Err(ProvisionError::Internal(message.clone()));
        }
        Ok(LaunchedTerminal {
            pid: Some(4242),
            executable: PathBuf::from("terminal.exe"),
        })
    }
}

/// Launcher that only checks the instance was materialized
pub struct FakeLauncher;

#[async_trait]
impl TerminalLauncher for FakeLauncher {
    async fn launch(&self, instance: &TerminalInstance) -> Result<LaunchedTerminal, ProvisionError> {
        let executable = instance.executable_path();
        if !executable.is_file() {
            return Err(ProvisionError::ExecutableMissing { path: executable });
        }
        Ok(LaunchedTerminal {
            pid: None,
            executable,
        })
    }
}

/// Temporary directory removed on drop
pub struct Scratch(pub PathBuf);

impl Scratch {
    pub fn new(label: &str) -> Self {
        let path = std::env::temp_dir().join(format!("rendr-{label}-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&path).expect("create scratch dir");
        Self(path)
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for Scratch {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.0);
    }
}
