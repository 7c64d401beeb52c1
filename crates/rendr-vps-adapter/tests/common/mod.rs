/*
[INPUT]:  Test configuration and mock server requirements
[OUTPUT]: Shared test utilities, fixtures, and mock helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for rendr-vps-adapter tests

use rendr_vps_adapter::RegistryClient;
use wiremock::MockServer;

pub const TEST_API_KEY: &str = "test-vps-key";

/// Setup a mock HTTP server for testing
pub async fn setup_mock_server() -> MockServer {
    MockServer::start().await
}

/// Registry client pointed at the mock server
pub fn client_for(server: &MockServer) -> RegistryClient {
    RegistryClient::new(&server.uri(), TEST_API_KEY).expect("client init")
}

/// Base URL of a server that is no longer listening
pub async fn unreachable_base_url() -> String {
    let server = MockServer::start().await;
    let uri = server.uri();
    drop(server);
    uri
}

/// Pending-accounts payload as the backend sends it
pub fn pending_accounts_body() -> serde_json::Value {
    serde_json::json!([
        {
            "external_account_id": "abc-123",
            "broker": "IC Markets",
            "platform": "MT4",
            "server": "Broker-Live",
            "login": "12345",
            "investor_password": "secretpw"
        },
        {
            "external_account_id": "def-456",
            "broker": null,
            "platform": "MT5",
            "server": "Broker-Demo",
            "login": 67890,
            "investor_password": "otherpw"
        }
    ])
}
