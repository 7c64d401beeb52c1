/*
[INPUT]:  HTTP client configuration and registry endpoints
[OUTPUT]: HTTP responses and typed registry results
[POS]:    HTTP layer - REST API communication
[UPDATE]: When adding new endpoints or changing client behavior
*/

pub mod client;
pub mod error;
pub mod vps;

pub use error::{RegistryError, Result};

pub use client::{API_KEY_HEADER, ClientConfig, DEFAULT_API_URL, RegistryClient};
