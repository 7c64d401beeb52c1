/*
[INPUT]:  Crate modules and public type definitions
[OUTPUT]: Public RendR VPS registry adapter crate surface
[POS]:    Crate root - module wiring
[UPDATE]: When public modules or exports change
*/

pub mod http;
pub mod types;

// Re-export commonly used types from http
pub use http::{
    API_KEY_HEADER,
    ClientConfig,
    DEFAULT_API_URL,
    RegistryClient,
    RegistryError,
    Result,
};

// Re-export all types
pub use types::*;
