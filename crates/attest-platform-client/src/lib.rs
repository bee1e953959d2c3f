//! attest-platform-client
//!
//! Platform metadata access for the attest engine.
//!
//! It includes:
//! - `HttpPlatformClient`, a bearer-token client for the platform artifact API
//! - `MemoryPlatform`, an in-memory metadata store keyed by fingerprint and metadata hash
//!
//! Both implement `attest_core::ports::PlatformReader`.

pub mod http;
pub mod memory;

pub use http::HttpPlatformClient;
pub use memory::MemoryPlatform;
