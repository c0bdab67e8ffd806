// ipam-api: Async Rust client for IP Address Management appliance REST APIs

pub mod auth;
pub mod connector;
pub mod entity;
pub mod error;
pub mod properties;
pub mod request;
pub mod requester;
pub mod transport;

pub use auth::{Credentials, HostConfig, Scheme};
pub use connector::Connector;
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
