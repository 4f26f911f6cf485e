//! Client core for the Thunder user-management service.
//!
//! # Overview
//! `ThunderClient` builds `HttpRequest` values and normalizes `HttpResponse`
//! values without touching the network (host-does-IO). `Thunder` pairs it
//! with a `Transport` for callers that want one call per operation.
//!
//! # Design
//! - Configuration is immutable; clients carry no session state.
//! - Every operation expects one status code. Anything else is a
//!   `ThunderError::StatusMismatch` holding the server's raw body.
//! - Application credentials (Basic auth) and user credentials (the
//!   `password` header) are separate fields on every request.
//! - The `ureq` feature (default) provides `UreqTransport`.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod service;
pub mod transport;
pub mod types;

pub use client::ThunderClient;
pub use config::ClientConfig;
pub use error::{ThunderError, TransportError};
pub use http::{BasicAuth, HttpMethod, HttpRequest, HttpResponse};
pub use service::Thunder;
pub use transport::Transport;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use types::{Email, ResponseType, User, Verification};
