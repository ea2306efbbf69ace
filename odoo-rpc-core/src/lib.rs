//! # Odoo RPC Core
//!
//! `odoo-rpc-core` is a client library for the JSON-RPC API of Odoo servers. It lets a
//! caller invoke any model method remotely, with connection reuse, retries of transient
//! failures and a TTL cache for expensive idempotent queries.
//!
//! ## Key Components
//!
//! * **[`OdooClient`]:** The entry point. Authenticates once, then exposes typed verbs
//!   (`search`, `read`, `search_read`, `fields_get`, `create`, `write`, ...) and the
//!   untyped [`OdooClient::execute`] escape hatch.
//! * **[`RpcError`]:** Every failure, classified into connection, authentication,
//!   application and protocol errors. Only connection errors are retried.
//! * **[`CacheStore`]:** An explicit, injectable TTL cache with file and in-memory
//!   backends.
//!
//! ## Layers
//!
//! From the bottom up: [`transport`] moves bytes over one pooled HTTP client, [`auth`]
//! performs the login handshake, [`rpc`] builds envelopes, decodes responses and retries,
//! [`cache`] stores query results, and [`client`] ties everything together.
//!
//! The library emits `tracing` events but never installs a subscriber.
//!
//! See the README.md for more details about usage.
pub mod auth;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod rpc;
pub mod transport;

pub use auth::AuthenticatedIdentity;
pub use cache::CacheStore;
pub use client::{ClientOptions, OdooClient};
pub use config::ConnectionConfig;
pub use error::{ErrorKind, RpcError};
pub use rpc::RetryPolicy;
