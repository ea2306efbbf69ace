//! # Odoo Client
//!
//! [`OdooClient`] is the public entry point: it authenticates once when created, then
//! exposes the common query and mutation verbs on top of a retrying RPC invoker.
//!
//! Every verb, typed or not, goes through a single dispatch path that applies the
//! read-only guard and merges the default context before the call reaches the invoker.
//!
//! ## Example
//!
//! ```rust,no_run
//! use odoo_rpc_core::{
//!     client::{Domain, OdooClient, SearchParams},
//!     config::ConnectionConfig,
//! };
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ConnectionConfig::new("https://odoo.example.com", "prod", "admin", "api-key");
//! let mut client = OdooClient::connect(&config).await?;
//!
//! let ids = client
//!     .search(
//!         "res.partner",
//!         &SearchParams::new(Domain::new().condition("is_company", "=", true)).limit(5),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! The client is driven through `&mut self`, one call at a time. Use one client per task,
//! or wrap it in a mutex.
pub mod mutation;
pub mod query;
mod types;

pub use types::*;

use crate::{
    auth::{self, AuthenticatedIdentity},
    cache::models_cache_key,
    config::ConnectionConfig,
    error::RpcError,
    rpc::{Invoke, RetryState, Retrying, RpcCall, RpcInvoker},
    transport::{HttpTransport, Transport},
};
use serde_json::{Map, Value};

/// Methods refused when the client is read-only.
const WRITE_METHODS: &[&str] = &["create", "write", "unlink", "copy"];

/// Authenticated client bound to one database.
pub struct OdooClient<T = HttpTransport> {
    invoker: Retrying<RpcInvoker<T>>,
    identity: AuthenticatedIdentity,
    options: ClientOptions,
    models_key: String,
}

impl OdooClient<HttpTransport> {
    /// Connects over HTTP with the default [`ClientOptions`].
    pub async fn connect(config: &ConnectionConfig) -> Result<Self, RpcError> {
        Self::connect_with(config, ClientOptions::default()).await
    }

    pub async fn connect_with(
        config: &ConnectionConfig,
        options: ClientOptions,
    ) -> Result<Self, RpcError> {
        let transport = HttpTransport::new(config)?;
        Self::from_transport(transport, config, options).await
    }
}

impl<T: Transport> OdooClient<T> {
    /// Authenticates through an existing transport.
    ///
    /// The login handshake is sent once, outside the retry policy.
    pub async fn from_transport(
        transport: T,
        config: &ConnectionConfig,
        options: ClientOptions,
    ) -> Result<Self, RpcError> {
        let mut invoker = RpcInvoker::new(transport);
        let identity = auth::authenticate(&mut invoker, config).await?;

        Ok(Self {
            invoker: Retrying::new(invoker, options.retry),
            identity,
            models_key: models_cache_key(&config.base_url(), config.database()),
            options,
        })
    }

    pub fn identity(&self) -> AuthenticatedIdentity {
        self.identity
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Outcome of the retry state machine for the last call.
    ///
    /// A call refused before reaching the server leaves the state [`crate::rpc::RetryPhase::Idle`].
    pub fn retry_state(&self) -> &RetryState {
        self.invoker.state()
    }

    pub fn transport(&self) -> &T {
        self.invoker.inner().transport()
    }

    /// Calls `model.method(*args, **kwargs)` as given.
    ///
    /// Use this for any remote method the typed verbs do not cover. `args` is sent as the
    /// positional argument list without further wrapping.
    pub async fn execute(
        &mut self,
        model: &str,
        method: &str,
        args: Vec<Value>,
        kwargs: Map<String, Value>,
    ) -> Result<Value, RpcError> {
        self.dispatch(RpcCall::new(model, method).args(args).kwargs(kwargs))
            .await
    }

    pub(crate) async fn dispatch(&mut self, mut call: RpcCall) -> Result<Value, RpcError> {
        if self.options.readonly && WRITE_METHODS.contains(&call.method.as_str()) {
            self.invoker.reset();
            return Err(RpcError::ReadOnly {
                model: call.model,
                method: call.method,
            });
        }

        merge_context(&mut call.kwargs, &self.options.context);

        self.invoker.invoke(&call).await
    }
}

// Keys already present in the call's context win over the defaults. A non-object context
// supplied by the caller is left untouched.
fn merge_context(kwargs: &mut Map<String, Value>, defaults: &Map<String, Value>) {
    if defaults.is_empty() {
        return;
    }

    let context = kwargs
        .entry("context")
        .or_insert_with(|| Value::Object(Map::new()));

    if let Value::Object(context) = context {
        for (key, value) in defaults {
            context
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}
