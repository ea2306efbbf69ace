//! # RPC Layer
//!
//! Building blocks between the raw [`crate::transport`] and the typed [`crate::client`]:
//!
//! * [`envelope`]: JSON-RPC request construction and response decoding.
//! * [`fault`]: decoding and classification of remote faults.
//! * [`invoker`]: [`RpcInvoker`], which sends one logical call per envelope.
//! * [`retry`]: [`Retrying`], the fixed-interval retry state machine around an invoker.
pub mod envelope;
pub mod fault;
pub mod invoker;
pub mod retry;

pub use invoker::RpcInvoker;
pub use retry::{RetryPhase, RetryPolicy, RetryState, Retrying};

use crate::error::RpcError;
use serde_json::{Map, Value};

/// One logical remote call: `model.method(*args, **kwargs)`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RpcCall {
    pub model: String,
    pub method: String,
    /// Positional arguments, sent as a single flat list.
    pub args: Vec<Value>,
    pub kwargs: Map<String, Value>,
}

impl RpcCall {
    pub fn new(model: impl Into<String>, method: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            method: method.into(),
            args: Vec::new(),
            kwargs: Map::new(),
        }
    }

    pub fn args(mut self, args: Vec<Value>) -> Self {
        self.args = args;
        self
    }

    pub fn arg(mut self, arg: impl Into<Value>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn kwargs(mut self, kwargs: Map<String, Value>) -> Self {
        self.kwargs = kwargs;
        self
    }

    pub fn kwarg(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.kwargs.insert(key.into(), value.into());
        self
    }

    /// Inserts the keyword argument only when a value is present.
    pub fn kwarg_opt<V: Into<Value>>(self, key: impl Into<String>, value: Option<V>) -> Self {
        match value {
            Some(value) => self.kwarg(key, value),
            None => self,
        }
    }
}

/// Anything able to execute an [`RpcCall`].
///
/// Implemented by [`RpcInvoker`] and by the [`Retrying`] wrapper, so the retry policy can be
/// composed around any invoker, including test doubles.
#[allow(async_fn_in_trait)]
pub trait Invoke {
    async fn invoke(&mut self, call: &RpcCall) -> Result<Value, RpcError>;
}
