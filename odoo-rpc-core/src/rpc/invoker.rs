//! # RPC Invoker
//!
//! [`RpcInvoker`] turns one [`RpcCall`] into one `execute_kw` envelope, submits it through
//! the owned [`Transport`] and decodes the answer.
//!
//! The invoker is bound to an identity by the [`crate::auth`] handshake. Before that, every
//! business call fails with [`RpcError::Authentication`].
use super::{
    Invoke, RpcCall,
    envelope::{CallerIdentity, JsonRpcRequest, decode_response},
};
use crate::{
    error::RpcError,
    transport::{Transport, TransportResponse},
};
use serde_json::Value;
use tracing::debug;

pub struct RpcInvoker<T> {
    transport: T,
    next_id: u64,
    identity: Option<CallerIdentity>,
}

impl<T: Transport> RpcInvoker<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            next_id: 1,
            identity: None,
        }
    }

    /// Sets the identity prefix sent in front of every subsequent call.
    pub fn bind(&mut self, identity: CallerIdentity) {
        self.identity = Some(identity);
    }

    pub fn identity(&self) -> Option<&CallerIdentity> {
        self.identity.as_ref()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Allocates the next correlation id, encodes the envelope and submits it.
    ///
    /// The raw response is returned undecoded, callers choose how to interpret a non-success
    /// status.
    pub(crate) async fn submit<F>(&mut self, build: F) -> Result<TransportResponse, RpcError>
    where
        F: FnOnce(u64) -> JsonRpcRequest,
    {
        let id = self.next_id;
        self.next_id += 1;

        let request = build(id);
        debug!(
            endpoint = self.transport.endpoint(),
            service = %request.params.service,
            method = %request.params.method,
            id,
            "Submitting JSON-RPC request"
        );

        self.transport.send(request.to_bytes()?).await
    }
}

impl<T: Transport> Invoke for RpcInvoker<T> {
    async fn invoke(&mut self, call: &RpcCall) -> Result<Value, RpcError> {
        let identity = self.identity.clone().ok_or_else(|| {
            RpcError::Authentication("The client is not authenticated".to_string())
        })?;

        debug!(model = %call.model, method = %call.method, "Invoking remote method");

        let response = self
            .submit(|id| JsonRpcRequest::execute_kw(&identity, call, id))
            .await?;

        decode_response(&response)
    }
}
