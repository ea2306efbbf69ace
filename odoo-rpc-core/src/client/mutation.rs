//! # Mutation Verbs
//!
//! Verbs that change records. All of them are refused with [`RpcError::ReadOnly`] when the
//! client is read-only.
use super::OdooClient;
use crate::{error::RpcError, rpc::RpcCall, transport::Transport};
use serde_json::{Map, Value, json};

impl<T: Transport> OdooClient<T> {
    /// Creates one record and returns its id.
    pub async fn create(
        &mut self,
        model: &str,
        values: Map<String, Value>,
    ) -> Result<Value, RpcError> {
        self.dispatch(RpcCall::new(model, "create").arg(Value::Object(values)))
            .await
    }

    /// Writes the same `values` to every record of `ids`.
    pub async fn write(
        &mut self,
        model: &str,
        ids: &[i64],
        values: Map<String, Value>,
    ) -> Result<Value, RpcError> {
        let call = RpcCall::new(model, "write")
            .arg(json!(ids))
            .arg(Value::Object(values));
        self.dispatch(call).await
    }

    pub async fn unlink(&mut self, model: &str, ids: &[i64]) -> Result<Value, RpcError> {
        self.dispatch(RpcCall::new(model, "unlink").arg(json!(ids)))
            .await
    }
}
