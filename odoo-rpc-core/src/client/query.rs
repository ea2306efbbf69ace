//! # Query Verbs
//!
//! Read-only verbs of [`OdooClient`]. Each one shapes its own positional and keyword
//! arguments to match what the remote method accepts.
use super::{
    Domain, FieldsGetParams, NameSearchParams, OdooClient, SearchParams, SearchReadParams,
};
use crate::{error::RpcError, rpc::RpcCall, transport::Transport};
use serde_json::{Value, json};
use tracing::debug;

const MODEL_REGISTRY: &str = "ir.model";

impl<T: Transport> OdooClient<T> {
    /// Ids of the records matching `params.domain`.
    pub async fn search(&mut self, model: &str, params: &SearchParams) -> Result<Value, RpcError> {
        let call = RpcCall::new(model, "search").args(params.domain.terms().to_vec());
        self.dispatch(paging(call, params)).await
    }

    /// Reads `fields` of the records `ids`. An empty `fields` list returns every field.
    pub async fn read(
        &mut self,
        model: &str,
        ids: &[i64],
        fields: &[&str],
    ) -> Result<Value, RpcError> {
        let call = RpcCall::new(model, "read")
            .arg(json!(ids))
            .kwarg_opt("fields", (!fields.is_empty()).then(|| json!(fields)));
        self.dispatch(call).await
    }

    pub async fn search_read(
        &mut self,
        model: &str,
        params: &SearchReadParams,
    ) -> Result<Value, RpcError> {
        let call = RpcCall::new(model, "search_read")
            .args(params.search.domain.terms().to_vec())
            .kwarg_opt("fields", params.fields.as_ref().map(|fields| json!(fields)));
        self.dispatch(paging(call, &params.search)).await
    }

    pub async fn search_count(&mut self, model: &str, domain: &Domain) -> Result<Value, RpcError> {
        let call = RpcCall::new(model, "search_count").args(domain.terms().to_vec());
        self.dispatch(call).await
    }

    /// Field metadata of `model`.
    ///
    /// `fields_get` only takes keyword arguments, the positional list is always empty.
    pub async fn fields_get(
        &mut self,
        model: &str,
        params: &FieldsGetParams,
    ) -> Result<Value, RpcError> {
        let call = RpcCall::new(model, "fields_get")
            .kwarg_opt(
                "allfields",
                (!params.all_fields.is_empty()).then(|| json!(params.all_fields)),
            )
            .kwarg_opt(
                "attributes",
                (!params.attributes.is_empty()).then(|| json!(params.attributes)),
            );
        self.dispatch(call).await
    }

    /// `[id, display name]` pairs of the records `ids`.
    pub async fn name_get(&mut self, model: &str, ids: &[i64]) -> Result<Value, RpcError> {
        self.dispatch(RpcCall::new(model, "name_get").arg(json!(ids)))
            .await
    }

    pub async fn name_search(
        &mut self,
        model: &str,
        params: &NameSearchParams,
    ) -> Result<Value, RpcError> {
        let call = RpcCall::new(model, "name_search").args(vec![
            Value::from(params.name.as_str()),
            params.domain.clone().into_value(),
            Value::from(params.operator.as_str()),
            Value::from(params.limit),
        ]);
        self.dispatch(call).await
    }

    /// Sorted technical names of every model installed on the database.
    ///
    /// Answered from the cache when [`super::ClientOptions::cache`] is set and holds a
    /// fresh listing for this database.
    pub async fn list_models(&mut self) -> Result<Vec<String>, RpcError> {
        if let Some(cached) = self.cached_models() {
            return Ok(cached);
        }

        let records = self
            .search_read(
                MODEL_REGISTRY,
                &SearchReadParams::new(Domain::new()).fields(["model"]),
            )
            .await?;

        let mut models = model_names(&records)?;
        models.sort();
        debug!(count = models.len(), "Fetched model listing");

        if let Some(cache) = &self.options.cache {
            cache.put(&self.models_key, json!(models), self.options.models_ttl);
        }

        Ok(models)
    }

    fn cached_models(&self) -> Option<Vec<String>> {
        let payload = self.options.cache.as_ref()?.get(&self.models_key)?;
        serde_json::from_value(payload).ok()
    }
}

fn paging(call: RpcCall, params: &SearchParams) -> RpcCall {
    call.kwarg_opt("offset", (params.offset > 0).then_some(params.offset))
        .kwarg_opt("limit", params.limit)
        .kwarg_opt("order", params.order.as_deref())
}

fn model_names(records: &Value) -> Result<Vec<String>, RpcError> {
    let records = records.as_array().ok_or_else(|| {
        RpcError::Protocol(format!("Expected a list of models, received: {records}"))
    })?;

    Ok(records
        .iter()
        .filter_map(|record| record.get("model").and_then(Value::as_str))
        .map(str::to_string)
        .collect())
}
