use crate::{
    cache::{CacheStore, DEFAULT_MODELS_TTL},
    rpc::RetryPolicy,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A search filter: a flat list of `[field, operator, value]` conditions, optionally mixed
/// with the prefix operators `"&"`, `"|"` and `"!"`.
///
/// Serializes as the plain JSON list, e.g. `[["is_company", "=", true]]`.
///
/// ```rust
/// use odoo_rpc_core::client::Domain;
/// use serde_json::json;
///
/// let domain = Domain::new()
///     .or()
///     .condition("customer_rank", ">", 0)
///     .condition("supplier_rank", ">", 0);
///
/// assert_eq!(
///     serde_json::to_value(&domain).unwrap(),
///     json!(["|", ["customer_rank", ">", 0], ["supplier_rank", ">", 0]])
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(Vec<Value>);

impl Domain {
    /// The empty domain, matching every record.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn condition(
        mut self,
        field: impl Into<String>,
        operator: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.0.push(Value::Array(vec![
            Value::String(field.into()),
            Value::String(operator.into()),
            value.into(),
        ]));
        self
    }

    pub fn and(self) -> Self {
        self.operator("&")
    }

    pub fn or(self) -> Self {
        self.operator("|")
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        self.operator("!")
    }

    fn operator(mut self, op: &str) -> Self {
        self.0.push(Value::String(op.to_string()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn terms(&self) -> &[Value] {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Array(self.0)
    }
}

impl From<Vec<Value>> for Domain {
    fn from(terms: Vec<Value>) -> Self {
        Self(terms)
    }
}

impl From<Domain> for Vec<Value> {
    fn from(domain: Domain) -> Self {
        domain.0
    }
}

/// Parameters of [`super::OdooClient::search`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchParams {
    pub domain: Domain,
    /// Number of records to skip. Only sent when greater than zero.
    pub offset: u64,
    pub limit: Option<u64>,
    /// Sort specification, e.g. `"name asc, id desc"`.
    pub order: Option<String>,
}

impl SearchParams {
    pub fn new(domain: impl Into<Domain>) -> Self {
        Self {
            domain: domain.into(),
            ..Self::default()
        }
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.order = Some(order.into());
        self
    }
}

/// Parameters of [`super::OdooClient::search_read`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SearchReadParams {
    pub search: SearchParams,
    /// Fields to return. `None` returns every field.
    pub fields: Option<Vec<String>>,
}

impl SearchReadParams {
    pub fn new(domain: impl Into<Domain>) -> Self {
        Self {
            search: SearchParams::new(domain),
            fields: None,
        }
    }

    pub fn fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.fields = Some(fields.into_iter().map(Into::into).collect());
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.search = self.search.offset(offset);
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.search = self.search.limit(limit);
        self
    }

    pub fn order(mut self, order: impl Into<String>) -> Self {
        self.search = self.search.order(order);
        self
    }
}

/// Parameters of [`super::OdooClient::fields_get`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldsGetParams {
    /// Restrict the answer to these fields. Empty means all fields.
    pub all_fields: Vec<String>,
    /// Field attributes to return, e.g. `["string", "type", "required"]`.
    pub attributes: Vec<String>,
}

impl FieldsGetParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn all_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.all_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn attributes<I, S>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.attributes = attributes.into_iter().map(Into::into).collect();
        self
    }
}

/// Parameters of [`super::OdooClient::name_search`].
#[derive(Debug, Clone, PartialEq)]
pub struct NameSearchParams {
    pub name: String,
    pub domain: Domain,
    pub operator: String,
    pub limit: u64,
}

impl NameSearchParams {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            domain: Domain::new(),
            operator: "ilike".to_string(),
            limit: 100,
        }
    }

    pub fn domain(mut self, domain: impl Into<Domain>) -> Self {
        self.domain = domain.into();
        self
    }

    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = operator.into();
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }
}

/// Behaviour of an [`super::OdooClient`] beyond the connection itself.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    pub retry: RetryPolicy,
    /// Refuse `create`, `write`, `unlink` and `copy` before they reach the server.
    pub readonly: bool,
    /// Context merged into the `context` keyword argument of every call.
    pub context: Map<String, Value>,
    /// Store for cached query results. No caching happens without one.
    pub cache: Option<CacheStore>,
    /// Lifetime, in seconds, of the cached model listing.
    pub models_ttl: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            readonly: false,
            context: Map::new(),
            cache: None,
            models_ttl: DEFAULT_MODELS_TTL,
        }
    }
}

impl ClientOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn readonly(mut self, readonly: bool) -> Self {
        self.readonly = readonly;
        self
    }

    pub fn with_context(mut self, context: Map<String, Value>) -> Self {
        self.context = context;
        self
    }

    pub fn with_cache(mut self, cache: CacheStore) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_models_ttl(mut self, ttl_seconds: u64) -> Self {
        self.models_ttl = ttl_seconds;
        self
    }
}
