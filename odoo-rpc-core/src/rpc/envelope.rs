//! # JSON-RPC Envelopes
//!
//! The only place that knows the wire format.
//!
//! Every business call is an `execute_kw` call on the `object` service:
//!
//! ```json
//! {"jsonrpc": "2.0", "method": "call",
//!  "params": {"service": "object", "method": "execute_kw",
//!             "args": [DB, UID, SECRET, MODEL, METHOD, POSITIONAL_ARGS, KEYWORD_ARGS]},
//!  "id": N}
//! ```
//!
//! and the login handshake targets the `common` service:
//!
//! ```json
//! {"jsonrpc": "2.0", "method": "call",
//!  "params": {"service": "common", "method": "login", "args": [DB, USERNAME, SECRET]},
//!  "id": N}
//! ```
//!
//! The positional arguments of a call are inserted into the outer `args` list exactly once,
//! by [`JsonRpcRequest::execute_kw`]. No other code builds that list.
use super::{RpcCall, fault::RpcFault};
use crate::{error::RpcError, transport::TransportResponse};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const JSONRPC_VERSION: &str = "2.0";

/// Outer JSON-RPC method; the real target lives in `params`.
const CALL_METHOD: &str = "call";

pub const OBJECT_SERVICE: &str = "object";
pub const EXECUTE_KW: &str = "execute_kw";
pub const COMMON_SERVICE: &str = "common";
pub const LOGIN: &str = "login";

/// JSON-RPC 2.0 request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: CallParams,
    pub id: u64,
}

/// Service dispatch parameters of a `call` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallParams {
    pub service: String,
    pub method: String,
    pub args: Vec<Value>,
}

/// Identity prefix repeated in front of every business call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub database: String,
    pub uid: i64,
    pub secret: String,
}

impl JsonRpcRequest {
    fn call(service: &str, method: &str, args: Vec<Value>, id: u64) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: CALL_METHOD.to_string(),
            params: CallParams {
                service: service.to_string(),
                method: method.to_string(),
                args,
            },
            id,
        }
    }

    /// Builds the login handshake envelope.
    pub fn login(database: &str, username: &str, secret: &str, id: u64) -> Self {
        Self::call(
            COMMON_SERVICE,
            LOGIN,
            vec![
                Value::from(database),
                Value::from(username),
                Value::from(secret),
            ],
            id,
        )
    }

    /// Builds the `execute_kw` envelope for a business call.
    ///
    /// The outer `args` list always has 7 elements. `call.args` becomes the 6th element as is,
    /// so an empty positional list is sent as `[]`.
    pub fn execute_kw(identity: &CallerIdentity, call: &RpcCall, id: u64) -> Self {
        let args = vec![
            Value::from(identity.database.as_str()),
            Value::from(identity.uid),
            Value::from(identity.secret.as_str()),
            Value::from(call.model.as_str()),
            Value::from(call.method.as_str()),
            Value::Array(call.args.clone()),
            Value::Object(call.kwargs.clone()),
        ];
        Self::call(OBJECT_SERVICE, EXECUTE_KW, args, id)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, RpcError> {
        serde_json::to_vec(self)
            .map_err(|e| RpcError::Protocol(format!("Failed to encode request: {e}")))
    }
}

/// Decodes a raw response into the success payload or a classified error.
///
/// * `result` present: returned unchanged, whatever its shape.
/// * `error` object present: decoded into an [`RpcFault`] and classified.
/// * anything else: [`RpcError::Protocol`].
pub fn decode_response(response: &TransportResponse) -> Result<Value, RpcError> {
    let document: Map<String, Value> = match serde_json::from_slice(&response.body) {
        Ok(Value::Object(document)) => document,
        Ok(_) | Err(_) if !response.is_success() => {
            return Err(RpcError::Protocol(format!(
                "Unexpected HTTP status {} with a non JSON-RPC body",
                response.status
            )));
        }
        Ok(other) => {
            return Err(RpcError::Protocol(format!(
                "Expected a JSON object, received: {}",
                truncate(&other.to_string())
            )));
        }
        Err(e) => {
            return Err(RpcError::Protocol(format!("Invalid JSON response: {e}")));
        }
    };

    decode_document(document)
}

fn decode_document(mut document: Map<String, Value>) -> Result<Value, RpcError> {
    if let Some(error) = document.remove("error").filter(|error| !error.is_null()) {
        return match RpcFault::from_value(&error) {
            Some(fault) => Err(fault.into_error()),
            None => Err(RpcError::Protocol(format!(
                "Malformed error object: {}",
                truncate(&error.to_string())
            ))),
        };
    }

    document
        .remove("result")
        .ok_or_else(|| RpcError::Protocol("Response has neither 'result' nor 'error'".to_string()))
}

fn truncate(text: &str) -> String {
    const MAX: usize = 200;
    match text.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity() -> CallerIdentity {
        CallerIdentity {
            database: "demo".to_string(),
            uid: 2,
            secret: "admin".to_string(),
        }
    }

    fn ok(body: Value) -> TransportResponse {
        TransportResponse {
            status: 200,
            body: serde_json::to_vec(&body).unwrap(),
        }
    }

    #[test]
    fn execute_kw_envelope_is_bit_exact() {
        let call = RpcCall::new("res.partner", "search")
            .args(vec![json!(["is_company", "=", true])])
            .kwarg("limit", 5);

        let request = JsonRpcRequest::execute_kw(&identity(), &call, 7);

        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": {
                    "service": "object",
                    "method": "execute_kw",
                    "args": ["demo", 2, "admin", "res.partner", "search",
                             [["is_company", "=", true]], {"limit": 5}]
                },
                "id": 7
            })
        );
    }

    #[test]
    fn empty_positional_list_stays_empty() {
        let call = RpcCall::new("res.partner", "fields_get").kwarg("attributes", json!(["type"]));
        let request = JsonRpcRequest::execute_kw(&identity(), &call, 1);

        assert_eq!(request.params.args.len(), 7);
        assert_eq!(request.params.args[5], json!([]));
        assert_eq!(request.params.args[6], json!({"attributes": ["type"]}));
    }

    #[test]
    fn login_envelope_targets_common_service() {
        let request = JsonRpcRequest::login("demo", "admin", "secret", 1);
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "call",
                "params": {"service": "common", "method": "login",
                           "args": ["demo", "admin", "secret"]},
                "id": 1
            })
        );
    }

    #[test]
    fn result_is_passed_through_unchanged() {
        let payload = json!([{"id": 1, "child_ids": [], "parent_id": null, "tags": [[4, 2]]}]);
        let decoded = decode_response(&ok(json!({"jsonrpc": "2.0", "id": 1, "result": payload})));
        assert_eq!(decoded.unwrap(), payload);
    }

    #[test]
    fn null_result_is_a_success() {
        let decoded = decode_response(&ok(json!({"jsonrpc": "2.0", "id": 1, "result": null})));
        assert_eq!(decoded.unwrap(), Value::Null);
    }

    #[test]
    fn fault_is_classified() {
        let decoded = decode_response(&ok(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": "odoo.exceptions.ValidationError", "message": "Invalid email"}
            }
        })));

        match decoded {
            Err(RpcError::RemoteApplication(fault)) => {
                assert_eq!(fault.exception, "odoo.exceptions.ValidationError");
                assert_eq!(fault.detail.as_deref(), Some("Invalid email"));
            }
            other => panic!("Expected a remote application error, got {other:?}"),
        }
    }

    #[test]
    fn malformed_bodies_are_protocol_errors() {
        let not_json = TransportResponse {
            status: 200,
            body: b"<html>Bad gateway</html>".to_vec(),
        };
        assert!(matches!(decode_response(&not_json), Err(RpcError::Protocol(_))));

        assert!(matches!(
            decode_response(&ok(json!([1, 2, 3]))),
            Err(RpcError::Protocol(_))
        ));
        assert!(matches!(
            decode_response(&ok(json!({"jsonrpc": "2.0", "id": 1}))),
            Err(RpcError::Protocol(_))
        ));
        assert!(matches!(
            decode_response(&ok(json!({"jsonrpc": "2.0", "id": 1, "error": "boom"}))),
            Err(RpcError::Protocol(_))
        ));
    }

    #[test]
    fn non_success_status_without_envelope_names_the_status() {
        let response = TransportResponse {
            status: 502,
            body: b"Bad Gateway".to_vec(),
        };
        match decode_response(&response) {
            Err(RpcError::Protocol(message)) => assert!(message.contains("502")),
            other => panic!("Expected a protocol error, got {other:?}"),
        }
    }
}
