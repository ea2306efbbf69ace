//! # Remote Faults
//!
//! Decoding of the `error` member of a JSON-RPC response and its classification into
//! the client's error taxonomy.
//!
//! The server reports faults as:
//!
//! ```json
//! {"code": 200, "message": "Odoo Server Error",
//!  "data": {"name": "odoo.exceptions.UserError", "message": "...", "debug": "Traceback ..."}}
//! ```
//!
//! Classification is driven by the remote exception class name (`data.name`), never by
//! the numeric code, which the server uses inconsistently.
use crate::error::RpcError;
use serde_json::Value;
use std::fmt;

/// Lower bound of the error codes reserved by the JSON-RPC 2.0 specification.
const RESERVED_CODE_MIN: i64 = -32768;
/// Upper bound of the error codes reserved by the JSON-RPC 2.0 specification.
const RESERVED_CODE_MAX: i64 = -32000;

/// A fault reported by the remote server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcFault {
    /// Numeric fault code.
    pub code: i64,
    /// Short human message of the outer error object.
    pub message: String,
    /// Fully qualified name of the remote exception class (empty when not reported).
    pub exception: String,
    /// Message carried by the remote exception itself.
    pub detail: Option<String>,
    /// Remote traceback, if the server exposes it.
    pub debug: Option<String>,
}

impl fmt::Display for RpcFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.detail {
            Some(detail) if !detail.is_empty() => write!(f, "{}: {}", self.message, detail)?,
            _ => write!(f, "{}", self.message)?,
        }
        if !self.exception.is_empty() {
            write!(f, " ({})", self.exception)?;
        }
        Ok(())
    }
}

impl RpcFault {
    /// Decodes the `error` member of a response.
    ///
    /// Returns `None` when the value is not an object. Unknown members are ignored, missing
    /// or mistyped ones default to empty values.
    pub fn from_value(value: &Value) -> Option<Self> {
        let error = value.as_object()?;
        let data = error.get("data").and_then(Value::as_object);
        let data_str = |key: &str| {
            data.and_then(|data| data.get(key))
                .and_then(Value::as_str)
                .map(str::to_string)
        };

        Some(Self {
            code: error.get("code").and_then(Value::as_i64).unwrap_or_default(),
            message: error
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            exception: data_str("name").unwrap_or_default(),
            detail: data_str("message"),
            debug: data_str("debug"),
        })
    }

    /// Whether the remote exception means the credentials or session are not valid.
    pub fn is_authentication(&self) -> bool {
        let name = short_name(&self.exception);
        name == "AccessDenied" || name.starts_with("SessionExpired")
    }

    /// Whether the fault is a protocol-level rejection of the request itself.
    pub fn is_protocol(&self) -> bool {
        if self.exception.starts_with("werkzeug.exceptions.") {
            return true;
        }
        self.exception.is_empty() && (RESERVED_CODE_MIN..=RESERVED_CODE_MAX).contains(&self.code)
    }

    /// Maps the fault into the matching [`RpcError`] variant.
    pub fn into_error(self) -> RpcError {
        if self.is_authentication() {
            RpcError::Authentication(self.to_string())
        } else if self.is_protocol() {
            RpcError::Protocol(self.to_string())
        } else {
            RpcError::RemoteApplication(self)
        }
    }
}

fn short_name(exception: &str) -> &str {
    exception.rsplit('.').next().unwrap_or(exception)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fault(name: &str) -> RpcFault {
        RpcFault::from_value(&json!({
            "code": 200,
            "message": "Odoo Server Error",
            "data": {"name": name, "message": "boom", "debug": "Traceback"}
        }))
        .unwrap()
    }

    #[test]
    fn decodes_all_members() {
        let fault = fault("odoo.exceptions.UserError");
        assert_eq!(fault.code, 200);
        assert_eq!(fault.message, "Odoo Server Error");
        assert_eq!(fault.exception, "odoo.exceptions.UserError");
        assert_eq!(fault.detail.as_deref(), Some("boom"));
        assert_eq!(fault.debug.as_deref(), Some("Traceback"));
    }

    #[test]
    fn missing_data_defaults_to_empty() {
        let fault = RpcFault::from_value(&json!({"code": -32601, "message": "Method not found"}))
            .unwrap();
        assert_eq!(fault.exception, "");
        assert_eq!(fault.detail, None);
        assert!(fault.is_protocol());
    }

    #[test]
    fn mistyped_members_default_individually() {
        let fault = RpcFault::from_value(&json!({
            "code": "200",
            "message": "Odoo Server Error",
            "data": {"name": "odoo.exceptions.UserError", "message": 7}
        }))
        .unwrap();
        assert_eq!(fault.code, 0);
        assert_eq!(fault.exception, "odoo.exceptions.UserError");
        assert_eq!(fault.detail, None);
        assert!(matches!(fault.into_error(), RpcError::RemoteApplication(_)));
    }

    #[test]
    fn mistyped_debug_keeps_authentication_class() {
        let err = RpcFault::from_value(&json!({
            "code": 200,
            "message": "Odoo Server Error",
            "data": {"name": "odoo.exceptions.AccessDenied", "debug": {"tb": 1}}
        }))
        .unwrap()
        .into_error();
        assert!(matches!(err, RpcError::Authentication(_)));
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn non_object_is_not_a_fault() {
        assert!(RpcFault::from_value(&json!("oops")).is_none());
        assert!(RpcFault::from_value(&json!(null)).is_none());
    }

    #[test]
    fn classification_by_exception_name() {
        assert!(matches!(
            fault("odoo.exceptions.AccessDenied").into_error(),
            RpcError::Authentication(_)
        ));
        assert!(matches!(
            fault("odoo.http.SessionExpiredException").into_error(),
            RpcError::Authentication(_)
        ));
        assert!(matches!(
            fault("werkzeug.exceptions.NotFound").into_error(),
            RpcError::Protocol(_)
        ));
        assert!(matches!(
            fault("odoo.exceptions.AccessError").into_error(),
            RpcError::RemoteApplication(_)
        ));
        assert!(matches!(
            fault("odoo.exceptions.ValidationError").into_error(),
            RpcError::RemoteApplication(_)
        ));
    }

    #[test]
    fn display_combines_message_detail_and_class() {
        assert_eq!(
            fault("odoo.exceptions.UserError").to_string(),
            "Odoo Server Error: boom (odoo.exceptions.UserError)"
        );
    }
}
