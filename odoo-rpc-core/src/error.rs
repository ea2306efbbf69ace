//! # Error Taxonomy
//!
//! Every failure the client can report is an [`RpcError`]. Each variant belongs to exactly
//! one [`ErrorKind`], and the kind alone decides two things:
//!
//! * **Retryability**: only [`ErrorKind::Connection`] is ever retried (see [`crate::rpc::retry`]).
//! * **Exit code**: the value a command-line front end should terminate with.
//!
//! | Kind             | Exit code | Retried |
//! |------------------|-----------|---------|
//! | `Connection`     | 1         | yes     |
//! | `Authentication` | 2         | no      |
//! | `Application`    | 3         | no      |
//! | `Protocol`       | 3         | no      |
use crate::rpc::fault::RpcFault;

/// Coarse classification of an [`RpcError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// DNS, TCP or TLS failure, or a timeout.
    Connection,
    /// Bad credentials, unknown database or an invalidated session.
    Authentication,
    /// A business rule, validation or access-control rejection.
    Application,
    /// The response did not follow the expected JSON-RPC shape.
    Protocol,
}

/// Errors returned by every operation of the client.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RpcError {
    #[error("Failed to reach '{endpoint}': {reason}")]
    Connection {
        endpoint: String,
        reason: String,
        timed_out: bool,
    },
    #[error("Authentication failed: {0}")]
    Authentication(String),
    #[error("Remote error: {0}")]
    RemoteApplication(RpcFault),
    #[error("Write operation '{method}' on '{model}' blocked: the client is read-only")]
    ReadOnly { model: String, method: String },
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl RpcError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            RpcError::Connection { .. } => ErrorKind::Connection,
            RpcError::Authentication(_) => ErrorKind::Authentication,
            RpcError::RemoteApplication(_) | RpcError::ReadOnly { .. } => ErrorKind::Application,
            RpcError::Protocol(_) => ErrorKind::Protocol,
        }
    }

    /// Whether submitting the same call again may succeed.
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Connection
    }

    /// Process exit code a front end should use for this error.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::Connection => 1,
            ErrorKind::Authentication => 2,
            ErrorKind::Application | ErrorKind::Protocol => 3,
        }
    }

    /// The remote fault, when the server reported one.
    pub fn fault(&self) -> Option<&RpcFault> {
        match self {
            RpcError::RemoteApplication(fault) => Some(fault),
            _ => None,
        }
    }

    /// Returns a human readable hint on how to fix the error, if one is known.
    ///
    /// The hint is picked by matching well known fragments of the error message, so it
    /// works for faults raised by any server module.
    pub fn suggestion(&self) -> Option<&'static str> {
        match self {
            RpcError::ReadOnly { .. } => {
                return Some("Use a client that is not configured as read-only");
            }
            RpcError::Connection { timed_out: true, .. } => {
                return Some("Increase the request timeout or reduce the amount of data requested");
            }
            RpcError::Authentication(_) => {
                return Some("Check the database name, username and password");
            }
            _ => {}
        }

        let message = self.to_string().to_lowercase();
        SUGGESTIONS
            .iter()
            .find(|(needles, _)| needles.iter().all(|needle| message.contains(needle)))
            .map(|(_, hint)| *hint)
    }
}

// Every needle of an entry must appear in the lowercased message. First match wins.
const SUGGESTIONS: &[(&[&str], &str)] = &[
    (
        &["unhashable type"],
        "Ensure the domain is a list of conditions: [[\"field\", \"=\", \"value\"]]",
    ),
    (
        &["tuple index out of range"],
        "Each domain condition needs 3 parts: [\"field\", \"operator\", \"value\"]",
    ),
    (
        &["domains to normalize"],
        "Pass the domain as a list of conditions, not as a string",
    ),
    (
        &["has no attribute", "field"],
        "List the fields of the model with fields_get to find the right name",
    ),
    (
        &["invalid field"],
        "Check the field name spelling against fields_get",
    ),
    (
        &["method", "does not exist"],
        "Check the method name spelling and the capabilities of the model",
    ),
    (
        &["model", "does not exist"],
        "List the available models with list_models",
    ),
    (
        &["does not exist"],
        "Check the model or record reference and try again",
    ),
    (
        &["has no attribute", "method"],
        "Check the method name spelling and the capabilities of the model",
    ),
    (
        &["got multiple values for argument"],
        "An argument was sent both positionally and by keyword, pass it only once",
    ),
    (
        &["unexpected keyword argument"],
        "The remote method does not accept one of the keyword arguments",
    ),
    (
        &["access denied"],
        "Use a user with the required access rights or check the access rules",
    ),
    (
        &["authentication failed"],
        "Check the database name, username and password",
    ),
    (
        &["connection refused"],
        "Check the server URL and that the server is running",
    ),
    (
        &["timed out"],
        "Increase the request timeout or reduce the amount of data requested",
    ),
];
