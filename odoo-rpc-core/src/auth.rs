//! # Authentication
//!
//! Performs the `common.login` handshake and binds the resulting identity to the invoker.
//!
//! The handshake is never retried: a failed login is reported immediately.
use crate::{
    config::ConnectionConfig,
    error::RpcError,
    rpc::{
        RpcInvoker,
        envelope::{CallerIdentity, JsonRpcRequest, decode_response},
        fault::RpcFault,
    },
    transport::Transport,
};
use serde_json::Value;
use tracing::info;

/// The server-side user id obtained by a successful login.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AuthenticatedIdentity {
    pub uid: i64,
}

/// Logs in with the credentials of `config` and binds the identity to `invoker`.
///
/// # Errors
///
/// * [`RpcError::Authentication`] when a credential is empty, the server answers with a
///   non-success status or a fault, or the login result is falsy (`false`, `null`, `0`).
/// * [`RpcError::Protocol`] when the result is neither falsy nor a user id.
/// * [`RpcError::Connection`] when the server cannot be reached.
pub async fn authenticate<T: Transport>(
    invoker: &mut RpcInvoker<T>,
    config: &ConnectionConfig,
) -> Result<AuthenticatedIdentity, RpcError> {
    check_credentials(config)?;

    let response = invoker
        .submit(|id| {
            JsonRpcRequest::login(config.database(), config.username(), config.secret(), id)
        })
        .await?;

    if !response.is_success() {
        return Err(RpcError::Authentication(format!(
            "Server answered the login with HTTP status {}",
            response.status
        )));
    }

    if let Some(fault) = login_fault(&response.body) {
        return Err(RpcError::Authentication(fault.to_string()));
    }

    let uid = parse_uid(decode_response(&response)?)?;

    invoker.bind(CallerIdentity {
        database: config.database().to_string(),
        uid,
        secret: config.secret().to_string(),
    });

    info!(
        host = config.host(),
        database = config.database(),
        uid,
        "Authenticated"
    );

    Ok(AuthenticatedIdentity { uid })
}

fn check_credentials(config: &ConnectionConfig) -> Result<(), RpcError> {
    let fields = [
        ("url", config.url()),
        ("database", config.database()),
        ("username", config.username()),
        ("secret", config.secret()),
    ];

    match fields.iter().find(|(_, value)| value.trim().is_empty()) {
        Some((name, _)) => Err(RpcError::Authentication(format!(
            "Missing credential '{name}'"
        ))),
        None => Ok(()),
    }
}

// Any fault during login is a credential problem, whatever its class.
fn login_fault(body: &[u8]) -> Option<RpcFault> {
    let document: Value = serde_json::from_slice(body).ok()?;
    document
        .get("error")
        .filter(|error| !error.is_null())
        .and_then(RpcFault::from_value)
}

fn parse_uid(result: Value) -> Result<i64, RpcError> {
    match result {
        Value::Null | Value::Bool(false) => Err(invalid_credentials()),
        Value::Number(number) => match number.as_i64() {
            Some(0) => Err(invalid_credentials()),
            Some(uid) if uid > 0 => Ok(uid),
            _ => Err(RpcError::Protocol(format!(
                "Login returned an invalid user id: {number}"
            ))),
        },
        other => Err(RpcError::Protocol(format!(
            "Login returned an unexpected value: {other}"
        ))),
    }
}

fn invalid_credentials() -> RpcError {
    RpcError::Authentication("Invalid database, username or password".to_string())
}
