#![allow(dead_code)]

use odoo_rpc_core::{
    ConnectionConfig, RpcError,
    transport::{Transport, TransportResponse},
};
use serde_json::{Value, json};
use std::collections::VecDeque;

pub fn config() -> ConnectionConfig {
    ConnectionConfig::new("https://odoo.example.com", "demo", "admin", "admin")
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

pub fn refused() -> RpcError {
    RpcError::Connection {
        endpoint: "https://odoo.example.com/jsonrpc".to_string(),
        reason: "connection refused".to_string(),
        timed_out: false,
    }
}

/// Transport answering from a scripted queue and recording every body it is given.
///
/// Once the queue is empty every send fails with a connection error.
#[derive(Default)]
pub struct StubTransport {
    replies: VecDeque<Result<TransportResponse, RpcError>>,
    sent: Vec<Value>,
}

impl StubTransport {
    /// A transport whose first answer is a successful login as `uid`.
    pub fn logged_in(uid: i64) -> Self {
        Self::default().then_result(json!(uid))
    }

    pub fn then_result(self, result: Value) -> Self {
        self.then_json(json!({"jsonrpc": "2.0", "id": 1, "result": result}))
    }

    pub fn then_fault(self, name: &str, message: &str) -> Self {
        self.then_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {
                "code": 200,
                "message": "Odoo Server Error",
                "data": {"name": name, "message": message, "debug": "Traceback (most recent call last)"}
            }
        }))
    }

    pub fn then_json(self, document: Value) -> Self {
        self.then_raw(200, document.to_string().as_bytes())
    }

    pub fn then_raw(mut self, status: u16, body: &[u8]) -> Self {
        self.replies.push_back(Ok(TransportResponse {
            status,
            body: body.to_vec(),
        }));
        self
    }

    pub fn then_error(mut self, error: RpcError) -> Self {
        self.replies.push_back(Err(error));
        self
    }

    /// Every request body sent so far, login included.
    pub fn sent(&self) -> &[Value] {
        &self.sent
    }

    pub fn sends(&self) -> usize {
        self.sent.len()
    }

    /// `params.args` of the last request.
    pub fn last_args(&self) -> &Value {
        &self.sent.last().expect("no request was sent")["params"]["args"]
    }
}

impl Transport for StubTransport {
    async fn send(&mut self, body: Vec<u8>) -> Result<TransportResponse, RpcError> {
        self.sent
            .push(serde_json::from_slice(&body).expect("request body is JSON"));
        self.replies.pop_front().unwrap_or_else(|| Err(refused()))
    }

    fn endpoint(&self) -> &str {
        "https://odoo.example.com/jsonrpc"
    }
}
