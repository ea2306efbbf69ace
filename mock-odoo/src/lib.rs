//! # Mock Odoo
//!
//! An in-process HTTP server speaking the Odoo JSON-RPC protocol, for integration tests.
//!
//! The server listens on a random loopback port, records every request body it receives
//! and answers with whatever the supplied handler returns. It shuts down when dropped.
use http_body_util::{BodyExt, Full};
use hyper::{
    Request, Response, StatusCode,
    body::{Bytes, Incoming},
    header::{CONTENT_TYPE, HeaderValue},
    server::conn::http1,
    service::service_fn,
};
use hyper_util::rt::TokioIo;
use serde_json::{Value, json};
use std::convert::Infallible;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Database accepted by [`odoo`].
pub const DATABASE: &str = "demo";
/// Login accepted by [`odoo`].
pub const USERNAME: &str = "admin";
/// Password accepted by [`odoo`].
pub const PASSWORD: &str = "admin";
/// Uid returned by [`odoo`] on a successful login.
pub const UID: i64 = 2;

/// What the server answers to one request.
#[derive(Debug, Clone)]
pub enum Reply {
    /// `{"jsonrpc": "2.0", "id": N, "result": value}`
    Result(Value),
    /// A server fault with the given exception class name and message.
    Fault { name: String, message: String },
    /// A raw HTTP response, bypassing the JSON-RPC envelope.
    Http { status: u16, body: String },
    /// Waits before answering.
    Delay(Duration, Box<Reply>),
}

impl Reply {
    pub fn fault(name: impl Into<String>, message: impl Into<String>) -> Self {
        Reply::Fault {
            name: name.into(),
            message: message.into(),
        }
    }

    pub fn after(self, delay: Duration) -> Self {
        Reply::Delay(delay, Box::new(self))
    }
}

/// A request received by the server.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedRequest {
    pub body: Value,
}

impl RecordedRequest {
    pub fn id(&self) -> Value {
        self.body["id"].clone()
    }

    pub fn service(&self) -> &str {
        self.body["params"]["service"].as_str().unwrap_or_default()
    }

    pub fn method(&self) -> &str {
        self.body["params"]["method"].as_str().unwrap_or_default()
    }

    pub fn args(&self) -> &[Value] {
        self.body["params"]["args"]
            .as_array()
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Target model of an `execute_kw` call.
    pub fn model(&self) -> &str {
        self.args().get(3).and_then(Value::as_str).unwrap_or_default()
    }

    /// Target method of an `execute_kw` call.
    pub fn model_method(&self) -> &str {
        self.args().get(4).and_then(Value::as_str).unwrap_or_default()
    }

    pub fn positional(&self) -> &Value {
        self.args().get(5).unwrap_or(&Value::Null)
    }

    pub fn kwargs(&self) -> &Value {
        self.args().get(6).unwrap_or(&Value::Null)
    }
}

type Handler = dyn Fn(&RecordedRequest) -> Reply + Send + Sync;

struct State {
    handler: Box<Handler>,
    requests: Mutex<Vec<RecordedRequest>>,
    connections: AtomicUsize,
}

impl State {
    fn requests(&self) -> MutexGuard<'_, Vec<RecordedRequest>> {
        self.requests.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct MockOdoo {
    addr: String,
    state: Arc<State>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOdoo {
    /// Starts a server answering with [`odoo`].
    pub async fn start_default() -> io::Result<Self> {
        Self::start(odoo).await
    }

    /// Starts a server answering every request with `handler`.
    pub async fn start<F>(handler: F) -> io::Result<Self>
    where
        F: Fn(&RecordedRequest) -> Reply + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?.to_string();

        let state = Arc::new(State {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
            connections: AtomicUsize::new(0),
        });
        let (shutdown_tx, mut shutdown_rx) = oneshot::channel();

        let accept_state = state.clone();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        let Ok((stream, _)) = result else { continue };
                        accept_state.connections.fetch_add(1, Ordering::SeqCst);

                        let state = accept_state.clone();
                        tokio::spawn(async move {
                            let service = service_fn(move |req| serve(req, state.clone()));
                            let _ = http1::Builder::new()
                                .serve_connection(TokioIo::new(stream), service)
                                .await;
                        });
                    }
                    _ = &mut shutdown_rx => break,
                }
            }
        });

        Ok(Self {
            addr,
            state,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Base URL of the server, e.g. `http://127.0.0.1:41234`.
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests().clone()
    }

    /// Number of requests received so far.
    pub fn hits(&self) -> usize {
        self.state.requests().len()
    }

    /// Number of TCP connections accepted so far.
    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }
}

impl Drop for MockOdoo {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

async fn serve(
    req: Request<Incoming>,
    state: Arc<State>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    let body = match req.into_body().collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => return Ok(respond(400, "text/plain", e.to_string())),
    };

    let request = match serde_json::from_slice(&body) {
        Ok(body) => RecordedRequest { body },
        Err(e) => return Ok(respond(400, "text/plain", e.to_string())),
    };

    state.requests().push(request.clone());
    let mut reply = (state.handler)(&request);

    while let Reply::Delay(delay, inner) = reply {
        tokio::time::sleep(delay).await;
        reply = *inner;
    }

    let response = match reply {
        Reply::Result(result) => {
            let document = json!({"jsonrpc": "2.0", "id": request.id(), "result": result});
            respond(200, "application/json", document.to_string())
        }
        Reply::Fault { name, message } => {
            let document = json!({
                "jsonrpc": "2.0",
                "id": request.id(),
                "error": {
                    "code": 200,
                    "message": "Odoo Server Error",
                    "data": {"name": name, "message": message, "debug": ""}
                }
            });
            respond(200, "application/json", document.to_string())
        }
        Reply::Http { status, body } => respond(status, "text/html", body),
        Reply::Delay(..) => unreachable!("delays are resolved above"),
    };

    Ok(response)
}

fn respond(status: u16, content_type: &'static str, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
    response
}

/// A small Odoo lookalike.
///
/// * `common.login` with [`DATABASE`], [`USERNAME`] and [`PASSWORD`] returns [`UID`],
///   anything else returns `false`.
/// * `execute_kw` answers `search`, `search_read`, `search_count`, `read`, `fields_get`,
///   `name_get`, `create`, `write` and `unlink` with canned data.
/// * Unknown methods fault with `AttributeError`, the way the server reports them.
pub fn odoo(request: &RecordedRequest) -> Reply {
    match (request.service(), request.method()) {
        ("common", "login") => {
            let credentials = [json!(DATABASE), json!(USERNAME), json!(PASSWORD)];
            if request.args() == credentials {
                Reply::Result(json!(UID))
            } else {
                Reply::Result(json!(false))
            }
        }
        ("object", "execute_kw") => execute_kw(request),
        (service, method) => Reply::fault(
            "werkzeug.exceptions.NotFound",
            format!("Unknown service method {service}.{method}"),
        ),
    }
}

fn execute_kw(request: &RecordedRequest) -> Reply {
    let args = request.args();
    if args.get(1) != Some(&json!(UID)) || args.get(2) != Some(&json!(PASSWORD)) {
        return Reply::fault("odoo.exceptions.AccessDenied", "Access Denied");
    }

    match (request.model(), request.model_method()) {
        ("ir.model", "search_read") => Reply::Result(json!([
            {"id": 3, "model": "sale.order"},
            {"id": 1, "model": "res.partner"},
            {"id": 2, "model": "account.move"}
        ])),
        (_, "search") => Reply::Result(json!([1, 2, 3])),
        (_, "search_count") => Reply::Result(json!(3)),
        (_, "search_read" | "read") => Reply::Result(json!([
            {"id": 1, "name": "Azure Interior", "parent_id": false, "child_ids": [4, 5]}
        ])),
        (_, "fields_get") => Reply::Result(json!({
            "name": {"string": "Name", "type": "char", "required": true}
        })),
        (_, "name_get") => Reply::Result(json!([[1, "Azure Interior"]])),
        (_, "create") => Reply::Result(json!(42)),
        (_, "write" | "unlink") => Reply::Result(json!(true)),
        (model, method) => Reply::fault(
            "builtins.AttributeError",
            format!("The method '{model}.{method}' does not exist"),
        ),
    }
}
