//! HTTP/JSON front-end for the carpool booking engine.
//!
//! Routes live under `/api/v1`:
//!
//! | method          | path                         | engine call              |
//! |-----------------|------------------------------|--------------------------|
//! | GET             | `/users`                     | `list_users`             |
//! | GET / DELETE    | `/users/{id}`                | `get_user` / `delete_user` |
//! | POST / PUT      | `/users/{id}`                | `register_user` / `update_user` |
//! | GET             | `/trips`                     | `list_trips`             |
//! | GET / DELETE    | `/trips/{id}`                | `get_trip` / `cancel_trip` |
//! | POST / PUT      | `/trips/{id}`                | `create_or_update_trip`  |
//! | PUT             | `/trips/{id}/enroll`         | `enroll_passenger`       |
//! | PUT             | `/trips/{id}/start`          | `start_trip` (caller in `car-owner-id`) |
//! | GET             | `/trips/{id}/status`         | `get_status`             |
//!
//! plus `GET /health`. Mutations answer `202 Accepted` with the resulting
//! record; errors answer `{"error": <kind>, "message": <text>}`.
//!
//! The [`TestServer`] helper starts a server on a random port for integration testing.

use carpool_core::{BookingEngine, CoreError, ErrorKind};
use carpool_schema::{TripRequest, TripView, UserId, UserProfile};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{self, Read};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tiny_http::{Header, Method, Request, Response, Server, StatusCode};
use tracing::{debug, error, info, warn};

/// Header carrying the caller identity for `PUT /trips/{id}/start`.
pub const CAR_OWNER_HEADER: &str = "car-owner-id";

const API_PREFIX: &str = "/api/v1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route<'a> {
    Health,
    Users,
    User(&'a str),
    Trips,
    Trip(&'a str),
    Enroll(&'a str),
    Start(&'a str),
    Status(&'a str),
}

/// Parse a request URL into a [`Route`]. Query strings are ignored.
pub fn parse_route(url: &str) -> Option<Route<'_>> {
    let path = url.split_once('?').map_or(url, |(p, _)| p);
    if path == "/health" {
        return Some(Route::Health);
    }
    let rest = path.strip_prefix(API_PREFIX)?;
    let segments: Vec<&str> = rest.trim_start_matches('/').split('/').collect();
    match segments.as_slice() {
        ["users"] => Some(Route::Users),
        ["users", id] if !id.is_empty() => Some(Route::User(id)),
        ["trips"] => Some(Route::Trips),
        ["trips", id] if !id.is_empty() => Some(Route::Trip(id)),
        ["trips", id, "enroll"] if !id.is_empty() => Some(Route::Enroll(id)),
        ["trips", id, "start"] if !id.is_empty() => Some(Route::Start(id)),
        ["trips", id, "status"] if !id.is_empty() => Some(Route::Status(id)),
        _ => None,
    }
}

/// HTTP status for a domain error kind.
pub fn status_for(kind: ErrorKind) -> u16 {
    match kind {
        ErrorKind::NotFound => 404,
        ErrorKind::Conflict => 409,
        ErrorKind::Unauthorized => 401,
        ErrorKind::InvalidCarOwner
        | ErrorKind::InvalidSchedule
        | ErrorKind::InvalidCapacity
        | ErrorKind::AlreadyStarted
        | ErrorKind::NoPassengers
        | ErrorKind::OutOfWindow
        | ErrorKind::TripFull
        | ErrorKind::InvalidProfile
        | ErrorKind::AccountTooNew => 400,
    }
}

/// Body of `PUT /trips/{id}/enroll`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrollRequest {
    pub user_id: UserId,
}

/// Body of every error response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

/// A rendered reply, before it is written to the socket.
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn ok<T: Serialize>(status: u16, value: &T) -> Self {
        match serde_json::to_value(value) {
            Ok(body) => Self { status, body },
            Err(e) => {
                error!("serialize response: {e}");
                Self::error(500, "internal", &e.to_string())
            }
        }
    }

    fn error(status: u16, kind: &str, message: &str) -> Self {
        Self {
            status,
            body: json!({ "error": kind, "message": message }),
        }
    }
}

impl From<CoreError> for Reply {
    fn from(e: CoreError) -> Self {
        let kind = e.kind();
        Self::error(status_for(kind), kind.as_str(), &e.to_string())
    }
}

fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, Reply> {
    serde_json::from_slice(body).map_err(|e| {
        debug!("rejected request body: {e}");
        Reply::error(400, "bad_request", &format!("invalid JSON body: {e}"))
    })
}

fn method_not_allowed(method: &Method) -> Reply {
    Reply::error(
        405,
        "method_not_allowed",
        &format!("method {method} not allowed here"),
    )
}

fn users(engine: &BookingEngine, method: &Method, id: &str, body: &[u8]) -> Result<Reply, Reply> {
    match *method {
        Method::Get => Ok(Reply::ok(200, &engine.get_user(id)?)),
        Method::Delete => Ok(Reply::ok(202, &engine.delete_user(id)?)),
        Method::Post => {
            let profile: UserProfile = parse_body(body)?;
            Ok(Reply::ok(202, &engine.register_user(id, profile)?))
        }
        Method::Put => {
            let profile: UserProfile = parse_body(body)?;
            Ok(Reply::ok(202, &engine.update_user(id, profile)?))
        }
        _ => Err(method_not_allowed(method)),
    }
}

fn trips(engine: &BookingEngine, method: &Method, id: &str, body: &[u8]) -> Result<Reply, Reply> {
    match *method {
        Method::Get => Ok(Reply::ok(200, &TripView::from(&engine.get_trip(id)?))),
        Method::Delete => {
            engine.cancel_trip(id)?;
            Ok(Reply::ok(202, &json!({ "id": id, "cancelled": true })))
        }
        Method::Post | Method::Put => {
            let request: TripRequest = parse_body(body)?;
            let trip = engine.create_or_update_trip(*method == Method::Post, id, request)?;
            Ok(Reply::ok(202, &TripView::from(&trip)))
        }
        _ => Err(method_not_allowed(method)),
    }
}

/// Route one request to the engine and render the outcome.
///
/// `car_owner` is the value of the `car-owner-id` header, if any. Kept free
/// of socket I/O so routing and error mapping can be tested directly.
pub fn dispatch(
    engine: &BookingEngine,
    method: &Method,
    url: &str,
    car_owner: Option<&str>,
    body: &[u8],
) -> Reply {
    let Some(route) = parse_route(url) else {
        return Reply::error(404, "not_found", &format!("no route for {url}"));
    };

    let result = match (route, method) {
        (Route::Health, Method::Get) => Ok(Reply::ok(200, &json!({ "status": "ok" }))),
        (Route::Users, Method::Get) => Ok(Reply::ok(200, &engine.list_users())),
        (Route::User(id), _) => users(engine, method, id, body),
        (Route::Trips, Method::Get) => {
            let views: Vec<TripView> = engine.list_trips().iter().map(TripView::from).collect();
            Ok(Reply::ok(200, &views))
        }
        (Route::Trip(id), _) => trips(engine, method, id, body),
        (Route::Enroll(id), Method::Put) => parse_body::<EnrollRequest>(body).and_then(|req| {
            let trip = engine.enroll_passenger(id, &req.user_id)?;
            Ok(Reply::ok(202, &TripView::from(&trip)))
        }),
        (Route::Start(id), Method::Put) => engine
            .start_trip(id, car_owner.unwrap_or_default())
            .map(|trip| Reply::ok(202, &TripView::from(&trip)))
            .map_err(Reply::from),
        (Route::Status(id), Method::Get) => engine
            .get_status(id)
            .map(|status| Reply::ok(200, &status))
            .map_err(Reply::from),
        _ => Err(method_not_allowed(method)),
    };
    result.unwrap_or_else(|reply| reply)
}

fn respond(req: Request, reply: &Reply) {
    let data = serde_json::to_vec(&reply.body).unwrap_or_default();
    let mut response = Response::from_data(data).with_status_code(StatusCode(reply.status));
    if let Ok(header) = Header::from_bytes("Content-Type", "application/json") {
        response.add_header(header);
    }
    if let Err(e) = req.respond(response) {
        warn!("failed to write response: {e}");
    }
}

/// Read one request off the socket, dispatch it, and write the reply.
pub fn handle_request(engine: &BookingEngine, mut req: Request) {
    let method = req.method().clone();
    let url = req.url().to_owned();
    debug!("{method} {url}");

    let mut body = Vec::new();
    if let Err(e) = req.as_reader().read_to_end(&mut body) {
        respond(req, &Reply::error(400, "bad_request", &format!("read error: {e}")));
        return;
    }
    let car_owner = req
        .headers()
        .iter()
        .find(|h| h.field.equiv(CAR_OWNER_HEADER))
        .map(|h| h.value.as_str().trim().to_owned());

    let reply = dispatch(engine, &method, &url, car_owner.as_deref(), &body);
    if reply.status >= 500 {
        error!("{method} {url}: {}", reply.status);
    } else {
        debug!("{method} {url}: {}", reply.status);
    }
    respond(req, &reply);
}

/// Bind a listener on `addr`.
pub fn bind(addr: &str) -> io::Result<Arc<Server>> {
    Server::http(addr)
        .map(Arc::new)
        .map_err(|e| io::Error::other(format!("failed to bind {addr}: {e}")))
}

/// Spawn `workers` threads that all pull requests from the same listener.
///
/// Each worker exits once `Server::unblock` wakes it, so the shutdown path
/// must unblock once per worker.
pub fn spawn_workers(
    engine: &Arc<BookingEngine>,
    server: &Arc<Server>,
    workers: usize,
) -> Vec<JoinHandle<()>> {
    (0..workers.max(1))
        .map(|n| {
            let engine = Arc::clone(engine);
            let server = Arc::clone(server);
            thread::spawn(move || {
                for request in server.incoming_requests() {
                    handle_request(&engine, request);
                }
                debug!("worker {n} stopped");
            })
        })
        .collect()
}

/// Unblock every worker waiting on `server`.
pub fn shutdown(server: &Server, workers: usize) {
    for _ in 0..workers.max(1) {
        server.unblock();
    }
}

/// Serve until every worker has been unblocked, blocking the current thread.
pub fn run_server(engine: &Arc<BookingEngine>, server: &Arc<Server>, workers: usize) {
    info!("serving with {} worker threads", workers.max(1));
    for handle in spawn_workers(engine, server, workers) {
        if handle.join().is_err() {
            error!("worker thread panicked");
        }
    }
    info!("server stopped");
}

/// A test helper that starts a carpool server on a random port in background threads.
///
/// The server listens on `127.0.0.1:{port}`. Dropping the `TestServer` unblocks
/// its workers.
pub struct TestServer {
    pub url: String,
    pub port: u16,
    pub engine: Arc<BookingEngine>,
    server: Arc<Server>,
    workers: usize,
    _handles: Vec<JoinHandle<()>>,
}

impl TestServer {
    /// Start a test server over `engine`. Binds to `127.0.0.1:0`.
    pub fn start(engine: Arc<BookingEngine>) -> io::Result<Self> {
        let server = bind("127.0.0.1:0")?;
        let port = server
            .server_addr()
            .to_ip()
            .map(|addr| addr.port())
            .ok_or_else(|| io::Error::other("listener is not an IP socket"))?;
        let workers = 4;
        let handles = spawn_workers(&engine, &server, workers);
        Ok(Self {
            url: format!("http://127.0.0.1:{port}"),
            port,
            engine,
            server,
            workers,
            _handles: handles,
        })
    }

    /// Absolute URL for an API path such as `/trips/T1`.
    pub fn api(&self, path: &str) -> String {
        format!("{}{API_PREFIX}{path}", self.url)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        shutdown(&self.server, self.workers);
    }
}
