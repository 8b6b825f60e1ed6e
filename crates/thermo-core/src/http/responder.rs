//! One accept / read / route / send cycle per tick.

use alloc::vec;

use embedded_io::{Error as _, ErrorKind};
use embedded_io_async::{Read, Write};
use log::{debug, warn};

use super::query::parse_points;
use super::request::{Method, Request};
use super::response::{ContentType, Response, Status};
use super::send::send_all;
use super::transport::{Connection, Listener};
use super::HttpError;
use crate::config::{HttpConfig, PointsBounds};
use crate::render::{self, Snapshot};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    /// No listener; every cycle is a no-op until one is attached
    Absent,
    Listening,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Data { points: usize },
    Text,
    Dashboard,
}

impl Route {
    /// `/data` and `/text` match exactly; every other path is the dashboard.
    pub fn resolve(request: &Request<'_>, points: &PointsBounds) -> Self {
        match request.path {
            "/data" => Self::Data {
                points: parse_points(&request.query, points),
            },
            "/text" => Self::Text,
            _ => Self::Dashboard,
        }
    }

    fn respond(self, snapshot: &Snapshot<'_>) -> Response {
        match self {
            Self::Data { points } => match render::data_body(snapshot.store, points) {
                Ok(body) => Response::ok(ContentType::Json, body),
                Err(error) => {
                    warn!("Rendering /data failed: {}", error);
                    Response::internal_error()
                }
            },
            Self::Text => Response::ok(ContentType::PlainText, render::status_body(snapshot)),
            Self::Dashboard => Response::ok(ContentType::Html, render::dashboard_body(snapshot)),
        }
    }
}

/// What one responder cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    Absent,
    /// Nothing was waiting to be accepted
    Idle,
    Served {
        route: Route,
        status: Status,
        body_len: usize,
    },
    /// The peer sent nothing before closing or timing out
    Abandoned,
    Failed(HttpError),
}

pub struct HttpResponder<L> {
    listener: Option<L>,
    config: HttpConfig,
}

impl<L: Listener> HttpResponder<L> {
    pub fn new(config: HttpConfig) -> Self {
        Self {
            listener: None,
            config,
        }
    }

    /// Start serving on `listener`. Returns the listener it replaces, if any.
    pub fn attach(&mut self, listener: L) -> Option<L> {
        self.listener.replace(listener)
    }

    /// Stop serving and hand the listener back.
    pub fn detach(&mut self) -> Option<L> {
        self.listener.take()
    }

    pub fn state(&self) -> ServerState {
        match self.listener {
            Some(_) => ServerState::Listening,
            None => ServerState::Absent,
        }
    }

    pub fn listener(&self) -> Option<&L> {
        self.listener.as_ref()
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    /// Accept and fully serve at most one connection.
    ///
    /// Returns at once when no listener is attached or nothing is pending.
    /// An accepted connection is closed exactly once before this returns,
    /// whatever happened while serving it.
    pub async fn poll(&mut self, snapshot: &Snapshot<'_>) -> CycleOutcome {
        let Some(listener) = self.listener.as_mut() else {
            return CycleOutcome::Absent;
        };

        let connection = match listener.try_accept().await {
            Ok(Some(connection)) => connection,
            Ok(None) => return CycleOutcome::Idle,
            Err(error) => {
                warn!("Accept failed: {:?}", error.kind());
                return CycleOutcome::Failed(HttpError::Accept(error.kind()));
            }
        };

        serve(connection, &self.config, snapshot).await
    }
}

async fn serve<C: Connection>(
    mut connection: C,
    config: &HttpConfig,
    snapshot: &Snapshot<'_>,
) -> CycleOutcome {
    let outcome = exchange(&mut connection, config, snapshot).await;
    connection.close().await;
    outcome
}

async fn exchange<C: Read + Write>(
    connection: &mut C,
    config: &HttpConfig,
    snapshot: &Snapshot<'_>,
) -> CycleOutcome {
    let mut head = vec![0u8; config.head_buffer_len];
    let len = match read_head(connection, &mut head).await {
        Ok(0) => {
            debug!("Peer sent no request, closing");
            return CycleOutcome::Abandoned;
        }
        Ok(len) => len,
        Err(error) => {
            warn!("Reading request failed: {}", error);
            return CycleOutcome::Failed(error);
        }
    };

    let request = Request::parse(&head[..len]);
    let route = Route::resolve(&request, &config.points);
    let response = route.respond(snapshot);

    match send_response(connection, &response, request.method, config.max_send_stalls).await {
        Ok(()) => {
            debug!(
                "{:?} {} -> {} ({} bytes)",
                request.method,
                request.path,
                response.status.code(),
                response.body.len()
            );
            CycleOutcome::Served {
                route,
                status: response.status,
                body_len: response.body.len(),
            }
        }
        Err(SendFailure { error, head_started }) => {
            warn!("Sending response to {} failed: {}", request.path, error);
            if !head_started && response.status != Status::InternalServerError {
                let fallback = Response::internal_error();
                if let Err(SendFailure { error, .. }) =
                    send_response(connection, &fallback, request.method, config.max_send_stalls).await
                {
                    debug!("Best-effort 500 not delivered: {}", error);
                }
            }
            CycleOutcome::Failed(error)
        }
    }
}

/// Fill `buf` with the request head, stopping at the blank line, at EOF or
/// when the buffer is full.
///
/// Returns `Ok(0)` when the peer sent nothing. A read error after some bytes
/// arrived ends the head early instead of failing it.
async fn read_head<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<usize, HttpError> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]).await {
            Ok(0) => break,
            Ok(n) => {
                let scan_from = filled.saturating_sub(3);
                filled += n;
                if buf[scan_from..filled].windows(4).any(|w| w == b"\r\n\r\n") {
                    break;
                }
            }
            Err(error) if filled > 0 => {
                debug!("Request head cut short after {} bytes: {:?}", filled, error.kind());
                break;
            }
            Err(error) if error.kind() == ErrorKind::TimedOut => return Ok(0),
            Err(error) => return Err(HttpError::Read(error.kind())),
        }
    }
    Ok(filled)
}

struct SendFailure {
    error: HttpError,
    /// Whether any byte of the status line or headers went out
    head_started: bool,
}

async fn send_response<W: Write>(
    writer: &mut W,
    response: &Response,
    method: Method,
    max_stalls: u32,
) -> Result<(), SendFailure> {
    let head = response.head();
    send_all(writer, head.as_bytes(), max_stalls)
        .await
        .map_err(|error| SendFailure {
            head_started: error.bytes_written() > 0,
            error,
        })?;

    if method != Method::Head {
        send_all(writer, response.body.as_bytes(), max_stalls)
            .await
            .map_err(|error| SendFailure {
                error,
                head_started: true,
            })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::testing::{ScriptedConnection, ScriptedListener, WriteStep};
    use crate::render::{DataSeries, fixture};
    use crate::storage::{LagSnapshot, RingBufferStore};
    use alloc::string::String;
    use alloc::vec::Vec;
    use embassy_futures::block_on;

    fn config() -> HttpConfig {
        HttpConfig {
            points: fixture::POINTS,
            ..HttpConfig::default()
        }
    }

    fn responder(listener: ScriptedListener) -> HttpResponder<ScriptedListener> {
        let mut responder = HttpResponder::new(config());
        responder.attach(listener);
        responder
    }

    /// Serve one request against a store of 100 commits and return the
    /// outcome and everything written to the peer.
    fn exchange_one(connection: ScriptedConnection, store: &RingBufferStore) -> (CycleOutcome, String) {
        let mut listener = ScriptedListener::new();
        let log = listener.close_log();
        listener.push(connection);
        let mut responder = responder(listener);
        let lags = LagSnapshot::compute(store, &[5, 10, 30, 60]);

        let outcome = block_on(responder.poll(&fixture::snapshot(store, &lags)));

        let closed = log.borrow();
        assert_eq!(closed.len(), 1, "connection must be closed exactly once");
        (outcome, String::from_utf8(closed[0].clone()).unwrap())
    }

    fn get(target: &str) -> ScriptedConnection {
        let mut request = String::from("GET ");
        request.push_str(target);
        request.push_str(" HTTP/1.1\r\nHost: thermo\r\nAccept: */*\r\n\r\n");
        ScriptedConnection::new(request.as_bytes())
    }

    fn body(written: &str) -> &str {
        written.split_once("\r\n\r\n").map(|(_, body)| body).unwrap()
    }

    fn points_served(target: &str) -> usize {
        let store = fixture::store(100, 100);
        let (outcome, written) = exchange_one(get(target), &store);
        assert!(matches!(outcome, CycleOutcome::Served { status: Status::Ok, .. }));
        let series: DataSeries = serde_json::from_str(body(&written)).unwrap();
        assert_eq!(series.t.len(), series.h.len());
        series.t.len()
    }

    #[test]
    fn test_points_clamped_to_bounds() {
        assert_eq!(points_served("/data?points=5"), 10);
        assert_eq!(points_served("/data?points=999999"), 61);
        assert_eq!(points_served("/data?points=30"), 30);
        assert_eq!(points_served("/data"), 60);
        assert_eq!(points_served("/data?points=lots"), 60);
    }

    #[test]
    fn test_data_never_exceeds_available_history() {
        let store = fixture::store(100, 3);
        let (_, written) = exchange_one(get("/data?points=50"), &store);
        let series: DataSeries = serde_json::from_str(body(&written)).unwrap();
        assert_eq!(series.t.len(), 3);
    }

    #[test]
    fn test_response_headers() {
        let store = fixture::store(100, 10);
        let (outcome, written) = exchange_one(get("/text"), &store);

        let CycleOutcome::Served { route, status, body_len } = outcome else {
            panic!("unexpected outcome {:?}", outcome);
        };
        assert_eq!(route, Route::Text);
        assert_eq!(status, Status::Ok);
        assert!(written.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(written.contains("Content-Type: text/plain; charset=utf-8\r\n"));
        assert!(written.contains("Cache-Control: no-store\r\n"));
        assert!(written.contains("Connection: close\r\n"));
        assert_eq!(body(&written).len(), body_len);
        assert_eq!(body(&written).lines().count(), 3);
    }

    #[test]
    fn test_unknown_and_malformed_requests_get_dashboard() {
        let store = fixture::store(100, 10);
        for connection in [
            get("/"),
            get("/favicon.ico"),
            get("/data/extra"),
            ScriptedConnection::new(b"garbage\r\n\r\n"),
            ScriptedConnection::new(b"GET /text\r\n\r\n"),
        ] {
            let (outcome, written) = exchange_one(connection, &store);
            assert!(matches!(
                outcome,
                CycleOutcome::Served {
                    route: Route::Dashboard,
                    ..
                }
            ));
            assert!(written.contains("Content-Type: text/html; charset=utf-8\r\n"));
            assert!(body(&written).starts_with("<!DOCTYPE html>"));
        }
    }

    #[test]
    fn test_head_request_omits_body() {
        let store = fixture::store(100, 10);
        let connection = ScriptedConnection::new(b"HEAD /text HTTP/1.1\r\n\r\n");
        let (outcome, written) = exchange_one(connection, &store);

        let CycleOutcome::Served { body_len, .. } = outcome else {
            panic!("unexpected outcome {:?}", outcome);
        };
        assert!(body_len > 0);
        assert!(written.ends_with("\r\n\r\n"));
        assert!(written.contains(&alloc::format!("Content-Length: {}\r\n", body_len)));
    }

    #[test]
    fn test_request_read_in_small_chunks() {
        let store = fixture::store(100, 100);
        let (outcome, _) = exchange_one(get("/data?points=20").with_read_chunk(3), &store);
        assert!(matches!(
            outcome,
            CycleOutcome::Served {
                route: Route::Data { points: 20 },
                ..
            }
        ));
    }

    #[test]
    fn test_response_delivered_through_slow_writes() {
        let store = fixture::store(100, 100);
        let plan: Vec<WriteStep> = (0..30)
            .map(|i| if i % 2 == 0 { WriteStep::Zero } else { WriteStep::Accept(5) })
            .collect();
        let slow = get("/data").with_writes(&plan).with_write_chunk(7);
        let (slow_outcome, slow_written) = exchange_one(slow, &store);
        let (fast_outcome, fast_written) = exchange_one(get("/data"), &store);

        assert_eq!(slow_outcome, fast_outcome);
        assert_eq!(slow_written, fast_written);
    }

    #[test]
    fn test_empty_request_is_abandoned() {
        let store = fixture::store(100, 10);
        let (outcome, written) = exchange_one(ScriptedConnection::new(b""), &store);
        assert_eq!(outcome, CycleOutcome::Abandoned);
        assert!(written.is_empty());

        let timed_out = ScriptedConnection::new(b"").with_read_error(ErrorKind::TimedOut);
        let (outcome, _) = exchange_one(timed_out, &store);
        assert_eq!(outcome, CycleOutcome::Abandoned);
    }

    #[test]
    fn test_read_error_fails_and_closes() {
        let store = fixture::store(100, 10);
        let reset = ScriptedConnection::new(b"").with_read_error(ErrorKind::ConnectionReset);
        let (outcome, written) = exchange_one(reset, &store);
        assert_eq!(
            outcome,
            CycleOutcome::Failed(HttpError::Read(ErrorKind::ConnectionReset))
        );
        assert!(written.is_empty());
    }

    #[test]
    fn test_partial_head_before_read_error_is_served() {
        let store = fixture::store(100, 10);
        let cut = ScriptedConnection::new(b"GET /text HTTP/1.1\r\nHost")
            .with_read_error(ErrorKind::TimedOut);
        let (outcome, _) = exchange_one(cut, &store);
        assert!(matches!(outcome, CycleOutcome::Served { route: Route::Text, .. }));
    }

    #[test]
    fn test_trickled_head_past_both_deadlines_is_closed() {
        let store = fixture::store(100, 10);
        let late = ScriptedConnection::new(b"GET /te")
            .with_read_chunk(1)
            .with_read_error(ErrorKind::TimedOut)
            .with_writes(&[
                WriteStep::Fail(ErrorKind::TimedOut),
                WriteStep::Fail(ErrorKind::TimedOut),
            ]);
        let (outcome, written) = exchange_one(late, &store);

        assert_eq!(
            outcome,
            CycleOutcome::Failed(HttpError::Send {
                kind: ErrorKind::TimedOut,
                written: 0
            })
        );
        assert!(written.is_empty());
    }

    #[test]
    fn test_failed_head_send_falls_back_to_500() {
        let store = fixture::store(100, 10);
        let failing = get("/text").with_writes(&[WriteStep::Fail(ErrorKind::ConnectionReset)]);
        let (outcome, written) = exchange_one(failing, &store);

        assert_eq!(
            outcome,
            CycleOutcome::Failed(HttpError::Send {
                kind: ErrorKind::ConnectionReset,
                written: 0
            })
        );
        assert!(written.starts_with("HTTP/1.1 500 Internal Server Error\r\n"));
        assert_eq!(body(&written), "internal server error\n");
    }

    #[test]
    fn test_failed_body_send_does_not_restart_response() {
        let store = fixture::store(100, 10);
        let failing = get("/text").with_writes(&[
            WriteStep::Accept(usize::MAX),
            WriteStep::Fail(ErrorKind::BrokenPipe),
        ]);
        let (outcome, written) = exchange_one(failing, &store);

        assert!(matches!(
            outcome,
            CycleOutcome::Failed(HttpError::Send {
                kind: ErrorKind::BrokenPipe,
                written: 0
            })
        ));
        assert!(written.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(written.ends_with("\r\n\r\n"));
        assert!(!written.contains("500"));
    }

    #[test]
    fn test_stalled_peer_is_dropped() {
        let store = fixture::store(100, 10);
        let stalled = get("/").with_writes(&[WriteStep::Accept(20)]).with_stalled_tail();
        let (outcome, written) = exchange_one(stalled, &store);

        assert!(matches!(
            outcome,
            CycleOutcome::Failed(HttpError::Stalled { written: 20, .. })
        ));
        assert_eq!(written.len(), 20);
    }

    #[test]
    fn test_every_accepted_connection_closed_once() {
        let store = fixture::store(100, 100);
        let lags = LagSnapshot::compute(&store, &[5]);
        let snapshot = fixture::snapshot(&store, &lags);

        let mut listener = ScriptedListener::new();
        let log = listener.close_log();
        listener.push(get("/data"));
        listener.push(ScriptedConnection::new(b""));
        listener.push(get("/text").with_writes(&[WriteStep::Fail(ErrorKind::ConnectionReset)]));
        listener.push(ScriptedConnection::new(b"").with_read_error(ErrorKind::ConnectionAborted));
        listener.push(get("/").with_stalled_tail());
        let mut responder = responder(listener);

        for served in 1..=5 {
            let outcome = block_on(responder.poll(&snapshot));
            assert_ne!(outcome, CycleOutcome::Idle);
            assert_eq!(log.borrow().len(), served);
        }
        assert_eq!(responder.listener().map(ScriptedListener::pending), Some(0));
        assert_eq!(block_on(responder.poll(&snapshot)), CycleOutcome::Idle);
        assert_eq!(log.borrow().len(), 5);
    }

    #[test]
    fn test_one_connection_per_cycle() {
        let store = fixture::store(100, 10);
        let lags = LagSnapshot::default();
        let snapshot = fixture::snapshot(&store, &lags);

        let mut listener = ScriptedListener::new();
        listener.push(get("/"));
        listener.push(get("/text"));
        let mut responder = responder(listener);

        block_on(responder.poll(&snapshot));
        assert_eq!(responder.listener().map(ScriptedListener::pending), Some(1));
    }

    #[test]
    fn test_absent_listener_is_noop() {
        let store = fixture::store(100, 10);
        let lags = LagSnapshot::default();
        let snapshot = fixture::snapshot(&store, &lags);
        let mut responder: HttpResponder<ScriptedListener> = HttpResponder::new(config());

        assert_eq!(responder.state(), ServerState::Absent);
        assert_eq!(block_on(responder.poll(&snapshot)), CycleOutcome::Absent);

        assert!(responder.attach(ScriptedListener::new()).is_none());
        assert_eq!(responder.state(), ServerState::Listening);
        assert_eq!(block_on(responder.poll(&snapshot)), CycleOutcome::Idle);

        assert!(responder.detach().is_some());
        assert_eq!(block_on(responder.poll(&snapshot)), CycleOutcome::Absent);
    }

    #[test]
    fn test_accept_error_is_reported_and_recovered() {
        let store = fixture::store(100, 10);
        let lags = LagSnapshot::default();
        let snapshot = fixture::snapshot(&store, &lags);

        let mut listener = ScriptedListener::new();
        listener.fail_next_accept(ErrorKind::OutOfMemory);
        listener.push(get("/"));
        let mut responder = responder(listener);

        assert_eq!(
            block_on(responder.poll(&snapshot)),
            CycleOutcome::Failed(HttpError::Accept(ErrorKind::OutOfMemory))
        );
        assert!(matches!(
            block_on(responder.poll(&snapshot)),
            CycleOutcome::Served { .. }
        ));
    }
}
