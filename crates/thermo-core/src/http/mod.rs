//! Minimal cooperative HTTP/1.x responder.
//!
//! One connection is accepted and fully served per tick, never more. The
//! request head is read into a fixed buffer, only the request line is
//! parsed, and the response is written with `Connection: close`. Transports
//! plug in through [`transport::Listener`] and [`transport::Connection`].

pub mod query;
pub mod request;
pub mod responder;
pub mod response;
pub mod send;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use query::{QueryParams, parse_points};
pub use request::{Method, Request};
pub use responder::{CycleOutcome, HttpResponder, Route, ServerState};
pub use response::{ContentType, Response, Status};
pub use transport::{Connection, Listener};

use embedded_io::ErrorKind;
use thiserror_no_std::Error;

/// Faults of one responder cycle. None of them outlive the tick.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpError {
    #[error("accept failed: {0:?}")]
    Accept(ErrorKind),
    #[error("reading request failed: {0:?}")]
    Read(ErrorKind),
    #[error("sending response failed after {written} bytes: {kind:?}")]
    Send { kind: ErrorKind, written: usize },
    #[error("peer stopped accepting data after {written} of {total} bytes")]
    Stalled { written: usize, total: usize },
}

impl HttpError {
    /// Bytes of the current payload already delivered when a send failed.
    pub fn bytes_written(&self) -> usize {
        match *self {
            Self::Send { written, .. } | Self::Stalled { written, .. } => written,
            Self::Accept(_) | Self::Read(_) => 0,
        }
    }
}
