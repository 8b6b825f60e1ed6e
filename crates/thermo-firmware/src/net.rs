//! `embassy-net` transport for the core HTTP responder.
//!
//! A single long-lived [`TcpSocket`] is reused for every request: each tick
//! it listens for a short accept window, serves at most one peer, then is
//! aborted back to the closed state ready for the next accept. Reads and
//! writes on an accepted peer stop at deadlines fixed when it was accepted.

use embassy_net::Stack;
use embassy_net::tcp::{AcceptError, TcpSocket};
use embassy_time::{Duration, Instant, with_deadline, with_timeout};
use embedded_io::ErrorKind;
use log::debug;
use static_cell::StaticCell;
use thermo_core::config::{ExchangeDeadlines, HttpConfig};
use thermo_core::http::{Connection, Listener};

const RX_BUFFER_LEN: usize = 1024;
const TX_BUFFER_LEN: usize = 2048;

static RX_BUFFER: StaticCell<[u8; RX_BUFFER_LEN]> = StaticCell::new();
static TX_BUFFER: StaticCell<[u8; TX_BUFFER_LEN]> = StaticCell::new();

/// Upper bound on flushing the tail of a response before the reset.
const CLOSE_FLUSH: Duration = Duration::from_millis(100);

pub struct SocketListener {
    socket: TcpSocket<'static>,
    port: u16,
    accept_window: Duration,
    deadlines: ExchangeDeadlines,
}

impl SocketListener {
    /// Claim the static socket buffers. Returns `None` if called twice.
    pub fn new(stack: Stack<'static>, config: &HttpConfig) -> Option<Self> {
        let rx = RX_BUFFER.try_init([0; RX_BUFFER_LEN])?;
        let tx = TX_BUFFER.try_init([0; TX_BUFFER_LEN])?;
        Some(Self {
            socket: TcpSocket::new(stack, rx, tx),
            port: config.port,
            accept_window: Duration::from_millis(config.accept_window_ms as u64),
            deadlines: config.exchange_deadlines(),
        })
    }
}

impl Listener for SocketListener {
    type Error = ErrorKind;
    type Connection<'a> = SocketConnection<'a>;

    async fn try_accept(&mut self) -> Result<Option<Self::Connection<'_>>, Self::Error> {
        // Re-arming an already listening socket on the same port is a no-op,
        // so a timed-out accept simply keeps listening into the next tick.
        match with_timeout(self.accept_window, self.socket.accept(self.port)).await {
            Err(_) => Ok(None),
            Ok(Ok(())) => {
                debug!("Accepted {:?}", self.socket.remote_endpoint());
                let accepted = Instant::now();
                Ok(Some(SocketConnection {
                    socket: &mut self.socket,
                    read_by: accepted + Duration::from_millis(self.deadlines.read_by_ms as u64),
                    write_by: accepted + Duration::from_millis(self.deadlines.write_by_ms as u64),
                }))
            }
            Ok(Err(AcceptError::InvalidPort)) => Err(ErrorKind::InvalidInput),
            Ok(Err(AcceptError::InvalidState)) => {
                self.socket.abort();
                Err(ErrorKind::Other)
            }
            Ok(Err(_)) => {
                self.socket.abort();
                Err(ErrorKind::ConnectionReset)
            }
        }
    }
}

pub struct SocketConnection<'a> {
    socket: &'a mut TcpSocket<'static>,
    read_by: Instant,
    write_by: Instant,
}

/// A missed deadline is `TimedOut`; embassy-net's only socket error is a reset.
fn io_result<T>(
    result: Result<Result<T, embassy_net::tcp::Error>, embassy_time::TimeoutError>,
) -> Result<T, ErrorKind> {
    match result {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(_)) => Err(ErrorKind::ConnectionReset),
        Err(_) => Err(ErrorKind::TimedOut),
    }
}

impl embedded_io::ErrorType for SocketConnection<'_> {
    type Error = ErrorKind;
}

impl embedded_io_async::Read for SocketConnection<'_> {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        io_result(with_deadline(self.read_by, self.socket.read(buf)).await)
    }
}

impl embedded_io_async::Write for SocketConnection<'_> {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        io_result(with_deadline(self.write_by, self.socket.write(buf)).await)
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        io_result(with_deadline(self.write_by, self.socket.flush()).await)
    }
}

impl Connection for SocketConnection<'_> {
    async fn close(self) {
        self.socket.close();
        let _ = with_timeout(CLOSE_FLUSH, self.socket.flush()).await;
        self.socket.abort();
    }
}
