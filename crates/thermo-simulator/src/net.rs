//! `std::net` transport for the core responder.

use std::io::{self, Read as _, Write as _};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::{Duration, Instant};

use embedded_io::ErrorKind;
use log::debug;

use thermo_core::config::{ExchangeDeadlines, HttpConfig};
use thermo_core::http::{Connection, Listener};

/// Map a std I/O error onto the transport error kinds the core inspects.
fn kind_of(error: &io::Error) -> ErrorKind {
    match error.kind() {
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => ErrorKind::TimedOut,
        io::ErrorKind::ConnectionReset => ErrorKind::ConnectionReset,
        io::ErrorKind::ConnectionAborted => ErrorKind::ConnectionAborted,
        io::ErrorKind::BrokenPipe => ErrorKind::BrokenPipe,
        io::ErrorKind::NotConnected => ErrorKind::NotConnected,
        io::ErrorKind::Interrupted => ErrorKind::Interrupted,
        io::ErrorKind::OutOfMemory => ErrorKind::OutOfMemory,
        _ => ErrorKind::Other,
    }
}

/// Non-blocking listener: `try_accept` never waits.
pub struct StdListener {
    inner: TcpListener,
    deadlines: ExchangeDeadlines,
}

impl StdListener {
    pub fn bind(addr: SocketAddr, config: &HttpConfig) -> io::Result<Self> {
        let inner = TcpListener::bind(addr)?;
        inner.set_nonblocking(true)?;
        Ok(Self {
            inner,
            deadlines: config.exchange_deadlines(),
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }

    fn prepare(&self, stream: TcpStream) -> io::Result<StdConnection> {
        stream.set_nonblocking(false)?;
        stream.set_nodelay(true)?;
        let accepted = Instant::now();
        Ok(StdConnection {
            stream,
            read_by: accepted + Duration::from_millis(self.deadlines.read_by_ms as u64),
            write_by: accepted + Duration::from_millis(self.deadlines.write_by_ms as u64),
        })
    }
}

impl Listener for StdListener {
    type Error = ErrorKind;
    type Connection<'a> = StdConnection;

    async fn try_accept(&mut self) -> Result<Option<Self::Connection<'_>>, Self::Error> {
        match self.inner.accept() {
            Ok((stream, peer)) => {
                debug!("Accepted {}", peer);
                // A failed setup drops the stream, which closes it
                self.prepare(stream).map(Some).map_err(|error| kind_of(&error))
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(error) => Err(kind_of(&error)),
        }
    }
}

/// Blocking stream whose reads and writes stop at fixed deadlines set when
/// it was accepted.
pub struct StdConnection {
    stream: TcpStream,
    read_by: Instant,
    write_by: Instant,
}

/// Time left until `deadline`, or `TimedOut` once it has passed.
fn remaining(deadline: Instant) -> Result<Duration, ErrorKind> {
    let left = deadline.saturating_duration_since(Instant::now());
    if left.is_zero() {
        Err(ErrorKind::TimedOut)
    } else {
        Ok(left)
    }
}

impl embedded_io::ErrorType for StdConnection {
    type Error = ErrorKind;
}

impl embedded_io_async::Read for StdConnection {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let left = remaining(self.read_by)?;
        self.stream
            .set_read_timeout(Some(left))
            .map_err(|error| kind_of(&error))?;
        self.stream.read(buf).map_err(|error| kind_of(&error))
    }
}

impl embedded_io_async::Write for StdConnection {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let left = remaining(self.write_by)?;
        self.stream
            .set_write_timeout(Some(left))
            .map_err(|error| kind_of(&error))?;
        self.stream.write(buf).map_err(|error| kind_of(&error))
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        remaining(self.write_by)?;
        self.stream.flush().map_err(|error| kind_of(&error))
    }
}

impl Connection for StdConnection {
    async fn close(self) {
        if let Err(error) = self.stream.shutdown(Shutdown::Both) {
            debug!("Shutdown after response: {}", error);
        }
    }
}
