//! Transport seams for the responder.

use embedded_io_async::{Read, Write};

/// Source of inbound connections.
pub trait Listener {
    type Error: embedded_io::Error;
    type Connection<'a>: Connection
    where
        Self: 'a;

    /// Take one pending connection if there is one.
    ///
    /// Must resolve promptly with `Ok(None)` when nothing is waiting; the
    /// tick loop calls this every tick.
    fn try_accept(
        &mut self,
    ) -> impl Future<Output = Result<Option<Self::Connection<'_>>, Self::Error>>;
}

/// One accepted duplex stream.
///
/// The transport bounds the whole exchange, not each call: once the
/// [`crate::config::ExchangeDeadlines`] read or write deadline has passed,
/// further reads or writes fail with `ErrorKind::TimedOut`. A write may
/// return `Ok(0)` to mean "nothing accepted right now, try again shortly".
pub trait Connection: Read + Write {
    /// Release the connection. Consuming `self` makes a second close
    /// impossible.
    fn close(self) -> impl Future<Output = ()>;
}
