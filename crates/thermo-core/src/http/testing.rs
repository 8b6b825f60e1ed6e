//! In-memory transports with scripted behaviour for responder tests.

use alloc::collections::VecDeque;
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::cell::RefCell;

use embedded_io::ErrorKind;

use super::transport::{Connection, Listener};

/// Bytes written to each connection, recorded when it is closed.
pub type CloseLog = Rc<RefCell<Vec<Vec<u8>>>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStep {
    /// Accept up to this many bytes
    Accept(usize),
    /// Accept nothing this time
    Zero,
    /// Fail the write
    Fail(ErrorKind),
}

pub struct ScriptedConnection {
    request: Vec<u8>,
    read_pos: usize,
    read_chunk: usize,
    read_error: Option<ErrorKind>,
    plan: VecDeque<WriteStep>,
    write_chunk: usize,
    stalled_tail: bool,
    written: Vec<u8>,
    close_log: Option<CloseLog>,
}

impl ScriptedConnection {
    pub fn new(request: &[u8]) -> Self {
        Self {
            request: request.to_vec(),
            read_pos: 0,
            read_chunk: usize::MAX,
            read_error: None,
            plan: VecDeque::new(),
            write_chunk: usize::MAX,
            stalled_tail: false,
            written: Vec::new(),
            close_log: None,
        }
    }

    /// Deliver the request this many bytes per read.
    pub fn with_read_chunk(mut self, chunk: usize) -> Self {
        self.read_chunk = chunk.max(1);
        self
    }

    /// Fail reads once the request bytes are used up, instead of EOF.
    pub fn with_read_error(mut self, kind: ErrorKind) -> Self {
        self.read_error = Some(kind);
        self
    }

    /// Outcomes for the next writes, in order.
    pub fn with_writes(mut self, plan: &[WriteStep]) -> Self {
        self.plan.extend(plan.iter().copied());
        self
    }

    /// Bytes accepted per write once the plan is used up.
    pub fn with_write_chunk(mut self, chunk: usize) -> Self {
        self.write_chunk = chunk.max(1);
        self
    }

    /// Accept nothing once the plan is used up.
    pub fn with_stalled_tail(mut self) -> Self {
        self.stalled_tail = true;
        self
    }

    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl embedded_io::ErrorType for ScriptedConnection {
    type Error = ErrorKind;
}

impl embedded_io_async::Read for ScriptedConnection {
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let remaining = &self.request[self.read_pos..];
        if remaining.is_empty() {
            return match self.read_error {
                Some(kind) => Err(kind),
                None => Ok(0),
            };
        }
        let n = remaining.len().min(buf.len()).min(self.read_chunk);
        buf[..n].copy_from_slice(&remaining[..n]);
        self.read_pos += n;
        Ok(n)
    }
}

impl embedded_io_async::Write for ScriptedConnection {
    async fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        let step = match self.plan.pop_front() {
            Some(step) => step,
            None if self.stalled_tail => WriteStep::Zero,
            None => WriteStep::Accept(self.write_chunk),
        };
        match step {
            WriteStep::Accept(n) => {
                let n = n.min(buf.len());
                self.written.extend_from_slice(&buf[..n]);
                Ok(n)
            }
            WriteStep::Zero => Ok(0),
            WriteStep::Fail(kind) => Err(kind),
        }
    }

    async fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

impl Connection for ScriptedConnection {
    async fn close(self) {
        if let Some(log) = self.close_log {
            log.borrow_mut().push(self.written);
        }
    }
}

/// Hands out queued connections, one per accept.
#[derive(Default)]
pub struct ScriptedListener {
    pending: VecDeque<ScriptedConnection>,
    accept_error: Option<ErrorKind>,
    close_log: CloseLog,
}

impl ScriptedListener {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mut connection: ScriptedConnection) {
        connection.close_log = Some(self.close_log.clone());
        self.pending.push_back(connection);
    }

    pub fn fail_next_accept(&mut self, kind: ErrorKind) {
        self.accept_error = Some(kind);
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    pub fn close_log(&self) -> CloseLog {
        self.close_log.clone()
    }
}

impl Listener for ScriptedListener {
    type Error = ErrorKind;
    type Connection<'a> = ScriptedConnection;

    async fn try_accept(&mut self) -> Result<Option<Self::Connection<'_>>, Self::Error> {
        if let Some(kind) = self.accept_error.take() {
            return Err(kind);
        }
        Ok(self.pending.pop_front())
    }
}
