//! Response status, content types and header block.

use alloc::string::String;
use core::fmt::Write;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    InternalServerError,
}

impl Status {
    pub const fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::InternalServerError => 500,
        }
    }

    pub const fn reason(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InternalServerError => "Internal Server Error",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    PlainText,
    Html,
}

impl ContentType {
    pub const fn mime(self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::PlainText => "text/plain; charset=utf-8",
            Self::Html => "text/html; charset=utf-8",
        }
    }
}

/// Header block, sized for the fixed set of headers written here.
pub type ResponseHead = heapless::String<192>;

/// A fully rendered response, ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub status: Status,
    pub content_type: ContentType,
    pub body: String,
}

impl Response {
    pub fn ok(content_type: ContentType, body: String) -> Self {
        Self {
            status: Status::Ok,
            content_type,
            body,
        }
    }

    /// The best-effort reply sent when a handler fails.
    pub fn internal_error() -> Self {
        Self {
            status: Status::InternalServerError,
            content_type: ContentType::PlainText,
            body: String::from("internal server error\n"),
        }
    }

    pub fn head(&self) -> ResponseHead {
        let mut head = ResponseHead::new();
        // Cannot overflow: the longest status, type and a 20 digit length fit.
        let _ = write!(
            head,
            "HTTP/1.1 {} {}\r\n\
             Content-Type: {}\r\n\
             Content-Length: {}\r\n\
             Cache-Control: no-store\r\n\
             Connection: close\r\n\
             \r\n",
            self.status.code(),
            self.status.reason(),
            self.content_type.mime(),
            self.body.len()
        );
        head
    }
}
