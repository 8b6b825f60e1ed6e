//! Request line parsing.

use super::query::QueryParams;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
    Other,
}

impl Method {
    fn parse(token: &str) -> Self {
        match token {
            "GET" => Self::Get,
            "HEAD" => Self::Head,
            _ => Self::Other,
        }
    }
}

/// The parts of a request the responder routes on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Request<'a> {
    pub method: Method,
    pub path: &'a str,
    pub query: QueryParams<'a>,
}

impl<'a> Request<'a> {
    /// What a malformed request line is treated as.
    pub const FALLBACK: Request<'static> = Request {
        method: Method::Get,
        path: "/",
        query: QueryParams::new(""),
    };

    /// Parse `METHOD SP TARGET SP VERSION` from the first line of `head`.
    ///
    /// Never fails: anything that is not a well-formed request line becomes
    /// [`Request::FALLBACK`]. Headers after the first line are ignored.
    pub fn parse(head: &'a [u8]) -> Self {
        Self::parse_line(head).unwrap_or(Self::FALLBACK)
    }

    fn parse_line(head: &'a [u8]) -> Option<Self> {
        let end = head
            .iter()
            .position(|&byte| byte == b'\n')
            .unwrap_or(head.len());
        let line = core::str::from_utf8(&head[..end]).ok()?;
        let line = line.strip_suffix('\r').unwrap_or(line);

        let mut parts = line.split(' ');
        let method = parts.next().filter(|token| !token.is_empty())?;
        let target = parts.next().filter(|token| token.starts_with('/'))?;
        let version = parts.next().filter(|token| token.starts_with("HTTP/"))?;
        if parts.next().is_some() || version.len() <= "HTTP/".len() {
            return None;
        }

        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Some(Self {
            method: Method::parse(method),
            path,
            query: QueryParams::new(query),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request_line_with_query() {
        let request = Request::parse(b"GET /data?points=30 HTTP/1.1\r\nHost: x\r\n\r\n");
        assert_eq!(request.method, Method::Get);
        assert_eq!(request.path, "/data");
        assert_eq!(request.query.get("points"), Some("30"));
    }

    #[test]
    fn test_split_at_first_question_mark_only() {
        let request = Request::parse(b"GET /text?a=1?b=2 HTTP/1.0\r\n");
        assert_eq!(request.path, "/text");
        assert_eq!(request.query, QueryParams::new("a=1?b=2"));
    }

    #[test]
    fn test_head_and_other_methods() {
        assert_eq!(Request::parse(b"HEAD / HTTP/1.1\r\n").method, Method::Head);
        let post = Request::parse(b"POST /data HTTP/1.1\r\n");
        assert_eq!(post.method, Method::Other);
        assert_eq!(post.path, "/data");
    }

    #[test]
    fn test_line_without_crlf_terminator() {
        let request = Request::parse(b"GET /text HTTP/1.1");
        assert_eq!(request.path, "/text");
    }

    #[test]
    fn test_malformed_lines_fall_back_to_root() {
        let cases: [&[u8]; 8] = [
            b"",
            b"\r\n",
            b"GET\r\n",
            b"GET /data\r\n",
            b"GET data HTTP/1.1\r\n",
            b"GET /data FTP/1.1\r\n",
            b"GET  /data HTTP/1.1\r\n",
            b"GET /data HTTP/1.1 extra\r\n",
        ];
        for head in cases {
            assert_eq!(Request::parse(head), Request::FALLBACK, "{:?}", head);
        }
        assert_eq!(Request::parse(&[0xff, 0xfe, b'\n']), Request::FALLBACK);
    }
}
