//! The status catalog and the [`Reply`] type built on top of it.

/// A single `name: value` header. Names are compared case-insensitively
/// elsewhere (see [`crate::util::string_begins_no_case`] and the scan in
/// [`crate::handler`]); order is preserved here because it is significant
/// on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: String,
}

impl Header {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// The closed set of statuses this gateway ever emits. Anything not in
/// this catalog is a bug, not a representable reply -- unknown codes are
/// not constructible.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusCode {
    Ok = 200,
    Created = 201,
    Accepted = 202,
    NoContent = 204,
    PartialContent = 206,
    MultipleChoices = 300,
    MovedPermanently = 301,
    MovedTemporarily = 302,
    NotModified = 304,
    BadRequest = 400,
    Unauthorized = 401,
    Forbidden = 403,
    NotFound = 404,
    InternalServerError = 500,
    NotImplemented = 501,
    BadGateway = 502,
    ServiceUnavailable = 503,
}

impl StatusCode {
    /// Canonical `HTTP/1.1 <code> <reason>\r\n` status line.
    pub fn status_line(self) -> &'static str {
        match self {
            StatusCode::Ok => "HTTP/1.1 200 OK\r\n",
            StatusCode::Created => "HTTP/1.1 201 Created\r\n",
            StatusCode::Accepted => "HTTP/1.1 202 Accepted\r\n",
            StatusCode::NoContent => "HTTP/1.1 204 No Content\r\n",
            StatusCode::PartialContent => "HTTP/1.1 206 Partial Content\r\n",
            StatusCode::MultipleChoices => "HTTP/1.1 300 Multiple Choices\r\n",
            StatusCode::MovedPermanently => "HTTP/1.1 301 Moved Permanently\r\n",
            StatusCode::MovedTemporarily => "HTTP/1.1 302 Moved Temporarily\r\n",
            StatusCode::NotModified => "HTTP/1.1 304 Not Modified\r\n",
            StatusCode::BadRequest => "HTTP/1.1 400 Bad Request\r\n",
            StatusCode::Unauthorized => "HTTP/1.1 401 Unauthorized\r\n",
            StatusCode::Forbidden => "HTTP/1.1 403 Forbidden\r\n",
            StatusCode::NotFound => "HTTP/1.1 404 Not Found\r\n",
            StatusCode::InternalServerError => "HTTP/1.1 500 Internal Server Error\r\n",
            StatusCode::NotImplemented => "HTTP/1.1 501 Not Implemented\r\n",
            StatusCode::BadGateway => "HTTP/1.1 502 Bad Gateway\r\n",
            StatusCode::ServiceUnavailable => "HTTP/1.1 503 Service Unavailable\r\n",
        }
    }

    /// Minimal stock HTML body for error/redirect replies.
    pub fn stock_body(self) -> String {
        let (code, reason) = match self {
            StatusCode::Ok => (200, "OK"),
            StatusCode::Created => (201, "Created"),
            StatusCode::Accepted => (202, "Accepted"),
            StatusCode::NoContent => (204, "No Content"),
            StatusCode::PartialContent => (206, "Partial Content"),
            StatusCode::MultipleChoices => (300, "Multiple Choices"),
            StatusCode::MovedPermanently => (301, "Moved Permanently"),
            StatusCode::MovedTemporarily => (302, "Moved Temporarily"),
            StatusCode::NotModified => (304, "Not Modified"),
            StatusCode::BadRequest => (400, "Bad Request"),
            StatusCode::Unauthorized => (401, "Unauthorized"),
            StatusCode::Forbidden => (403, "Forbidden"),
            StatusCode::NotFound => (404, "Not Found"),
            StatusCode::InternalServerError => (500, "Internal Server Error"),
            StatusCode::NotImplemented => (501, "Not Implemented"),
            StatusCode::BadGateway => (502, "Bad Gateway"),
            StatusCode::ServiceUnavailable => (503, "Service Unavailable"),
        };
        format!("<html><head><title>{reason}</title></head><body><h1>{code} {reason}</h1></body></html>")
    }
}

/// A reply to be sent to a client. `content` only carries a body for stock
/// (error) replies -- the streamed body of a successful GET never touches
/// this field; it is written straight from the producer into the
/// connection's scratch buffer.
#[derive(Debug, Clone)]
pub struct Reply {
    pub status: StatusCode,
    pub headers: Vec<Header>,
    pub content: String,
    pub send_bytes: usize,
}

impl Reply {
    fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: Vec::new(),
            content: String::new(),
            send_bytes: 0,
        }
    }

    /// Serialize the status line + headers + trailing blank line. Does not
    /// include `content`/body bytes -- callers append those separately.
    pub fn to_buffers(&self) -> String {
        let mut out = String::from(self.status.status_line());
        for h in &self.headers {
            out.push_str(&h.name);
            out.push_str(": ");
            out.push_str(&h.value);
            out.push_str("\r\n");
        }
        out.push_str("\r\n");
        out
    }

    /// A minimal reply carrying a status line, fixed HTML body, and
    /// `Content-Length`/`Content-Type` headers.
    pub fn stock_reply(status: StatusCode) -> Self {
        let mut rep = Reply::new(status);
        rep.content = status.stock_body();
        rep.headers.push(Header::new("Content-Length", rep.content.len().to_string()));
        rep.headers.push(Header::new("Content-Type", "text/html"));
        rep
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_buffers_begins_with_status_line_and_ends_blank() {
        let rep = Reply::stock_reply(StatusCode::BadRequest);
        let buf = rep.to_buffers();
        assert!(buf.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(buf.ends_with("\r\n\r\n"));
    }

    #[test]
    fn stock_reply_has_two_headers() {
        let rep = Reply::stock_reply(StatusCode::NotFound);
        assert_eq!(rep.headers.len(), 2);
        assert_eq!(rep.headers[0].name, "Content-Length");
        assert_eq!(rep.headers[1].name, "Content-Type");
        assert_eq!(rep.headers[1].value, "text/html");
    }

    #[test]
    fn unknown_status_is_unconstructible() {
        // There is no `StatusCode::from(999)` -- invalid codes simply
        // cannot be named, by construction of this closed enum.
        let _ = StatusCode::Ok;
    }
}
