//! Incremental, byte-driven HTTP/1.x request-line + header state machine.
//!
//! Ported mechanically from the classic Boost.Asio HTTP server sample's
//! `request_parser::consume`: each `consume` match arm below corresponds
//! 1:1 to a row of that state machine's transition table. The
//! `boost::tribool` result becomes [`ParseOutcome`]; the `InputIterator`
//! pair becomes a byte slice with a returned consumed-count, which is the
//! idiomatic replacement here.

use crate::request::Request;
use crate::status::Header;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    MethodStart,
    Method,
    UriStart,
    Uri,
    HvH,
    HvT1,
    HvT2,
    HvP,
    HvSlash,
    MajorStart,
    Major,
    MinorStart,
    Minor,
    ExpectNl1,
    HdrLineStart,
    HdrLws,
    HdrName,
    SpBeforeVal,
    HdrValue,
    ExpectNl2,
    ExpectNl3,
}

/// Outcome of feeding bytes to the parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseOutcome {
    /// A complete request (through the terminating `\r\n\r\n`) was parsed.
    Done,
    /// Valid so far, but more bytes are needed.
    NeedMore,
    /// An invalid byte was seen; the request is unparseable.
    Bad,
}

fn is_char(c: u8) -> bool {
    c <= 127
}

fn is_ctl(c: u8) -> bool {
    c <= 31 || c == 127
}

fn is_digit(c: u8) -> bool {
    c.is_ascii_digit()
}

fn is_tspecial(c: u8) -> bool {
    matches!(
        c,
        b'(' | b')'
            | b'<'
            | b'>'
            | b'@'
            | b','
            | b';'
            | b':'
            | b'\\'
            | b'"'
            | b'/'
            | b'['
            | b']'
            | b'?'
            | b'='
            | b'{'
            | b'}'
            | b' '
            | b'\t'
    )
}

/// An incremental HTTP request-line + header parser. One instance is owned
/// per connection and reused (via [`Parser::reset`]) across keep-alive
/// pipelined requests.
#[derive(Debug)]
pub struct Parser {
    state: State,
    /// Raw bytes of the URI accumulated so far. The URI is gated only on
    /// `¬ctl` (unlike the method, which is also gated on `¬tspecial` and
    /// therefore confined to ASCII), so bytes `0x80..=0xFF` must pass
    /// through unchanged rather than being widened one-at-a-time via
    /// `as char`, which would re-encode each such byte as a 2-byte UTF-8
    /// sequence and corrupt the URI. Flushed into `req.uri` once, when
    /// the URI is complete.
    uri_buf: Vec<u8>,
    /// Same reasoning as `uri_buf`, for the header value currently being
    /// accumulated (spans `HdrValue` and any folded `HdrLws` continuation
    /// lines). Flushed into the last header's `value` once the value is
    /// known to be complete (a new header starts, or the header block
    /// ends) -- not on every CRLF, since a continuation line may follow.
    header_value_buf: Vec<u8>,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        Self {
            state: State::MethodStart,
            uri_buf: Vec::new(),
            header_value_buf: Vec::new(),
        }
    }

    /// Reset to the initial state, ready to parse a new request.
    pub fn reset(&mut self) {
        self.state = State::MethodStart;
        self.uri_buf.clear();
        self.header_value_buf.clear();
    }

    /// Decode accumulated raw bytes into a `String`, exactly as received
    /// for any valid UTF-8 byte sequence (including literal, non-ASCII
    /// bytes sent un-percent-encoded); invalid sequences degrade via
    /// replacement rather than panicking or silently splitting bytes.
    fn take_bytes_as_string(buf: &mut Vec<u8>) -> String {
        let s = String::from_utf8_lossy(buf).into_owned();
        buf.clear();
        s
    }

    /// Flush `header_value_buf` into the last header's `value`, if a
    /// header is open. No-op if nothing has been accumulated (e.g. an
    /// empty header value).
    fn flush_header_value(&mut self, req: &mut Request) {
        if let Some(last) = req.headers.last_mut() {
            last.value = Self::take_bytes_as_string(&mut self.header_value_buf);
        }
    }

    /// Feed `bytes` to the parser, mutating `req` as header/method/uri
    /// bytes are recognised. Returns the outcome and how many bytes of
    /// `bytes` were consumed before a terminal result (or all of them, if
    /// [`ParseOutcome::NeedMore`]).
    pub fn parse(&mut self, req: &mut Request, bytes: &[u8]) -> (ParseOutcome, usize) {
        for (i, &b) in bytes.iter().enumerate() {
            match self.consume(req, b) {
                ParseOutcome::NeedMore => continue,
                outcome => return (outcome, i + 1),
            }
        }
        (ParseOutcome::NeedMore, bytes.len())
    }

    fn consume(&mut self, req: &mut Request, input: u8) -> ParseOutcome {
        use State::*;
        match self.state {
            MethodStart => {
                if !is_char(input) || is_ctl(input) || is_tspecial(input) {
                    ParseOutcome::Bad
                } else {
                    self.state = Method;
                    req.method.push(input as char);
                    ParseOutcome::NeedMore
                }
            }
            Method => {
                if input == b' ' {
                    self.state = Uri;
                    ParseOutcome::NeedMore
                } else if !is_char(input) || is_ctl(input) || is_tspecial(input) {
                    ParseOutcome::Bad
                } else {
                    req.method.push(input as char);
                    ParseOutcome::NeedMore
                }
            }
            UriStart => {
                if is_ctl(input) {
                    ParseOutcome::Bad
                } else {
                    self.state = Uri;
                    self.uri_buf.push(input);
                    ParseOutcome::NeedMore
                }
            }
            Uri => {
                if input == b' ' {
                    req.uri = Self::take_bytes_as_string(&mut self.uri_buf);
                    self.state = HvH;
                    ParseOutcome::NeedMore
                } else if is_ctl(input) {
                    ParseOutcome::Bad
                } else {
                    self.uri_buf.push(input);
                    ParseOutcome::NeedMore
                }
            }
            HvH => {
                if input == b'H' {
                    self.state = HvT1;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            HvT1 => {
                if input == b'T' {
                    self.state = HvT2;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            HvT2 => {
                if input == b'T' {
                    self.state = HvP;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            HvP => {
                if input == b'P' {
                    self.state = HvSlash;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            HvSlash => {
                if input == b'/' {
                    req.http_version_major = 0;
                    req.http_version_minor = 0;
                    self.state = MajorStart;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            MajorStart => {
                if is_digit(input) {
                    req.http_version_major = req.http_version_major * 10 + (input - b'0') as u32;
                    self.state = Major;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            Major => {
                if input == b'.' {
                    self.state = MinorStart;
                    ParseOutcome::NeedMore
                } else if is_digit(input) {
                    req.http_version_major = req.http_version_major * 10 + (input - b'0') as u32;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            MinorStart => {
                if is_digit(input) {
                    req.http_version_minor = req.http_version_minor * 10 + (input - b'0') as u32;
                    self.state = Minor;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            Minor => {
                if input == b'\r' {
                    self.state = ExpectNl1;
                    ParseOutcome::NeedMore
                } else if is_digit(input) {
                    req.http_version_minor = req.http_version_minor * 10 + (input - b'0') as u32;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            ExpectNl1 => {
                if input == b'\n' {
                    self.state = HdrLineStart;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            HdrLineStart => {
                if input == b'\r' {
                    // End of headers: the previous header's value (if any)
                    // is now complete, since no continuation line follows.
                    self.flush_header_value(req);
                    self.state = ExpectNl3;
                    ParseOutcome::NeedMore
                } else if !req.headers.is_empty() && (input == b' ' || input == b'\t') {
                    // Continuation line: the previous header's value is
                    // not yet complete, so do not flush it.
                    self.state = HdrLws;
                    ParseOutcome::NeedMore
                } else if !is_char(input) || is_ctl(input) || is_tspecial(input) {
                    ParseOutcome::Bad
                } else {
                    // A new header starts: the previous one's value (if
                    // any) is now complete.
                    self.flush_header_value(req);
                    req.headers.push(Header::new(String::new(), String::new()));
                    req.headers.last_mut().unwrap().name.push(input as char);
                    self.state = HdrName;
                    ParseOutcome::NeedMore
                }
            }
            HdrLws => {
                if input == b'\r' {
                    self.state = ExpectNl2;
                    ParseOutcome::NeedMore
                } else if input == b' ' || input == b'\t' {
                    ParseOutcome::NeedMore
                } else if is_ctl(input) {
                    ParseOutcome::Bad
                } else {
                    self.state = HdrValue;
                    self.header_value_buf.push(input);
                    ParseOutcome::NeedMore
                }
            }
            HdrName => {
                if input == b':' {
                    self.state = SpBeforeVal;
                    ParseOutcome::NeedMore
                } else if !is_char(input) || is_ctl(input) || is_tspecial(input) {
                    ParseOutcome::Bad
                } else {
                    req.headers.last_mut().unwrap().name.push(input as char);
                    ParseOutcome::NeedMore
                }
            }
            SpBeforeVal => {
                if input == b' ' {
                    self.state = HdrValue;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            HdrValue => {
                if input == b'\r' {
                    self.state = ExpectNl2;
                    ParseOutcome::NeedMore
                } else if is_ctl(input) {
                    ParseOutcome::Bad
                } else {
                    self.header_value_buf.push(input);
                    ParseOutcome::NeedMore
                }
            }
            ExpectNl2 => {
                if input == b'\n' {
                    self.state = HdrLineStart;
                    ParseOutcome::NeedMore
                } else {
                    ParseOutcome::Bad
                }
            }
            ExpectNl3 => {
                if input == b'\n' {
                    ParseOutcome::Done
                } else {
                    ParseOutcome::Bad
                }
            }
        }
    }
}
