//! Builds a [`Reply`] skeleton from a parsed [`Request`]: validates the
//! path, invokes the producer's resolve callback, applies `Range` math,
//! and emits response headers. Never writes the body -- the connection
//! state machine streams that separately.

use tracing::trace;

use crate::mime;
use crate::producer::{Producer, ResolveOutcome};
use crate::request::Request;
use crate::status::{Header, Reply, StatusCode};
use crate::util::{self, ByteRange};

/// Parse the leading run of ASCII digits in `s`, defaulting to `0` if
/// there is none. Mirrors `atoi`'s permissive behaviour in
/// `original_source`'s `req.video_index = atoi(tmp.c_str())` -- this is
/// deliberately permissive rather than reject-on-non-numeric, so a
/// trailing non-numeric segment degrades to index `0` instead of failing
/// the request.
fn parse_leading_int(s: &str) -> i32 {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}

/// Process `req` against `producer`, returning the reply to send. On
/// success, `req.offset`/`req.body_size`/`req.keep_alive` are populated so
/// the connection can stream the body.
pub fn handle(req: &mut Request, producer: &dyn Producer) -> Reply {
    // 1. Decode path.
    let Some(path) = util::url_decode(&req.uri) else {
        return Reply::stock_reply(StatusCode::BadRequest);
    };

    // 2. Validate path.
    if path.is_empty() || !path.starts_with('/') || path.contains("..") {
        return Reply::stock_reply(StatusCode::BadRequest);
    }

    // 3. Trailing slash normalisation.
    let mut path = path;
    if path.ends_with('/') {
        path.push('0');
    }

    // 4. Extension extraction.
    let last_slash = path.rfind('/');
    let last_dot = path.rfind('.');
    let extension = match (last_dot, last_slash) {
        (Some(dot), Some(slash)) if dot > slash => &path[dot + 1..],
        (Some(dot), None) => &path[dot + 1..],
        _ => "",
    };

    // 5. Header scan.
    let mut range: ByteRange = ByteRange::default();
    let mut is_range_request = false;
    let mut keep_alive = false;
    for h in &req.headers {
        if h.name.eq_ignore_ascii_case("range") {
            is_range_request = true;
            range = util::parse_range_value(&h.value);
        } else if h.name.eq_ignore_ascii_case("connection") {
            keep_alive = h.value.eq_ignore_ascii_case("keep-alive");
        }
    }

    // 6. Derive video_index from the last path segment of the undecoded URI.
    let video_index = match req.uri.rfind('/') {
        Some(pos) => parse_leading_int(&req.uri[pos + 1..]),
        None => 0,
    };

    // 7. Status.
    let status = if is_range_request {
        StatusCode::PartialContent
    } else {
        StatusCode::Ok
    };

    // 8. Invoke producer resolve callback.
    let (file_size, video_index) = match producer.resolve(&req.uri, video_index) {
        ResolveOutcome::Found { file_size, video_index } => (file_size, video_index),
        ResolveOutcome::NotFound => return Reply::stock_reply(StatusCode::BadRequest),
    };
    req.video_index = video_index;

    // 9. Range math.
    let range_start = range.start;
    let body_size = if file_size == 0 {
        0
    } else {
        match range.end {
            // No range header (or a failed parse) degrades to this same
            // case, since both reset range to start=0/end=None.
            None if range_start == 0 => file_size,
            None => file_size - range_start,
            Some(end) => end - range_start + 1,
        }
    };

    // 10. Store on request; recompute range_end for Content-Range.
    req.offset = range_start;
    req.body_size = range_start + body_size;
    req.keep_alive = keep_alive;
    let range_end = req.body_size - 1;

    trace!(
        uri = %req.uri,
        path = %path,
        video_index,
        offset = req.offset,
        body_size = req.body_size,
        file_size,
        "resolved request"
    );

    // 11. Emit headers.
    let mut rep = Reply {
        status,
        headers: Vec::with_capacity(6),
        content: String::new(),
        send_bytes: 0,
    };
    rep.headers.push(Header::new("Content-Length", body_size.to_string()));
    rep.headers.push(Header::new("Server", "TorrentServer/1.0"));
    rep.headers.push(Header::new(
        "Content-Range",
        format!("bytes {range_start}-{range_end}/{file_size}"),
    ));
    rep.headers.push(Header::new("Content-Type", mime::extension_to_type(extension)));
    rep.headers.push(Header::new(
        "Connection",
        if req.keep_alive { "keep-alive" } else { "close" },
    ));
    rep.headers.push(Header::new("Accept-Ranges", "bytes"));
    rep
}
