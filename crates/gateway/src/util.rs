//! Percent-decoding, case-insensitive comparison, and `Range` value parsing.

/// Percent-decode `in_`. `+` becomes a space; `%HH` becomes the byte
/// `0xHH` (both hex digits required); anything else is copied verbatim.
/// Returns `None` if a `%` is not followed by exactly two valid hex
/// digits, or if the decoded bytes are not valid UTF-8.
///
/// Works over raw bytes throughout and only re-assembles a `String` at
/// the end -- a multi-byte UTF-8 character, whether passed through
/// verbatim or reconstructed from consecutive `%HH` escapes, must have
/// its bytes joined before conversion, not converted one byte at a time
/// (a lone byte of a multi-byte sequence is not itself a valid `char`).
pub fn url_decode(in_: &str) -> Option<String> {
    let bytes = in_.as_bytes();
    let mut out: Vec<u8> = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                if i + 2 >= bytes.len() {
                    return None;
                }
                let hi = (bytes[i + 1] as char).to_digit(16)?;
                let lo = (bytes[i + 2] as char).to_digit(16)?;
                out.push((hi * 16 + lo) as u8);
                i += 3;
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8(out).ok()
}

/// ASCII case-insensitive prefix test: does `s` begin with `prefix`?
pub fn string_begins_no_case(prefix: &str, s: &str) -> bool {
    s.len() >= prefix.len() && s.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
}

/// Parsed `Range` value. `end == None` means open-ended ("to EOF").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ByteRange {
    pub start: i64,
    pub end: Option<i64>,
}

/// Parse a `Range` header value whose lowercased form is expected to start
/// with `bytes=`. On any failure -- missing `bytes=` prefix, malformed
/// numbers, or `end < start` -- both fields reset to the default (a
/// failed range parse degrades to "no range", not an error). A negative
/// `start` is rejected outright, unlike the `strtoll`-based original
/// parser this mirrors, which would have accepted it silently.
pub fn parse_range_value(v: &str) -> ByteRange {
    let lower = v.to_ascii_lowercase();
    let rest = if string_begins_no_case("bytes=", &lower) {
        &lower[6..]
    } else {
        lower.as_str()
    };

    let Some((start_s, end_s)) = rest.split_once('-') else {
        return ByteRange::default();
    };

    let Ok(start) = start_s.parse::<i64>() else {
        return ByteRange::default();
    };
    if start < 0 {
        return ByteRange::default();
    }

    if end_s.is_empty() {
        return ByteRange { start, end: None };
    }

    let Ok(end) = end_s.parse::<i64>() else {
        return ByteRange::default();
    };
    if end < start {
        return ByteRange::default();
    }

    ByteRange { start, end: Some(end) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percent_encode(s: &str) -> String {
        let mut out = String::new();
        for b in s.bytes() {
            match b {
                b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                    out.push(b as char)
                }
                b' ' => out.push('+'),
                _ => out.push_str(&format!("%{:02X}", b)),
            }
        }
        out
    }

    #[test]
    fn decodes_plus_and_percent() {
        assert_eq!(url_decode("a+b%20c").as_deref(), Some("a b c"));
    }

    #[test]
    fn verbatim_passthrough_without_percent() {
        assert_eq!(url_decode("/movie.mp4").as_deref(), Some("/movie.mp4"));
    }

    #[test]
    fn rejects_short_or_invalid_escape() {
        assert_eq!(url_decode("%"), None);
        assert_eq!(url_decode("%2"), None);
        assert_eq!(url_decode("%zz"), None);
    }

    #[test]
    fn round_trips_through_percent_encode() {
        for s in ["/movie.mp4", "a b+c", "100% done", "日本語-ish"] {
            let encoded = percent_encode(s);
            assert_eq!(url_decode(&encoded).as_deref(), Some(s));
        }
    }

    #[test]
    fn case_insensitive_prefix() {
        assert!(string_begins_no_case("bytes=", "Bytes=0-10"));
        assert!(!string_begins_no_case("bytes=", "byte=0-10"));
    }

    #[test]
    fn open_ended_range() {
        let r = parse_range_value("bytes=500-");
        assert_eq!(r, ByteRange { start: 500, end: None });
    }

    #[test]
    fn closed_range() {
        let r = parse_range_value("bytes=100-199");
        assert_eq!(r, ByteRange { start: 100, end: Some(199) });
    }

    #[test]
    fn malformed_range_resets_to_zero() {
        assert_eq!(parse_range_value("bytes=abc-10"), ByteRange::default());
        assert_eq!(parse_range_value("garbage"), ByteRange::default());
        assert_eq!(parse_range_value("bytes=10-5"), ByteRange::default());
    }

    #[test]
    fn negative_start_is_rejected() {
        assert_eq!(parse_range_value("bytes=-10"), ByteRange::default());
    }
}
