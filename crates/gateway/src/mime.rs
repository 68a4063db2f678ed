//! Extension -> media type lookup, seeded from the set of containers this
//! gateway is expected to stream (progressive video/audio playback).

const MAPPINGS: &[(&str, &str)] = &[
    ("html", "text/html"),
    ("htm", "text/html"),
    ("txt", "text/plain"),
    ("xml", "text/xml"),
    ("css", "text/css"),
    ("gif", "image/gif"),
    ("jpe", "image/jpeg"),
    ("jpg", "image/jpeg"),
    ("jpeg", "image/jpeg"),
    ("png", "image/png"),
    ("mp4", "video/mp4"),
    ("3gp", "video/3gpp"),
    ("avi", "video/avi"),
    ("mkv", "video/x-matroska"),
    ("flv", "video/flv"),
    ("mpg", "video/mpeg"),
    ("mpeg", "video/mpeg"),
    ("mov", "video/quicktime"),
    ("webm", "video/webm"),
    ("wav", "audio/wav"),
    ("mp3", "audio/mpeg"),
    ("ogg", "application/ogg"),
    ("oga", "audio/ogg"),
    ("ogv", "video/ogg"),
    ("opus", "audio/ogg; codecs=opus"),
    ("wma", "audio/x-ms-wma"),
    ("wmv", "video/x-ms-wmv"),
    ("rmvb", "video/x-pn-realvideo"),
    ("divx", "video/divx"),
    ("asf", "video/x-ms-asf"),
];

const DEFAULT_MIME_TYPE: &str = "application/octet-stream";

/// Convert a file extension (no leading dot, case sensitive) into a media type.
pub fn extension_to_type(extension: &str) -> &'static str {
    MAPPINGS
        .iter()
        .find(|(ext, _)| *ext == extension)
        .map(|(_, mime)| *mime)
        .unwrap_or(DEFAULT_MIME_TYPE)
}
