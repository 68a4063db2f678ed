//! End-to-end request/response scenarios driven over a real loopback TCP
//! connection against a [`Server`] wired to an in-memory
//! [`torrentd_gateway::fixtures::FileProducer`]. Grounded on
//! `crates/librqbit/src/tests/e2e_stream.rs`'s convention of exercising a
//! real socket end-to-end rather than mocking the transport.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use torrentd_gateway::fixtures::FileProducer;
use torrentd_gateway::Server;

struct ParsedResponse {
    status_line: String,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ParsedResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Read one HTTP response off `stream`: the header block, then exactly
/// `Content-Length` bytes of body.
async fn read_response(stream: &mut TcpStream) -> ParsedResponse {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        let n = stream.read(&mut chunk).await.expect("read headers");
        assert_ne!(n, 0, "connection closed before headers completed");
        buf.extend_from_slice(&chunk[..n]);
    };

    let header_text = String::from_utf8(buf[..header_end].to_vec()).unwrap();
    let mut lines = header_text.split("\r\n").filter(|l| !l.is_empty());
    let status_line = lines.next().unwrap().to_string();
    let headers: Vec<(String, String)> = lines
        .map(|l| {
            let (name, value) = l.split_once(':').expect("malformed header line");
            (name.trim().to_string(), value.trim().to_string())
        })
        .collect();

    let content_length: usize = headers
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case("content-length"))
        .map(|(_, v)| v.parse().unwrap())
        .expect("every reply in this gateway carries Content-Length");

    let mut body = buf[header_end..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut chunk).await.expect("read body");
        assert_ne!(n, 0, "connection closed before body completed");
        body.extend_from_slice(&chunk[..n]);
    }
    body.truncate(content_length);

    ParsedResponse {
        status_line,
        headers,
        body,
    }
}

async fn start_server(producer: Arc<FileProducer>) -> Server {
    Server::bind("127.0.0.1", 0, "", producer)
        .await
        .expect("server binds")
}

#[tokio::test]
async fn full_get_serves_whole_file() {
    let producer = Arc::new(FileProducer::new());
    producer.insert(1, vec![0xAB; 1000]);
    let server = start_server(producer).await;
    let addr = server.local_addr();
    tokio::spawn(async move { server.run().await.unwrap() });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /1 HTTP/1.1\r\nHost: x\r\n\r\n")
        .await
        .unwrap();

    let resp = read_response(&mut stream).await;
    assert_eq!(resp.status_line, "HTTP/1.1 200 OK");
    assert_eq!(resp.header("Content-Length"), Some("1000"));
    assert_eq!(resp.header("Content-Range"), Some("bytes 0-999/1000"));
    assert_eq!(resp.header("Accept-Ranges"), Some("bytes"));
    assert_eq!(resp.body.len(), 1000);
    assert!(resp.body.iter().all(|&b| b == 0xAB));
}

#[tokio::test]
async fn closed_range_serves_byte_slice() {
    let producer = Arc::new(FileProducer::new());
    let data: Vec<u8> = (0..1000u32).map(|i| (i % 256) as u8).collect();
    producer.insert(1, data.clone());
    let server = start_server(producer).await;
    let addr = server.local_addr();
    tokio::spawn(async move { server.run().await.unwrap() });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /1 HTTP/1.1\r\nHost: x\r\nRange: bytes=100-199\r\n\r\n")
        .await
        .unwrap();

    let resp = read_response(&mut stream).await;
    assert_eq!(resp.status_line, "HTTP/1.1 206 Partial Content");
    assert_eq!(resp.header("Content-Length"), Some("100"));
    assert_eq!(resp.header("Content-Range"), Some("bytes 100-199/1000"));
    assert_eq!(resp.body, &data[100..200]);
}

#[tokio::test]
async fn open_range_serves_to_eof() {
    let producer = Arc::new(FileProducer::new());
    let data: Vec<u8> = (0..1000u32).map(|i| (i % 256) as u8).collect();
    producer.insert(1, data.clone());
    let server = start_server(producer).await;
    let addr = server.local_addr();
    tokio::spawn(async move { server.run().await.unwrap() });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /1 HTTP/1.1\r\nHost: x\r\nRange: bytes=500-\r\n\r\n")
        .await
        .unwrap();

    let resp = read_response(&mut stream).await;
    assert_eq!(resp.status_line, "HTTP/1.1 206 Partial Content");
    assert_eq!(resp.header("Content-Length"), Some("500"));
    assert_eq!(resp.header("Content-Range"), Some("bytes 500-999/1000"));
    assert_eq!(resp.body, &data[500..1000]);
}

#[tokio::test(flavor = "multi_thread")]
async fn producer_backpressure_retries_then_completes_in_order() {
    let producer = Arc::new(FileProducer::new());
    let data: Vec<u8> = (0..2000u32).map(|i| (i % 256) as u8).collect();
    producer.insert_with_stall(1, data.clone(), 3);
    let server = start_server(producer).await;
    let addr = server.local_addr();
    tokio::spawn(async move { server.run().await.unwrap() });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /1 HTTP/1.1\r\nHost: x\r\n\r\n")
        .await
        .unwrap();

    // 3 stalls * 1s retry delay; give headroom.
    let resp = tokio::time::timeout(Duration::from_secs(10), read_response(&mut stream))
        .await
        .expect("response within timeout");
    assert_eq!(resp.status_line, "HTTP/1.1 200 OK");
    assert_eq!(resp.body, data);
}

#[tokio::test]
async fn bad_path_with_dotdot_is_rejected_and_connection_closes() {
    let producer = Arc::new(FileProducer::new());
    let server = start_server(producer).await;
    let addr = server.local_addr();
    tokio::spawn(async move { server.run().await.unwrap() });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /../etc/passwd HTTP/1.1\r\nHost: x\r\n\r\n")
        .await
        .unwrap();

    let resp = read_response(&mut stream).await;
    assert_eq!(resp.status_line, "HTTP/1.1 400 Bad Request");
    assert_eq!(resp.header("Content-Type"), Some("text/html"));

    // The connection must be closed after a bad request: a further read
    // observes EOF.
    let mut trailing = [0u8; 1];
    let n = stream.read(&mut trailing).await.unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn keep_alive_pipelining_serves_both_then_closes_on_third() {
    let producer = Arc::new(FileProducer::new());
    producer.insert(1, vec![1u8; 10]);
    producer.insert(2, vec![2u8; 20]);
    let server = start_server(producer).await;
    let addr = server.local_addr();
    tokio::spawn(async move { server.run().await.unwrap() });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /1 HTTP/1.1\r\nConnection: keep-alive\r\n\r\n")
        .await
        .unwrap();
    let resp1 = read_response(&mut stream).await;
    assert_eq!(resp1.status_line, "HTTP/1.1 200 OK");
    assert_eq!(resp1.header("Connection"), Some("keep-alive"));
    assert_eq!(resp1.body, vec![1u8; 10]);

    stream
        .write_all(b"GET /2 HTTP/1.1\r\nConnection: close\r\n\r\n")
        .await
        .unwrap();
    let resp2 = read_response(&mut stream).await;
    assert_eq!(resp2.status_line, "HTTP/1.1 200 OK");
    assert_eq!(resp2.header("Connection"), Some("close"));
    assert_eq!(resp2.body, vec![2u8; 20]);

    let mut trailing = [0u8; 1];
    let n = stream.read(&mut trailing).await.unwrap();
    assert_eq!(n, 0);
}

#[tokio::test]
async fn unresolvable_uri_yields_bad_request() {
    let producer = Arc::new(FileProducer::new());
    let server = start_server(producer).await;
    let addr = server.local_addr();
    tokio::spawn(async move { server.run().await.unwrap() });

    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream
        .write_all(b"GET /999 HTTP/1.1\r\nHost: x\r\n\r\n")
        .await
        .unwrap();

    let resp = read_response(&mut stream).await;
    assert_eq!(resp.status_line, "HTTP/1.1 400 Bad Request");
}

#[tokio::test]
async fn stop_rejects_further_connections() {
    let producer = Arc::new(FileProducer::new());
    producer.insert(1, vec![0u8; 10]);
    let server = Arc::new(start_server(producer).await);
    let addr = server.local_addr();
    let run_server = server.clone();
    let handle = tokio::spawn(async move { run_server.run().await });

    server.stop();
    let result = tokio::time::timeout(Duration::from_secs(1), handle)
        .await
        .expect("run() returns promptly after stop()")
        .unwrap();
    assert!(result.is_ok());
    assert_eq!(server.live_connection_count(), 0);
    let _ = addr;
}
