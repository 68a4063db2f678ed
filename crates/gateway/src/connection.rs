//! Per-connection I/O state machine: read -> parse -> handle ->
//! header-write -> body-loop (read-from-producer -> write-to-socket, with
//! timed retry on "not ready"), with keep-alive pipelining support.
//!
//! Ground truth is `original_source`'s Boost.Asio `connection` class
//! (`handle_read`/`handle_write`/`handle_timer`), translated to a single
//! `tokio` task driving a sequential loop rather than the original's
//! chained callbacks: the next pipelined request is read only after the
//! previous body has finished streaming, instead of arming the next
//! `read_until` concurrently with the body-write loop. The wire contract
//! is unaffected either way.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::handler;
use crate::parser::{ParseOutcome, Parser};
use crate::producer::{Producer, ReadOutcome};
use crate::request::Request;
use crate::status::{Reply, StatusCode};

/// Scratch buffer size shared by header serialisation and each body
/// chunk, matching the `io_buffer_size` constant this is grounded on in
/// `original_source`.
pub const IO_BUFFER_SIZE: usize = 512 * 1024;

/// Retry delay after a producer reports backpressure. A policy constant,
/// not part of the wire contract.
const PRODUCER_RETRY_DELAY: Duration = Duration::from_secs(1);

/// A single client connection: one socket, one scratch buffer, one parser
/// instance, driven to completion or cancellation by [`Connection::run`].
pub struct Connection {
    socket: TcpStream,
    producer: std::sync::Arc<dyn Producer>,
    buf: Box<[u8; IO_BUFFER_SIZE]>,
    parser: Parser,
    pending: Vec<u8>,
    local_port: u16,
    abort: CancellationToken,
}

impl Connection {
    pub fn new(
        socket: TcpStream,
        producer: std::sync::Arc<dyn Producer>,
        abort: CancellationToken,
    ) -> Self {
        let local_port = socket.local_addr().map(|a| a.port()).unwrap_or(0);
        Self {
            socket,
            producer,
            buf: Box::new([0u8; IO_BUFFER_SIZE]),
            parser: Parser::new(),
            pending: Vec::new(),
            local_port,
            abort,
        }
    }

    /// Drive this connection until it closes (end of keep-alive, bad
    /// request, producer error, socket error) or is cancelled.
    pub async fn run(mut self) {
        loop {
            match self.serve_one_request().await {
                ServeOutcome::KeepAlive => continue,
                ServeOutcome::Close | ServeOutcome::Aborted | ServeOutcome::Error => break,
            }
        }
        let _ = self.socket.shutdown().await;
    }

    async fn serve_one_request(&mut self) -> ServeOutcome {
        let mut req = Request::new();
        req.http_server_port = self.local_port;

        match self.read_request(&mut req).await {
            ReadRequestOutcome::Parsed => {}
            ReadRequestOutcome::Bad => {
                self.write_stock_and_close(StatusCode::BadRequest).await;
                return ServeOutcome::Close;
            }
            ReadRequestOutcome::Eof => return ServeOutcome::Close,
            ReadRequestOutcome::Aborted => return ServeOutcome::Aborted,
            ReadRequestOutcome::Error(e) => {
                debug!(error = %e, "error reading request");
                return ServeOutcome::Error;
            }
        }

        let reply = handler::handle(&mut req, self.producer.as_ref());
        let is_bad_request = reply.status == StatusCode::BadRequest;

        match self.write_headers(&reply).await {
            WriteOutcome::Ok => {}
            WriteOutcome::Aborted => return ServeOutcome::Aborted,
            WriteOutcome::Err => return ServeOutcome::Error,
        }

        if is_bad_request {
            let _ = self.write_all_abortable(reply.content.as_bytes()).await;
            return ServeOutcome::Close;
        }

        match self.stream_body(&mut req).await {
            WriteOutcome::Ok => {}
            WriteOutcome::Aborted => return ServeOutcome::Aborted,
            WriteOutcome::Err => return ServeOutcome::Error,
        }

        if req.keep_alive {
            self.parser.reset();
            ServeOutcome::KeepAlive
        } else {
            ServeOutcome::Close
        }
    }

    async fn read_request(&mut self, req: &mut Request) -> ReadRequestOutcome {
        loop {
            if let Some(pos) = find_header_end(&self.pending) {
                let (outcome, _consumed) = self.parser.parse(req, &self.pending[..pos]);
                // The header block is exactly `pos` bytes; drop it so any
                // pipelined bytes after it survive for the next request.
                self.pending.drain(..pos);
                return match outcome {
                    ParseOutcome::Done => ReadRequestOutcome::Parsed,
                    ParseOutcome::Bad => ReadRequestOutcome::Bad,
                    ParseOutcome::NeedMore => ReadRequestOutcome::Bad,
                };
            }

            let mut chunk = [0u8; 4096];
            tokio::select! {
                _ = self.abort.cancelled() => return ReadRequestOutcome::Aborted,
                res = self.socket.read(&mut chunk) => {
                    match res {
                        Ok(0) => return ReadRequestOutcome::Eof,
                        Ok(n) => self.pending.extend_from_slice(&chunk[..n]),
                        Err(e) => return ReadRequestOutcome::Error(e),
                    }
                }
            }
        }
    }

    async fn write_headers(&mut self, reply: &Reply) -> WriteOutcome {
        let header_block = reply.to_buffers();
        self.write_all_abortable(header_block.as_bytes()).await
    }

    async fn write_stock_and_close(&mut self, status: StatusCode) {
        let reply = Reply::stock_reply(status);
        let mut out = reply.to_buffers();
        out.push_str(&reply.content);
        let _ = self.write_all_abortable(out.as_bytes()).await;
    }

    /// The body-streaming loop: read from the producer in bursts of up to
    /// [`IO_BUFFER_SIZE`], write each burst to the socket, retry with a
    /// 1-second delay on backpressure (`ReadOutcome::Produced(0)`).
    async fn stream_body(&mut self, req: &mut Request) -> WriteOutcome {
        while req.offset < req.body_size {
            let remaining = (req.body_size - req.offset) as usize;
            let want = remaining.min(IO_BUFFER_SIZE);

            let outcome = self.producer.read(req.video_index, req.offset as u64, &mut self.buf[..want]);
            match outcome {
                ReadOutcome::Produced(0) => {
                    trace!(offset = req.offset, "producer not ready, retrying");
                    tokio::select! {
                        _ = self.abort.cancelled() => return WriteOutcome::Aborted,
                        _ = tokio::time::sleep(PRODUCER_RETRY_DELAY) => {}
                    }
                    continue;
                }
                ReadOutcome::Produced(n) => {
                    req.offset += n as i64;
                    match self.write_buf_abortable(n).await {
                        WriteOutcome::Ok => continue,
                        other => return other,
                    }
                }
                ReadOutcome::Error => {
                    warn!(offset = req.offset, "producer read failed, dropping connection");
                    return WriteOutcome::Err;
                }
            }
        }
        WriteOutcome::Ok
    }

    async fn write_buf_abortable(&mut self, n: usize) -> WriteOutcome {
        tokio::select! {
            _ = self.abort.cancelled() => WriteOutcome::Aborted,
            res = self.socket.write_all(&self.buf[..n]) => match res {
                Ok(()) => WriteOutcome::Ok,
                Err(e) => {
                    debug!(error = %e, "error writing body to socket");
                    WriteOutcome::Err
                }
            },
        }
    }

    async fn write_all_abortable(&mut self, bytes: &[u8]) -> WriteOutcome {
        tokio::select! {
            _ = self.abort.cancelled() => WriteOutcome::Aborted,
            res = self.socket.write_all(bytes) => match res {
                Ok(()) => WriteOutcome::Ok,
                Err(e) => {
                    debug!(error = %e, "error writing to socket");
                    WriteOutcome::Err
                }
            },
        }
    }
}

/// Find the index one-past `\r\n\r\n` in `buf`, if present.
fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

enum ReadRequestOutcome {
    Parsed,
    Bad,
    Eof,
    Aborted,
    Error(std::io::Error),
}

enum ServeOutcome {
    KeepAlive,
    Close,
    Aborted,
    Error,
}

#[derive(Debug, PartialEq, Eq)]
enum WriteOutcome {
    Ok,
    Aborted,
    Err,
}
