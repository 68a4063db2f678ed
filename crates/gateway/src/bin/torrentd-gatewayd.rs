//! Demo binary wiring [`torrentd_gateway::Server`] to an in-memory
//! [`torrentd_gateway::fixtures::FileProducer`] so the gateway is runnable
//! without a real BitTorrent engine behind it. Styled after the relevant
//! subset of `crates/rqbit/src/main.rs` -- the torrent-specific flags
//! (trackers, DHT, peer limits) have no counterpart here and are not
//! reproduced.

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};
use torrentd_gateway::fixtures::FileProducer;
use torrentd_gateway::Server;
use tracing::info;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl LogLevel {
    fn as_str(self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// A standalone HTTP/1.1 streaming gateway, demoed against an in-memory
/// file table instead of a real torrent download.
#[derive(Parser, Debug)]
#[command(name = "torrentd-gatewayd")]
struct Opts {
    #[arg(long, default_value = "0.0.0.0")]
    bind_addr: String,

    #[arg(long, default_value_t = 8889)]
    port: u16,

    /// Accepted for API compatibility; unused by the core logic.
    #[arg(long, default_value = "")]
    doc_root: String,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Serve this many bytes of generated filler content at video index 0
    /// (`GET /0`), so the server is immediately pokeable with curl/VLC.
    #[arg(long, default_value_t = 10 * 1024 * 1024)]
    demo_file_size: u64,
}

fn main() -> anyhow::Result<()> {
    let opts = Opts::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(opts.log_level.as_str().parse()?)
                .from_env_lossy(),
        )
        .init();

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("error building tokio runtime")?;

    rt.block_on(async_main(opts))
}

async fn async_main(opts: Opts) -> anyhow::Result<()> {
    let producer = Arc::new(FileProducer::new());
    producer.insert(0, vec![0u8; opts.demo_file_size as usize]);

    let server = Server::bind(&opts.bind_addr, opts.port, opts.doc_root, producer)
        .await
        .context("error starting gateway server")?;
    server
        .install_signal_handlers()
        .context("error installing signal handlers")?;

    info!(addr = %server.local_addr(), "gateway listening, GET /0 to fetch the demo file");
    server.run().await.context("gateway server error")?;
    Ok(())
}
