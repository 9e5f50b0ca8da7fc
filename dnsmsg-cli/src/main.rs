use anyhow::Context;
use clap::Parser;
use dnsmsg::dns::{DnsMessage, UdpUpstream, Upstream};
use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

/// Largest UDP DNS payload accepted from clients.
const MAX_UDP_PAYLOAD: usize = 512;

#[derive(Parser)]
#[command(name = "dnsmsg-server")]
#[command(version)]
#[command(about = "Forwarding DNS server: answers A queries using an upstream resolver")]
struct Cli {
    /// Upstream resolver address (ip:port)
    #[arg(short = 'r', long, value_name = "ADDR")]
    resolver: SocketAddr,

    /// Address to listen on
    #[arg(short = 'b', long, default_value = "127.0.0.1:2053")]
    bind: SocketAddr,

    /// Upstream timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    /// Log level (trace, debug, info, warn, error); overrides RUST_LOG
    #[arg(long)]
    log_level: Option<String>,
}

fn init_logging(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref());

    let upstream = UdpUpstream::new(cli.resolver, Duration::from_millis(cli.timeout_ms));
    let socket = UdpSocket::bind(cli.bind)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;

    info!(
        bind = %cli.bind,
        upstream = %upstream.server(),
        "dnsmsg-server v{} listening",
        env!("CARGO_PKG_VERSION")
    );

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown requested");
            signal.cancel();
        }
    });

    serve(&socket, &upstream, shutdown).await
}

/// Receives packets until `shutdown` fires, answering each one before reading the next.
async fn serve(
    socket: &UdpSocket,
    upstream: &impl Upstream,
    shutdown: CancellationToken,
) -> anyhow::Result<()> {
    let mut buf = [0u8; MAX_UDP_PAYLOAD];

    loop {
        let (size, source) = tokio::select! {
            _ = shutdown.cancelled() => return Ok(()),
            received = socket.recv_from(&mut buf) => received.context("error receiving data")?,
        };
        debug!(size, %source, "received packet");

        let reply = match answer(&buf[..size], upstream).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(%source, error = %e, "dropping packet");
                continue;
            }
        };

        if let Err(e) = socket.send_to(&reply, source).await {
            error!(%source, error = %e, "failed to send reply");
        }
    }
}

/// Parses one query, resolves its questions upstream and returns the serialized reply.
async fn answer(packet: &[u8], upstream: &impl Upstream) -> anyhow::Result<Vec<u8>> {
    let mut message = DnsMessage::parse(packet)?;

    let mut resolved: HashMap<String, Ipv4Addr> = HashMap::new();
    for question in &message.questions {
        if resolved.contains_key(&question.name) {
            continue;
        }
        match upstream.resolve_ipv4(&question.name).await {
            Ok(Some(ip)) => {
                resolved.insert(question.name.clone(), ip);
            }
            Ok(None) => {}
            Err(e) => warn!(name = %question.name, error = %e, "upstream lookup failed"),
        }
    }

    let filled = message
        .transform(|q, a| {
            let mut a = a.clone();
            if let Some(ip) = resolved.get(&q.name) {
                a.set_ipv4(*ip);
            }
            (q.clone(), a)
        })
        .count();
    debug!(id = message.header.id, filled, "answers filled");

    message.mark_as_response();
    Ok(message.serialize()?)
}
