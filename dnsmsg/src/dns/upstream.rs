//! # Upstream resolver (`tokio-dep`)
//!
//! Asks an upstream resolver for the IPv4 address of a name over UDP. The query is built
//! with [`DnsMessage::new_query`], sent with a timeout, and the reply is decoded with the
//! same codec used for inbound packets.
//!
//! ```rust,no_run
//! # async fn run() -> Result<(), dnsmsg::dns::UpstreamError> {
//! use dnsmsg::dns::{Upstream, UdpUpstream};
//! use std::time::Duration;
//!
//! let upstream = UdpUpstream::new("8.8.8.8:53".parse().unwrap(), Duration::from_secs(5));
//! let addr = upstream.resolve_ipv4("example.com").await?;
//! println!("{:?}", addr);
//! # Ok(())
//! # }
//! ```
use crate::dns::errors::DnsError;
use crate::dns::header::{OpCodeOptions, RecordType};
use crate::dns::message::DnsMessage;
use async_trait::async_trait;
use std::net::{Ipv4Addr, SocketAddr};
use std::time::Duration;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::time::error::Elapsed;
use tokio::time::timeout;
use tracing::{debug, warn};

/// Largest UDP DNS payload read back from the upstream.
const MAX_UDP_PAYLOAD: usize = 512;

/// Represents errors that may occur when querying the upstream resolver.
#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream socket error: {0}")]
    SocketIo(#[from] std::io::Error),
    #[error("upstream did not answer in time: {0}")]
    Elapsed(#[from] Elapsed),
    #[error("the upstream response ID didn't match the query sent. Id: {0}")]
    IdResponseInvalid(u16),
    #[error("could not decode the upstream response: {0}")]
    Decode(#[from] DnsError),
}

/// Something that can turn a name into an IPv4 address.
#[async_trait]
pub trait Upstream: Send + Sync {
    /// Returns the first IPv4 address found for `name`, or `None` when the upstream
    /// answered without one.
    async fn resolve_ipv4(&self, name: &str) -> Result<Option<Ipv4Addr>, UpstreamError>;
}

/// An [`Upstream`] reached over plain UDP.
#[derive(Debug, Clone)]
pub struct UdpUpstream {
    server: SocketAddr,
    timeout: Duration,
}

impl UdpUpstream {
    pub fn new(server: SocketAddr, timeout: Duration) -> Self {
        UdpUpstream { server, timeout }
    }

    pub fn server(&self) -> SocketAddr {
        self.server
    }

    async fn send_query(&self, query: &DnsMessage) -> Result<DnsMessage, UpstreamError> {
        let bind: SocketAddr = if self.server.is_ipv4() {
            (Ipv4Addr::UNSPECIFIED, 0).into()
        } else {
            (std::net::Ipv6Addr::UNSPECIFIED, 0).into()
        };
        let socket = UdpSocket::bind(bind).await?;

        let bytes = query.serialize()?;
        timeout(self.timeout, socket.send_to(&bytes, self.server)).await??;

        let mut buf = [0u8; MAX_UDP_PAYLOAD];
        let (len, _src) = timeout(self.timeout, socket.recv_from(&mut buf)).await??;

        let response = DnsMessage::parse(&buf[..len])?;
        if response.header.id != query.header.id {
            return Err(UpstreamError::IdResponseInvalid(query.header.id));
        }
        Ok(response)
    }
}

#[async_trait]
impl Upstream for UdpUpstream {
    async fn resolve_ipv4(&self, name: &str) -> Result<Option<Ipv4Addr>, UpstreamError> {
        let query = DnsMessage::new_query(name, RecordType::A, OpCodeOptions::StandardQuery);
        let response = self.send_query(&query).await?;

        // A reply without answers still parses with placeholders; those hold no address.
        let addr = response.answers.iter().find_map(|a| a.ipv4());
        match addr {
            Some(ip) => debug!(name, %ip, upstream = %self.server, "resolved"),
            None => warn!(name, upstream = %self.server, "upstream returned no A record"),
        }
        Ok(addr)
    }
}
