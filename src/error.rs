use std::io;
use std::net::IpAddr;

use pnet_packet::icmp::IcmpType;
use thiserror::Error;
use trust_dns_resolver::error::ResolveError;

pub type Result<T> = std::result::Result<T, PingError>;

#[derive(Error, Debug)]
pub enum PingError {
    #[error("buffer size was too small")]
    IncorrectBufferSize,
    #[error("invalid packet: {0}")]
    InvalidPacket(#[from] InvalidPacketError),
    #[error("io error: {0}")]
    IOError(#[from] io::Error),
    #[error("expected echoreply, got {0:?}")]
    NotEchoReply(IcmpType),
    #[error("Request timeout for icmp_seq {0}")]
    Timeout(u16),
    #[error("failed to resolve {host}: {source}")]
    Resolve {
        host: String,
        #[source]
        source: ResolveError,
    },
    #[error("no ipv4 address for {0}")]
    NoAddress(String),
    #[error("unsupported address {0}, only ipv4 is supported")]
    UnsupportedAddress(IpAddr),
    #[error("failed to open icmp socket to {addr}: {source}")]
    Connect {
        addr: IpAddr,
        #[source]
        source: io::Error,
    },
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl PingError {
    /// Errors that end the run before probing starts.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PingError::Resolve { .. }
                | PingError::NoAddress(_)
                | PingError::UnsupportedAddress(_)
                | PingError::Connect { .. }
                | PingError::InvalidConfig(_)
        )
    }
}

#[derive(Error, Debug)]
pub enum InvalidPacketError {
    #[error("expected an Ipv4Packet")]
    NotIpv4Packet,
    #[error("expected an IcmpPacket payload")]
    NotIcmpPacket,
    #[error("payload too short, got {got}, want {want}")]
    PayloadTooShort { got: usize, want: usize },
    #[error("bad icmp checksum {0:#06x}")]
    BadChecksum(u16),
}
