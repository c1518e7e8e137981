use std::net::Ipv4Addr;

use crate::error::Result;

mod v4;

#[cfg(test)]
pub(crate) use v4::tests::{echo_reply_for, ipv4_datagram};

/// ICMP header: type, code, checksum, identifier, sequence.
pub const ICMP_HEADER_LEN: usize = 8;
/// IPv4 header without options.
pub const IPV4_HEADER_LEN: usize = 20;
/// Largest payload that fits a single IPv4 datagram.
pub const MAX_PAYLOAD_LEN: usize = 65535 - IPV4_HEADER_LEN - ICMP_HEADER_LEN;

/// An outgoing echo request. The payload is `size` zero bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoRequest {
    pub ident: u16,
    pub seq: u16,
    pub size: usize,
}

impl EchoRequest {
    pub fn new(ident: u16, seq: u16, size: usize) -> Self {
        Self { ident, seq, size }
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        v4::encode(self)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EchoReply {
    pub ttl: u8,
    pub source: Ipv4Addr,
    pub seq: u16,
    pub ident: u16,
    /// ICMP header plus payload, in bytes.
    pub size: usize,
}

impl EchoReply {
    pub fn answers(&self, request: &EchoRequest) -> bool {
        self.ident == request.ident && self.seq == request.seq
    }
}

pub fn encode_echo_request(ident: u16, seq: u16, size: usize) -> Result<Vec<u8>> {
    EchoRequest::new(ident, seq, size).encode()
}

/// Decode a raw-socket read: IPv4 header followed by an ICMP echo reply.
pub fn decode_echo_reply(buf: &[u8]) -> Result<EchoReply> {
    v4::decode(buf)
}

/// Read buffer length for a reply to a request with `size` payload bytes.
/// Leaves room for up to 20 bytes of IP options.
pub fn reply_buffer_len(size: usize) -> usize {
    IPV4_HEADER_LEN + ICMP_HEADER_LEN + size + 20
}
