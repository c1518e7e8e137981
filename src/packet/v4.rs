use pnet_packet::icmp::echo_reply::EchoReplyPacket;
use pnet_packet::icmp::echo_request::MutableEchoRequestPacket;
use pnet_packet::icmp::{IcmpCode, IcmpPacket, IcmpTypes};
use pnet_packet::ipv4::Ipv4Packet;
use pnet_packet::Packet;

use super::{EchoReply, EchoRequest, ICMP_HEADER_LEN, IPV4_HEADER_LEN};
use crate::checksum;
use crate::error::{InvalidPacketError, PingError, Result};

pub(super) fn encode(p: &EchoRequest) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; ICMP_HEADER_LEN + p.size];
    let mut packet =
        MutableEchoRequestPacket::new(&mut buf[..]).ok_or(PingError::IncorrectBufferSize)?;
    packet.set_icmp_type(IcmpTypes::EchoRequest);
    packet.set_icmp_code(IcmpCode::new(0));
    packet.set_identifier(p.ident);
    packet.set_sequence_number(p.seq);

    // checksum field is still zero here
    let sum = checksum::checksum(packet.packet());
    packet.set_checksum(sum);

    Ok(buf)
}

pub(super) fn decode(buf: &[u8]) -> Result<EchoReply> {
    let ipv4_packet =
        Ipv4Packet::new(buf).ok_or_else(|| PingError::from(InvalidPacketError::NotIpv4Packet))?;
    if ipv4_packet.get_version() != 4 {
        return Err(InvalidPacketError::NotIpv4Packet.into());
    }

    let header_len = (usize::from(ipv4_packet.get_header_length()) * 4).max(IPV4_HEADER_LEN);
    let icmp = buf.get(header_len..).unwrap_or_default();
    if icmp.len() < ICMP_HEADER_LEN {
        return Err(InvalidPacketError::PayloadTooShort {
            got: icmp.len(),
            want: ICMP_HEADER_LEN,
        }
        .into());
    }

    let icmp_packet =
        IcmpPacket::new(icmp).ok_or_else(|| PingError::from(InvalidPacketError::NotIcmpPacket))?;
    let typ = icmp_packet.get_icmp_type();
    if typ != IcmpTypes::EchoReply {
        return Err(PingError::NotEchoReply(typ));
    }
    if !checksum::verify(icmp) {
        return Err(InvalidPacketError::BadChecksum(icmp_packet.get_checksum()).into());
    }

    let echo_reply_packet =
        EchoReplyPacket::new(icmp).ok_or_else(|| PingError::from(InvalidPacketError::NotIcmpPacket))?;
    Ok(EchoReply {
        ttl: ipv4_packet.get_ttl(),
        source: ipv4_packet.get_source(),
        seq: echo_reply_packet.get_sequence_number(),
        ident: echo_reply_packet.get_identifier(),
        size: icmp.len(),
    })
}
