//! ICMP Echo wire format: explicit big-endian packing over fixed-size
//! buffers. Raw `AF_INET` sockets hand back the full IPv4 header on
//! receive, so reply parsing starts 20 bytes in.

use crate::checksum::checksum16;
use std::net::Ipv4Addr;

pub const ICMP_ECHO_REQUEST: u8 = 8;
pub const ICMP_ECHO_REPLY: u8 = 0;

pub const ICMP_HEADER_LEN: usize = 8;
pub const IPV4_HEADER_LEN: usize = 20;

/// Receive buffer size for incoming datagrams.
pub const ICMP_MAX_RECV: usize = 2048;

/// First byte of the payload pattern. Content is irrelevant to matching;
/// only the length matters.
const PAYLOAD_PATTERN_START: u8 = 0x42;

/// One outgoing Echo Request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoRequest {
    pub ident: u16,
    pub seq: u16,
    pub payload_len: usize,
}

impl EchoRequest {
    /// Encodes the 8-byte ICMP header plus payload, checksummed over the
    /// whole packet with the checksum field zeroed.
    pub fn encode(&self) -> Vec<u8> {
        let mut packet = vec![0u8; ICMP_HEADER_LEN + self.payload_len];
        packet[0] = ICMP_ECHO_REQUEST;
        packet[1] = 0;
        packet[4..6].copy_from_slice(&self.ident.to_be_bytes());
        packet[6..8].copy_from_slice(&self.seq.to_be_bytes());
        for (i, byte) in packet[ICMP_HEADER_LEN..].iter_mut().enumerate() {
            *byte = PAYLOAD_PATTERN_START.wrapping_add(i as u8);
        }
        let checksum = checksum16(&packet);
        packet[2..4].copy_from_slice(&checksum.to_be_bytes());
        packet
    }
}

/// An incoming ICMP packet, parsed out of a raw datagram. Despite the name
/// this may hold any ICMP type seen on the shared raw socket; callers check
/// [`EchoReply::is_echo_reply`] and the ident before trusting it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    pub src: Ipv4Addr,
    pub icmp_type: u8,
    pub icmp_code: u8,
    pub ident: u16,
    pub seq: u16,
    pub ttl: u8,
    pub payload_len: usize,
}

impl EchoReply {
    /// Parses the 20-byte IPv4 header and the 8-byte ICMP header. Returns
    /// `None` for datagrams too short to hold both.
    pub fn parse(datagram: &[u8]) -> Option<EchoReply> {
        if datagram.len() < IPV4_HEADER_LEN + ICMP_HEADER_LEN {
            return None;
        }
        let ttl = datagram[8];
        let src = Ipv4Addr::new(datagram[12], datagram[13], datagram[14], datagram[15]);
        let icmp = &datagram[IPV4_HEADER_LEN..];
        Some(EchoReply {
            src,
            icmp_type: icmp[0],
            icmp_code: icmp[1],
            ident: u16::from_be_bytes([icmp[4], icmp[5]]),
            seq: u16::from_be_bytes([icmp[6], icmp[7]]),
            ttl,
            payload_len: datagram.len() - IPV4_HEADER_LEN - ICMP_HEADER_LEN,
        })
    }

    pub fn is_echo_reply(&self) -> bool {
        self.icmp_type == ICMP_ECHO_REPLY
    }
}

/// Probe sequence numbers: 1, 2, ... 99, then back to 1. Zero is reserved
/// and never emitted.
#[derive(Debug)]
pub struct SequenceCounter {
    next: u16,
}

const SEQUENCE_MAX: u16 = 99;

impl SequenceCounter {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn next(&mut self) -> u16 {
        let seq = self.next;
        self.next = if seq >= SEQUENCE_MAX { 1 } else { seq + 1 };
        seq
    }
}

impl Default for SequenceCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_layout() {
        let request = EchoRequest {
            ident: 0x1234,
            seq: 7,
            payload_len: 3,
        };
        let packet = request.encode();
        assert_eq!(packet.len(), 11);
        assert_eq!(packet[0], ICMP_ECHO_REQUEST);
        assert_eq!(packet[1], 0);
        assert_eq!(&packet[4..6], &[0x12, 0x34]);
        assert_eq!(&packet[6..8], &[0x00, 0x07]);
        assert_eq!(&packet[8..], &[0x42, 0x43, 0x44]);
    }

    #[test]
    fn encode_checksum_is_idempotent() {
        let packet = EchoRequest {
            ident: 1,
            seq: 1,
            payload_len: 1,
        }
        .encode();
        let stored = u16::from_be_bytes([packet[2], packet[3]]);
        assert_eq!(stored, 0xb5fd);

        let mut zeroed = packet.clone();
        zeroed[2] = 0;
        zeroed[3] = 0;
        assert_eq!(checksum16(&zeroed), stored);
    }

    #[test]
    fn parse_reply_datagram() {
        let mut datagram = vec![0u8; IPV4_HEADER_LEN];
        datagram[0] = 0x45;
        datagram[8] = 64; // TTL
        datagram[12..16].copy_from_slice(&[127, 0, 0, 1]);
        let mut icmp = vec![0u8; ICMP_HEADER_LEN + 5];
        icmp[0] = ICMP_ECHO_REPLY;
        icmp[4..6].copy_from_slice(&0xbeefu16.to_be_bytes());
        icmp[6..8].copy_from_slice(&42u16.to_be_bytes());
        datagram.extend_from_slice(&icmp);

        let reply = EchoReply::parse(&datagram).expect("parses");
        assert_eq!(reply.src, Ipv4Addr::LOCALHOST);
        assert_eq!(reply.ttl, 64);
        assert_eq!(reply.ident, 0xbeef);
        assert_eq!(reply.seq, 42);
        assert_eq!(reply.payload_len, 5);
        assert!(reply.is_echo_reply());
    }

    #[test]
    fn parse_rejects_short_datagram() {
        assert!(EchoReply::parse(&[0u8; 27]).is_none());
        assert!(EchoReply::parse(&[]).is_none());
    }

    #[test]
    fn sequence_wraps_and_skips_zero() {
        let mut counter = SequenceCounter::new();
        assert_eq!(counter.next(), 1);
        assert_eq!(counter.next(), 2);
        let mut last = 0;
        for _ in 0..97 {
            last = counter.next();
        }
        assert_eq!(last, 99);
        assert_eq!(counter.next(), 1);

        let mut counter = SequenceCounter::new();
        for _ in 0..500 {
            assert_ne!(counter.next(), 0);
        }
    }
}
