//! # Header codec
//!
//! The fixed 12-byte header of every DNS message (RFC 1035 §4.1.1):
//!
//! ```text
//!                                 1  1  1  1  1  1
//!   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                      ID                       |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |QR|   Opcode  |AA|TC|RD|RA|   Z    |   RCODE   |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! |                    QDCOUNT                    |
//! |                    ANCOUNT                    |
//! |                    NSCOUNT                    |
//! |                    ARCOUNT                    |
//! +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! ```
//!
//! Also home to the small enums naming the TYPE, OPCODE and RCODE values used by this crate.
use crate::dns::errors::{DnsError, DnsErrorKind, Section};
use crate::dns::name::HEADER_LEN;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Represents the header section of a DNS message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HeaderSection {
    /// Identifier to match requests and responses.
    pub id: u16,
    /// Flags and control bits for the DNS message.
    pub flags: DnsHeaderFlags,
    /// Number of entries in the question section.
    pub qd_count: u16,
    /// Number of resource records in the answer section.
    pub an_count: u16,
    /// Number of name server records in the authority section.
    pub ns_count: u16,
    /// Number of resource records in the additional section.
    pub ar_count: u16,
}

#[allow(clippy::wrong_self_convention)]
impl HeaderSection {
    /// Converts the header into a 12-byte array suitable for network transmission.
    pub fn to_bytes(&self) -> [u8; 12] {
        let mut bytes = [0u8; 12];
        bytes[0..2].copy_from_slice(&self.id.to_be_bytes());
        bytes[2..4].copy_from_slice(&self.flags.to_bytes());
        bytes[4..6].copy_from_slice(&self.qd_count.to_be_bytes());
        bytes[6..8].copy_from_slice(&self.an_count.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.ns_count.to_be_bytes());
        bytes[10..12].copy_from_slice(&self.ar_count.to_be_bytes());
        bytes
    }

    /// Reads a header from the first 12 bytes of `bytes`.
    ///
    /// # Errors
    /// [`DnsErrorKind::HeaderTooShort`] when fewer than 12 bytes are available.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DnsError> {
        if bytes.len() < HEADER_LEN {
            return Err(DnsError::new(
                DnsErrorKind::HeaderTooShort,
                Section::Header,
                "HEADER",
                format!("header needs {} bytes, got {}", HEADER_LEN, bytes.len()),
            ));
        }

        let word = |i: usize| u16::from_be_bytes([bytes[i], bytes[i + 1]]);

        Ok(HeaderSection {
            id: word(0),
            flags: DnsHeaderFlags::from_bytes([bytes[2], bytes[3]]),
            qd_count: word(4),
            an_count: word(6),
            ns_count: word(8),
            ar_count: word(10),
        })
    }
}

/// Represents the 16-bit DNS flags field (RFC 1035 §4.1.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DnsHeaderFlags {
    /// Query/Response flag
    pub qr: bool,
    /// Operation code
    /// Use `OpCodeOptions`
    pub opcode: u8,
    /// Authoritative Answer
    pub aa: bool,
    /// Truncation flag
    pub tc: bool,
    /// Recursion Desired
    pub rd: bool,
    /// Recursion Available
    pub ra: bool,
    /// Reserved bits (RFC 1035)
    pub z: u8,
    /// Response code
    /// Use `ResponseCode`
    pub rcode: u8,
}

const QR_MASK: u8 = 0b1000_0000;
const OPCODE_MASK: u8 = 0b0111_1000;
const AA_MASK: u8 = 0b0000_0100;
const TC_MASK: u8 = 0b0000_0010;
const RD_MASK: u8 = 0b0000_0001;
const RA_MASK: u8 = 0b1000_0000;
const Z_MASK: u8 = 0b0111_0000;
const RCODE_MASK: u8 = 0b0000_1111;

impl DnsHeaderFlags {
    /// Encode the flags into their two wire bytes.
    pub fn to_bytes(self) -> [u8; 2] {
        let mut first = (self.opcode << 3) & OPCODE_MASK;
        if self.qr {
            first |= QR_MASK;
        }
        if self.aa {
            first |= AA_MASK;
        }
        if self.tc {
            first |= TC_MASK;
        }
        if self.rd {
            first |= RD_MASK;
        }

        let mut second = ((self.z << 4) & Z_MASK) | (self.rcode & RCODE_MASK);
        if self.ra {
            second |= RA_MASK;
        }
        [first, second]
    }

    /// Decode the two wire bytes into structured flags.
    pub fn from_bytes([first, second]: [u8; 2]) -> Self {
        Self {
            qr: first & QR_MASK != 0,
            opcode: (first & OPCODE_MASK) >> 3,
            aa: first & AA_MASK != 0,
            tc: first & TC_MASK != 0,
            rd: first & RD_MASK != 0,
            ra: second & RA_MASK != 0,
            z: (second & Z_MASK) >> 4,
            rcode: second & RCODE_MASK,
        }
    }

    /// Encode the flags into a 16-bit integer.
    pub fn to_u16(self) -> u16 {
        u16::from_be_bytes(self.to_bytes())
    }

    /// Decode from a 16-bit integer into structured flags.
    pub fn from_u16(value: u16) -> Self {
        Self::from_bytes(value.to_be_bytes())
    }

    /// Flags for the reply to a query carrying `query` flags.
    ///
    /// Only standard queries are served; any other opcode is answered with
    /// [`ResponseCode::NotImplemented`].
    pub fn response_to(query: DnsHeaderFlags) -> Self {
        let rcode = if query.opcode == OpCodeOptions::StandardQuery as u8 {
            ResponseCode::NoError
        } else {
            ResponseCode::NotImplemented
        };

        Self {
            qr: true,
            opcode: query.opcode,
            aa: false,
            tc: false,
            rd: query.rd,
            ra: false,
            z: 0,
            rcode: rcode as u8,
        }
    }
}

// 3-15 reserved for future use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpCodeOptions {
    StandardQuery = 0,
    InverseQuery = 1,
    ServerStatusRequest = 2,
}

/// RCODE values from RFC 1035 §4.1.1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseCode {
    NoError = 0,
    FormatError = 1,
    ServerFailure = 2,
    NameError = 3,
    NotImplemented = 4,
    Refused = 5,
}

/// TYPE fields are used in resource records. Note that these types are a subset of QTYPEs.
///
/// Answers produced by this crate are always `A` records; the other values are only
/// named so that queries for them can be recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    // A host address
    A = 1,
    // An authoritative name server
    Ns = 2,
    // The Canonical name for an alias
    Cname = 5,
    // Marks the start of a zone of authority
    Soa = 6,
    // A domain name pointer
    Ptr = 12,
    // Mail exchange
    Mx = 15,
    // Text strings
    Txt = 16,
    Aaaa = 28,
}

#[allow(clippy::wrong_self_convention)]
impl RecordType {
    /// Encode the record type as a 2-byte big-endian value.
    pub fn to_bytes(self) -> [u8; 2] {
        (self as u16).to_be_bytes()
    }
}

/// CLASS value for the Internet.
pub const CLASS_IN: u16 = 1;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_type_to_bytes() {
        assert_eq!(RecordType::A.to_bytes(), [0x00, 0x01]);
        assert_eq!(RecordType::Txt.to_bytes(), [0x00, 0x10]);
    }

    #[test]
    fn test_dns_header_flags_encode_decode() {
        let flags = DnsHeaderFlags {
            qr: true,
            opcode: OpCodeOptions::ServerStatusRequest as u8,
            aa: true,
            tc: false,
            rd: true,
            ra: false,
            z: 3,
            rcode: 5,
        };

        assert_eq!(DnsHeaderFlags::from_bytes(flags.to_bytes()), flags);
        assert_eq!(DnsHeaderFlags::from_u16(flags.to_u16()), flags);
    }

    #[test]
    fn test_flags_bit_layout() {
        // 0x0100: only RD set
        let flags = DnsHeaderFlags::from_u16(0x0100);
        assert!(flags.rd);
        assert!(!flags.qr && !flags.aa && !flags.tc && !flags.ra);
        assert_eq!(flags.opcode, 0);

        // 0x8180: QR, RD, RA
        let flags = DnsHeaderFlags::from_u16(0x8180);
        assert!(flags.qr && flags.rd && flags.ra);
        assert_eq!(flags.to_u16(), 0x8180);
    }

    #[test]
    fn test_flags_set_alongside_neighbours() {
        // Every flag bit set at once; each must still read as set.
        let flags = DnsHeaderFlags::from_bytes([0xFF, 0xFF]);
        assert!(flags.qr);
        assert!(flags.aa);
        assert!(flags.tc);
        assert!(flags.rd);
        assert!(flags.ra);
        assert_eq!(flags.opcode, 0b1111);
        assert_eq!(flags.z, 0b111);
        assert_eq!(flags.rcode, 0b1111);

        // AA and TC are not the lowest bit, so `(byte & mask) == 1` would miss them.
        let flags = DnsHeaderFlags::from_bytes([AA_MASK | TC_MASK, 0]);
        assert!(flags.aa);
        assert!(flags.tc);
        assert!(!flags.rd);

        let flags = DnsHeaderFlags::from_bytes([0, RA_MASK | 0x03]);
        assert!(flags.ra);
        assert_eq!(flags.rcode, 3);
    }

    #[test]
    fn test_flags_out_of_range_fields_are_masked() {
        let flags = DnsHeaderFlags {
            opcode: 0xFF,
            z: 0xFF,
            rcode: 0xFF,
            ..Default::default()
        };
        assert_eq!(flags.to_bytes(), [OPCODE_MASK, Z_MASK | RCODE_MASK]);
    }

    #[test]
    fn test_response_to_standard_query() {
        let query = DnsHeaderFlags::from_u16(0x0100);
        let reply = DnsHeaderFlags::response_to(query);
        assert!(reply.qr);
        assert!(reply.rd);
        assert_eq!(reply.opcode, 0);
        assert_eq!(reply.rcode, ResponseCode::NoError as u8);
    }

    #[test]
    fn test_response_to_non_standard_opcode() {
        let query = DnsHeaderFlags {
            opcode: OpCodeOptions::InverseQuery as u8,
            ..Default::default()
        };
        let reply = DnsHeaderFlags::response_to(query);
        assert_eq!(reply.opcode, 1);
        assert_eq!(reply.rcode, ResponseCode::NotImplemented as u8);
    }

    #[test]
    fn test_header_round_trip() {
        let header = HeaderSection {
            id: 0x1234,
            flags: DnsHeaderFlags::from_u16(0x0100),
            qd_count: 1,
            an_count: 2,
            ns_count: 3,
            ar_count: 4,
        };
        let bytes = header.to_bytes();
        assert_eq!(bytes, [0x12, 0x34, 0x01, 0x00, 0, 1, 0, 2, 0, 3, 0, 4]);
        assert_eq!(HeaderSection::from_bytes(&bytes).unwrap(), header);
    }

    #[test]
    fn test_header_too_short() {
        let err = HeaderSection::from_bytes(&[0u8; 11]).unwrap_err();
        assert_eq!(err.kind, DnsErrorKind::HeaderTooShort);
        assert_eq!(err.section, Section::Header);
    }
}
