//! # Answer codec
//!
//! All RRs (resource records) share the same top level format (RFC 1035 §4.1.3):
//! owner name, TYPE, CLASS, TTL, RDLENGTH and RDATA.
use crate::dns::errors::{DnsError, Section};
use crate::dns::header::{CLASS_IN, RecordType};
use crate::dns::name;
use crate::dns::question::QuestionSection;
use std::net::Ipv4Addr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// TTL given to synthesized answers.
pub const PLACEHOLDER_TTL: u32 = 60;

/// Width of TYPE + CLASS + TTL + RDLENGTH.
const FIXED_LEN: usize = 10;

/// Represents a single answer record in a DNS message.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AnswerSection {
    /// The domain name that owns this record.
    pub owner_name: String,
    /// The type of DNS record (e.g., A, AAAA, CNAME).
    pub record_type: u16,
    /// The class of the DNS record (usually IN).
    pub class: u16,
    /// Time-to-live of the record in seconds.
    pub ttl: u32,
    /// Length of the RDATA field.
    pub rd_length: u16,
    /// The actual resource data (e.g., IP address for A record).
    pub r_data: Vec<u8>,
}

#[allow(clippy::wrong_self_convention)]
impl AnswerSection {
    /// The answer synthesized for `question` before it is resolved:
    /// an `A`/`IN` record with a 60 second TTL and no data.
    pub fn placeholder(question: &QuestionSection) -> Self {
        AnswerSection {
            owner_name: question.name.clone(),
            record_type: RecordType::A as u16,
            class: CLASS_IN,
            ttl: PLACEHOLDER_TTL,
            rd_length: 0,
            r_data: Vec::new(),
        }
    }

    /// Stores `addr` as the record data.
    pub fn set_ipv4(&mut self, addr: Ipv4Addr) {
        self.r_data = addr.octets().to_vec();
        self.rd_length = 4;
    }

    /// The record data as an IPv4 address, if this is an `A` record holding one.
    pub fn ipv4(&self) -> Option<Ipv4Addr> {
        if self.record_type != RecordType::A as u16 {
            return None;
        }
        let octets: [u8; 4] = self.r_data.as_slice().try_into().ok()?;
        Some(Ipv4Addr::from(octets))
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DnsError> {
        let mut bytes = name::encode(&self.owner_name).map_err(|e| e.in_section(Section::Answer))?;
        bytes.extend_from_slice(&self.record_type.to_be_bytes());
        bytes.extend_from_slice(&self.class.to_be_bytes());
        bytes.extend_from_slice(&self.ttl.to_be_bytes());
        bytes.extend_from_slice(&self.rd_length.to_be_bytes());
        bytes.extend_from_slice(&self.r_data);
        Ok(bytes)
    }

    /// Decodes one answer at absolute `offset` of `packet`.
    ///
    /// The owner name may be compressed, so `packet` must be the full message.
    /// Returns the record and the number of bytes it occupied at `offset`.
    pub fn from_bytes(packet: &[u8], offset: usize) -> Result<(Self, usize), DnsError> {
        let (owner_name, name_len) =
            name::decode_compressed(packet, offset).map_err(|e| e.in_section(Section::Answer))?;
        let mut pos = offset + name_len;

        let fixed = packet.get(pos..pos + FIXED_LEN).ok_or_else(|| {
            DnsError::truncated(
                Section::Answer,
                "TYPE/CLASS/TTL/RDLENGTH",
                FIXED_LEN,
                packet.len().saturating_sub(pos),
            )
        })?;
        let record_type = u16::from_be_bytes([fixed[0], fixed[1]]);
        let class = u16::from_be_bytes([fixed[2], fixed[3]]);
        let ttl = u32::from_be_bytes([fixed[4], fixed[5], fixed[6], fixed[7]]);
        let rd_length = u16::from_be_bytes([fixed[8], fixed[9]]);
        pos += FIXED_LEN;

        let r_data = packet
            .get(pos..pos + rd_length as usize)
            .ok_or_else(|| {
                DnsError::truncated(
                    Section::Answer,
                    "RDATA",
                    rd_length as usize,
                    packet.len().saturating_sub(pos),
                )
            })?
            .to_vec();
        pos += rd_length as usize;

        let answer = AnswerSection {
            owner_name,
            record_type,
            class,
            ttl,
            rd_length,
            r_data,
        };
        Ok((answer, pos - offset))
    }
}
