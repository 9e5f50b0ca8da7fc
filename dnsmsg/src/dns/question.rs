//! # Question codec
//!
//! A question record is a name followed by two 16-bit fields, QTYPE and QCLASS.
//! Records are decoded back to back with explicit length bookkeeping: the name codec
//! reports how many bytes the name used, and the record always takes exactly 4 more.
use crate::dns::errors::{DnsError, Section};
use crate::dns::header::{CLASS_IN, RecordType};
use crate::dns::name;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Width of QTYPE + QCLASS.
const FIXED_LEN: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct QuestionSection {
    /// The domain name being queried.
    pub name: String,
    /// The type of DNS record being requested (e.g., A, AAAA, MX).
    pub record_type: u16,
    /// The class of the DNS record (usually IN for Internet, or CH for Chaos).
    pub class: u16,
}

#[allow(clippy::wrong_self_convention)]
impl QuestionSection {
    /// An `IN` class question for `name`.
    pub fn new(name: impl Into<String>, record_type: RecordType) -> Self {
        QuestionSection {
            name: name.into(),
            record_type: record_type as u16,
            class: CLASS_IN,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, DnsError> {
        let mut bytes = name::encode(&self.name)?;
        bytes.extend_from_slice(&self.record_type.to_be_bytes());
        bytes.extend_from_slice(&self.class.to_be_bytes());
        Ok(bytes)
    }

    /// Decodes one pointer-free question at `offset`, returning it with the number of
    /// bytes it occupied.
    pub fn from_bytes(buffer: &[u8], offset: usize) -> Result<(Self, usize), DnsError> {
        let (name, name_len) = name::decode(buffer, offset)?;
        let pos = offset + name_len;

        let fixed = buffer.get(pos..pos + FIXED_LEN).ok_or_else(|| {
            DnsError::truncated(
                Section::Question,
                "QTYPE/QCLASS",
                FIXED_LEN,
                buffer.len().saturating_sub(pos),
            )
        })?;

        let question = QuestionSection {
            name,
            record_type: u16::from_be_bytes([fixed[0], fixed[1]]),
            class: u16::from_be_bytes([fixed[2], fixed[3]]),
        };
        Ok((question, name_len + FIXED_LEN))
    }

    /// Decodes `count` consecutive questions from the start of a flattened question
    /// section. Returns the questions and the total number of bytes used.
    pub fn decode_all(buffer: &[u8], count: u16) -> Result<(Vec<Self>, usize), DnsError> {
        let mut questions = Vec::with_capacity(count as usize);
        let mut pos = 0;

        for index in 0..count as usize {
            let (question, used) = QuestionSection::from_bytes(buffer, pos)
                .map_err(|e| e.in_section(Section::Question).at(index))?;
            pos += used;
            questions.push(question);
        }

        Ok((questions, pos))
    }
}
