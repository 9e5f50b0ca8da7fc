//! # DNS message
//!
//! [`DnsMessage`] owns one header plus the question and answer sections of a packet,
//! paired by position: `answer[i]` is the answer to `question[i]`.
//!
//! A message lives for a single request/response cycle:
//!
//! 1. [`DnsMessage::parse`] decodes an inbound packet and synthesizes one placeholder
//!    answer per question.
//! 2. [`DnsMessage::transform`] walks the (question, answer) pairs and replaces them
//!    with values computed by the caller (e.g. resolved addresses).
//! 3. [`DnsMessage::serialize`] produces the outbound packet, checking that the header
//!    counts still match the sections.
//!
//! ```rust
//! use dnsmsg::dns::DnsMessage;
//! use std::net::Ipv4Addr;
//!
//! let packet = [
//!     0x12, 0x34, 0x01, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
//!     0x01, b'a', 0x02, b'i', b'o', 0x00, 0x00, 0x01, 0x00, 0x01,
//! ];
//! let mut msg = DnsMessage::parse(&packet).unwrap();
//!
//! let filled = msg
//!     .transform(|q, a| {
//!         let mut a = a.clone();
//!         a.set_ipv4(Ipv4Addr::new(10, 0, 0, 1));
//!         (q.clone(), a)
//!     })
//!     .count();
//! assert_eq!(filled, 1);
//!
//! let reply = msg.serialize().unwrap();
//! assert_eq!(&reply[reply.len() - 4..], &[10, 0, 0, 1]);
//! ```
use crate::dns::answer::AnswerSection;
use crate::dns::errors::{DnsError, DnsErrorKind, Section};
use crate::dns::header::{DnsHeaderFlags, HeaderSection, OpCodeOptions, RecordType};
use crate::dns::name::{self, HEADER_LEN};
use crate::dns::question::QuestionSection;
use tracing::{debug, trace};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod internal {
    use rand::Rng;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    /// Generates a random 16-bit ID for a DNS query.
    pub fn generate_id() -> u16 {
        let mut thread_rng = rand::rng();
        let mut rng = SmallRng::from_rng(&mut thread_rng);

        rng.random::<u16>()
    }
}

pub use internal::generate_id;

/// A parsed DNS message: header, questions and answers.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DnsMessage {
    pub header: HeaderSection,
    // The questions for the name server
    pub questions: Vec<QuestionSection>,
    // RRs answering the questions, one per question
    pub answers: Vec<AnswerSection>,
}

impl DnsMessage {
    /// Creates a new single-question query with a random id and recursion desired.
    ///
    /// # Arguments
    /// * `target` - The domain name to query.
    /// * `record_type` - Type of record (A, MX, TXT, etc.).
    /// * `query_type` - DNS operation code (Standard, Inverse, or ServerStatus).
    pub fn new_query(
        target: &str,
        record_type: RecordType,
        query_type: OpCodeOptions,
    ) -> DnsMessage {
        DnsMessage {
            header: HeaderSection {
                id: generate_id(),
                flags: DnsHeaderFlags {
                    opcode: query_type as u8,
                    rd: true,
                    ..Default::default()
                },
                qd_count: 1,
                ..Default::default()
            },
            questions: vec![QuestionSection::new(target, record_type)],
            answers: Vec::new(),
        }
    }

    /// Parses a raw packet.
    ///
    /// The question section is flattened against the full packet (so compression
    /// pointers resolve with absolute offsets) and decoded record by record. When the
    /// packet carries answers they are decoded too; otherwise one placeholder answer is
    /// synthesized per question. Bytes after the declared sections are ignored.
    ///
    /// # Errors
    /// - [`DnsErrorKind::HeaderTooShort`] when the packet is 12 bytes or shorter.
    /// - [`DnsErrorKind::MalformedName`] / [`DnsErrorKind::TruncatedRecord`] for broken records.
    pub fn parse(packet: &[u8]) -> Result<DnsMessage, DnsError> {
        if packet.len() <= HEADER_LEN {
            return Err(DnsError::new(
                DnsErrorKind::HeaderTooShort,
                Section::Header,
                "HEADER",
                format!(
                    "message should be longer than {} bytes, but it is {}",
                    HEADER_LEN,
                    packet.len()
                ),
            ));
        }

        let mut header = HeaderSection::from_bytes(&packet[..HEADER_LEN])?;

        let flat = name::decompress(packet, header.qd_count)?;
        let (questions, _) = QuestionSection::decode_all(&flat, header.qd_count)?;

        let answers = if header.an_count > 0 {
            let mut pos = HEADER_LEN + questions_wire_len(packet, header.qd_count)?;
            let mut answers = Vec::with_capacity(header.an_count as usize);
            for index in 0..header.an_count as usize {
                let (answer, used) =
                    AnswerSection::from_bytes(packet, pos).map_err(|e| e.at(index))?;
                pos += used;
                answers.push(answer);
            }
            answers
        } else {
            questions.iter().map(AnswerSection::placeholder).collect()
        };

        header.qd_count = questions.len() as u16;
        header.an_count = answers.len() as u16;

        debug!(
            id = header.id,
            questions = header.qd_count,
            answers = header.an_count,
            "parsed DNS message"
        );

        Ok(DnsMessage {
            header,
            questions,
            answers,
        })
    }

    /// Starts a pairwise transform over the questions and answers.
    ///
    /// Nothing happens until the returned [`PairTransform`] is advanced.
    pub fn transform<F>(&mut self, pair_fn: F) -> PairTransform<'_, F>
    where
        F: Fn(&QuestionSection, &AnswerSection) -> (QuestionSection, AnswerSection),
    {
        PairTransform {
            message: self,
            pair_fn,
            cursor: 0,
        }
    }

    /// Serializes the message into wire bytes.
    ///
    /// # Errors
    /// [`DnsErrorKind::QuestionCountMismatch`] / [`DnsErrorKind::AnswerCountMismatch`] when
    /// the header counts disagree with the sections, or any record encoding error.
    pub fn serialize(&self) -> Result<Vec<u8>, DnsError> {
        if self.header.qd_count as usize != self.questions.len() {
            return Err(DnsError::new(
                DnsErrorKind::QuestionCountMismatch,
                Section::Question,
                "QDCOUNT",
                format!(
                    "QDCOUNT is {} but the message holds {} questions",
                    self.header.qd_count,
                    self.questions.len()
                ),
            ));
        }
        if self.header.an_count as usize != self.answers.len() {
            return Err(DnsError::new(
                DnsErrorKind::AnswerCountMismatch,
                Section::Answer,
                "ANCOUNT",
                format!(
                    "ANCOUNT is {} but the message holds {} answers",
                    self.header.an_count,
                    self.answers.len()
                ),
            ));
        }

        let mut message: Vec<u8> = Vec::with_capacity(512);
        message.extend_from_slice(&self.header.to_bytes());
        for (index, question) in self.questions.iter().enumerate() {
            message.extend_from_slice(&question.to_bytes().map_err(|e| e.at(index))?);
        }
        for (index, answer) in self.answers.iter().enumerate() {
            message.extend_from_slice(&answer.to_bytes().map_err(|e| e.at(index))?);
        }

        trace!(id = self.header.id, len = message.len(), "serialized DNS message");
        Ok(message)
    }

    /// Turns a parsed query into its reply header: response flags derived from the
    /// query flags. Authority and additional records are never carried over, so their
    /// counts are cleared.
    pub fn mark_as_response(&mut self) {
        self.header.flags = DnsHeaderFlags::response_to(self.header.flags);
        self.header.ns_count = 0;
        self.header.ar_count = 0;
    }
}

/// Length of the question section as it sits in `packet`, pointers not expanded.
fn questions_wire_len(packet: &[u8], qd_count: u16) -> Result<usize, DnsError> {
    let mut pos = HEADER_LEN;
    for index in 0..qd_count as usize {
        let (_, used) = name::decode_compressed(packet, pos).map_err(|e| e.at(index))?;
        pos += used + 4;
    }
    Ok(pos - HEADER_LEN)
}

/// A pull-based walk over the (question, answer) pairs of a [`DnsMessage`].
///
/// Each call to [`advance`](PairTransform::advance) feeds the pair under the cursor to the
/// transform function, writes the returned pair back in place and moves the cursor by one.
/// The walk ends at the end of the shorter section. Holding the transform borrows the
/// message mutably, so nothing else can touch it meanwhile.
pub struct PairTransform<'a, F> {
    message: &'a mut DnsMessage,
    pair_fn: F,
    cursor: usize,
}

impl<F> PairTransform<'_, F>
where
    F: Fn(&QuestionSection, &AnswerSection) -> (QuestionSection, AnswerSection),
{
    /// Transforms the next pair. Returns `false` once no pair is left.
    pub fn advance(&mut self) -> bool {
        let i = self.cursor;
        let (Some(question), Some(answer)) =
            (self.message.questions.get(i), self.message.answers.get(i))
        else {
            return false;
        };

        let (question, answer) = (self.pair_fn)(question, answer);
        self.message.questions[i] = question;
        self.message.answers[i] = answer;
        self.cursor += 1;
        true
    }

    /// Index of the next pair to transform.
    pub fn position(&self) -> usize {
        self.cursor
    }
}

/// Yields the index of each transformed pair.
impl<F> Iterator for PairTransform<'_, F>
where
    F: Fn(&QuestionSection, &AnswerSection) -> (QuestionSection, AnswerSection),
{
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        let i = self.cursor;
        self.advance().then_some(i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn header(qd: u16, an: u16) -> Vec<u8> {
        HeaderSection {
            id: 0x1234,
            flags: DnsHeaderFlags::from_u16(0x0100),
            qd_count: qd,
            an_count: an,
            ..Default::default()
        }
        .to_bytes()
        .to_vec()
    }

    fn query(names: &[&str]) -> Vec<u8> {
        let mut packet = header(names.len() as u16, 0);
        for n in names {
            packet.extend_from_slice(&QuestionSection::new(*n, RecordType::A).to_bytes().unwrap());
        }
        packet
    }

    fn fill(
        addr: Ipv4Addr,
    ) -> impl Fn(&QuestionSection, &AnswerSection) -> (QuestionSection, AnswerSection) {
        move |q, a| {
            let mut a = a.clone();
            a.set_ipv4(addr);
            (q.clone(), a)
        }
    }

    #[test]
    fn test_dns_message_new_query() {
        let msg = DnsMessage::new_query("example.com", RecordType::A, OpCodeOptions::StandardQuery);

        assert_eq!(msg.header.qd_count, 1);
        assert_eq!(msg.header.an_count, 0);
        assert!(msg.header.flags.rd);
        assert!(!msg.header.flags.qr);
        assert_eq!(msg.questions[0].name, "example.com");
        assert_eq!(msg.questions[0].record_type, RecordType::A as u16);
        assert_eq!(msg.questions[0].class, 1);
        assert!(msg.answers.is_empty());

        let bytes = msg.serialize().unwrap();
        assert_eq!(u16::from_be_bytes([bytes[0], bytes[1]]), msg.header.id);
    }

    #[test]
    fn test_parse_synthesizes_placeholders() {
        let msg = DnsMessage::parse(&query(&["a.io", "b.io"])).unwrap();

        assert_eq!(msg.header.qd_count, 2);
        assert_eq!(msg.header.an_count, 2);
        assert_eq!(msg.answers[0].owner_name, "a.io");
        assert_eq!(msg.answers[1].owner_name, "b.io");
        assert!(msg.answers.iter().all(|a| a.ttl == 60 && a.r_data.is_empty()));
    }

    #[test]
    fn test_parse_header_too_short() {
        for len in [0usize, 1, 11, 12] {
            let err = DnsMessage::parse(&vec![0u8; len]).unwrap_err();
            assert_eq!(err.kind, DnsErrorKind::HeaderTooShort);
        }
    }

    #[test]
    fn test_parse_thirteen_bytes_without_questions() {
        let mut packet = header(0, 0);
        packet.push(0);
        let msg = DnsMessage::parse(&packet).unwrap();
        assert!(msg.questions.is_empty());
        assert!(msg.answers.is_empty());
    }

    #[test]
    fn test_parse_thirteen_bytes_with_declared_question_is_truncated() {
        let mut packet = header(1, 0);
        packet.push(0);
        let err = DnsMessage::parse(&packet).unwrap_err();
        assert_eq!(err.kind, DnsErrorKind::TruncatedRecord);
        assert_eq!(err.index, Some(0));
    }

    #[test]
    fn test_transform_advances_one_pair_per_call() {
        let mut msg = DnsMessage::parse(&query(&["a.io", "b.io"])).unwrap();
        let mut walk = msg.transform(fill(Ipv4Addr::new(1, 1, 1, 1)));

        assert_eq!(walk.position(), 0);
        assert!(walk.advance());
        assert_eq!(walk.position(), 1);
        assert!(walk.advance());
        assert!(!walk.advance());
        assert!(!walk.advance());
        assert_eq!(walk.position(), 2);

        assert!(msg.answers.iter().all(|a| a.r_data == vec![1, 1, 1, 1]));
    }

    #[test]
    fn test_transform_is_lazy() {
        let mut msg = DnsMessage::parse(&query(&["a.io"])).unwrap();
        let _walk = msg.transform(fill(Ipv4Addr::new(1, 1, 1, 1)));
        drop(_walk);
        assert!(msg.answers[0].r_data.is_empty());
    }

    #[test]
    fn test_transform_stops_at_shorter_section() {
        let mut msg = DnsMessage::parse(&query(&["a.io", "b.io", "c.io"])).unwrap();
        msg.answers.truncate(1);

        let indexes: Vec<usize> = msg.transform(fill(Ipv4Addr::new(2, 2, 2, 2))).collect();
        assert_eq!(indexes, vec![0]);
    }

    #[test]
    fn test_transform_can_rewrite_question() {
        let mut msg = DnsMessage::parse(&query(&["a.io"])).unwrap();
        msg.transform(|q, a| {
            let mut q = q.clone();
            q.name = q.name.to_uppercase();
            (q, a.clone())
        })
        .for_each(drop);
        assert_eq!(msg.questions[0].name, "A.IO");
    }

    #[test]
    fn test_serialize_question_count_mismatch() {
        let mut msg = DnsMessage::parse(&query(&["a.io"])).unwrap();
        msg.header.qd_count = 3;
        let err = msg.serialize().unwrap_err();
        assert_eq!(err.kind, DnsErrorKind::QuestionCountMismatch);
        assert_eq!(err.index, None);
    }

    #[test]
    fn test_serialize_answer_count_mismatch() {
        let mut msg = DnsMessage::parse(&query(&["a.io"])).unwrap();
        msg.answers.clear();
        let err = msg.serialize().unwrap_err();
        assert_eq!(err.kind, DnsErrorKind::AnswerCountMismatch);
        assert_eq!(err.section, Section::Answer);
    }

    #[test]
    fn test_serialize_reports_bad_record_index() {
        let mut msg = DnsMessage::parse(&query(&["a.io", "b.io"])).unwrap();
        msg.questions[1].name = "x".repeat(64);
        let err = msg.serialize().unwrap_err();
        assert_eq!(err.kind, DnsErrorKind::MalformedName);
        assert_eq!(err.index, Some(1));
    }

    #[test]
    fn test_mark_as_response() {
        let mut msg = DnsMessage::parse(&query(&["a.io"])).unwrap();
        msg.mark_as_response();
        assert!(msg.header.flags.qr);
        assert!(msg.header.flags.rd);
        assert_eq!(msg.header.flags.rcode, 0);
        assert_eq!(msg.header.id, 0x1234);
    }

    #[test]
    fn test_parse_root_name_question() {
        let mut packet = header(1, 0);
        packet.extend_from_slice(&[0, 0, 1, 0, 1]);
        let msg = DnsMessage::parse(&packet).unwrap();
        assert_eq!(msg.questions[0].name, "");
        assert_eq!(msg.answers.len(), 1);
    }

    #[test]
    fn test_reply_drops_additional_records() {
        // query with one EDNS OPT record in the additional section
        let mut packet = header(1, 0);
        packet[10..12].copy_from_slice(&1u16.to_be_bytes());
        packet.extend_from_slice(&QuestionSection::new("a.io", RecordType::A).to_bytes().unwrap());
        packet.extend_from_slice(&[0, 0, 41, 0x10, 0, 0, 0, 0, 0, 0, 0]);

        let mut msg = DnsMessage::parse(&packet).unwrap();
        assert_eq!(msg.header.ar_count, 1);

        msg.mark_as_response();
        let reply = msg.serialize().unwrap();

        assert_eq!(&reply[8..12], &[0, 0, 0, 0]);
        let answer_len = msg.answers[0].to_bytes().unwrap().len();
        assert_eq!(reply.len(), HEADER_LEN + 10 + answer_len);
        assert_eq!(DnsMessage::parse(&reply).unwrap().header.ar_count, 0);
    }

    #[test]
    fn test_parse_non_utf8_label() {
        let mut packet = header(1, 0);
        packet.push(30);
        packet.extend_from_slice(&[0xFF; 30]);
        packet.extend_from_slice(&[0, 0, 1, 0, 1]);

        let msg = DnsMessage::parse(&packet).unwrap();
        assert_eq!(msg.questions.len(), 1);
        assert_eq!(msg.questions[0].record_type, RecordType::A as u16);
    }

    #[test]
    fn test_parse_answers_after_compressed_question() {
        let mut packet = header(2, 1);
        let first = QuestionSection::new("example.com", RecordType::A);
        packet.extend_from_slice(&first.to_bytes().unwrap());
        packet.extend_from_slice(&[3, b'w', b'w', b'w', 0xC0, 0x0C, 0, 1, 0, 1]);
        packet.extend_from_slice(&[0xC0, 0x0C, 0, 1, 0, 1, 0, 0, 0, 30, 0, 4, 9, 9, 9, 9]);

        let msg = DnsMessage::parse(&packet).unwrap();
        assert_eq!(msg.questions[1].name, "www.example.com");
        assert_eq!(msg.answers.len(), 1);
        assert_eq!(msg.answers[0].owner_name, "example.com");
        assert_eq!(msg.answers[0].ipv4(), Some(Ipv4Addr::new(9, 9, 9, 9)));
    }
}
