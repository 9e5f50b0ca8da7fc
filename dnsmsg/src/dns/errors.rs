//! # DNS codec errors
//!
//! Every failure raised while parsing or serializing a [`DnsMessage`](crate::dns::DnsMessage)
//! is reported through a single [`DnsError`] value. Besides the error kind it records
//! *where* the problem happened: the message section, the record index inside that
//! section (when it applies), the property being read or written, and a human readable
//! reason.
//!
//! ```rust
//! use dnsmsg::dns::{DnsMessage, DnsErrorKind, Section};
//!
//! let err = DnsMessage::parse(&[0u8; 4]).unwrap_err();
//! assert_eq!(err.kind, DnsErrorKind::HeaderTooShort);
//! assert_eq!(err.section, Section::Header);
//! ```
use std::fmt::Display;
use thiserror::Error;

/// The message section an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Header,
    Question,
    Answer,
}

impl Display for Section {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Section::Header => write!(f, "HEADER"),
            Section::Question => write!(f, "QUESTION"),
            Section::Answer => write!(f, "ANSWER"),
        }
    }
}

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DnsErrorKind {
    /// The packet is not longer than the 12-byte header.
    HeaderTooShort,
    /// `qd_count` disagrees with the number of questions.
    QuestionCountMismatch,
    /// `an_count` disagrees with the number of answers.
    AnswerCountMismatch,
    /// Missing terminator, oversized label, or a bad compression pointer.
    MalformedName,
    /// Fewer bytes remain than the record's fixed fields require.
    TruncatedRecord,
}

impl Display for DnsErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DnsErrorKind::HeaderTooShort => "header too short",
            DnsErrorKind::QuestionCountMismatch => "question count mismatch",
            DnsErrorKind::AnswerCountMismatch => "answer count mismatch",
            DnsErrorKind::MalformedName => "malformed name",
            DnsErrorKind::TruncatedRecord => "truncated record",
        };
        write!(f, "{}", s)
    }
}

/// A structured parse/serialize error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} in section {section}{}, property `{property}`: {reason}", fmt_index(.index))]
pub struct DnsError {
    pub kind: DnsErrorKind,
    pub section: Section,
    /// Index of the offending record, `None` when the error is not tied to one.
    pub index: Option<usize>,
    pub property: &'static str,
    pub reason: String,
}

fn fmt_index(index: &Option<usize>) -> String {
    match index {
        Some(i) => format!(" at index {}", i),
        None => String::new(),
    }
}

impl DnsError {
    pub(crate) fn new(
        kind: DnsErrorKind,
        section: Section,
        property: &'static str,
        reason: impl Into<String>,
    ) -> Self {
        DnsError {
            kind,
            section,
            index: None,
            property,
            reason: reason.into(),
        }
    }

    /// Attaches the record index, keeping an index that was already set.
    pub(crate) fn at(mut self, index: usize) -> Self {
        self.index.get_or_insert(index);
        self
    }

    /// Re-labels an error raised by a shared helper (e.g. the name codec)
    /// with the section that was being decoded.
    pub(crate) fn in_section(mut self, section: Section) -> Self {
        self.section = section;
        self
    }

    pub(crate) fn malformed_name(reason: impl Into<String>) -> Self {
        DnsError::new(DnsErrorKind::MalformedName, Section::Question, "NAME", reason)
    }

    pub(crate) fn truncated(
        section: Section,
        property: &'static str,
        needed: usize,
        left: usize,
    ) -> Self {
        DnsError::new(
            DnsErrorKind::TruncatedRecord,
            section,
            property,
            format!("needs {} bytes but only {} remain", needed, left),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_with_index() {
        let err = DnsError::truncated(Section::Answer, "RDATA", 4, 1).at(2);
        assert_eq!(
            err.to_string(),
            "truncated record in section ANSWER at index 2, property `RDATA`: needs 4 bytes but only 1 remain"
        );
    }

    #[test]
    fn test_display_without_index() {
        let err = DnsError::new(
            DnsErrorKind::QuestionCountMismatch,
            Section::Question,
            "QDCOUNT",
            "expected 2, found 1",
        );
        assert_eq!(
            err.to_string(),
            "question count mismatch in section QUESTION, property `QDCOUNT`: expected 2, found 1"
        );
    }

    #[test]
    fn test_at_keeps_first_index() {
        let err = DnsError::malformed_name("loop").at(1).at(5);
        assert_eq!(err.index, Some(1));
    }

    #[test]
    fn test_in_section_relabels() {
        let err = DnsError::malformed_name("bad").in_section(Section::Answer);
        assert_eq!(err.section, Section::Answer);
        assert_eq!(err.kind, DnsErrorKind::MalformedName);
    }
}
