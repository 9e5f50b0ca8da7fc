#![cfg_attr(docsrs, feature(doc_cfg))]
//! # dnsmsg
//!
//! A DNS message codec written in pure Rust: parse a raw UDP payload into a header,
//! questions and answers, fill in the answers, and serialize the result back to wire
//! bytes.
//!
//! ## Features
//!
//! - **Header codec** - Bit-packed flags decoded with proper masks, all four counts.
//! - **Name codec** - Length-prefixed labels and RFC 1035 compression pointers, resolved
//!   against the full packet with absolute offsets.
//! - **Question and answer codecs** - Explicit per-record length bookkeeping.
//! - **Pairwise transform** - A cursor-holding walk over (question, answer) pairs used to
//!   fill placeholder answers in place.
//! - **Structured errors** - Every failure names its section, record index and property.
//! - **Upstream client** (`tokio-dep`) - Async A lookups against an upstream resolver.
//!
//! ## Quick Start
//!
//! ```toml
//! [dependencies]
//! dnsmsg = { version = "0.1" }
//! dnsmsg = { version = "0.1", features = ["tokio-dep"] }
//! ```
//!
//! ## Usage Example
//!
//! ```rust
//! use dnsmsg::dns::{DnsMessage, QuestionSection, RecordType};
//! use std::net::Ipv4Addr;
//!
//! // A query for codecrafters.io, type A, class IN
//! let mut packet = vec![0x12, 0x34, 0x01, 0x00, 0, 1, 0, 0, 0, 0, 0, 0];
//! packet.extend(QuestionSection::new("codecrafters.io", RecordType::A).to_bytes().unwrap());
//!
//! let mut msg = DnsMessage::parse(&packet).unwrap();
//! assert_eq!(msg.questions[0].name, "codecrafters.io");
//! assert_eq!(msg.answers[0].ttl, 60);
//!
//! let mut walk = msg.transform(|q, a| {
//!     let mut a = a.clone();
//!     a.set_ipv4(Ipv4Addr::new(8, 8, 8, 8));
//!     (q.clone(), a)
//! });
//! while walk.advance() {}
//!
//! msg.mark_as_response();
//! let reply = msg.serialize().unwrap();
//! assert_eq!(&reply[reply.len() - 4..], &[8, 8, 8, 8]);
//! ```
//!
//! ## Error Handling
//!
//! All operations return `Result<T, DnsError>`:
//!
//! ```rust
//! use dnsmsg::dns::{DnsMessage, DnsErrorKind};
//!
//! match DnsMessage::parse(&[0u8; 12]) {
//!     Err(e) if e.kind == DnsErrorKind::HeaderTooShort => eprintln!("{}", e),
//!     other => panic!("{:?}", other),
//! }
//! ```
//!
//! ## License
//!
//! This project is licensed under the MIT License.

pub mod dns;
