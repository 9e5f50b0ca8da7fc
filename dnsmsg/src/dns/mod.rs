//! # DNS message codec
//!
//! Parsing and serialization of DNS messages as they travel over UDP.
//!
//! ## Modules
//!
//! - `name` — length-prefixed labels and compression pointers.
//! - `header` — the 12-byte header and its bit-packed flags.
//! - `question` / `answer` — the record codecs.
//! - `message` — [`DnsMessage`], the aggregate tying them together, and the pairwise
//!   transform used to fill in answers.
//! - `errors` — [`DnsError`], reported by every fallible operation above.
//! - `upstream` — an async UDP client for an upstream resolver (`tokio-dep` feature).
//!
//! ## Features
//!
//! | Feature     | Description                                                   |
//! |-------------|---------------------------------------------------------------|
//! | *(none)*    | Codec only, no I/O and no async runtime.                      |
//! | `tokio-dep` | Adds [`Upstream`] / [`UdpUpstream`] built on [Tokio](https://tokio.rs). |
//! | `serde`     | Derives `Serialize`/`Deserialize` for the message types.      |

pub mod answer;
pub mod errors;
pub mod header;
pub mod message;
pub mod name;
pub mod question;

pub use self::answer::AnswerSection;
pub use self::errors::{DnsError, DnsErrorKind, Section};
pub use self::header::{DnsHeaderFlags, HeaderSection, OpCodeOptions, RecordType, ResponseCode};
pub use self::message::{DnsMessage, PairTransform};
pub use self::question::QuestionSection;

cfg_if::cfg_if! {
    if #[cfg(feature = "tokio-dep")] {
        #[cfg_attr(docsrs, doc(cfg(feature = "tokio-dep")))]
        pub mod upstream;
        pub use self::upstream::{Upstream, UdpUpstream, UpstreamError};
    }
}
