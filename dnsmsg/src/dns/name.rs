//! # Name codec
//!
//! Domain names travel on the wire as a sequence of labels, each one prefixed with its
//! length, and terminated by a zero byte (RFC 1035 §3.1):
//!
//! ```text
//! "www.example.com" -> 3 w w w 7 e x a m p l e 3 c o m 0
//! ```
//!
//! To save space a name may also end early with a compression pointer (RFC 1035 §4.1.4):
//!
//! ```text
//!   +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//!   | 1  1|                OFFSET                   |
//!   +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
//! ```
//!
//! The OFFSET is counted from the first byte of the message header. Every function in
//! this module that resolves pointers therefore takes the **full packet** and works with
//! absolute offsets only.
//!
//! - [`encode`] / [`decode`] handle plain, pointer-free names.
//! - [`decode_compressed`] follows pointers while decoding a name in place.
//! - [`decompress`] flattens the whole question section so that it can be decoded with
//!   [`decode`] alone.
use crate::dns::errors::{DnsError, DnsErrorKind, Section};
use tracing::trace;

/// Longest label allowed by RFC 1035.
pub const MAX_LABEL_LEN: usize = 63;
/// Size of the fixed header that precedes the question section.
pub const HEADER_LEN: usize = 12;

const POINTER_MASK: u8 = 0b1100_0000;
const OFFSET_MASK: u16 = 0x3FFF;

/// Encodes a dot-separated name into length-prefixed labels.
///
/// Empty labels are skipped, so `""`, `"."` and a trailing dot are all accepted.
///
/// # Errors
/// [`DnsErrorKind::MalformedName`] when a label is longer than 63 bytes.
pub fn encode(name: &str) -> Result<Vec<u8>, DnsError> {
    let mut out = Vec::with_capacity(name.len() + 2);

    for label in name.split('.').filter(|l| !l.is_empty()) {
        if label.len() > MAX_LABEL_LEN {
            return Err(DnsError::malformed_name(format!(
                "label `{}` is {} bytes long (max {})",
                label,
                label.len(),
                MAX_LABEL_LEN
            )));
        }
        out.push(label.len() as u8);
        out.extend_from_slice(label.as_bytes());
    }
    out.push(0);
    Ok(out)
}

/// Decodes a pointer-free name starting at `offset`.
///
/// Returns the dot-joined name and the number of bytes consumed, terminator included.
pub fn decode(buffer: &[u8], offset: usize) -> Result<(String, usize), DnsError> {
    let mut labels: Vec<String> = Vec::new();
    let mut pos = offset;

    loop {
        let len = *buffer.get(pos).ok_or_else(|| {
            DnsError::malformed_name(format!("missing terminating zero after offset {}", offset))
        })?;

        if len == 0 {
            pos += 1;
            break;
        }
        if len & POINTER_MASK != 0 {
            return Err(DnsError::malformed_name(format!(
                "unexpected compression pointer at offset {}",
                pos
            )));
        }

        let label = label_bytes(buffer, pos)?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        pos += 1 + len as usize;
    }

    Ok((labels.join("."), pos - offset))
}

/// Decodes a name that may contain compression pointers.
///
/// `packet` must be the whole message so pointer offsets resolve correctly. The returned
/// length only counts bytes at the original position: a pointer contributes its 2 bytes
/// and ends the name there.
pub fn decode_compressed(packet: &[u8], offset: usize) -> Result<(String, usize), DnsError> {
    let mut labels: Vec<String> = Vec::new();
    let consumed = walk_compressed(packet, offset, |label| {
        labels.push(String::from_utf8_lossy(label).into_owned());
    })?;

    Ok((labels.join("."), consumed))
}

/// Flattens the question section of `packet`.
///
/// Walks `qd_count` question records starting right after the header, resolves every
/// compression pointer against the full packet and returns the records with plain names,
/// each still followed by its 4 type/class bytes. Label bytes are copied as they are on
/// the wire.
pub fn decompress(packet: &[u8], qd_count: u16) -> Result<Vec<u8>, DnsError> {
    let mut flat = Vec::with_capacity(packet.len().saturating_sub(HEADER_LEN));
    let mut pos = HEADER_LEN;

    for index in 0..qd_count as usize {
        let consumed = walk_compressed(packet, pos, |label| {
            flat.push(label.len() as u8);
            flat.extend_from_slice(label);
        })
        .map_err(|e| e.at(index))?;
        flat.push(0);
        pos += consumed;

        let fixed = packet.get(pos..pos + 4).ok_or_else(|| {
            let left = packet.len().saturating_sub(pos);
            DnsError::truncated(Section::Question, "QTYPE/QCLASS", 4, left).at(index)
        })?;
        flat.extend_from_slice(fixed);
        pos += 4;
    }

    Ok(flat)
}

/// Walks the labels of a possibly compressed name, handing each one to `on_label`.
///
/// Returns the bytes consumed at `offset`.
fn walk_compressed<'p>(
    packet: &'p [u8],
    offset: usize,
    mut on_label: impl FnMut(&'p [u8]),
) -> Result<usize, DnsError> {
    let mut pos = offset;
    let mut consumed: Option<usize> = None;
    // A name without loops reads each packet byte at most once.
    let mut visited = 0usize;

    loop {
        let len = *packet.get(pos).ok_or_else(|| {
            DnsError::malformed_name(format!("missing terminating zero after offset {}", offset))
        })?;

        if len == 0 {
            pos += 1;
            break;
        }

        if len & POINTER_MASK == POINTER_MASK {
            let target = read_pointer(packet, pos)?;
            visited += 2;
            if visited > packet.len() {
                return Err(pointer_loop(pos));
            }
            trace!(from = pos, to = target, "following compression pointer");
            consumed.get_or_insert(pos + 2 - offset);
            pos = target;
            continue;
        }
        if len & POINTER_MASK != 0 {
            return Err(DnsError::malformed_name(format!(
                "reserved label type {:#04x} at offset {}",
                len, pos
            )));
        }

        let label = label_bytes(packet, pos)?;
        visited += 1 + label.len();
        if visited > packet.len() {
            return Err(pointer_loop(pos));
        }
        on_label(label);
        pos += 1 + label.len();
    }

    Ok(consumed.unwrap_or(pos - offset))
}

fn pointer_loop(pos: usize) -> DnsError {
    DnsError::malformed_name(format!("compression pointer loop at offset {}", pos))
}

fn label_bytes(buffer: &[u8], pos: usize) -> Result<&[u8], DnsError> {
    let len = buffer[pos] as usize;
    buffer.get(pos + 1..pos + 1 + len).ok_or_else(|| {
        DnsError::malformed_name(format!(
            "label at offset {} declares {} bytes but the buffer ends first",
            pos, len
        ))
    })
}

fn read_pointer(packet: &[u8], pos: usize) -> Result<usize, DnsError> {
    let low = *packet.get(pos + 1).ok_or_else(|| {
        DnsError::malformed_name(format!("compression pointer at offset {} is cut short", pos))
    })?;
    let target = (u16::from_be_bytes([packet[pos], low]) & OFFSET_MASK) as usize;

    if target >= packet.len() {
        return Err(DnsError::new(
            DnsErrorKind::MalformedName,
            Section::Question,
            "NAME",
            format!(
                "compression pointer at offset {} targets {} beyond packet length {}",
                pos,
                target,
                packet.len()
            ),
        ));
    }
    Ok(target)
}
