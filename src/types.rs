use core::num::NonZeroUsize;

mod message;
mod name;
mod query;
mod question;
mod record;
mod record_data;
mod record_type;

pub use message::{Header, Message};
pub use query::{Query, compose};
pub use question::Question;
pub use record::Record;
pub use record_data::{Hinfo, RecordData, Srv, Txt};
pub use record_type::{DNSClass, RecordType, UnknownRecordTypeStr};

pub(crate) const MESSAGE_HEADER_SIZE: usize = 12;
const QDCOUNT_OFFSET: usize = 4;
const U16_SIZE: usize = 2;
const U32_SIZE: usize = 4;
const RECORD_HEADER_ENCODED_WITHOUT_NAME_SIZE: usize = 10; // ty(2) + class(2) + ttl(4) + rdlen(2)

/// Upper bound of a fully qualified domain name in text form.
const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;
const MAX_QUESTIONS: usize = 255;
const MAX_POINTER_HOPS: usize = 16;

const COMPRESSION_POINTER_MASK: u8 = 0xC0;
const COMPRESSION_OFFSET_MASK: u16 = 0x3FFF;
/// Top bit of a class field: cache-flush in records, unicast-response in questions.
const CLASS_TOP_BIT: u16 = 1 << 15;

/// Returned when an outbound query cannot be encoded.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EncodeError {
  /// A query needs at least one name.
  #[error("at least one name is required")]
  NoNames,
  /// More names than fit into the question count.
  #[error("too many names: {0}, at most 255 are allowed")]
  TooManyNames(usize),
  /// A name contains an empty label.
  #[error("name {0:?} contains an empty label")]
  EmptyLabel(smol_str::SmolStr),
  /// A label is longer than 63 bytes once encoded as UTF-8.
  #[error("label {label:?} is {len} bytes long, at most 63 are allowed")]
  LabelTooLong {
    /// The offending label.
    label: smol_str::SmolStr,
    /// The UTF-8 byte length of the label.
    len: usize,
  },
  /// A name is longer than 253 bytes once encoded as UTF-8.
  #[error("name is {0} bytes long, at most 253 are allowed")]
  NameTooLong(usize),
  /// The query type is not in the known type table.
  #[error(transparent)]
  UnknownRecordType(#[from] UnknownRecordTypeStr),
}

/// Returned when an inbound packet is not a well-formed message.
///
/// The discovery engine never surfaces this error: malformed packets are dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
  /// Tried to read past the end of the packet or of a record's data.
  #[error("not enough data: tried to read {tried_to_read} bytes, {available} available")]
  NotEnoughData {
    /// How many bytes the decoder wanted.
    tried_to_read: NonZeroUsize,
    /// How many bytes were left.
    available: usize,
  },
  /// A label length byte in the reserved `0x40..=0xBF` range.
  #[error("invalid label length {0:#04x}")]
  InvalidLabelLength(u8),
  /// A compression pointer that does not point strictly backwards.
  #[error("compression pointer at {position} targets {target}")]
  InvalidPointer {
    /// Offset of the pointer itself.
    position: usize,
    /// Offset the pointer targets.
    target: usize,
  },
  /// A name followed more compression pointers than allowed.
  #[error("too many compression pointers")]
  TooManyPointers,
  /// A decompressed name exceeds 253 bytes.
  #[error("name exceeds 253 bytes")]
  NameTooLong,
  /// Record data whose length does not match its type.
  #[error("invalid {ty} rdata of {len} bytes")]
  InvalidRdata {
    /// The record type.
    ty: RecordType,
    /// The rdata length.
    len: usize,
  },
  /// All section counts are zero.
  #[error("message carries no records")]
  Empty,
}

#[inline]
const fn not_enough_data(tried_to_read: usize, available: usize) -> DecodeError {
  DecodeError::NotEnoughData {
    tried_to_read: match NonZeroUsize::new(tried_to_read) {
      Some(n) => n,
      None => NonZeroUsize::MIN,
    },
    available,
  }
}

#[inline]
fn read_u16(src: &[u8], off: usize) -> Result<u16, DecodeError> {
  match src.get(off..off + U16_SIZE) {
    Some(b) => Ok(u16::from_be_bytes([b[0], b[1]])),
    None => Err(not_enough_data(U16_SIZE, src.len().saturating_sub(off))),
  }
}

#[inline]
fn read_u32(src: &[u8], off: usize) -> Result<u32, DecodeError> {
  match src.get(off..off + U32_SIZE) {
    Some(b) => Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]])),
    None => Err(not_enough_data(U32_SIZE, src.len().saturating_sub(off))),
  }
}

/// Decodes a packet, returning `None` for anything that is not a complete,
/// well-formed message.
///
/// ## Example
///
/// ```rust
/// use mdns_discover::parse;
///
/// assert!(parse(&[0; 11]).is_none());
/// ```
pub fn parse(src: &[u8]) -> Option<Message> {
  match Message::decode(src) {
    Ok(msg) => Some(msg),
    Err(e) => {
      tracing::trace!(err=%e, len=src.len(), "mdns discovery: dropping malformed packet");
      None
    }
  }
}
