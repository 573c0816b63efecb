use smol_str::SmolStr;

use super::{
  CLASS_TOP_BIT, DNSClass, DecodeError, RECORD_HEADER_ENCODED_WITHOUT_NAME_SIZE, RecordData,
  RecordType, U16_SIZE, U32_SIZE, name, not_enough_data, read_u16, read_u32,
};

/// A resource record of the answer, authority or additional section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
  name: SmolStr,
  ty: RecordType,
  class: DNSClass,
  cache_flush: bool,
  ttl: u32,
  data: RecordData,
}

impl Record {
  /// Returns the owner name of the record.
  #[inline]
  pub fn name(&self) -> &SmolStr {
    &self.name
  }

  /// Returns the type of the record.
  #[inline]
  pub const fn ty(&self) -> RecordType {
    self.ty
  }

  /// Returns the class of the record, without the cache-flush bit.
  #[inline]
  pub const fn class(&self) -> DNSClass {
    self.class
  }

  /// Returns `true` if the cache-flush bit is set.
  ///
  /// RFC 6762, section 10.2. Announcements to Flush Outdated Cache Entries
  #[inline]
  pub const fn cache_flush(&self) -> bool {
    self.cache_flush
  }

  /// Returns the time-to-live of the record, in seconds.
  #[inline]
  pub const fn ttl(&self) -> u32 {
    self.ttl
  }

  /// Returns the data of the record.
  #[inline]
  pub const fn data(&self) -> &RecordData {
    &self.data
  }

  pub(super) fn decode(src: &[u8], off: usize) -> Result<(Self, usize), DecodeError> {
    let (name, mut off) = name::decode(src, off)?;
    let len = src.len();
    if len < off + RECORD_HEADER_ENCODED_WITHOUT_NAME_SIZE {
      return Err(not_enough_data(
        RECORD_HEADER_ENCODED_WITHOUT_NAME_SIZE,
        len.saturating_sub(off),
      ));
    }

    let ty = RecordType::from(read_u16(src, off)?);
    off += U16_SIZE;
    let class = read_u16(src, off)?;
    off += U16_SIZE;
    let ttl = read_u32(src, off)?;
    off += U32_SIZE;
    let rdlen = read_u16(src, off)? as usize;
    off += U16_SIZE;

    let end = off + rdlen;
    if end > len {
      return Err(not_enough_data(rdlen, len - off));
    }

    let data = RecordData::decode(ty, src, off, end)?;
    Ok((
      Self {
        name,
        ty,
        class: DNSClass::from(class & !CLASS_TOP_BIT),
        cache_flush: class & CLASS_TOP_BIT != 0,
        ttl,
        data,
      },
      end,
    ))
  }
}
