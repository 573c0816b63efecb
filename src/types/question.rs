use smol_str::SmolStr;

use super::{CLASS_TOP_BIT, DNSClass, DecodeError, RecordType, U16_SIZE, name, read_u16};

/// An entry of the question section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
  name: SmolStr,
  ty: RecordType,
  class: DNSClass,
  unicast_response: bool,
}

impl Question {
  /// Returns the queried name.
  #[inline]
  pub fn name(&self) -> &SmolStr {
    &self.name
  }

  /// Returns the queried type.
  #[inline]
  pub const fn ty(&self) -> RecordType {
    self.ty
  }

  /// Returns the queried class.
  #[inline]
  pub const fn class(&self) -> DNSClass {
    self.class
  }

  /// Returns `true` if the sender prefers a unicast response.
  ///
  /// RFC 6762, section 18.12. Repurposing of Top Bit of qclass in Question Section
  #[inline]
  pub const fn unicast_response(&self) -> bool {
    self.unicast_response
  }

  pub(super) fn decode(src: &[u8], off: usize) -> Result<(Self, usize), DecodeError> {
    let (name, off) = name::decode(src, off)?;
    let ty = RecordType::from(read_u16(src, off)?);
    let class = read_u16(src, off + U16_SIZE)?;
    Ok((
      Self {
        name,
        ty,
        class: DNSClass::from(class & !CLASS_TOP_BIT),
        unicast_response: class & CLASS_TOP_BIT != 0,
      },
      off + 2 * U16_SIZE,
    ))
  }
}
