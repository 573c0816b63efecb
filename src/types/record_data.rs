use core::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

use smol_str::SmolStr;

use super::{DecodeError, RecordType, name, not_enough_data, read_u16};

mod hinfo;
mod srv;
mod txt;

pub use hinfo::Hinfo;
pub use srv::Srv;
pub use txt::Txt;

const IPV4_LEN: usize = 4;
const IPV6_LEN: usize = 16;

/// The data of a resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
  /// ```text
  /// 3.4.1. A RDATA format
  ///
  ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
  ///     |                    ADDRESS                    |
  ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
  ///
  /// where:
  ///
  /// ADDRESS         A 32 bit Internet address.
  /// ```
  A(Ipv4Addr),
  /// ```text
  /// -- RFC 1886 -- IPv6 DNS Extensions              December 1995
  ///
  /// 2.2 AAAA data format
  ///
  ///    A 128 bit IPv6 address is encoded in the data portion of an AAAA
  ///    resource record in network byte order (high-order byte first).
  /// ```
  AAAA(Ipv6Addr),
  /// ```text
  /// 3.3.12. PTR RDATA format
  ///
  ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
  ///     /                   PTRDNAME                    /
  ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
  /// ```
  PTR(SmolStr),
  /// ```text
  /// 3.3.14. TXT RDATA format
  ///
  ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
  ///     /                   TXT-DATA                    /
  ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
  ///
  /// where:
  ///
  /// TXT-DATA        One or more <character-string>s.
  /// ```
  TXT(Txt),
  /// ```text
  /// RFC 2782                       DNS SRV RR                  February 2000
  ///
  /// The format of the SRV RR
  ///
  ///  _Service._Proto.Name TTL Class SRV Priority Weight Port Target
  /// ```
  SRV(Srv),
  /// ```text
  /// 3.3.2. HINFO RDATA format
  ///
  ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
  ///     /                      CPU                      /
  ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
  ///     /                       OS                      /
  ///     +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
  /// ```
  HINFO(Hinfo),
  /// Data of any other type, as a lowercase hex dump of the raw bytes.
  Unknown(SmolStr),
}

impl RecordData {
  /// Decodes the rdata of a record of type `ty` occupying `src[start..end]`.
  ///
  /// Names inside the rdata may point anywhere before them in `src`.
  pub(super) fn decode(
    ty: RecordType,
    src: &[u8],
    start: usize,
    end: usize,
  ) -> Result<Self, DecodeError> {
    let len = end - start;
    let data = &src[start..end];
    Ok(match ty {
      RecordType::A => {
        let octets: [u8; IPV4_LEN] = data
          .try_into()
          .map_err(|_| DecodeError::InvalidRdata { ty, len })?;
        Self::A(Ipv4Addr::from(octets))
      }
      RecordType::AAAA => {
        let octets: [u8; IPV6_LEN] = data
          .try_into()
          .map_err(|_| DecodeError::InvalidRdata { ty, len })?;
        Self::AAAA(Ipv6Addr::from(octets))
      }
      RecordType::PTR => Self::PTR(decode_name_within(src, start, end)?),
      RecordType::TXT => Self::TXT(Txt::decode(data)?),
      RecordType::SRV => {
        if len < 6 {
          return Err(DecodeError::InvalidRdata { ty, len });
        }

        let src = &src[..end];
        let priority = read_u16(src, start)?;
        let weight = read_u16(src, start + 2)?;
        let port = read_u16(src, start + 4)?;
        let target = decode_name_within(src, start + 6, end)?;
        Self::SRV(Srv::new(priority, weight, port, target))
      }
      RecordType::HINFO => Self::HINFO(Hinfo::decode(data)?),
      _ => Self::Unknown(hex(data)),
    })
  }

  /// Returns the type of the record data, `None` for [`RecordData::Unknown`].
  #[inline]
  pub const fn ty(&self) -> Option<RecordType> {
    Some(match self {
      Self::A(_) => RecordType::A,
      Self::AAAA(_) => RecordType::AAAA,
      Self::PTR(_) => RecordType::PTR,
      Self::TXT(_) => RecordType::TXT,
      Self::SRV(_) => RecordType::SRV,
      Self::HINFO(_) => RecordType::HINFO,
      Self::Unknown(_) => return None,
    })
  }
}

impl fmt::Display for RecordData {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::A(addr) => write!(f, "{addr}"),
      Self::AAAA(addr) => {
        for (idx, seg) in addr.segments().iter().enumerate() {
          if idx != 0 {
            f.write_str(":")?;
          }
          write!(f, "{seg:04x}")?;
        }
        Ok(())
      }
      Self::PTR(name) => f.write_str(name),
      Self::TXT(txt) => write!(f, "{txt}"),
      Self::SRV(srv) => write!(f, "{srv}"),
      Self::HINFO(hinfo) => write!(f, "{hinfo}"),
      Self::Unknown(hex) => f.write_str(hex),
    }
  }
}

/// Reads a name whose labels must not run past `end`. Pointers always target
/// earlier bytes, so cutting the packet at `end` is enough.
fn decode_name_within(src: &[u8], start: usize, end: usize) -> Result<SmolStr, DecodeError> {
  name::decode(&src[..end], start).map(|(name, _)| name)
}

fn hex(data: &[u8]) -> SmolStr {
  const DIGITS: &[u8; 16] = b"0123456789abcdef";
  let mut s = String::with_capacity(data.len() * 2);
  for b in data {
    s.push(DIGITS[(b >> 4) as usize] as char);
    s.push(DIGITS[(b & 0x0F) as usize] as char);
  }
  SmolStr::from(s)
}

/// Reads one `<character-string>` at `off`, returning its bytes and the next offset.
fn character_string(data: &[u8], off: usize) -> Result<(&[u8], usize), DecodeError> {
  let len = data[off] as usize;
  let start = off + 1;
  match data.get(start..start + len) {
    Some(s) => Ok((s, start + len)),
    None => Err(not_enough_data(len, data.len().saturating_sub(start))),
  }
}
