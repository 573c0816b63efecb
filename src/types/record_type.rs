use core::fmt;
use std::str::FromStr;

use smol_str::SmolStr;

const AVALUE: u16 = 1;
const NSVALUE: u16 = 2;
const CNAMEVALUE: u16 = 5;
const SOAVALUE: u16 = 6;
const PTRVALUE: u16 = 12;
const HINFOVALUE: u16 = 13;
const MXVALUE: u16 = 15;
const TXTVALUE: u16 = 16;
const AAAAVALUE: u16 = 28;
const SRVVALUE: u16 = 33;
const NSECVALUE: u16 = 47;
const ANYVALUE: u16 = 255;

const INVALUE: u16 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Hash, thiserror::Error)]
#[error("unknown record type string: {0}")]
/// Returned when a query type symbol is not in the type table.
pub struct UnknownRecordTypeStr(pub SmolStr);

/// The DNS record types known to the codec.
///
/// Codes outside the table are kept as [`RecordType::Unknown`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum RecordType {
  /// [RFC 1035](https://tools.ietf.org/html/rfc1035) IPv4 Address record
  A,
  /// [RFC 1035](https://tools.ietf.org/html/rfc1035) Name server record
  NS,
  /// [RFC 1035](https://tools.ietf.org/html/rfc1035) Canonical name record
  CNAME,
  /// [RFC 1035](https://tools.ietf.org/html/rfc1035) Start of authority record
  SOA,
  /// [RFC 1035](https://tools.ietf.org/html/rfc1035) Pointer record
  PTR,
  /// [RFC 1035](https://tools.ietf.org/html/rfc1035) Host information record
  HINFO,
  /// [RFC 1035](https://tools.ietf.org/html/rfc1035) Mail exchange record
  MX,
  /// [RFC 1035](https://tools.ietf.org/html/rfc1035) Text record
  TXT,
  /// [RFC 3596](https://tools.ietf.org/html/rfc3596) IPv6 address record
  AAAA,
  /// [RFC 2782](https://tools.ietf.org/html/rfc2782) Service locator
  SRV,
  /// [RFC 4034](https://tools.ietf.org/html/rfc4034) Next secure record
  NSEC,
  /// [RFC 1035](https://tools.ietf.org/html/rfc1035) All cached records, aka ANY
  ANY,
  /// A code the codec does not know.
  Unknown(u16),
}

impl RecordType {
  /// Returns the symbolic name of the record type, or `None` for unknown codes.
  #[inline]
  pub const fn as_str(&self) -> Option<&'static str> {
    Some(match self {
      Self::A => "A",
      Self::NS => "NS",
      Self::CNAME => "CNAME",
      Self::SOA => "SOA",
      Self::PTR => "PTR",
      Self::HINFO => "HINFO",
      Self::MX => "MX",
      Self::TXT => "TXT",
      Self::AAAA => "AAAA",
      Self::SRV => "SRV",
      Self::NSEC => "NSEC",
      Self::ANY => "ANY",
      Self::Unknown(_) => return None,
    })
  }
}

impl fmt::Display for RecordType {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self.as_str() {
      Some(s) => f.write_str(s),
      None => write!(f, "0x{:04X}", u16::from(*self)),
    }
  }
}

impl From<RecordType> for u16 {
  #[inline]
  fn from(value: RecordType) -> u16 {
    match value {
      RecordType::A => AVALUE,
      RecordType::NS => NSVALUE,
      RecordType::CNAME => CNAMEVALUE,
      RecordType::SOA => SOAVALUE,
      RecordType::PTR => PTRVALUE,
      RecordType::HINFO => HINFOVALUE,
      RecordType::MX => MXVALUE,
      RecordType::TXT => TXTVALUE,
      RecordType::AAAA => AAAAVALUE,
      RecordType::SRV => SRVVALUE,
      RecordType::NSEC => NSECVALUE,
      RecordType::ANY => ANYVALUE,
      RecordType::Unknown(v) => v,
    }
  }
}

impl From<u16> for RecordType {
  #[inline]
  fn from(value: u16) -> Self {
    match value {
      AVALUE => Self::A,
      NSVALUE => Self::NS,
      CNAMEVALUE => Self::CNAME,
      SOAVALUE => Self::SOA,
      PTRVALUE => Self::PTR,
      HINFOVALUE => Self::HINFO,
      MXVALUE => Self::MX,
      TXTVALUE => Self::TXT,
      AAAAVALUE => Self::AAAA,
      SRVVALUE => Self::SRV,
      NSECVALUE => Self::NSEC,
      ANYVALUE => Self::ANY,
      v => Self::Unknown(v),
    }
  }
}

impl TryFrom<&str> for RecordType {
  type Error = UnknownRecordTypeStr;

  #[inline]
  fn try_from(value: &str) -> Result<Self, Self::Error> {
    Ok(match value.trim() {
      "A" | "a" => RecordType::A,
      "NS" | "ns" => RecordType::NS,
      "CNAME" | "cname" => RecordType::CNAME,
      "SOA" | "soa" => RecordType::SOA,
      "PTR" | "ptr" => RecordType::PTR,
      "HINFO" | "hinfo" => RecordType::HINFO,
      "MX" | "mx" => RecordType::MX,
      "TXT" | "txt" => RecordType::TXT,
      "AAAA" | "aaaa" => RecordType::AAAA,
      "SRV" | "srv" => RecordType::SRV,
      "NSEC" | "nsec" => RecordType::NSEC,
      "ANY" | "any" | "*" => RecordType::ANY,
      _ => return Err(UnknownRecordTypeStr(value.into())),
    })
  }
}

impl FromStr for RecordType {
  type Err = UnknownRecordTypeStr;

  #[inline]
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    RecordType::try_from(s)
  }
}

/// The DNS class of a question or record, without the mDNS top bit.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum DNSClass {
  /// Internet
  IN,
  /// Any class
  ANY,
  /// A class the codec does not know.
  Unknown(u16),
}

impl From<u16> for DNSClass {
  #[inline]
  fn from(value: u16) -> Self {
    match value {
      INVALUE => Self::IN,
      ANYVALUE => Self::ANY,
      v => Self::Unknown(v),
    }
  }
}

impl From<DNSClass> for u16 {
  #[inline]
  fn from(value: DNSClass) -> u16 {
    match value {
      DNSClass::IN => INVALUE,
      DNSClass::ANY => ANYVALUE,
      DNSClass::Unknown(v) => v,
    }
  }
}

impl fmt::Display for DNSClass {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::IN => f.write_str("IN"),
      Self::ANY => f.write_str("ANY"),
      Self::Unknown(v) => write!(f, "0x{v:04X}"),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn symbols() {
    assert_eq!("*".parse::<RecordType>().unwrap(), RecordType::ANY);
    assert_eq!("srv".parse::<RecordType>().unwrap(), RecordType::SRV);
    assert!("BOGUS".parse::<RecordType>().is_err());
  }

  #[test]
  fn unknown_code_displays_as_hex() {
    assert_eq!(RecordType::from(0x0029).to_string(), "0x0029");
    assert_eq!(RecordType::from(33).to_string(), "SRV");
    assert_eq!(u16::from(RecordType::Unknown(99)), 99);
  }
}
