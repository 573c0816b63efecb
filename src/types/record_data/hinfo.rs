use core::fmt;

use smol_str::SmolStr;

use super::{DecodeError, character_string};

/// The data of an HINFO record.
#[derive(Debug, Default, Clone, PartialEq, Eq, Hash)]
pub struct Hinfo {
  cpu: Option<SmolStr>,
  os: Option<SmolStr>,
}

impl Hinfo {
  /// Creates a new HINFO record data.
  #[inline]
  pub const fn new(cpu: Option<SmolStr>, os: Option<SmolStr>) -> Self {
    Self { cpu, os }
  }

  /// Returns the CPU type, if the record carries one.
  #[inline]
  pub fn cpu(&self) -> Option<&SmolStr> {
    self.cpu.as_ref()
  }

  /// Returns the operating system, if the record carries one.
  #[inline]
  pub fn os(&self) -> Option<&SmolStr> {
    self.os.as_ref()
  }

  pub(super) fn decode(data: &[u8]) -> Result<Self, DecodeError> {
    let mut off = 0;
    let mut next = || -> Result<Option<SmolStr>, DecodeError> {
      if off >= data.len() {
        return Ok(None);
      }

      let (s, next) = character_string(data, off)?;
      off = next;
      Ok(Some(SmolStr::from(String::from_utf8_lossy(s))))
    };

    let cpu = next()?;
    let os = next()?;
    Ok(Self { cpu, os })
  }
}

impl fmt::Display for Hinfo {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {}",
      self.cpu.as_deref().unwrap_or_default(),
      self.os.as_deref().unwrap_or_default()
    )
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn both_strings() {
    let data = [3, b'A', b'R', b'M', 5, b'L', b'i', b'n', b'u', b'x'];
    let hinfo = Hinfo::decode(&data).unwrap();
    assert_eq!(hinfo.cpu().map(|s| s.as_str()), Some("ARM"));
    assert_eq!(hinfo.os().map(|s| s.as_str()), Some("Linux"));
  }

  #[test]
  fn missing_os() {
    let hinfo = Hinfo::decode(&[3, b'x', b'8', b'6']).unwrap();
    assert!(hinfo.os().is_none());
    assert!(Hinfo::decode(&[]).unwrap().cpu().is_none());
  }

  #[test]
  fn overrun() {
    assert!(Hinfo::decode(&[4, b'x']).is_err());
  }
}
