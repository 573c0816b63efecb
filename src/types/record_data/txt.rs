use core::fmt;
use std::collections::BTreeMap;

use smol_str::SmolStr;
use triomphe::Arc;

use super::{DecodeError, character_string};

/// The data of a TXT record, split into DNS-SD `key=value` pairs.
///
/// Values are available both as (lossily decoded) strings and as the raw
/// bytes found on the wire. Only the first occurrence of a key is kept, see
/// [RFC 6763 section 6.4](https://datatracker.ietf.org/doc/html/rfc6763#section-6.4).
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Txt {
  values: BTreeMap<SmolStr, SmolStr>,
  raw: BTreeMap<SmolStr, Arc<[u8]>>,
}

impl Txt {
  /// Returns the value of `key`.
  ///
  /// A bare key (a string without `=`) has an empty value.
  #[inline]
  pub fn get(&self, key: &str) -> Option<&SmolStr> {
    self.values.get(key)
  }

  /// Returns the raw bytes of the value of `key`.
  #[inline]
  pub fn get_raw(&self, key: &str) -> Option<&[u8]> {
    self.raw.get(key).map(|v| &v[..])
  }

  /// Returns `true` if the record has no keys.
  #[inline]
  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }

  /// Returns the number of keys.
  #[inline]
  pub fn len(&self) -> usize {
    self.values.len()
  }

  /// Iterates over the key/value pairs, ordered by key.
  #[inline]
  pub fn iter(&self) -> impl Iterator<Item = (&SmolStr, &SmolStr)> {
    self.values.iter()
  }

  /// Iterates over the key/raw value pairs, ordered by key.
  #[inline]
  pub fn iter_raw(&self) -> impl Iterator<Item = (&SmolStr, &[u8])> {
    self.raw.iter().map(|(k, v)| (k, &v[..]))
  }

  /// Returns the value of the first of `keys` present, comparing keys ASCII
  /// case-insensitively.
  pub fn find_any(&self, keys: &[&str]) -> Option<&SmolStr> {
    keys.iter().find_map(|want| {
      self
        .values
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(want))
        .map(|(_, v)| v)
    })
  }

  pub(super) fn decode(data: &[u8]) -> Result<Self, DecodeError> {
    let mut txt = Self::default();
    let mut off = 0;
    while off < data.len() {
      let (s, next) = character_string(data, off)?;
      off = next;
      if s.is_empty() {
        continue;
      }

      let (key, value) = match s.iter().position(|&b| b == b'=') {
        Some(idx) => (&s[..idx], &s[idx + 1..]),
        None => (s, &[][..]),
      };

      let key = SmolStr::from(String::from_utf8_lossy(key));
      if txt.values.contains_key(&key) {
        continue;
      }

      txt
        .values
        .insert(key.clone(), SmolStr::from(String::from_utf8_lossy(value)));
      txt.raw.insert(key, Arc::from_iter(value.iter().copied()));
    }
    Ok(txt)
  }
}

impl fmt::Display for Txt {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (idx, (k, v)) in self.values.iter().enumerate() {
      if idx != 0 {
        f.write_str(" ")?;
      }
      write!(f, "{k}={v}")?;
    }
    Ok(())
  }
}
