use smol_str::SmolStr;

use super::{
  DNSClass, EncodeError, MAX_QUESTIONS, MESSAGE_HEADER_SIZE, QDCOUNT_OFFSET, RecordType, name,
};

/// An outbound query: one question per name, all of the same type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
  names: Vec<SmolStr>,
  ty: RecordType,
}

impl Query {
  /// Creates a query for `names`.
  ///
  /// `ty` is a symbol of the type table (`"A"`, `"PTR"`, `"*"`, ...) and
  /// defaults to `ANY`. Fails on an empty name list, on more than 255 names
  /// and on unknown type symbols.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::{Query, RecordType};
  ///
  /// let q = Query::new(["_http._tcp.local"], Some("PTR")).unwrap();
  /// assert_eq!(q.ty(), RecordType::PTR);
  /// assert!(Query::new(["_http._tcp.local"], Some("BOGUS")).is_err());
  /// ```
  pub fn new<I, S>(names: I, ty: Option<&str>) -> Result<Self, EncodeError>
  where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
  {
    let names: Vec<SmolStr> = names.into_iter().map(|n| SmolStr::new(n.as_ref())).collect();
    if names.is_empty() {
      return Err(EncodeError::NoNames);
    }

    if names.len() > MAX_QUESTIONS {
      return Err(EncodeError::TooManyNames(names.len()));
    }

    let ty = match ty {
      Some(ty) => RecordType::try_from(ty)?,
      None => RecordType::ANY,
    };

    Ok(Self { names, ty })
  }

  /// Returns the queried names.
  #[inline]
  pub fn names(&self) -> &[SmolStr] {
    &self.names
  }

  /// Returns the queried type.
  #[inline]
  pub const fn ty(&self) -> RecordType {
    self.ty
  }

  /// Encodes the query into a DNS message wire format.
  ///
  /// Names are always written as literal labels, outbound queries never use
  /// compression.
  pub fn encode(&self) -> Result<Vec<u8>, EncodeError> {
    let mut buf = Vec::with_capacity(
      MESSAGE_HEADER_SIZE
        + self
          .names
          .iter()
          .map(|n| n.len() + 2 + 4)
          .sum::<usize>(),
    );

    // id, flags and all other counts stay zero: a standard query
    let mut header = [0u8; MESSAGE_HEADER_SIZE];
    header[QDCOUNT_OFFSET..QDCOUNT_OFFSET + 2]
      .copy_from_slice(&(self.names.len() as u16).to_be_bytes());
    buf.extend_from_slice(&header);

    for n in &self.names {
      name::encode(n, &mut buf)?;
      buf.extend_from_slice(&u16::from(self.ty).to_be_bytes());
      // no unicast-response bit on outbound queries
      buf.extend_from_slice(&u16::from(DNSClass::IN).to_be_bytes());
    }

    Ok(buf)
  }
}

/// Builds a query packet for `names`, see [`Query::new`] and [`Query::encode`].
///
/// ## Example
///
/// ```rust
/// use mdns_discover::compose;
///
/// let buf = compose(["café.local"], None).unwrap();
/// // "café" is 5 bytes long in UTF-8
/// assert_eq!(buf[12], 5);
/// ```
pub fn compose<I, S>(names: I, ty: Option<&str>) -> Result<Vec<u8>, EncodeError>
where
  I: IntoIterator<Item = S>,
  S: AsRef<str>,
{
  Query::new(names, ty)?.encode()
}
