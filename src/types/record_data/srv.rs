use core::fmt;

use smol_str::SmolStr;

/// The data of an SRV record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Srv {
  priority: u16,
  weight: u16,
  port: u16,
  target: SmolStr,
}

impl Srv {
  /// Creates a new SRV record data.
  #[inline]
  pub const fn new(priority: u16, weight: u16, port: u16, target: SmolStr) -> Self {
    Self {
      priority,
      weight,
      port,
      target,
    }
  }

  /// ```text
  ///  Priority
  /// The priority of this target host.  A client MUST attempt to
  /// contact the target host with the lowest-numbered priority it can
  /// reach; target hosts with the same priority SHOULD be tried in an
  /// order defined by the weight field.
  /// ```
  #[inline]
  pub const fn priority(&self) -> u16 {
    self.priority
  }

  /// ```text
  ///  Weight
  /// A server selection mechanism.  The weight field specifies a
  /// relative weight for entries with the same priority.
  /// ```
  #[inline]
  pub const fn weight(&self) -> u16 {
    self.weight
  }

  /// ```text
  ///  Port
  /// The port on this target host of this service.  The range is 0-
  /// 65535.  This is a 16 bit unsigned integer in network byte order.
  /// ```
  #[inline]
  pub const fn port(&self) -> u16 {
    self.port
  }

  /// ```text
  ///  Target
  /// The domain name of the target host.
  ///
  /// A Target of "." means that the service is decidedly not
  /// available at this domain.
  /// ```
  #[inline]
  pub fn target(&self) -> &SmolStr {
    &self.target
  }
}

impl fmt::Display for Srv {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{} {} {} {}",
      self.priority, self.weight, self.port, self.target
    )
  }
}
