use std::io;

use smol_str::SmolStr;

use crate::{EncodeError, SessionState};

/// Errors returned by the discovery and monitoring operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
  /// The discovery parameters are invalid. Reported before any network activity.
  #[error(transparent)]
  Parameter(#[from] ParameterError),
  /// No usable interface, every socket failed to bind, or the query could not
  /// be sent on any socket.
  #[error("network error: {0}")]
  Network(#[from] io::Error),
  /// Another session is already active.
  #[error("a {0} session is already active")]
  State(SessionState),
}

impl Error {
  #[inline]
  pub(crate) fn network(kind: io::ErrorKind, msg: &'static str) -> Self {
    Self::Network(io::Error::new(kind, msg))
  }
}

/// Returned when [`DiscoverParams`](crate::DiscoverParams) cannot be turned into a query.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParameterError {
  /// A requested name is empty.
  #[error("service names must not be empty")]
  EmptyName,
  /// The names or the type cannot be encoded into a query.
  #[error(transparent)]
  Query(#[from] EncodeError),
  /// The dedup key is neither `address` nor `fqdn`.
  #[error("unknown dedup key {0:?}, expected \"address\" or \"fqdn\"")]
  UnknownDedupKey(SmolStr),
}

impl From<EncodeError> for Error {
  #[inline]
  fn from(e: EncodeError) -> Self {
    Self::Parameter(e.into())
  }
}
