#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![allow(unexpected_cfgs)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![cfg_attr(docsrs, allow(unused_attributes))]

#[cfg(test)]
mod tests;

use std::net::Ipv4Addr;

use smallvec_wrapper::SmallVec;

const IPV4_MDNS: Ipv4Addr = Ipv4Addr::new(224, 0, 0, 251);
const MDNS_PORT: u16 = 5353;
// See RFC 6762, https://datatracker.ietf.org/doc/rfc6762/
const MAX_PAYLOAD_SIZE: usize = 9000;

mod client;
mod error;
mod resolver;
mod types;
mod utils;

pub use client::{DedupKey, DiscoverParams, Discovery, Filter, Packet, SessionState};
pub use error::{Error, ParameterError};
pub use iprobe as netprobe;
pub use resolver::{DiscoveredDevice, Service, resolve};
pub use smol_str::SmolStr;
pub use types::*;

/// The options for [`Discovery`].
#[derive(Clone, Debug)]
pub struct DiscoveryOptions {
  interfaces: SmallVec<Ipv4Addr>,
  max_payload_size: usize,
}

impl Default for DiscoveryOptions {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

impl DiscoveryOptions {
  /// Returns a new instance of [`DiscoveryOptions`].
  #[inline]
  pub fn new() -> Self {
    Self {
      interfaces: SmallVec::new(),
      max_payload_size: MAX_PAYLOAD_SIZE,
    }
  }

  /// Returns the IPv4 interfaces to listen on. Empty means every local,
  /// non-loopback, non-link-local interface.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::DiscoveryOptions;
  /// use std::net::Ipv4Addr;
  ///
  /// let opts = DiscoveryOptions::new().with_interface(Ipv4Addr::new(192, 168, 1, 1));
  /// assert_eq!(opts.interfaces(), &[Ipv4Addr::new(192, 168, 1, 1)]);
  /// ```
  #[inline]
  pub fn interfaces(&self) -> &[Ipv4Addr] {
    &self.interfaces
  }

  /// Adds an IPv4 interface to listen on, disabling interface enumeration.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::DiscoveryOptions;
  /// use std::net::Ipv4Addr;
  ///
  /// let opts = DiscoveryOptions::new()
  ///   .with_interface(Ipv4Addr::new(192, 168, 1, 1))
  ///   .with_interface(Ipv4Addr::new(10, 0, 0, 1));
  /// assert_eq!(opts.interfaces().len(), 2);
  /// ```
  #[inline]
  pub fn with_interface(mut self, iface: Ipv4Addr) -> Self {
    if !self.interfaces.contains(&iface) {
      self.interfaces.push(iface);
    }
    self
  }

  /// Returns the size of the receive buffer, the largest datagram accepted.
  ///
  /// Default is `9000`.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::DiscoveryOptions;
  ///
  /// let opts = DiscoveryOptions::new();
  /// assert_eq!(opts.max_payload_size(), 9000);
  /// ```
  #[inline]
  pub const fn max_payload_size(&self) -> usize {
    self.max_payload_size
  }

  /// Sets the size of the receive buffer.
  ///
  /// Values smaller than a DNS header (12 bytes) are raised to 12.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::DiscoveryOptions;
  ///
  /// let opts = DiscoveryOptions::new().with_max_payload_size(1500);
  /// assert_eq!(opts.max_payload_size(), 1500);
  ///
  /// let opts = DiscoveryOptions::new().with_max_payload_size(0);
  /// assert_eq!(opts.max_payload_size(), 12);
  /// ```
  #[inline]
  pub fn with_max_payload_size(mut self, max_payload_size: usize) -> Self {
    self.max_payload_size = max_payload_size.max(types::MESSAGE_HEADER_SIZE);
    self
  }
}

/// Types for `tokio` runtime
#[cfg(feature = "tokio")]
#[cfg_attr(docsrs, doc(cfg(feature = "tokio")))]
pub mod tokio {
  pub use agnostic_net::{runtime::tokio::TokioRuntime as Runtime, tokio::Net};

  /// A discovery engine that can be used with `tokio` runtime
  pub type Discovery = super::Discovery<Net>;
}

/// Types for `smol` runtime
#[cfg(feature = "smol")]
#[cfg_attr(docsrs, doc(cfg(feature = "smol")))]
pub mod smol {
  pub use agnostic_net::{runtime::smol::SmolRuntime as Runtime, smol::Net};

  /// A discovery engine that can be used with `smol` runtime
  pub type Discovery = super::Discovery<Net>;
}

/// Types for `async-std` runtime
#[cfg(feature = "async-std")]
#[cfg_attr(docsrs, doc(cfg(feature = "async-std")))]
pub mod async_std {
  pub use agnostic_net::{async_std::Net, runtime::async_std::AsyncStdRuntime as Runtime};

  /// A discovery engine that can be used with `async-std` runtime
  pub type Discovery = super::Discovery<Net>;
}

pub use agnostic_net as net;
