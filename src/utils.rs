use std::{
  io,
  net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket as StdUdpSocket},
};

use smallvec_wrapper::SmallVec;

use crate::IPV4_MDNS;

// Multicast datagrams must stay on the local link, RFC 6762 section 11.
const MULTICAST_TTL: u32 = 255;

#[cfg(unix)]
pub(crate) use unix_impl::*;

#[cfg(unix)]
mod unix_impl {
  use super::*;
  use rustix::net::{AddressFamily, SocketType, bind, ipproto, socket, sockopt};

  /// Binds `0.0.0.0:port` and joins the mDNS group on the interface `ifi`.
  pub(crate) fn multicast_udp4_socket(ifi: Ipv4Addr, port: u16) -> io::Result<StdUdpSocket> {
    let sock = socket(AddressFamily::INET, SocketType::DGRAM, Some(ipproto::UDP))?;
    sockopt::set_socket_reuseaddr(&sock, true)?;
    sockopt::set_socket_reuseport(&sock, true)?;

    let addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, port).into();
    bind(&sock, &addr)?;
    sockopt::set_ip_multicast_if(&sock, &ifi)?;

    let sock = StdUdpSocket::from(sock);
    super::join(sock, ifi)
  }
}

#[cfg(windows)]
pub(crate) use windows_impl::*;

#[cfg(windows)]
mod windows_impl {
  use super::*;
  use socket2::{Domain, Protocol, Socket, Type};

  /// Binds `0.0.0.0:port` and joins the mDNS group on the interface `ifi`.
  pub(crate) fn multicast_udp4_socket(ifi: Ipv4Addr, port: u16) -> io::Result<StdUdpSocket> {
    let sock = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP))?;
    sock.set_reuse_address(true)?;
    let addr: SocketAddr = (Ipv4Addr::UNSPECIFIED, port).into();
    sock.bind(&addr.into())?;
    sock.set_multicast_if_v4(&ifi)?;

    let sock = StdUdpSocket::from(sock);
    super::join(sock, ifi)
  }
}

fn join(sock: StdUdpSocket, ifi: Ipv4Addr) -> io::Result<StdUdpSocket> {
  sock.set_nonblocking(true)?;
  sock.set_multicast_ttl_v4(MULTICAST_TTL)?;
  sock.set_multicast_loop_v4(true)?;
  sock.join_multicast_v4(&IPV4_MDNS, &ifi)?;
  Ok(sock)
}

/// Returns the IPv4 addresses of the local interfaces, without loopback and
/// link-local addresses.
pub(crate) fn local_ipv4_addrs() -> io::Result<SmallVec<Ipv4Addr>> {
  let mut addrs = SmallVec::new();
  for iface in if_addrs::get_if_addrs()? {
    if iface.is_loopback() {
      continue;
    }

    if let IpAddr::V4(ip) = iface.ip() {
      if is_usable(&ip) && !addrs.contains(&ip) {
        addrs.push(ip);
      }
    }
  }
  Ok(addrs)
}

#[inline]
const fn is_usable(ip: &Ipv4Addr) -> bool {
  !(ip.is_loopback() || ip.is_link_local() || ip.is_unspecified())
}
