use core::{fmt, str::FromStr, time::Duration};
use std::{
  collections::HashSet,
  io,
  net::{Ipv4Addr, SocketAddr, UdpSocket as StdUdpSocket},
  panic::{self, AssertUnwindSafe},
};

use agnostic_net::{
  Net, UdpSocket,
  runtime::{AsyncSpawner, RuntimeLite},
};
use async_channel::{Receiver, Sender};
use futures::{
  StreamExt as _,
  future::{Either, select},
  stream::FuturesUnordered,
};
use parking_lot::Mutex;
use scopeguard::ScopeGuard;
use smallvec_wrapper::SmallVec;
use smol_str::SmolStr;
use triomphe::Arc;

use crate::{
  DiscoveredDevice, DiscoveryOptions, Error, IPV4_MDNS, MDNS_PORT, Message, ParameterError,
  compose, parse, resolve,
  utils::{local_ipv4_addrs, multicast_udp4_socket},
};

const DEFAULT_WAIT: Duration = Duration::from_secs(3);
const CHANNEL_CAPACITY: usize = 32;

type JoinHandle<N> =
  <<<N as Net>::Runtime as RuntimeLite>::Spawner as AsyncSpawner>::JoinHandle<()>;
pub(crate) type PacketHandler = std::sync::Arc<dyn Fn(Packet) + Send + Sync + 'static>;

/// The kind of the active session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionState {
  /// A [`Discovery::discover`] call is running.
  Discovering,
  /// Monitoring was started by [`Discovery::start_monitoring`].
  Monitoring,
}

impl fmt::Display for SessionState {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Discovering => f.write_str("discovery"),
      Self::Monitoring => f.write_str("monitoring"),
    }
  }
}

/// Which field identifies a device when deduplicating replies.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DedupKey {
  /// The IPv4 address of the device.
  #[default]
  Address,
  /// The fully qualified name of the device. Devices without one fall back
  /// to their address.
  Fqdn,
}

impl DedupKey {
  /// Returns the string form of the key.
  #[inline]
  pub const fn as_str(&self) -> &'static str {
    match self {
      Self::Address => "address",
      Self::Fqdn => "fqdn",
    }
  }
}

impl fmt::Display for DedupKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for DedupKey {
  type Err = ParameterError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "address" => Ok(Self::Address),
      "fqdn" => Ok(Self::Fqdn),
      s => Err(ParameterError::UnknownDedupKey(s.into())),
    }
  }
}

/// Selects which discovered devices are returned.
#[derive(Clone)]
pub enum Filter {
  /// Keeps devices whose fqdn, address, model name or family name contains
  /// the string. Matching is case-sensitive.
  Substring(SmolStr),
  /// Keeps devices the predicate returns `true` for. A panicking predicate
  /// excludes the device.
  Predicate(std::sync::Arc<dyn Fn(&DiscoveredDevice) -> bool + Send + Sync + 'static>),
}

impl Filter {
  /// Creates a substring filter.
  #[inline]
  pub fn substring(needle: impl Into<SmolStr>) -> Self {
    Self::Substring(needle.into())
  }

  /// Creates a predicate filter.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::Filter;
  ///
  /// let filter = Filter::predicate(|d| d.service().is_some_and(|s| s.port() == 8009));
  /// ```
  #[inline]
  pub fn predicate<F>(f: F) -> Self
  where
    F: Fn(&DiscoveredDevice) -> bool + Send + Sync + 'static,
  {
    Self::Predicate(std::sync::Arc::new(f))
  }

  /// Returns `true` if `device` passes the filter.
  pub fn accepts(&self, device: &DiscoveredDevice) -> bool {
    match self {
      Self::Substring(needle) => {
        let needle = needle.as_str();
        [device.fqdn(), device.model_name(), device.family_name()]
          .into_iter()
          .flatten()
          .any(|s| s.contains(needle))
          || device.address().to_string().contains(needle)
      }
      Self::Predicate(f) => match panic::catch_unwind(AssertUnwindSafe(|| f(device))) {
        Ok(keep) => keep,
        Err(_) => {
          tracing::warn!(address=%device.address(), "mdns discovery: filter panicked, excluding device");
          false
        }
      },
    }
  }
}

impl fmt::Debug for Filter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Substring(s) => f.debug_tuple("Substring").field(s).finish(),
      Self::Predicate(_) => f.write_str("Predicate(..)"),
    }
  }
}

impl From<&str> for Filter {
  #[inline]
  fn from(s: &str) -> Self {
    Self::substring(s)
  }
}

impl From<SmolStr> for Filter {
  #[inline]
  fn from(s: SmolStr) -> Self {
    Self::Substring(s)
  }
}

/// The parameters of a [`Discovery::discover`] call.
#[derive(Debug, Clone)]
pub struct DiscoverParams {
  names: SmallVec<SmolStr>,
  ty: Option<SmolStr>,
  key: DedupKey,
  wait: Duration,
  quick: bool,
  filter: Option<Filter>,
  localhost: bool,
}

impl DiscoverParams {
  /// Creates parameters querying `name`, with all other values defaulted.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::{DedupKey, DiscoverParams};
  /// use std::time::Duration;
  ///
  /// let params = DiscoverParams::new("_googlecast._tcp.local");
  /// assert_eq!(params.ty(), None);
  /// assert_eq!(params.key(), DedupKey::Address);
  /// assert_eq!(params.wait(), Duration::from_secs(3));
  /// assert!(!params.quick());
  /// assert!(!params.localhost());
  /// ```
  pub fn new(name: impl Into<SmolStr>) -> Self {
    let mut names = SmallVec::new();
    names.push(name.into());
    Self {
      names,
      ty: None,
      key: DedupKey::Address,
      wait: DEFAULT_WAIT,
      quick: false,
      filter: None,
      localhost: false,
    }
  }

  /// Replaces the queried names.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::DiscoverParams;
  ///
  /// let params = DiscoverParams::new("_http._tcp.local")
  ///   .with_names(["_ipp._tcp.local", "_printer._tcp.local"]);
  /// assert_eq!(params.names().len(), 2);
  /// ```
  pub fn with_names<I, S>(mut self, names: I) -> Self
  where
    I: IntoIterator<Item = S>,
    S: Into<SmolStr>,
  {
    self.names = names.into_iter().map(Into::into).collect();
    self
  }

  /// Returns the queried names.
  #[inline]
  pub fn names(&self) -> &[SmolStr] {
    &self.names
  }

  /// Sets the query type symbol, e.g. `"PTR"`. Defaults to `ANY`.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::DiscoverParams;
  ///
  /// let params = DiscoverParams::new("_http._tcp.local").with_type("PTR");
  /// assert_eq!(params.ty(), Some("PTR"));
  /// ```
  #[inline]
  pub fn with_type(mut self, ty: impl Into<SmolStr>) -> Self {
    self.ty = Some(ty.into());
    self
  }

  /// Returns the query type symbol.
  #[inline]
  pub fn ty(&self) -> Option<&str> {
    self.ty.as_deref()
  }

  /// Sets the dedup key. Defaults to [`DedupKey::Address`].
  #[inline]
  pub fn with_key(mut self, key: DedupKey) -> Self {
    self.key = key;
    self
  }

  /// Returns the dedup key.
  #[inline]
  pub const fn key(&self) -> DedupKey {
    self.key
  }

  /// Sets how long to collect replies. Defaults to 3 seconds.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::DiscoverParams;
  /// use std::time::Duration;
  ///
  /// let params = DiscoverParams::new("_http._tcp.local")
  ///   .with_wait(Duration::from_millis(500));
  /// assert_eq!(params.wait(), Duration::from_millis(500));
  /// ```
  #[inline]
  pub fn with_wait(mut self, wait: Duration) -> Self {
    self.wait = wait;
    self
  }

  /// Returns how long replies are collected.
  #[inline]
  pub const fn wait(&self) -> Duration {
    self.wait
  }

  /// Sets whether to return as soon as one device passes the filter.
  #[inline]
  pub fn with_quick(mut self, quick: bool) -> Self {
    self.quick = quick;
    self
  }

  /// Returns whether to return on the first match.
  #[inline]
  pub const fn quick(&self) -> bool {
    self.quick
  }

  /// Sets the filter applied to every discovered device.
  ///
  /// ## Example
  ///
  /// ```rust
  /// use mdns_discover::{DiscoverParams, Filter};
  ///
  /// let params = DiscoverParams::new("_googlecast._tcp.local")
  ///   .with_filter(Filter::substring("Living Room"));
  /// assert!(params.filter().is_some());
  /// ```
  #[inline]
  pub fn with_filter(mut self, filter: impl Into<Filter>) -> Self {
    self.filter = Some(filter.into());
    self
  }

  /// Returns the filter.
  #[inline]
  pub const fn filter(&self) -> Option<&Filter> {
    self.filter.as_ref()
  }

  /// Sets whether replies sent from this host are accepted.
  #[inline]
  pub fn with_localhost(mut self, localhost: bool) -> Self {
    self.localhost = localhost;
    self
  }

  /// Returns whether replies sent from this host are accepted.
  #[inline]
  pub const fn localhost(&self) -> bool {
    self.localhost
  }

  /// Validates the parameters and encodes the query packet.
  pub(crate) fn query(&self) -> Result<Vec<u8>, ParameterError> {
    if self
      .names
      .iter()
      .any(|n| n.trim_end_matches('.').is_empty())
    {
      return Err(ParameterError::EmptyName);
    }

    compose(self.names.iter(), self.ty.as_deref()).map_err(Into::into)
  }
}

/// A datagram received while monitoring.
#[derive(Debug, Clone)]
pub struct Packet {
  source: SocketAddr,
  message: Arc<Message>,
}

impl Packet {
  /// Returns the sender of the packet.
  #[inline]
  pub const fn source(&self) -> SocketAddr {
    self.source
  }

  /// Returns the parsed packet.
  #[inline]
  pub fn message(&self) -> &Message {
    &self.message
  }
}

/// The state owned by one discovery or monitoring session.
#[derive(Debug, Clone)]
pub(crate) struct SessionContext {
  local_addrs: SmallVec<Ipv4Addr>,
  localhost: bool,
}

impl SessionContext {
  pub(crate) fn new(local_addrs: impl IntoIterator<Item = Ipv4Addr>, localhost: bool) -> Self {
    Self {
      local_addrs: local_addrs.into_iter().collect(),
      localhost,
    }
  }

  fn is_local(&self, ip: &Ipv4Addr) -> bool {
    ip.is_loopback() || self.local_addrs.contains(ip)
  }

  /// Returns the IPv4 source of `msg` if it is an answer: a standard
  /// response, from another host unless localhost traffic is allowed.
  pub(crate) fn accept(&self, msg: &Message, from: SocketAddr) -> Option<Ipv4Addr> {
    let header = msg.header();
    if !header.qr() || header.opcode() != 0 {
      return None;
    }

    let ip = match from {
      SocketAddr::V4(addr) => *addr.ip(),
      SocketAddr::V6(addr) => addr.ip().to_ipv4_mapped()?,
    };

    if !self.localhost && self.is_local(&ip) {
      return None;
    }
    Some(ip)
  }
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum Seen {
  Address(Ipv4Addr),
  Fqdn(SmolStr),
}

/// Accumulates the devices of one discovery session.
pub(crate) struct Collector<'a> {
  ctx: &'a SessionContext,
  params: &'a DiscoverParams,
  seen: HashSet<Seen>,
  devices: Vec<DiscoveredDevice>,
}

impl<'a> Collector<'a> {
  pub(crate) fn new(ctx: &'a SessionContext, params: &'a DiscoverParams) -> Self {
    Self {
      ctx,
      params,
      seen: HashSet::new(),
      devices: Vec::new(),
    }
  }

  /// Handles one datagram.
  pub(crate) fn offer(&mut self, from: SocketAddr, data: &[u8]) {
    let Some(msg) = parse(data) else {
      return;
    };

    let Some(source) = self.ctx.accept(&msg, from) else {
      tracing::trace!(from=%from, "mdns discovery: ignoring packet");
      return;
    };

    for device in resolve(msg, source, &self.params.names) {
      let key = match (self.params.key, device.fqdn()) {
        (DedupKey::Fqdn, Some(fqdn)) => Seen::Fqdn(fqdn.clone()),
        _ => Seen::Address(device.address()),
      };
      if !self.seen.insert(key) {
        tracing::trace!(address=%device.address(), "mdns discovery: duplicate device");
        continue;
      }

      if let Some(filter) = &self.params.filter {
        if !filter.accepts(&device) {
          tracing::trace!(address=%device.address(), "mdns discovery: device filtered out");
          continue;
        }
      }

      tracing::debug!(address=%device.address(), fqdn=?device.fqdn(), "mdns discovery: found device");
      self.devices.push(device);
    }
  }

  #[inline]
  pub(crate) fn is_empty(&self) -> bool {
    self.devices.is_empty()
  }

  #[inline]
  pub(crate) fn finish(self) -> Vec<DiscoveredDevice> {
    self.devices
  }
}

/// Collects devices from `rx` until the wait elapses, or until the first
/// match in quick mode.
pub(crate) async fn collect<N: Net>(
  rx: Receiver<(SocketAddr, Vec<u8>)>,
  ctx: &SessionContext,
  params: &DiscoverParams,
) -> Vec<DiscoveredDevice> {
  let mut collector = Collector::new(ctx, params);

  let finish = <N::Runtime as RuntimeLite>::sleep(params.wait);
  futures::pin_mut!(finish);

  loop {
    let recv = rx.recv();
    futures::pin_mut!(recv);

    match select(finish.as_mut(), recv).await {
      Either::Left(_) => {
        tracing::debug!("mdns discovery: wait elapsed");
        break;
      }
      Either::Right((Ok((from, data)), _)) => {
        collector.offer(from, &data);
        if params.quick && !collector.is_empty() {
          tracing::debug!("mdns discovery: quick match");
          break;
        }
      }
      Either::Right((Err(_), _)) => {
        // every listener is gone, nothing else can arrive
        finish.as_mut().await;
        break;
      }
    }
  }

  collector.finish()
}

/// The multicast sockets of one session and their listener tasks.
struct Listeners<N: Net> {
  conns: SmallVec<(Ipv4Addr, Arc<N::UdpSocket>)>,
  // duplicated handles used to leave the group explicitly
  memberships: SmallVec<(Ipv4Addr, StdUdpSocket)>,
  handles: FuturesUnordered<JoinHandle<N>>,
  shutdown_tx: Sender<()>,
  shutdown_rx: Receiver<()>,
}

impl<N: Net> Drop for Listeners<N> {
  fn drop(&mut self) {
    self.shutdown_tx.close();
    self.leave();
  }
}

impl<N: Net> Listeners<N> {
  /// Binds one socket per interface. Interfaces that fail are skipped.
  fn open(
    ifaces: &[Ipv4Addr],
    max_payload_size: usize,
    tx: Sender<(SocketAddr, Vec<u8>)>,
  ) -> io::Result<Self> {
    let (shutdown_tx, shutdown_rx) = async_channel::bounded(1);
    let mut this = Self {
      conns: SmallVec::new(),
      memberships: SmallVec::new(),
      handles: FuturesUnordered::new(),
      shutdown_tx,
      shutdown_rx,
    };

    for ifi in ifaces.iter().copied() {
      let res = multicast_udp4_socket(ifi, MDNS_PORT).and_then(|sock| {
        let membership = sock.try_clone()?;
        <N::UdpSocket as TryFrom<_>>::try_from(sock).map(|conn| (conn, membership))
      });

      match res {
        Ok((conn, membership)) => {
          let conn = Arc::new(conn);
          this.memberships.push((ifi, membership));
          this.spawn(listen::<N>(
            ifi,
            conn.clone(),
            tx.clone(),
            this.shutdown_rx.clone(),
            max_payload_size,
          ));
          this.conns.push((ifi, conn));
        }
        Err(e) => {
          tracing::error!(err=%e, interface=%ifi, "mdns discovery: failed to bind multicast socket");
        }
      }
    }

    if this.conns.is_empty() {
      return Err(io::Error::new(
        io::ErrorKind::AddrNotAvailable,
        "no multicast listeners could be started",
      ));
    }

    Ok(this)
  }

  #[inline]
  fn len(&self) -> usize {
    self.conns.len()
  }

  fn spawn<F>(&mut self, fut: F)
  where
    F: core::future::Future<Output = ()> + Send + 'static,
  {
    self
      .handles
      .push(<N::Runtime as RuntimeLite>::Spawner::spawn(fut));
  }

  /// Sends `buf` to the mDNS group on every socket, returns the number of
  /// successful sends.
  async fn send(&self, buf: &[u8]) -> usize {
    let mut sent = 0;
    for (ifi, conn) in self.conns.iter() {
      match conn.send_to(buf, (IPV4_MDNS, MDNS_PORT)).await {
        Ok(_) => {
          tracing::trace!(interface=%ifi, data=?buf, "mdns discovery: sent query");
          sent += 1;
        }
        Err(e) => {
          tracing::error!(err=%e, interface=%ifi, "mdns discovery: failed to send query");
        }
      }
    }
    sent
  }

  /// Stops the listeners, waits for them to exit and leaves every group.
  async fn shutdown(mut self) {
    self.shutdown_tx.close();
    let mut handles = core::mem::take(&mut self.handles);
    while handles.next().await.is_some() {}
    self.leave();
  }

  fn leave(&mut self) {
    for (ifi, sock) in self.memberships.drain(..) {
      if let Err(e) = sock.leave_multicast_v4(&IPV4_MDNS, &ifi) {
        tracing::debug!(err=%e, interface=%ifi, "mdns discovery: failed to leave multicast group");
      }
    }
  }
}

async fn listen<N: Net>(
  ifi: Ipv4Addr,
  conn: Arc<N::UdpSocket>,
  tx: Sender<(SocketAddr, Vec<u8>)>,
  shutdown_rx: Receiver<()>,
  max_payload_size: usize,
) {
  let mut buf = vec![0u8; max_payload_size];

  tracing::debug!(interface=%ifi, "mdns discovery: starting to listen");
  scopeguard::defer!({
    tracing::debug!(interface=%ifi, "mdns discovery: stopping to listen");
  });

  loop {
    let res = {
      let shutdown = shutdown_rx.recv();
      let recv = conn.recv_from(&mut buf);
      futures::pin_mut!(shutdown);
      futures::pin_mut!(recv);

      match select(shutdown, recv).await {
        Either::Left(_) => return,
        Either::Right((res, _)) => res,
      }
    };

    let (size, from) = match res {
      Ok(res) => res,
      Err(e) => {
        tracing::error!(err=%e, interface=%ifi, "mdns discovery: failed to receive packet");
        continue;
      }
    };

    let data = buf[..size].to_vec();
    tracing::trace!(interface=%ifi, from=%from, data=?data, "mdns discovery: received packet");

    let send = tx.send((from, data));
    let shutdown = shutdown_rx.recv();
    futures::pin_mut!(send);
    futures::pin_mut!(shutdown);
    match select(send, shutdown).await {
      Either::Left((Ok(()), _)) => {}
      Either::Left((Err(_), _)) | Either::Right(_) => return,
    }
  }
}

/// Parses datagrams from `rx` and hands them to the registered handler.
pub(crate) async fn dispatch(
  rx: Receiver<(SocketAddr, Vec<u8>)>,
  handler: std::sync::Arc<Mutex<Option<PacketHandler>>>,
  shutdown_rx: Receiver<()>,
) {
  tracing::debug!("mdns discovery: starting to dispatch packets");
  scopeguard::defer!({
    tracing::debug!("mdns discovery: stopping to dispatch packets");
  });

  loop {
    let shutdown = shutdown_rx.recv();
    let recv = rx.recv();
    futures::pin_mut!(shutdown);
    futures::pin_mut!(recv);

    let (source, data) = match select(shutdown, recv).await {
      Either::Left(_) | Either::Right((Err(_), _)) => return,
      Either::Right((Ok(res), _)) => res,
    };

    let Some(message) = parse(&data) else {
      continue;
    };

    let handler = handler.lock().clone();
    let Some(handler) = handler else {
      tracing::trace!(from=%source, "mdns discovery: no packet handler, dropping packet");
      continue;
    };

    let packet = Packet {
      source,
      message: Arc::new(message),
    };
    if panic::catch_unwind(AssertUnwindSafe(|| handler(packet))).is_err() {
      tracing::warn!(from=%source, "mdns discovery: packet handler panicked");
    }
  }
}

/// Discovers and monitors mDNS devices on the local IPv4 networks.
///
/// At most one session, a [`discover`](Self::discover) call or a monitoring
/// run, is active at a time.
pub struct Discovery<N: Net> {
  opts: DiscoveryOptions,
  state: Mutex<Option<SessionState>>,
  monitor: Mutex<Option<Listeners<N>>>,
  handler: std::sync::Arc<Mutex<Option<PacketHandler>>>,
}

impl<N: Net> Default for Discovery<N> {
  #[inline]
  fn default() -> Self {
    Self::new(DiscoveryOptions::default())
  }
}

impl<N: Net> Discovery<N> {
  /// Creates an idle discovery engine.
  pub fn new(opts: DiscoveryOptions) -> Self {
    Self {
      opts,
      state: Mutex::new(None),
      monitor: Mutex::new(None),
      handler: std::sync::Arc::new(Mutex::new(None)),
    }
  }

  /// Returns the options of the engine.
  #[inline]
  pub fn options(&self) -> &DiscoveryOptions {
    &self.opts
  }

  /// Returns the active session, if any.
  #[inline]
  pub fn state(&self) -> Option<SessionState> {
    *self.state.lock()
  }

  /// Registers the consumer of monitored packets, replacing the previous one.
  ///
  /// The handler runs on the dispatcher task and should not block.
  pub fn set_packet_handler<F>(&self, handler: F)
  where
    F: Fn(Packet) + Send + Sync + 'static,
  {
    *self.handler.lock() = Some(std::sync::Arc::new(handler));
  }

  /// Removes the consumer of monitored packets.
  pub fn clear_packet_handler(&self) {
    self.handler.lock().take();
  }

  /// Queries the local networks and returns the devices that answered.
  ///
  /// Resolves after [`DiscoverParams::wait`], or as soon as one device
  /// passes the filter when [`DiscoverParams::quick`] is set. Sockets are
  /// closed and groups left on every exit path.
  pub async fn discover(&self, params: DiscoverParams) -> Result<Vec<DiscoveredDevice>, Error> {
    let query = params.query()?;

    self.acquire(SessionState::Discovering)?;
    let _slot = scopeguard::guard(&self.state, |state| *state.lock() = None);

    let ifaces = self.interfaces()?;
    let ctx = SessionContext::new(self.local_addrs(&ifaces), params.localhost());
    let (tx, rx) = async_channel::bounded(CHANNEL_CAPACITY);
    let listeners = Listeners::<N>::open(&ifaces, self.opts.max_payload_size(), tx)?;

    tracing::info!(names=?params.names(), interfaces=listeners.len(), "mdns discovery: discovering");
    if listeners.send(&query).await == 0 {
      listeners.shutdown().await;
      return Err(Error::network(
        io::ErrorKind::Other,
        "failed to send the query on any interface",
      ));
    }

    let devices = collect::<N>(rx, &ctx, &params).await;
    listeners.shutdown().await;

    tracing::info!(found = devices.len(), "mdns discovery: finished");
    Ok(devices)
  }

  /// Starts forwarding every parsed packet to the packet handler.
  ///
  /// No query is sent, and packets are neither filtered nor deduplicated.
  pub async fn start_monitoring(&self) -> Result<(), Error> {
    self.acquire(SessionState::Monitoring)?;
    let slot = scopeguard::guard(&self.state, |state| *state.lock() = None);

    let ifaces = self.interfaces()?;
    let (tx, rx) = async_channel::bounded(CHANNEL_CAPACITY);
    let mut listeners = Listeners::<N>::open(&ifaces, self.opts.max_payload_size(), tx)?;
    let shutdown_rx = listeners.shutdown_rx.clone();
    listeners.spawn(dispatch(rx, self.handler.clone(), shutdown_rx));

    tracing::info!(interfaces = listeners.len(), "mdns discovery: monitoring started");
    *self.monitor.lock() = Some(listeners);
    ScopeGuard::into_inner(slot);
    Ok(())
  }

  /// Stops monitoring. Does nothing if monitoring is not active.
  pub async fn stop_monitoring(&self) {
    let listeners = self.monitor.lock().take();
    let Some(listeners) = listeners else {
      return;
    };

    listeners.shutdown().await;
    *self.state.lock() = None;
    tracing::info!("mdns discovery: monitoring stopped");
  }

  fn acquire(&self, want: SessionState) -> Result<(), Error> {
    let mut state = self.state.lock();
    if let Some(active) = *state {
      return Err(Error::State(active));
    }
    *state = Some(want);
    Ok(())
  }

  /// Returns the addresses whose traffic counts as our own: the listening
  /// interfaces, plus every local address when the interfaces are explicit.
  pub(crate) fn local_addrs(&self, ifaces: &[Ipv4Addr]) -> SmallVec<Ipv4Addr> {
    let mut addrs: SmallVec<Ipv4Addr> = ifaces.iter().copied().collect();
    if self.opts.interfaces().is_empty() {
      return addrs;
    }

    match local_ipv4_addrs() {
      Ok(local) => {
        for addr in local.iter().copied() {
          if !addrs.contains(&addr) {
            addrs.push(addr);
          }
        }
      }
      Err(e) => {
        tracing::debug!(err=%e, "mdns discovery: failed to enumerate local addresses");
      }
    }
    addrs
  }

  fn interfaces(&self) -> Result<SmallVec<Ipv4Addr>, Error> {
    if !iprobe::ipv4() {
      return Err(Error::network(
        io::ErrorKind::Unsupported,
        "IPv4 is not available on this host",
      ));
    }

    let addrs = if self.opts.interfaces().is_empty() {
      local_ipv4_addrs()?
    } else {
      self.opts.interfaces().iter().copied().collect()
    };

    if addrs.is_empty() {
      return Err(Error::network(
        io::ErrorKind::NotFound,
        "no usable IPv4 interface",
      ));
    }
    Ok(addrs)
  }
}
