use core::time::Duration;
use std::{
  net::{Ipv4Addr, SocketAddr},
  sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
  },
};

use agnostic_net::Net;

use crate::{
  DedupKey, DiscoverParams, Discovery, DiscoveryOptions, EncodeError, Error, ParameterError,
  SessionState, utils::local_ipv4_addrs,
};

fn params() -> DiscoverParams {
  DiscoverParams::new("_http._tcp.local").with_wait(Duration::from_millis(200))
}

#[test]
fn dedup_key_from_str() {
  assert_eq!("address".parse::<DedupKey>().unwrap(), DedupKey::Address);
  assert_eq!("fqdn".parse::<DedupKey>().unwrap(), DedupKey::Fqdn);
  assert_eq!(
    "name".parse::<DedupKey>(),
    Err(ParameterError::UnknownDedupKey("name".into()))
  );
  assert_eq!(DedupKey::Fqdn.to_string(), "fqdn");
}

#[test]
fn state_error_message() {
  let err = Error::State(SessionState::Monitoring);
  assert_eq!(err.to_string(), "a monitoring session is already active");
}

async fn rejects_invalid_params<N: Net>() {
  // no interface is ever touched: validation comes first
  let discovery =
    Discovery::<N>::new(DiscoveryOptions::new().with_interface(Ipv4Addr::new(203, 0, 113, 1)));

  let err = discovery.discover(DiscoverParams::new("")).await.unwrap_err();
  assert!(matches!(err, Error::Parameter(ParameterError::EmptyName)));

  let long = format!("{}.local", "a".repeat(64));
  let err = discovery.discover(DiscoverParams::new(long)).await.unwrap_err();
  assert!(matches!(
    err,
    Error::Parameter(ParameterError::Query(EncodeError::LabelTooLong { len: 64, .. }))
  ));

  let err = discovery
    .discover(params().with_type("BOGUS"))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Parameter(ParameterError::Query(EncodeError::UnknownRecordType(_)))
  ));

  let err = discovery
    .discover(params().with_names(Vec::<&str>::new()))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Parameter(ParameterError::Query(EncodeError::NoNames))
  ));

  let names: Vec<String> = (0..256).map(|i| format!("n{i}.local")).collect();
  let err = discovery
    .discover(params().with_names(names))
    .await
    .unwrap_err();
  assert!(matches!(
    err,
    Error::Parameter(ParameterError::Query(EncodeError::TooManyNames(256)))
  ));

  assert_eq!(discovery.state(), None);
}

async fn discover_releases_session<N: Net>() {
  let discovery = Discovery::<N>::default();

  match discovery.discover(params()).await {
    Ok(devices) => {
      for d in devices.iter() {
        tracing::info!(address=%d.address(), fqdn=?d.fqdn(), "found device");
      }
    }
    Err(Error::Network(e)) => {
      tracing::warn!(err=%e, "no usable interface, skipping");
    }
    Err(e) => panic!("unexpected error: {e}"),
  }

  assert_eq!(discovery.state(), None);
}

async fn monitoring_is_exclusive<N: Net>() {
  let discovery = Discovery::<N>::default();

  // stopping while idle is a no-op
  discovery.stop_monitoring().await;
  assert_eq!(discovery.state(), None);

  match discovery.start_monitoring().await {
    Ok(()) => {}
    Err(Error::Network(e)) => {
      tracing::warn!(err=%e, "no usable interface, skipping");
      assert_eq!(discovery.state(), None);
      return;
    }
    Err(e) => panic!("unexpected error: {e}"),
  }

  assert_eq!(discovery.state(), Some(SessionState::Monitoring));
  assert!(matches!(
    discovery.start_monitoring().await,
    Err(Error::State(SessionState::Monitoring))
  ));
  assert!(matches!(
    discovery.discover(params()).await,
    Err(Error::State(SessionState::Monitoring))
  ));

  discovery.stop_monitoring().await;
  assert_eq!(discovery.state(), None);
  discovery.stop_monitoring().await;
  assert_eq!(discovery.state(), None);
}

async fn monitoring_forwards_packets<N: Net>() {
  let discovery = Discovery::<N>::default();
  let seen = Arc::new(AtomicUsize::new(0));

  let counter = seen.clone();
  discovery.set_packet_handler(move |packet| {
    let src: SocketAddr = packet.source();
    tracing::info!(from=%src, questions=packet.message().questions().len(), "monitored packet");
    counter.fetch_add(1, Ordering::SeqCst);
  });

  if let Err(e) = discovery.start_monitoring().await {
    tracing::warn!(err=%e, "monitoring unavailable, skipping");
    return;
  }

  // a second engine on the same host sends a query, looped back to the monitor
  let sender = Discovery::<N>::default();
  let sent = sender.discover(params()).await;

  discovery.stop_monitoring().await;
  discovery.clear_packet_handler();
  let packets = seen.load(Ordering::SeqCst);
  tracing::info!(packets, "monitoring finished");
  if sent.is_ok() {
    assert!(packets > 0, "the looped back query was not forwarded");
  }
  assert_eq!(discovery.state(), None);
}

fn unreachable_interface() -> DiscoveryOptions {
  DiscoveryOptions::new().with_interface(Ipv4Addr::new(203, 0, 113, 1))
}

async fn discover_fails_when_no_socket_opens<N: Net>() {
  let discovery = Discovery::<N>::new(unreachable_interface());

  let err = discovery.discover(params()).await.unwrap_err();
  assert!(matches!(err, Error::Network(_)), "unexpected error: {err}");
  assert_eq!(discovery.state(), None);

  // the slot is free again
  let err = discovery.discover(params()).await.unwrap_err();
  assert!(matches!(err, Error::Network(_)), "unexpected error: {err}");
}

async fn monitoring_fails_when_no_socket_opens<N: Net>() {
  let discovery = Discovery::<N>::new(unreachable_interface());

  let err = discovery.start_monitoring().await.unwrap_err();
  assert!(matches!(err, Error::Network(_)), "unexpected error: {err}");
  assert_eq!(discovery.state(), None);

  discovery.stop_monitoring().await;
  assert_eq!(discovery.state(), None);
}

async fn explicit_interfaces_keep_local_addrs<N: Net>() {
  let iface = Ipv4Addr::new(203, 0, 113, 1);
  let discovery = Discovery::<N>::new(unreachable_interface());
  let locals = discovery.local_addrs(&[iface]);
  assert!(locals.contains(&iface));

  if let Ok(addrs) = local_ipv4_addrs() {
    for addr in addrs.iter() {
      assert!(locals.contains(addr), "{addr} missing from the local set");
    }
  }

  // enumerated interfaces are already every local address
  let discovery = Discovery::<N>::default();
  let locals = discovery.local_addrs(&[iface]);
  assert_eq!(&locals[..], &[iface]);
}

#[test]
fn max_payload_size_holds_a_header() {
  assert_eq!(DiscoveryOptions::new().with_max_payload_size(0).max_payload_size(), 12);
  assert_eq!(DiscoveryOptions::new().with_max_payload_size(11).max_payload_size(), 12);
  assert_eq!(DiscoveryOptions::new().with_max_payload_size(12).max_payload_size(), 12);
  assert_eq!(DiscoveryOptions::new().with_max_payload_size(1500).max_payload_size(), 1500);
}

test_suites!(tokio {
  rejects_invalid_params,
  discover_releases_session,
  monitoring_is_exclusive,
  monitoring_forwards_packets,
  discover_fails_when_no_socket_opens,
  monitoring_fails_when_no_socket_opens,
  explicit_interfaces_keep_local_addrs,
});

test_suites!(smol {
  rejects_invalid_params,
  discover_releases_session,
  monitoring_is_exclusive,
  monitoring_forwards_packets,
  discover_fails_when_no_socket_opens,
  monitoring_fails_when_no_socket_opens,
  explicit_interfaces_keep_local_addrs,
});

test_suites!(async_std {
  rejects_invalid_params,
  discover_releases_session,
  monitoring_is_exclusive,
  monitoring_forwards_packets,
  discover_fails_when_no_socket_opens,
  monitoring_fails_when_no_socket_opens,
  explicit_interfaces_keep_local_addrs,
});
