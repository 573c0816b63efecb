use core::time::Duration;
use std::{
  net::{Ipv4Addr, SocketAddr},
  time::Instant,
};

use agnostic_net::Net;
use async_channel::Sender;

use crate::{
  DedupKey, DiscoverParams, Filter,
  client::{SessionContext, collect},
  tests::PacketBuilder,
};

const LOCAL: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 10);
const PEER: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 20);
const OTHER_PEER: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 30);

fn from(ip: Ipv4Addr) -> SocketAddr {
  SocketAddr::from((ip, 5353))
}

fn device_packet(addr: Ipv4Addr, instance: &str, family: &str) -> Vec<u8> {
  let host = format!("host-{}.local", addr.octets()[3]);
  let family = format!("fn={family}");
  PacketBuilder::response()
    .ptr("_http._tcp.local", instance)
    .additionals()
    .srv(instance, 80, &host)
    .txt(instance, &["md=Widget", family.as_str()])
    .a(&host, addr)
    .build()
}

fn params(wait: Duration) -> DiscoverParams {
  DiscoverParams::new("_http._tcp.local").with_wait(wait)
}

fn ctx(localhost: bool) -> SessionContext {
  SessionContext::new([LOCAL], localhost)
}

fn feed(tx: &Sender<(SocketAddr, Vec<u8>)>, src: Ipv4Addr, data: Vec<u8>) {
  tx.try_send((from(src), data)).unwrap();
}

async fn excludes_own_packets<N: Net>() {
  let (tx, rx) = async_channel::unbounded();
  feed(&tx, LOCAL, device_packet(LOCAL, "Me._http._tcp.local", "me"));
  drop(tx);

  let params = params(Duration::from_millis(50));
  let devices = collect::<N>(rx, &ctx(false), &params).await;
  assert!(devices.is_empty());
}

async fn includes_own_packets_with_localhost<N: Net>() {
  let (tx, rx) = async_channel::unbounded();
  feed(&tx, LOCAL, device_packet(LOCAL, "Me._http._tcp.local", "me"));
  drop(tx);

  let params = params(Duration::from_millis(50)).with_localhost(true);
  let devices = collect::<N>(rx, &ctx(true), &params).await;
  assert_eq!(devices.len(), 1);
  assert_eq!(devices[0].address(), LOCAL);
  assert_eq!(devices[0].family_name().unwrap(), "me");
}

async fn ignores_queries_and_garbage<N: Net>() {
  let (tx, rx) = async_channel::unbounded();
  let query = PacketBuilder::query()
    .question("_http._tcp.local", 12)
    .a("q.local", PEER)
    .build();
  feed(&tx, PEER, query);
  // response bit with a non-standard opcode
  let odd = PacketBuilder::with_bits(0x8800).a("x.local", PEER).build();
  feed(&tx, PEER, odd);
  feed(&tx, PEER, vec![0xff; 40]);
  feed(&tx, PEER, vec![0; 11]);
  feed(&tx, OTHER_PEER, device_packet(OTHER_PEER, "Ok._http._tcp.local", "ok"));
  drop(tx);

  let params = params(Duration::from_millis(50));
  let devices = collect::<N>(rx, &ctx(false), &params).await;
  assert_eq!(devices.len(), 1);
  assert_eq!(devices[0].fqdn().unwrap(), "Ok._http._tcp.local");
}

async fn quick_returns_before_wait<N: Net>() {
  let (tx, rx) = async_channel::unbounded();
  feed(&tx, PEER, device_packet(PEER, "A._http._tcp.local", "a"));

  let params = params(Duration::from_secs(10)).with_quick(true);
  let start = Instant::now();
  let devices = collect::<N>(rx, &ctx(false), &params).await;
  assert!(start.elapsed() < Duration::from_secs(5));
  assert_eq!(devices.len(), 1);
  drop(tx);
}

async fn quick_waits_for_a_filtered_match<N: Net>() {
  let (tx, rx) = async_channel::unbounded();
  feed(&tx, PEER, device_packet(PEER, "A._http._tcp.local", "kitchen"));
  feed(&tx, OTHER_PEER, device_packet(OTHER_PEER, "B._http._tcp.local", "office"));

  let params = params(Duration::from_secs(10))
    .with_quick(true)
    .with_filter("office");
  let devices = collect::<N>(rx, &ctx(false), &params).await;
  assert_eq!(devices.len(), 1);
  assert_eq!(devices[0].address(), OTHER_PEER);
  drop(tx);
}

async fn waits_without_quick<N: Net>() {
  let (tx, rx) = async_channel::unbounded();
  feed(&tx, PEER, device_packet(PEER, "A._http._tcp.local", "a"));

  let wait = Duration::from_millis(100);
  let start = Instant::now();
  let devices = collect::<N>(rx, &ctx(false), &params(wait)).await;
  assert!(start.elapsed() >= wait);
  assert_eq!(devices.len(), 1);
  drop(tx);
}

async fn dedup_by_address_first_wins<N: Net>() {
  let (tx, rx) = async_channel::unbounded();
  feed(&tx, PEER, device_packet(PEER, "A._http._tcp.local", "first"));
  feed(&tx, PEER, device_packet(PEER, "B._http._tcp.local", "second"));
  drop(tx);

  let devices = collect::<N>(rx, &ctx(false), &params(Duration::from_millis(50))).await;
  assert_eq!(devices.len(), 1);
  assert_eq!(devices[0].family_name().unwrap(), "first");
}

async fn dedup_by_fqdn<N: Net>() {
  let (tx, rx) = async_channel::unbounded();
  feed(&tx, PEER, device_packet(PEER, "A._http._tcp.local", "first"));
  feed(&tx, PEER, device_packet(PEER, "B._http._tcp.local", "second"));
  feed(&tx, PEER, device_packet(PEER, "A._http._tcp.local", "again"));
  drop(tx);

  let params = params(Duration::from_millis(50)).with_key(DedupKey::Fqdn);
  let devices = collect::<N>(rx, &ctx(false), &params).await;
  assert_eq!(devices.len(), 2);
  assert_eq!(devices[0].family_name().unwrap(), "first");
  assert_eq!(devices[1].family_name().unwrap(), "second");
}

async fn substring_filter<N: Net>() {
  let (tx, rx) = async_channel::unbounded();
  feed(&tx, PEER, device_packet(PEER, "A._http._tcp.local", "Living Room"));
  feed(&tx, OTHER_PEER, device_packet(OTHER_PEER, "B._http._tcp.local", "living room"));
  drop(tx);

  let params = params(Duration::from_millis(50)).with_filter(Filter::substring("Living"));
  let devices = collect::<N>(rx, &ctx(false), &params).await;
  assert_eq!(devices.len(), 1);
  assert_eq!(devices[0].address(), PEER);

  let (tx, rx) = async_channel::unbounded();
  feed(&tx, OTHER_PEER, device_packet(OTHER_PEER, "B._http._tcp.local", "x"));
  drop(tx);
  let params = self::params(Duration::from_millis(50)).with_filter("192.168.1.30");
  let devices = collect::<N>(rx, &ctx(false), &params).await;
  assert_eq!(devices.len(), 1);
}

async fn panicking_predicate_excludes<N: Net>() {
  let (tx, rx) = async_channel::unbounded();
  feed(&tx, PEER, device_packet(PEER, "A._http._tcp.local", "boom"));
  feed(&tx, OTHER_PEER, device_packet(OTHER_PEER, "B._http._tcp.local", "fine"));
  drop(tx);

  let params = params(Duration::from_millis(50)).with_filter(Filter::predicate(|d| {
    if d.family_name().is_some_and(|n| n == "boom") {
      panic!("predicate failure");
    }
    true
  }));
  let devices = collect::<N>(rx, &ctx(false), &params).await;
  assert_eq!(devices.len(), 1);
  assert_eq!(devices[0].family_name().unwrap(), "fine");
}

test_suites!(tokio {
  excludes_own_packets,
  includes_own_packets_with_localhost,
  ignores_queries_and_garbage,
  quick_returns_before_wait,
  quick_waits_for_a_filtered_match,
  waits_without_quick,
  dedup_by_address_first_wins,
  dedup_by_fqdn,
  substring_filter,
  panicking_predicate_excludes,
});

test_suites!(smol {
  excludes_own_packets,
  includes_own_packets_with_localhost,
  ignores_queries_and_garbage,
  quick_returns_before_wait,
  quick_waits_for_a_filtered_match,
  waits_without_quick,
  dedup_by_address_first_wins,
  dedup_by_fqdn,
  substring_filter,
  panicking_predicate_excludes,
});

test_suites!(async_std {
  excludes_own_packets,
  includes_own_packets_with_localhost,
  ignores_queries_and_garbage,
  quick_returns_before_wait,
  quick_waits_for_a_filtered_match,
  waits_without_quick,
  dedup_by_address_first_wins,
  dedup_by_fqdn,
  substring_filter,
  panicking_predicate_excludes,
});
