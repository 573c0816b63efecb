use core::fmt;
use std::net::Ipv4Addr;

use smallvec_wrapper::SmallVec;
use smol_str::SmolStr;
use triomphe::Arc;

use crate::{Message, Record, RecordData, Srv, Txt};

const MODEL_KEYS: &[&str] = &["md", "model", "ty", "product", "usb_MDL", "am"];
const FAMILY_KEYS: &[&str] = &["fn", "friendlyName", "n", "name"];

/// The service part of a [`DiscoveredDevice`], taken from an SRV record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Service {
  port: u16,
  protocol: Option<SmolStr>,
  ty: Option<SmolStr>,
}

impl Service {
  /// Returns the port announced by the SRV record.
  #[inline]
  pub const fn port(&self) -> u16 {
    self.port
  }

  /// Returns the transport protocol of the service, e.g. `tcp`.
  #[inline]
  pub const fn protocol(&self) -> Option<&SmolStr> {
    self.protocol.as_ref()
  }

  /// Returns the service type, e.g. `http`.
  #[inline]
  pub const fn ty(&self) -> Option<&SmolStr> {
    self.ty.as_ref()
  }
}

impl fmt::Display for Service {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match (&self.ty, &self.protocol) {
      (Some(ty), Some(proto)) => write!(f, "_{ty}._{proto}:{}", self.port),
      _ => write!(f, ":{}", self.port),
    }
  }
}

/// A device found in a response packet.
///
/// Fields that cannot be determined from the packet are `None`.
#[derive(Debug, Clone)]
pub struct DiscoveredDevice {
  address: Ipv4Addr,
  fqdn: Option<SmolStr>,
  model_name: Option<SmolStr>,
  family_name: Option<SmolStr>,
  service: Option<Service>,
  packet: Arc<Message>,
}

impl DiscoveredDevice {
  /// Returns the IPv4 address of the device.
  #[inline]
  pub const fn address(&self) -> Ipv4Addr {
    self.address
  }

  /// Returns the fully qualified name of the device.
  #[inline]
  pub const fn fqdn(&self) -> Option<&SmolStr> {
    self.fqdn.as_ref()
  }

  /// Returns the model name found in the TXT record.
  #[inline]
  pub const fn model_name(&self) -> Option<&SmolStr> {
    self.model_name.as_ref()
  }

  /// Returns the friendly name found in the TXT record.
  #[inline]
  pub const fn family_name(&self) -> Option<&SmolStr> {
    self.family_name.as_ref()
  }

  /// Returns the announced service.
  #[inline]
  pub const fn service(&self) -> Option<&Service> {
    self.service.as_ref()
  }

  /// Returns the packet the device was found in.
  #[inline]
  pub fn packet(&self) -> &Message {
    &self.packet
  }
}

/// Extracts the devices announced by a response packet.
///
/// One device is returned per service instance, i.e. per PTR target or SRV
/// owner. A packet without any instance yields a single device describing
/// the packet as a whole. `source` is the sender of the packet and the
/// fallback address; `queried` are the names the query asked for, used to
/// tell the service type and protocol apart.
pub fn resolve(message: Message, source: Ipv4Addr, queried: &[SmolStr]) -> Vec<DiscoveredDevice> {
  let message = Arc::new(message);
  let records: SmallVec<&Record> = message.answers_and_additionals().collect();

  // (instance, owner of the PTR pointing at it)
  let mut instances: SmallVec<(&SmolStr, Option<&SmolStr>)> = SmallVec::new();
  for r in records.iter() {
    if let RecordData::PTR(target) = r.data() {
      if !instances.iter().any(|(i, _)| i.eq_ignore_ascii_case(target)) {
        instances.push((target, Some(r.name())));
      }
    }
  }
  for r in records.iter() {
    if let RecordData::SRV(_) = r.data() {
      if !instances.iter().any(|(i, _)| i.eq_ignore_ascii_case(r.name())) {
        instances.push((r.name(), None));
      }
    }
  }

  if instances.is_empty() {
    let txt = records.iter().find_map(|r| match r.data() {
      RecordData::TXT(txt) => Some(txt),
      _ => None,
    });
    return vec![DiscoveredDevice {
      address: first_a(&records).unwrap_or(source),
      fqdn: None,
      model_name: txt.and_then(|t| t.find_any(MODEL_KEYS)).cloned(),
      family_name: txt.and_then(|t| t.find_any(FAMILY_KEYS)).cloned(),
      service: None,
      packet: message.clone(),
    }];
  }

  instances
    .iter()
    .map(|(instance, ptr_owner)| {
      let srv = find_owned(&records, instance, |d| match d {
        RecordData::SRV(srv) => Some(srv),
        _ => None,
      });
      let txt: Option<&Txt> = find_owned(&records, instance, |d| match d {
        RecordData::TXT(txt) => Some(txt),
        _ => None,
      });

      let address = srv
        .and_then(|srv| {
          find_owned(&records, srv.target(), |d| match d {
            RecordData::A(addr) => Some(*addr),
            _ => None,
          })
        })
        .or_else(|| first_a(&records))
        .unwrap_or(source);

      let fqdn = match ptr_owner {
        Some(_) => Some((*instance).clone()),
        None => srv.map(|srv| srv.target().clone()),
      };

      DiscoveredDevice {
        address,
        fqdn,
        model_name: txt.and_then(|t| t.find_any(MODEL_KEYS)).cloned(),
        family_name: txt.and_then(|t| t.find_any(FAMILY_KEYS)).cloned(),
        service: srv.map(|srv| service(srv, instance, *ptr_owner, queried)),
        packet: message.clone(),
      }
    })
    .collect()
}

fn find_owned<'a, T>(
  records: &[&'a Record],
  owner: &str,
  f: impl Fn(&'a RecordData) -> Option<T>,
) -> Option<T> {
  records
    .iter()
    .filter(|r| r.name().eq_ignore_ascii_case(owner))
    .find_map(|r| f(r.data()))
}

fn first_a(records: &[&Record]) -> Option<Ipv4Addr> {
  records.iter().find_map(|r| match r.data() {
    RecordData::A(addr) => Some(*addr),
    _ => None,
  })
}

fn service(srv: &Srv, instance: &str, ptr_owner: Option<&SmolStr>, queried: &[SmolStr]) -> Service {
  // the PTR owner is the service name; without one, drop the instance label
  let announced = match ptr_owner {
    Some(owner) => owner.as_str(),
    None => instance.split_once('.').map_or("", |(_, rest)| rest),
  };
  let announced = announced.trim_end_matches('.');

  let (ty, protocol) = queried
    .iter()
    .map(|q| q.trim_end_matches('.'))
    .find(|q| {
      q.eq_ignore_ascii_case(announced)
        || announced
          .len()
          .checked_sub(q.len() + 1)
          .is_some_and(|at| {
            announced.as_bytes()[at] == b'.' && announced[at + 1..].eq_ignore_ascii_case(q)
          })
    })
    .map(split_service_name)
    .unwrap_or_default();

  Service {
    port: srv.port(),
    protocol,
    ty,
  }
}

/// Splits `_http._tcp.local` into `(Some("http"), Some("tcp"))`.
fn split_service_name(name: &str) -> (Option<SmolStr>, Option<SmolStr>) {
  let labels: SmallVec<&str> = name.split('.').collect();
  let Some(at) = labels
    .iter()
    .position(|l| l.eq_ignore_ascii_case("_tcp") || l.eq_ignore_ascii_case("_udp"))
  else {
    return (None, None);
  };

  let protocol = SmolStr::new(&labels[at][1..]);
  let ty = at
    .checked_sub(1)
    .and_then(|idx| labels[idx].strip_prefix('_'))
    .filter(|ty| !ty.is_empty())
    .map(SmolStr::new);
  (ty, Some(protocol))
}
