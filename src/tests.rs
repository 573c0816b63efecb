use core::future::Future;
use std::net::Ipv4Addr;

macro_rules! test_suites {
  ($runtime:ident {
    $($name:ident),+$(,)?
  }) => {
    $(
      paste::paste! {
        #[test]
        fn [< $runtime _ $name >]() {
          $crate::tests::[< $runtime _run >]($name::<agnostic_net::[< $runtime >]::Net>());
        }
      }
    )*
  }
}

mod collect;
mod discovery;

/// Builds mDNS packets for the tests, records go to the answer section until
/// [`PacketBuilder::additionals`] is called.
pub(crate) struct PacketBuilder {
  bits: u16,
  counts: [u16; 4],
  questions: Vec<u8>,
  answers: Vec<u8>,
  additionals: Vec<u8>,
  in_additionals: bool,
}

impl PacketBuilder {
  /// An authoritative response.
  pub(crate) fn response() -> Self {
    Self::with_bits(0x8400)
  }

  /// A standard query.
  pub(crate) fn query() -> Self {
    Self::with_bits(0)
  }

  pub(crate) fn with_bits(bits: u16) -> Self {
    Self {
      bits,
      counts: [0; 4],
      questions: Vec::new(),
      answers: Vec::new(),
      additionals: Vec::new(),
      in_additionals: false,
    }
  }

  pub(crate) fn additionals(mut self) -> Self {
    self.in_additionals = true;
    self
  }

  fn name(buf: &mut Vec<u8>, name: &str) {
    for l in name.split('.').filter(|l| !l.is_empty()) {
      buf.push(l.len() as u8);
      buf.extend_from_slice(l.as_bytes());
    }
    buf.push(0);
  }

  pub(crate) fn question(mut self, name: &str, ty: u16) -> Self {
    Self::name(&mut self.questions, name);
    self.questions.extend_from_slice(&ty.to_be_bytes());
    self.questions.extend_from_slice(&1u16.to_be_bytes());
    self.counts[0] += 1;
    self
  }

  fn record(mut self, name: &str, ty: u16, rdata: &[u8]) -> Self {
    let (buf, count) = if self.in_additionals {
      (&mut self.additionals, &mut self.counts[3])
    } else {
      (&mut self.answers, &mut self.counts[1])
    };
    Self::name(buf, name);
    buf.extend_from_slice(&ty.to_be_bytes());
    // IN with the cache-flush bit
    buf.extend_from_slice(&0x8001u16.to_be_bytes());
    buf.extend_from_slice(&120u32.to_be_bytes());
    buf.extend_from_slice(&(rdata.len() as u16).to_be_bytes());
    buf.extend_from_slice(rdata);
    *count += 1;
    self
  }

  pub(crate) fn a(self, name: &str, addr: Ipv4Addr) -> Self {
    self.record(name, 1, &addr.octets())
  }

  pub(crate) fn ptr(self, owner: &str, target: &str) -> Self {
    let mut rdata = Vec::new();
    Self::name(&mut rdata, target);
    self.record(owner, 12, &rdata)
  }

  pub(crate) fn srv(self, owner: &str, port: u16, target: &str) -> Self {
    let mut rdata = vec![0, 0, 0, 0];
    rdata.extend_from_slice(&port.to_be_bytes());
    Self::name(&mut rdata, target);
    self.record(owner, 33, &rdata)
  }

  pub(crate) fn txt(self, owner: &str, entries: &[&str]) -> Self {
    let mut rdata = Vec::new();
    for e in entries {
      rdata.push(e.len() as u8);
      rdata.extend_from_slice(e.as_bytes());
    }
    self.record(owner, 16, &rdata)
  }

  pub(crate) fn build(self) -> Vec<u8> {
    let mut buf = Vec::with_capacity(
      12 + self.questions.len() + self.answers.len() + self.additionals.len(),
    );
    buf.extend_from_slice(&0u16.to_be_bytes());
    buf.extend_from_slice(&self.bits.to_be_bytes());
    for c in self.counts {
      buf.extend_from_slice(&c.to_be_bytes());
    }
    buf.extend_from_slice(&self.questions);
    buf.extend_from_slice(&self.answers);
    buf.extend_from_slice(&self.additionals);
    buf
  }
}

/// Initialize the tracing for the unit tests.
pub fn initialize_tests_tracing() {
  use std::sync::Once;
  static TRACE: Once = Once::new();
  TRACE.call_once(|| {
    let filter =
      std::env::var("MDNS_DISCOVER_TESTING_LOG").unwrap_or_else(|_| "mdns_discover=debug".to_owned());
    tracing::subscriber::set_global_default(
      tracing_subscriber::fmt::fmt()
        .without_time()
        .with_line_number(true)
        .with_env_filter(filter)
        .with_file(false)
        .with_target(true)
        .with_ansi(true)
        .finish(),
    )
    .unwrap();
  });
}

fn tokio_run<F>(f: F)
where
  F: Future<Output = ()>,
{
  initialize_tests_tracing();

  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .unwrap()
    .block_on(f);
}

fn smol_run<F>(f: F)
where
  F: Future<Output = ()>,
{
  initialize_tests_tracing();
  smol::block_on(f);
}

fn async_std_run<F>(f: F)
where
  F: Future<Output = ()>,
{
  initialize_tests_tracing();
  async_std::task::block_on(f);
}
