use super::{DecodeError, MESSAGE_HEADER_SIZE, Question, Record, not_enough_data};

const QR_BIT: u16 = 1 << 15;
const OPCODE_SHIFT: u16 = 11;
const AA_BIT: u16 = 1 << 10;
const TC_BIT: u16 = 1 << 9;
const RD_BIT: u16 = 1 << 8;
const RA_BIT: u16 = 1 << 7;
const Z_BIT: u16 = 1 << 6;
const AD_BIT: u16 = 1 << 5;
const CD_BIT: u16 = 1 << 4;
const NIBBLE: u16 = 0xF;

/// The fixed 12 byte header of a message.
///
/// ```text
///                                 1  1  1  1  1  1
///   0  1  2  3  4  5  6  7  8  9  0  1  2  3  4  5
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                      ID                       |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |QR|   Opcode  |AA|TC|RD|RA| Z|AD|CD|   RCODE   |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    QDCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ANCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    NSCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// |                    ARCOUNT                    |
/// +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
  id: u16,
  bits: u16,
  questions: u16,
  answers: u16,
  authorities: u16,
  additionals: u16,
}

impl Header {
  /// Returns the transaction id.
  #[inline]
  pub const fn id(&self) -> u16 {
    self.id
  }

  /// Returns `true` for a response, `false` for a query.
  #[inline]
  pub const fn qr(&self) -> bool {
    self.bits & QR_BIT != 0
  }

  /// Returns the opcode, `0` being a standard query.
  #[inline]
  pub const fn opcode(&self) -> u8 {
    ((self.bits >> OPCODE_SHIFT) & NIBBLE) as u8
  }

  /// Returns the authoritative answer bit.
  #[inline]
  pub const fn authoritative(&self) -> bool {
    self.bits & AA_BIT != 0
  }

  /// Returns the truncated bit.
  #[inline]
  pub const fn truncated(&self) -> bool {
    self.bits & TC_BIT != 0
  }

  /// Returns the recursion desired bit.
  #[inline]
  pub const fn recursion_desired(&self) -> bool {
    self.bits & RD_BIT != 0
  }

  /// Returns the recursion available bit.
  #[inline]
  pub const fn recursion_available(&self) -> bool {
    self.bits & RA_BIT != 0
  }

  /// Returns the reserved bit.
  #[inline]
  pub const fn reserved(&self) -> bool {
    self.bits & Z_BIT != 0
  }

  /// Returns the authentic data bit.
  #[inline]
  pub const fn authentic_data(&self) -> bool {
    self.bits & AD_BIT != 0
  }

  /// Returns the checking disabled bit.
  #[inline]
  pub const fn checking_disabled(&self) -> bool {
    self.bits & CD_BIT != 0
  }

  /// Returns the response code.
  #[inline]
  pub const fn response_code(&self) -> u8 {
    (self.bits & NIBBLE) as u8
  }

  /// Returns the declared number of questions.
  #[inline]
  pub const fn questions(&self) -> u16 {
    self.questions
  }

  /// Returns the declared number of answers.
  #[inline]
  pub const fn answers(&self) -> u16 {
    self.answers
  }

  /// Returns the declared number of authority records.
  #[inline]
  pub const fn authorities(&self) -> u16 {
    self.authorities
  }

  /// Returns the declared number of additional records.
  #[inline]
  pub const fn additionals(&self) -> u16 {
    self.additionals
  }

  fn decode(src: &[u8]) -> Result<Self, DecodeError> {
    if src.len() < MESSAGE_HEADER_SIZE {
      return Err(not_enough_data(MESSAGE_HEADER_SIZE, src.len()));
    }

    let word = |i: usize| u16::from_be_bytes([src[i], src[i + 1]]);
    Ok(Self {
      id: word(0),
      bits: word(2),
      questions: word(4),
      answers: word(6),
      authorities: word(8),
      additionals: word(10),
    })
  }
}

/// A decoded message.
///
/// A message only exists fully decoded: every section holds exactly as many
/// entries as the header declares.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
  header: Header,
  questions: Vec<Question>,
  answers: Vec<Record>,
  authorities: Vec<Record>,
  additionals: Vec<Record>,
}

impl Message {
  /// Returns the header.
  #[inline]
  pub const fn header(&self) -> &Header {
    &self.header
  }

  /// Returns the question section.
  #[inline]
  pub fn questions(&self) -> &[Question] {
    &self.questions
  }

  /// Returns the answer section.
  #[inline]
  pub fn answers(&self) -> &[Record] {
    &self.answers
  }

  /// Returns the authority section.
  #[inline]
  pub fn authorities(&self) -> &[Record] {
    &self.authorities
  }

  /// Returns the additional section.
  #[inline]
  pub fn additionals(&self) -> &[Record] {
    &self.additionals
  }

  /// Iterates over the answer records followed by the additional records.
  #[inline]
  pub fn answers_and_additionals(&self) -> impl Iterator<Item = &Record> {
    self.answers.iter().chain(self.additionals.iter())
  }

  /// Decodes a message, reporting why the bytes are not a message.
  ///
  /// See [`parse`](crate::parse) for the variant used by the discovery engine.
  pub fn decode(src: &[u8]) -> Result<Self, DecodeError> {
    let header = Header::decode(src)?;
    if header.questions == 0
      && header.answers == 0
      && header.authorities == 0
      && header.additionals == 0
    {
      return Err(DecodeError::Empty);
    }

    let mut off = MESSAGE_HEADER_SIZE;

    // Don't pre-allocate, counts are under attacker control
    let mut questions = Vec::new();
    for _ in 0..header.questions {
      let (q, noff) = Question::decode(src, off)?;
      off = noff;
      questions.push(q);
    }

    let (answers, off) = Self::decode_rr_slice(src, off, header.answers)?;
    let (authorities, off) = Self::decode_rr_slice(src, off, header.authorities)?;
    let (additionals, _) = Self::decode_rr_slice(src, off, header.additionals)?;

    Ok(Self {
      header,
      questions,
      answers,
      authorities,
      additionals,
    })
  }

  fn decode_rr_slice(
    src: &[u8],
    mut off: usize,
    count: u16,
  ) -> Result<(Vec<Record>, usize), DecodeError> {
    let mut records = Vec::new();
    for _ in 0..count {
      let (r, noff) = Record::decode(src, off)?;
      off = noff;
      records.push(r);
    }

    Ok((records, off))
  }
}
