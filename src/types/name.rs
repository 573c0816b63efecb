use smol_str::SmolStr;

use super::{
  COMPRESSION_OFFSET_MASK, COMPRESSION_POINTER_MASK, DecodeError, EncodeError, MAX_LABEL_LEN,
  MAX_NAME_LEN, MAX_POINTER_HOPS, not_enough_data,
};

/// Reads a possibly compressed name starting at `off`.
///
/// Returns the dot-joined name and the offset just past the name as it
/// appears at `off`, i.e. after the terminating zero or after the first
/// compression pointer.
pub(super) fn decode(src: &[u8], off: usize) -> Result<(SmolStr, usize), DecodeError> {
  let mut name = Vec::new();
  let mut cursor = off;
  let mut end = None;
  let mut hops = 0;

  loop {
    let Some(&len) = src.get(cursor) else {
      return Err(not_enough_data(1, 0));
    };

    match len {
      0 => {
        cursor += 1;
        break;
      }
      1..=63 => {
        let start = cursor + 1;
        let stop = start + len as usize;
        let Some(label) = src.get(start..stop) else {
          return Err(not_enough_data(len as usize, src.len().saturating_sub(start)));
        };

        let needed = if name.is_empty() { 0 } else { 1 } + label.len();
        if name.len() + needed > MAX_NAME_LEN {
          return Err(DecodeError::NameTooLong);
        }

        if !name.is_empty() {
          name.push(b'.');
        }
        name.extend_from_slice(label);
        cursor = stop;
      }
      len if len & COMPRESSION_POINTER_MASK == COMPRESSION_POINTER_MASK => {
        let Some(&low) = src.get(cursor + 1) else {
          return Err(not_enough_data(2, 1));
        };

        let target = (u16::from_be_bytes([len, low]) & COMPRESSION_OFFSET_MASK) as usize;
        // backward-only, which also rules out self references
        if target >= cursor {
          return Err(DecodeError::InvalidPointer {
            position: cursor,
            target,
          });
        }

        hops += 1;
        if hops > MAX_POINTER_HOPS {
          return Err(DecodeError::TooManyPointers);
        }

        end.get_or_insert(cursor + 2);
        cursor = target;
      }
      len => return Err(DecodeError::InvalidLabelLength(len)),
    }
  }

  let name = match String::from_utf8(name) {
    Ok(s) => SmolStr::from(s),
    Err(e) => SmolStr::from(String::from_utf8_lossy(e.as_bytes())),
  };
  Ok((name, end.unwrap_or(cursor)))
}

/// Appends `name` as a sequence of literal labels terminated by the root label.
pub(super) fn encode(name: &str, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
  let name = name.strip_suffix('.').unwrap_or(name);
  if name.len() > MAX_NAME_LEN {
    return Err(EncodeError::NameTooLong(name.len()));
  }

  if !name.is_empty() {
    for label in name.split('.') {
      let len = label.len();
      if len == 0 {
        return Err(EncodeError::EmptyLabel(SmolStr::new(name)));
      }

      if len > MAX_LABEL_LEN {
        return Err(EncodeError::LabelTooLong {
          label: SmolStr::new(label),
          len,
        });
      }

      buf.push(len as u8);
      buf.extend_from_slice(label.as_bytes());
    }
  }

  buf.push(0);
  Ok(())
}
