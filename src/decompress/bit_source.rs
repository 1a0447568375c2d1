use super::*;

/// Pulls bits out of a DEFLATE stream, least significant bit first.
///
/// Bytes are only pulled from the slice when a read actually needs them, so
/// after any read there's always fewer than 8 spare bits being held. That
/// keeps byte alignment trivial: just throw the spare bits away.
#[derive(Clone)]
pub(crate) struct BitSource<'b> {
  current: &'b [u8],
  spare_bits: u32,
  spare_bit_count: u32,
}
impl core::fmt::Debug for BitSource<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.debug_struct("BitSource")
      .field("current", &(&self.current[..self.current.len().min(4)], self.current.len()))
      .field("spare_bits", &self.spare_bits)
      .field("spare_bit_count", &self.spare_bit_count)
      .finish()
  }
}

impl<'b> BitSource<'b> {
  #[inline]
  pub const fn new(current: &'b [u8]) -> Self {
    Self { current, spare_bits: 0, spare_bit_count: 0 }
  }

  /// Bytes not yet pulled into the bit buffer.
  #[inline]
  #[must_use]
  pub const fn remaining_bytes(&self) -> usize {
    self.current.len()
  }

  #[inline]
  #[track_caller]
  fn grab_byte(&mut self) -> PngResult<u8> {
    match self.current {
      [n, rest @ ..] => {
        self.current = rest;
        Ok(*n)
      }
      [] => Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate)),
    }
  }

  #[inline]
  fn feed(&mut self, count_after: u32) -> PngResult<()> {
    debug_assert!(count_after <= 16);
    while count_after > self.spare_bit_count {
      let new_byte = u32::from(self.grab_byte()?);
      self.spare_bits |= new_byte << self.spare_bit_count;
      self.spare_bit_count += 8;
    }
    Ok(())
  }

  /// Gets `count` bits (16 or less), with the first bit of the stream in the
  /// lowest bit of the output.
  #[inline]
  pub fn next_bits_lsb(&mut self, count: u32) -> PngResult<u32> {
    debug_assert!(count <= 16);
    if count == 0 {
      return Ok(0);
    }
    self.feed(count)?;
    let out = self.spare_bits & ((1 << count) - 1);
    self.spare_bits >>= count;
    self.spare_bit_count -= count;
    Ok(out)
  }

  #[inline]
  pub fn next_one_bit(&mut self) -> PngResult<u32> {
    self.next_bits_lsb(1)
  }

  /// Drops any bits left over from a partly used byte.
  #[inline]
  pub fn align_to_byte(&mut self) {
    self.spare_bits = 0;
    self.spare_bit_count = 0;
  }

  /// Aligns to the next byte, then takes `count` whole bytes.
  #[inline]
  #[track_caller]
  pub fn next_bytes(&mut self, count: usize) -> PngResult<&'b [u8]> {
    self.align_to_byte();
    if self.current.len() < count {
      return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate));
    }
    let (bytes, rest) = self.current.split_at(count);
    self.current = rest;
    Ok(bytes)
  }

  /// Aligns to the next byte, then appends `count` raw bytes to `out`.
  #[inline]
  pub fn copy_bytes_to(&mut self, count: usize, out: &mut Vec<u8>) -> PngResult<()> {
    let bytes = self.next_bytes(count)?;
    out
      .try_reserve(bytes.len())
      .map_err(|_| PngError::new(PngErrorKind::Alloc, DecodeStage::Inflate))?;
    out.extend_from_slice(bytes);
    Ok(())
  }
}

#[test]
fn test_bit_source_lsb_order() {
  let mut bits = BitSource::new(&[0b1010_1101, 0b0000_0011]);
  assert_eq!(bits.next_one_bit().unwrap(), 1);
  assert_eq!(bits.next_bits_lsb(2).unwrap(), 0b10);
  // crosses the byte boundary
  assert_eq!(bits.next_bits_lsb(7).unwrap(), 0b11_10101);
  assert_eq!(bits.next_bits_lsb(0).unwrap(), 0);
  assert_eq!(bits.next_bits_lsb(6).unwrap(), 0);
  assert_eq!(bits.next_one_bit().unwrap_err().kind, PngErrorKind::Malformed);
}

#[test]
fn test_bit_source_align_and_copy() {
  let mut bits = BitSource::new(&[0xFF, 1, 2, 3]);
  assert_eq!(bits.next_bits_lsb(3).unwrap(), 0b111);
  let mut out = Vec::new();
  bits.copy_bytes_to(2, &mut out).unwrap();
  assert_eq!(out, [1, 2]);
  assert_eq!(bits.remaining_bytes(), 1);
  assert!(bits.copy_bytes_to(2, &mut out).is_err());
}
