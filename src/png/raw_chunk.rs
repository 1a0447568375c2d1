use super::*;

/// The four ASCII bytes naming a chunk's type.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct PngChunkType(pub [u8; 4]);
#[allow(nonstandard_style)]
impl PngChunkType {
  pub const IHDR: Self = Self(*b"IHDR");
  pub const PLTE: Self = Self(*b"PLTE");
  pub const IDAT: Self = Self(*b"IDAT");
  pub const IEND: Self = Self(*b"IEND");

  /// Critical chunks have an uppercase first letter (bit 5 clear).
  ///
  /// A decoder that sees a critical chunk it doesn't know can't safely show
  /// the image.
  #[inline]
  #[must_use]
  pub const fn is_critical(self) -> bool {
    (self.0[0] & 0b10_0000) == 0
  }
}
impl Debug for PngChunkType {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.write_char(self.0[0] as char)?;
    f.write_char(self.0[1] as char)?;
    f.write_char(self.0[2] as char)?;
    f.write_char(self.0[3] as char)?;
    Ok(())
  }
}

/// An unparsed chunk from a PNG.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RawPngChunk<'b> {
  pub(crate) type_: PngChunkType,
  pub(crate) data: &'b [u8],
  pub(crate) declared_crc: u32,
}
impl Debug for RawPngChunk<'_> {
  #[inline]
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("RawPngChunk")
      .field("type_", &self.type_)
      .field("data", &(&self.data[..self.data.len().min(12)], self.data.len()))
      .field("declared_crc", &self.declared_crc)
      .finish()
  }
}
impl<'b> RawPngChunk<'b> {
  #[inline]
  #[must_use]
  pub const fn type_(&self) -> PngChunkType {
    self.type_
  }

  #[inline]
  #[must_use]
  pub const fn data(&self) -> &'b [u8] {
    self.data
  }

  /// The CRC value stored in the datastream.
  #[inline]
  #[must_use]
  pub const fn declared_crc(&self) -> u32 {
    self.declared_crc
  }

  /// The CRC of this chunk's type and data.
  #[inline]
  #[must_use]
  pub fn actual_crc(&self) -> u32 {
    let mut crc = Crc32::new();
    crc.update(&self.type_.0);
    crc.update(self.data);
    crc.finish()
  }

  /// If the declared and actual CRC values match.
  #[inline]
  #[must_use]
  pub fn crc_is_valid(&self) -> bool {
    self.declared_crc == self.actual_crc()
  }
}

/// An iterator that produces successive raw chunks from PNG bytes.
///
/// * Chunks that are cut short produce a [`PngErrorKind::Malformed`] error,
///   as does a length over `2^31 - 1`.
/// * After an error the iterator is finished.
/// * The iterator doesn't check CRC values, use
///   [`crc_is_valid`](RawPngChunk::crc_is_valid) for that.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct RawPngChunkIter<'b>(pub(crate) &'b [u8]);
impl<'b> RawPngChunkIter<'b> {
  /// Pass the full PNG bytes, it will remove the PNG signature automatically.
  ///
  /// The signature isn't checked, see [`is_png_signature`] for that.
  #[inline]
  pub const fn new(bytes: &'b [u8]) -> Self {
    match bytes {
      [_, _, _, _, _, _, _, _, rest @ ..] => Self(rest),
      _ => Self(&[]),
    }
  }
}
impl<'b> Iterator for RawPngChunkIter<'b> {
  type Item = PngResult<RawPngChunk<'b>>;
  #[inline]
  fn next(&mut self) -> Option<Self::Item> {
    if self.0.is_empty() {
      return None;
    }
    let bytes = core::mem::take(&mut self.0);
    let (len, type_, rest) = match bytes {
      [l0, l1, l2, l3, t0, t1, t2, t3, rest @ ..] => {
        (u32::from_be_bytes([*l0, *l1, *l2, *l3]), PngChunkType([*t0, *t1, *t2, *t3]), rest)
      }
      _ => return Some(Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Chunks))),
    };
    if len > i32::MAX as u32 {
      log::debug!("{type_:?} chunk declares a length of {len}");
      return Some(Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Chunks)));
    }
    let len = len as usize;
    if rest.len() < len + 4 {
      log::debug!("{type_:?} chunk is truncated");
      return Some(Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Chunks)));
    }
    let (data, rest) = rest.split_at(len);
    let (crc_bytes, rest) = rest.split_at(4);
    let declared_crc = match crc_bytes {
      [c0, c1, c2, c3] => u32::from_be_bytes([*c0, *c1, *c2, *c3]),
      _ => return Some(Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Chunks))),
    };
    self.0 = rest;
    Some(Ok(RawPngChunk { type_, data, declared_crc }))
  }
}
impl core::iter::FusedIterator for RawPngChunkIter<'_> {}

#[test]
fn test_chunk_type_is_critical() {
  assert!(PngChunkType::IHDR.is_critical());
  assert!(PngChunkType::IDAT.is_critical());
  assert!(!PngChunkType(*b"tEXt").is_critical());
  assert!(!PngChunkType(*b"gAMA").is_critical());
  assert!(PngChunkType(*b"ABCD").is_critical());
}

#[test]
fn test_raw_chunk_iter() {
  let mut png = PNG_SIGNATURE.to_vec();
  // a zero length IEND
  png.extend_from_slice(&[0, 0, 0, 0]);
  png.extend_from_slice(b"IEND");
  png.extend_from_slice(&0xAE42_6082_u32.to_be_bytes());
  let mut it = RawPngChunkIter::new(&png);
  let chunk = it.next().unwrap().unwrap();
  assert_eq!(chunk.type_(), PngChunkType::IEND);
  assert!(chunk.data().is_empty());
  assert!(chunk.crc_is_valid());
  assert!(it.next().is_none());

  // chop off part of the CRC
  let mut it = RawPngChunkIter::new(&png[..png.len() - 1]);
  assert_eq!(it.next().unwrap().unwrap_err().kind, PngErrorKind::Malformed);
  assert!(it.next().is_none());

  // absurd length
  let mut bad = PNG_SIGNATURE.to_vec();
  bad.extend_from_slice(&[0x80, 0, 0, 0]);
  bad.extend_from_slice(b"IDAT");
  let mut it = RawPngChunkIter::new(&bad);
  assert_eq!(it.next().unwrap().unwrap_err().kind, PngErrorKind::Malformed);
  assert!(it.next().is_none());
}
