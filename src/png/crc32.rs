//! CRC-32 (ISO 3309, the same polynomial as zlib's `crc32`), which PNG stores
//! after every chunk.

static CRC_TABLE: [u32; 256] = crc_table();

/// Byte `n` of the table is the CRC of that byte processed alone, with no
/// pre or post conditioning.
const fn crc_table() -> [u32; 256] {
  let mut table = [0_u32; 256];
  let mut n = 0;
  while n < table.len() {
    let mut c = n as u32;
    let mut bit = 0;
    while bit < 8 {
      // xor in the reversed polynomial only when the low bit was set.
      c = (c >> 1) ^ (0xEDB8_8320 & (c & 1).wrapping_neg());
      bit += 1;
    }
    table[n] = c;
    n += 1;
  }
  table
}

/// A CRC-32 that's still taking in bytes.
///
/// ```
/// # use upng::png::Crc32;
/// let mut crc = Crc32::new();
/// crc.update(b"IE");
/// crc.update(b"ND");
/// assert_eq!(crc.finish(), 0xAE42_6082);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Crc32(u32);
impl Crc32 {
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self(u32::MAX)
  }

  #[inline]
  pub fn update(&mut self, bytes: &[u8]) {
    for &byte in bytes {
      self.push(byte);
    }
  }

  #[inline]
  fn push(&mut self, byte: u8) {
    let i = usize::from(self.0 as u8 ^ byte);
    self.0 = CRC_TABLE[i] ^ (self.0 >> 8);
  }

  /// The final CRC value.
  #[inline]
  #[must_use]
  pub const fn finish(self) -> u32 {
    self.0 ^ u32::MAX
  }
}
impl Default for Crc32 {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}

/// The CRC-32 of some bytes.
///
/// For a chunk the bytes covered are the chunk's type followed by its data
/// (not the length).
#[inline]
#[must_use]
pub fn png_crc(iter: impl Iterator<Item = u8>) -> u32 {
  let mut crc = Crc32::new();
  iter.for_each(|byte| crc.push(byte));
  crc.finish()
}

#[test]
fn test_png_crc() {
  assert_eq!(png_crc(b"IEND".iter().copied()), 0xAE42_6082);
  assert_eq!(png_crc(b"123456789".iter().copied()), 0xCBF4_3926);
  assert_eq!(png_crc(core::iter::empty()), 0);
  assert_eq!(CRC_TABLE[1], 0x7707_3096);
  assert_eq!(CRC_TABLE[255], 0x2D02_EF8D);
}
