/// Settings that control how strict the decoder is.
///
/// The defaults limit the width and height of images to 17,000 or less to
/// prevent accidental out-of-memory problems, and check every checksum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodeOptions {
  /// Images wider than this are [`Unsupported`](crate::PngErrorKind).
  pub max_width: u32,
  /// Images taller than this are [`Unsupported`](crate::PngErrorKind).
  pub max_height: u32,
  /// Compare each chunk's CRC-32 with its declared value.
  pub verify_crc: bool,
  /// Compare the zlib stream's Adler-32 trailer with the inflated data.
  pub verify_adler32: bool,
}
impl DecodeOptions {
  /// The default dimension limit.
  pub const DEFAULT_MAX_DIMENSION: u32 = 17_000;

  /// The default settings.
  #[inline]
  #[must_use]
  pub const fn new() -> Self {
    Self {
      max_width: Self::DEFAULT_MAX_DIMENSION,
      max_height: Self::DEFAULT_MAX_DIMENSION,
      verify_crc: true,
      verify_adler32: true,
    }
  }

  /// Sets the dimension limits.
  #[inline]
  #[must_use]
  pub const fn with_max_dimensions(self, max_width: u32, max_height: u32) -> Self {
    Self { max_width, max_height, ..self }
  }

  /// Turns CRC-32 checking on or off.
  #[inline]
  #[must_use]
  pub const fn with_verify_crc(self, verify_crc: bool) -> Self {
    Self { verify_crc, ..self }
  }

  /// Turns Adler-32 checking on or off.
  #[inline]
  #[must_use]
  pub const fn with_verify_adler32(self, verify_adler32: bool) -> Self {
    Self { verify_adler32, ..self }
  }

  /// Turns both checksum checks off.
  #[inline]
  #[must_use]
  pub const fn without_checksums(self) -> Self {
    self.with_verify_crc(false).with_verify_adler32(false)
  }
}
impl Default for DecodeOptions {
  #[inline]
  fn default() -> Self {
    Self::new()
  }
}
