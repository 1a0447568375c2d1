use super::*;

/// `IHDR`: Image header
///
/// Interlaced images are rejected while parsing, so an `IHDR` value always
/// describes plain top-to-bottom scanlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IHDR {
  pub width: u32,
  pub height: u32,
  pub pixel_format: PngPixelFormat,
}
impl IHDR {
  /// Parses the 13 data bytes of an `IHDR` chunk.
  ///
  /// ## Failure
  /// * Wrong data length, a zero dimension, or a compression or filter method
  ///   other than 0: [`PngErrorKind::Malformed`]
  /// * Color type and bit depth that PNG doesn't allow together:
  ///   [`PngErrorKind::InvalidFormat`]
  /// * Interlaced data, or a dimension over the limits in `options`:
  ///   [`PngErrorKind::Unsupported`]
  /// * Any other interlace method: [`PngErrorKind::Malformed`]
  pub fn try_from_data(data: &[u8], options: &DecodeOptions) -> PngResult<Self> {
    let malformed = || PngError::new(PngErrorKind::Malformed, DecodeStage::Header);
    let (width, height, bit_depth, color_type, compression, filter, interlace) = match *data {
      [w0, w1, w2, w3, h0, h1, h2, h3, bit_depth, color_type, compression, filter, interlace] => (
        u32::from_be_bytes([w0, w1, w2, w3]),
        u32::from_be_bytes([h0, h1, h2, h3]),
        bit_depth,
        color_type,
        compression,
        filter,
        interlace,
      ),
      _ => return Err(malformed()),
    };
    if width == 0 || height == 0 {
      log::debug!("image is {width}x{height}");
      return Err(malformed());
    }
    if compression != 0 || filter != 0 {
      log::debug!("compression method {compression}, filter method {filter}");
      return Err(malformed());
    }
    let pixel_format = match PngPixelFormat::from_color_type_and_depth(color_type, bit_depth) {
      Some(pixel_format) => pixel_format,
      None => {
        log::debug!("color type {color_type} with bit depth {bit_depth}");
        return Err(PngError::new(PngErrorKind::InvalidFormat, DecodeStage::Header));
      }
    };
    match interlace {
      0 => (),
      1 => {
        log::debug!("interlaced images aren't supported");
        return Err(PngError::new(PngErrorKind::Unsupported, DecodeStage::Header));
      }
      _ => return Err(malformed()),
    }
    if width > options.max_width || height > options.max_height {
      log::debug!(
        "{width}x{height} is over the {}x{} limit",
        options.max_width,
        options.max_height
      );
      return Err(PngError::new(PngErrorKind::Unsupported, DecodeStage::Header));
    }
    Ok(Self { width, height, pixel_format })
  }

  /// How many bytes the zlib stream must inflate to: each scanline plus its
  /// filter byte.
  #[inline]
  #[must_use]
  pub const fn zlib_decompression_requirement(&self) -> Option<usize> {
    match self.pixel_format.bytes_per_scanline(self.width) {
      Some(bytes) => match bytes.checked_add(1) {
        Some(line) => line.checked_mul(self.height as usize),
        None => None,
      },
      None => None,
    }
  }

  /// How many bytes the decoded pixels take.
  #[inline]
  #[must_use]
  pub const fn pixel_buffer_size(&self) -> Option<usize> {
    let bpp = self.pixel_format.output_format().bytes_per_pixel();
    match (self.width as usize).checked_mul(self.height as usize) {
      Some(pixels) => pixels.checked_mul(bpp),
      None => None,
    }
  }
}

#[cfg(test)]
fn ihdr_data(width: u32, height: u32, depth: u8, color_type: u8, interlace: u8) -> [u8; 13] {
  let mut out = [0; 13];
  out[0..4].copy_from_slice(&width.to_be_bytes());
  out[4..8].copy_from_slice(&height.to_be_bytes());
  out[8] = depth;
  out[9] = color_type;
  out[12] = interlace;
  out
}

#[test]
fn test_ihdr_parse() {
  let o = DecodeOptions::default();
  let ihdr = IHDR::try_from_data(&ihdr_data(3, 2, 8, 6, 0), &o).unwrap();
  assert_eq!(ihdr, IHDR { width: 3, height: 2, pixel_format: PngPixelFormat::RGBA8 });
  assert_eq!(ihdr.zlib_decompression_requirement(), Some(2 * (1 + 12)));
  assert_eq!(ihdr.pixel_buffer_size(), Some(24));

  let ihdr = IHDR::try_from_data(&ihdr_data(10, 1, 2, 3, 0), &o).unwrap();
  assert_eq!(ihdr.zlib_decompression_requirement(), Some(1 + 3));
  assert_eq!(ihdr.pixel_buffer_size(), Some(30));
}

#[test]
fn test_ihdr_errors() {
  let o = DecodeOptions::default();
  let kind = |data: &[u8]| IHDR::try_from_data(data, &o).unwrap_err().kind;
  assert_eq!(kind(&ihdr_data(3, 2, 8, 6, 0)[..12]), PngErrorKind::Malformed);
  assert_eq!(kind(&ihdr_data(0, 2, 8, 6, 0)), PngErrorKind::Malformed);
  assert_eq!(kind(&ihdr_data(3, 0, 8, 6, 0)), PngErrorKind::Malformed);
  assert_eq!(kind(&ihdr_data(3, 2, 16, 3, 0)), PngErrorKind::InvalidFormat);
  assert_eq!(kind(&ihdr_data(3, 2, 8, 5, 0)), PngErrorKind::InvalidFormat);
  assert_eq!(kind(&ihdr_data(3, 2, 8, 6, 1)), PngErrorKind::Unsupported);
  assert_eq!(kind(&ihdr_data(3, 2, 8, 6, 2)), PngErrorKind::Malformed);
  assert_eq!(kind(&ihdr_data(17_001, 2, 8, 6, 0)), PngErrorKind::Unsupported);
  let mut data = ihdr_data(3, 2, 8, 6, 0);
  data[10] = 1;
  assert_eq!(kind(&data), PngErrorKind::Malformed);
  let mut data = ihdr_data(3, 2, 8, 6, 0);
  data[11] = 1;
  assert_eq!(kind(&data), PngErrorKind::Malformed);

  let small = DecodeOptions::default().with_max_dimensions(2, 2);
  assert!(IHDR::try_from_data(&ihdr_data(3, 2, 8, 6, 0), &small).is_err());
  assert!(IHDR::try_from_data(&ihdr_data(2, 2, 8, 6, 0), &small).is_ok());
}
