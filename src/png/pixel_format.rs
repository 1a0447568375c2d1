#![allow(non_camel_case_types)]

/// The color models that PNG supports.
///
/// The discriminant is the color type value used in the `IHDR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ColorModel {
  /// Greyscale
  Luminance = 0,
  /// Red, green, blue
  Rgb = 2,
  /// Palette indexes, which become [`Rgb`](ColorModel::Rgb) once looked up
  Indexed = 3,
  /// Greyscale with alpha
  LuminanceAlpha = 4,
  /// Red, green, blue, alpha
  Rgba = 6,
}
impl ColorModel {
  /// Channels in each stored pixel.
  #[inline]
  #[must_use]
  pub const fn channels(self) -> u8 {
    match self {
      Self::Luminance | Self::Indexed => 1,
      Self::LuminanceAlpha => 2,
      Self::Rgb => 3,
      Self::Rgba => 4,
    }
  }
}

/// The pixel formats allowed in a PNG file.
///
/// This combines a channel ordering with a bit depth per channel, and only
/// the combinations that PNG actually allows exist.
///
/// * The Greyscale (`Y`) and Indexed (`I`) formats allow for pixels that are
///   only 1, 2, or 4 bits each. In this case, the pixels are tightly packed
///   into bytes, with the left-most pixel being the highest bits of the byte.
/// * 16-bit channels are big-endian.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum PngPixelFormat {
  Y1,
  Y2,
  Y4,
  Y8,
  Y16,
  RGB8,
  RGB16,
  I1,
  I2,
  I4,
  I8,
  YA8,
  YA16,
  RGBA8,
  RGBA16,
}
impl PngPixelFormat {
  /// Pairs a color type with a bit depth, if PNG allows that pairing.
  #[inline]
  #[must_use]
  pub const fn from_color_type_and_depth(color_type: u8, bit_depth: u8) -> Option<Self> {
    Some(match (color_type, bit_depth) {
      (0, 1) => Self::Y1,
      (0, 2) => Self::Y2,
      (0, 4) => Self::Y4,
      (0, 8) => Self::Y8,
      (0, 16) => Self::Y16,
      (2, 8) => Self::RGB8,
      (2, 16) => Self::RGB16,
      (3, 1) => Self::I1,
      (3, 2) => Self::I2,
      (3, 4) => Self::I4,
      (3, 8) => Self::I8,
      (4, 8) => Self::YA8,
      (4, 16) => Self::YA16,
      (6, 8) => Self::RGBA8,
      (6, 16) => Self::RGBA16,
      _ => return None,
    })
  }

  #[inline]
  #[must_use]
  pub const fn color_model(self) -> ColorModel {
    match self {
      Self::Y1 | Self::Y2 | Self::Y4 | Self::Y8 | Self::Y16 => ColorModel::Luminance,
      Self::RGB8 | Self::RGB16 => ColorModel::Rgb,
      Self::I1 | Self::I2 | Self::I4 | Self::I8 => ColorModel::Indexed,
      Self::YA8 | Self::YA16 => ColorModel::LuminanceAlpha,
      Self::RGBA8 | Self::RGBA16 => ColorModel::Rgba,
    }
  }

  /// Bits per channel.
  #[inline]
  #[must_use]
  pub const fn bit_depth(self) -> u8 {
    match self {
      Self::Y1 | Self::I1 => 1,
      Self::Y2 | Self::I2 => 2,
      Self::Y4 | Self::I4 => 4,
      Self::Y8 | Self::I8 | Self::RGB8 | Self::YA8 | Self::RGBA8 => 8,
      Self::Y16 | Self::RGB16 | Self::YA16 | Self::RGBA16 => 16,
    }
  }

  #[inline]
  #[must_use]
  pub const fn channels(self) -> u8 {
    self.color_model().channels()
  }

  /// Bits per stored pixel (bit depth times channels).
  #[inline]
  #[must_use]
  pub const fn bits_per_pixel(self) -> u32 {
    self.bit_depth() as u32 * self.channels() as u32
  }

  /// The byte distance that the filters use when looking "left".
  ///
  /// This is the bytes per pixel, rounded up, and never less than 1.
  #[inline]
  #[must_use]
  pub const fn filter_chunk_size(self) -> usize {
    let bytes = (self.bits_per_pixel() as usize + 7) / 8;
    if bytes < 1 {
      1
    } else {
      bytes
    }
  }

  /// Bytes in a scanline of `width` pixels, not counting the filter byte.
  ///
  /// Gives `None` if the size doesn't fit in `usize`.
  #[inline]
  #[must_use]
  pub const fn bytes_per_scanline(self, width: u32) -> Option<usize> {
    let bits = width as u64 * self.bits_per_pixel() as u64;
    let bytes = (bits + 7) / 8;
    if bytes > usize::MAX as u64 {
      None
    } else {
      Some(bytes as usize)
    }
  }

  /// The format of the decoded pixels.
  #[inline]
  #[must_use]
  pub const fn output_format(self) -> PixelFormat {
    match self {
      Self::Y1 => PixelFormat::Luminance1,
      Self::Y2 => PixelFormat::Luminance2,
      Self::Y4 => PixelFormat::Luminance4,
      Self::Y8 => PixelFormat::Luminance8,
      Self::Y16 => PixelFormat::Luminance16,
      Self::RGB8 | Self::I1 | Self::I2 | Self::I4 | Self::I8 => PixelFormat::Rgb8,
      Self::RGB16 => PixelFormat::Rgb16,
      Self::YA8 => PixelFormat::LuminanceAlpha8,
      Self::YA16 => PixelFormat::LuminanceAlpha16,
      Self::RGBA8 => PixelFormat::Rgba8,
      Self::RGBA16 => PixelFormat::Rgba16,
    }
  }
}

/// The layout of decoded pixel data.
///
/// Pixels are stored row by row, top to bottom, with no padding between rows.
///
/// * `Luminance1`, `Luminance2`, and `Luminance4` are one byte per pixel, with
///   the value in the low bits (eg: 0 to 3 for `Luminance2`).
/// * 16-bit channels are big-endian, the same as the PNG stored them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum PixelFormat {
  Rgb8,
  Rgb16,
  Rgba8,
  Rgba16,
  Luminance1,
  Luminance2,
  Luminance4,
  Luminance8,
  Luminance16,
  LuminanceAlpha8,
  LuminanceAlpha16,
}
impl PixelFormat {
  /// Bytes per output pixel.
  #[inline]
  #[must_use]
  pub const fn bytes_per_pixel(self) -> usize {
    match self {
      Self::Luminance1 | Self::Luminance2 | Self::Luminance4 | Self::Luminance8 => 1,
      Self::Luminance16 | Self::LuminanceAlpha8 => 2,
      Self::Rgb8 => 3,
      Self::LuminanceAlpha16 | Self::Rgba8 => 4,
      Self::Rgb16 => 6,
      Self::Rgba16 => 8,
    }
  }

  /// Bits per channel of the sample values.
  #[inline]
  #[must_use]
  pub const fn bit_depth(self) -> u8 {
    match self {
      Self::Luminance1 => 1,
      Self::Luminance2 => 2,
      Self::Luminance4 => 4,
      Self::Rgb8 | Self::Rgba8 | Self::Luminance8 | Self::LuminanceAlpha8 => 8,
      Self::Rgb16 | Self::Rgba16 | Self::Luminance16 | Self::LuminanceAlpha16 => 16,
    }
  }

  /// Channels per output pixel.
  #[inline]
  #[must_use]
  pub const fn channels(self) -> u8 {
    match self {
      Self::Luminance1
      | Self::Luminance2
      | Self::Luminance4
      | Self::Luminance8
      | Self::Luminance16 => 1,
      Self::LuminanceAlpha8 | Self::LuminanceAlpha16 => 2,
      Self::Rgb8 | Self::Rgb16 => 3,
      Self::Rgba8 | Self::Rgba16 => 4,
    }
  }
}

#[test]
fn test_png_pixel_format_table() {
  let mut valid = 0;
  for color_type in 0..=8 {
    for depth in 0..=16 {
      if let Some(f) = PngPixelFormat::from_color_type_and_depth(color_type, depth) {
        valid += 1;
        assert_eq!(f.color_model() as u8, color_type);
        assert_eq!(f.bit_depth(), depth);
      }
    }
  }
  assert_eq!(valid, 15);
  assert!(PngPixelFormat::from_color_type_and_depth(3, 16).is_none());
  assert!(PngPixelFormat::from_color_type_and_depth(2, 4).is_none());
  assert!(PngPixelFormat::from_color_type_and_depth(1, 8).is_none());
}

#[test]
fn test_scanline_sizes() {
  assert_eq!(PngPixelFormat::Y1.bytes_per_scanline(9), Some(2));
  assert_eq!(PngPixelFormat::I2.bytes_per_scanline(5), Some(2));
  assert_eq!(PngPixelFormat::Y4.bytes_per_scanline(3), Some(2));
  assert_eq!(PngPixelFormat::RGB16.bytes_per_scanline(3), Some(18));
  assert_eq!(PngPixelFormat::Y1.filter_chunk_size(), 1);
  assert_eq!(PngPixelFormat::YA16.filter_chunk_size(), 4);
  assert_eq!(PngPixelFormat::RGBA16.filter_chunk_size(), 8);
  assert_eq!(PngPixelFormat::RGB8.bits_per_pixel(), 24);
}
