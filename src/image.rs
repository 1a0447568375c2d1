//! Provides a heap-allocated image type, and conversion of decoded PNG data
//! into `RGBA8`.

use alloc::vec::Vec;

use bitfrob::u8_replicate_bits;
use bytemuck::Pod;

use crate::{
  pixel_formats::RGBA8, DecodeStage, PixelFormat, PngDecoder, PngError, PngErrorKind, PngResult,
};

/// Converts an `(x,y)` position within a given `width` 2D space into a linear
/// index.
#[inline]
#[must_use]
pub const fn xy_width_to_index(x: u32, y: u32, width: u32) -> usize {
  y as usize * width as usize + x as usize
}

/// A direct-color image.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub struct Bitmap<P> {
  pub width: u32,
  pub height: u32,
  pub pixels: Vec<P>,
}
impl<P> Bitmap<P> {
  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get(&self, x: u32, y: u32) -> Option<&P> {
    if x < self.width && y < self.height {
      self.pixels.get(xy_width_to_index(x, y, self.width))
    } else {
      None
    }
  }

  /// Gets the pixel at the position, or `None` if the position is out of
  /// bounds.
  #[inline]
  #[must_use]
  pub fn get_mut(&mut self, x: u32, y: u32) -> Option<&mut P> {
    if x < self.width && y < self.height {
      self.pixels.get_mut(xy_width_to_index(x, y, self.width))
    } else {
      None
    }
  }

  /// Flips the image top to bottom.
  ///
  /// PNG rows go top to bottom, some graphics APIs want them bottom to top.
  #[inline]
  pub fn vertical_flip(&mut self) {
    let width = self.width as usize;
    if width == 0 {
      return;
    }
    let mut data: &mut [P] = self.pixels.as_mut_slice();
    while data.len() >= 2 * width {
      let (low, mid) = data.split_at_mut(width);
      let mid_len = mid.len();
      let (mid, high) = mid.split_at_mut(mid_len - width);
      low.swap_with_slice(high);
      data = mid;
    }
  }
}
impl<P: Pod> Bitmap<P> {
  /// The pixel data as bytes.
  #[inline]
  #[must_use]
  pub fn as_bytes(&self) -> &[u8] {
    bytemuck::cast_slice(&self.pixels)
  }
}

impl Bitmap<RGBA8> {
  /// Decodes PNG bytes into an `RGBA8` image.
  ///
  /// Every [`PixelFormat`] converts:
  /// * Greyscale goes into all three color channels.
  /// * Less than 8 bits per channel gets scaled up to 8.
  /// * 16 bits per channel keeps the high byte.
  /// * Formats without alpha become fully opaque.
  #[inline]
  pub fn try_from_png_bytes(png: &[u8]) -> PngResult<Self> {
    let mut decoder = PngDecoder::new(png);
    decoder.decode()?;
    Self::try_from_decoder(&decoder)
  }

  /// Converts the pixels of a decoder that has already decoded.
  ///
  /// A decoder that hasn't decoded gives an
  /// [`InvalidParam`](PngErrorKind::InvalidParam) error, one that failed gives
  /// its stored error.
  pub fn try_from_decoder(decoder: &PngDecoder<'_>) -> PngResult<Self> {
    let bytes = decoder.pixels()?;
    let format = decoder
      .format()
      .ok_or_else(|| PngError::new(PngErrorKind::InvalidParam, DecodeStage::Access))?;
    let (width, height) = (decoder.width(), decoder.height());
    let mut pixels = Vec::new();
    pixels
      .try_reserve_exact(width as usize * height as usize)
      .map_err(|_| PngError::new(PngErrorKind::Alloc, DecodeStage::Unpack))?;
    extend_rgba8(format, bytes, &mut pixels);
    Ok(Self { width, height, pixels })
  }
}

/// Converts decoded pixel bytes of the given format into `RGBA8` pixels,
/// appending them to `out`.
///
/// Bytes past the last whole pixel are ignored.
pub fn extend_rgba8(format: PixelFormat, bytes: &[u8], out: &mut Vec<RGBA8>) {
  let bpp = format.bytes_per_pixel();
  let pixels = bytes.chunks_exact(bpp);
  match format {
    PixelFormat::Luminance1 | PixelFormat::Luminance2 | PixelFormat::Luminance4 => {
      let depth = u32::from(format.bit_depth());
      out.extend(pixels.map(|p| RGBA8::grey(u8_replicate_bits(depth, p[0]), 255)))
    }
    PixelFormat::Luminance8 | PixelFormat::Luminance16 => {
      out.extend(pixels.map(|p| RGBA8::grey(p[0], 255)))
    }
    PixelFormat::LuminanceAlpha8 => out.extend(pixels.map(|p| RGBA8::grey(p[0], p[1]))),
    PixelFormat::LuminanceAlpha16 => out.extend(pixels.map(|p| RGBA8::grey(p[0], p[2]))),
    PixelFormat::Rgb8 => out.extend(pixels.map(|p| RGBA8 { r: p[0], g: p[1], b: p[2], a: 255 })),
    PixelFormat::Rgb16 => out.extend(pixels.map(|p| RGBA8 { r: p[0], g: p[2], b: p[4], a: 255 })),
    PixelFormat::Rgba8 => out.extend(pixels.map(|p| RGBA8 { r: p[0], g: p[1], b: p[2], a: p[3] })),
    PixelFormat::Rgba16 => {
      out.extend(pixels.map(|p| RGBA8 { r: p[0], g: p[2], b: p[4], a: p[6] }))
    }
  }
}

#[test]
fn test_vertical_flip() {
  for height in 0..6_u32 {
    let width = 3;
    let pixels: Vec<u32> = (0..width * height).collect();
    let mut b = Bitmap { width, height, pixels };
    b.vertical_flip();
    for y in 0..height {
      for x in 0..width {
        assert_eq!(*b.get(x, y).unwrap(), (height - 1 - y) * width + x);
      }
    }
  }
}

#[test]
fn test_get_out_of_bounds() {
  let mut b = Bitmap { width: 2, height: 2, pixels: alloc::vec![RGBA8::default(); 4] };
  assert!(b.get(2, 0).is_none());
  assert!(b.get(0, 2).is_none());
  *b.get_mut(1, 1).unwrap() = RGBA8::grey(9, 9);
  assert_eq!(b.as_bytes()[12..], [9, 9, 9, 9]);
}

#[test]
fn test_extend_rgba8() {
  let mut out = Vec::new();
  extend_rgba8(PixelFormat::Luminance2, &[0, 1, 2, 3], &mut out);
  assert_eq!(out.iter().map(|p| p.r).collect::<Vec<_>>(), [0x00, 0x55, 0xAA, 0xFF]);

  let mut out = Vec::new();
  extend_rgba8(PixelFormat::Luminance1, &[0, 1], &mut out);
  assert_eq!(out, [RGBA8::grey(0, 255), RGBA8::grey(255, 255)]);

  let mut out = Vec::new();
  extend_rgba8(PixelFormat::LuminanceAlpha16, &[0x12, 0x34, 0x56, 0x78], &mut out);
  assert_eq!(out, [RGBA8::grey(0x12, 0x56)]);

  let mut out = Vec::new();
  extend_rgba8(PixelFormat::Rgba16, &[1, 0, 2, 0, 3, 0, 4, 0], &mut out);
  assert_eq!(out, [RGBA8 { r: 1, g: 2, b: 3, a: 4 }]);
}
