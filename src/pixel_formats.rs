//! Pixel types, for palettes and converted images.
//!
//! Raw decoder output is plain bytes described by a
//! [`PixelFormat`](crate::PixelFormat). These types are for when you want
//! something with named channels instead.
//!
//! ## Between Bit Depths
//! To *reduce* bit depth just keep the top bits, and to *increase* bit depth
//! use the current bit pattern as the top bits, then copy that bit pattern
//! down however many times is required to fill in all newly added bits. This
//! way 0 stays 0 and the maximum stays the maximum.

use bytemuck::{Pod, Zeroable};

/// Red, green, blue, 8 bits each.
///
/// This is the layout of a `PLTE` entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGB8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
}

/// Red, green, blue, alpha, 8 bits each.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Zeroable, Pod)]
#[repr(C)]
#[allow(missing_docs)]
pub struct RGBA8 {
  pub r: u8,
  pub g: u8,
  pub b: u8,
  pub a: u8,
}
impl RGBA8 {
  /// A grey pixel with the given alpha.
  #[inline]
  #[must_use]
  pub const fn grey(y: u8, a: u8) -> Self {
    Self { r: y, g: y, b: y, a }
  }
}
impl From<RGB8> for RGBA8 {
  /// Fully opaque.
  #[inline]
  fn from(RGB8 { r, g, b }: RGB8) -> Self {
    Self { r, g, b, a: 255 }
  }
}

#[test]
fn test_pixel_layouts() {
  assert_eq!(core::mem::size_of::<RGB8>(), 3);
  assert_eq!(core::mem::size_of::<RGBA8>(), 4);
  let rgb: &[RGB8] = bytemuck::cast_slice(&[1_u8, 2, 3, 4, 5, 6]);
  assert_eq!(rgb[1], RGB8 { r: 4, g: 5, b: 6 });
  assert_eq!(RGBA8::from(rgb[0]), RGBA8 { r: 1, g: 2, b: 3, a: 255 });
}
