use upng::{
  image::Bitmap, ColorModel, DecodeState, PixelFormat, PngDecoder, PngErrorKind, RGBA8,
};

use super::{TestImage, ALL_FORMATS};

const SIZES: [(u32, u32); 5] = [(1, 1), (3, 5), (8, 2), (17, 4), (33, 9)];

#[test]
fn test_every_format_round_trips() {
  for (color_type, bit_depth) in ALL_FORMATS {
    for (width, height) in SIZES {
      let img = TestImage::random(color_type, bit_depth, width, height);
      let expected = img.expected_pixels();
      for level in [0, 1, 6] {
        let png = img.encode(level, 64);
        let mut decoder = PngDecoder::new(&png);
        if let Err(e) = decoder.decode() {
          panic!("{color_type}/{bit_depth} {width}x{height} level {level}: {e}");
        }
        assert_eq!(decoder.state(), DecodeState::Decoded);
        assert_eq!(decoder.width(), width);
        assert_eq!(decoder.height(), height);
        assert_eq!(decoder.bit_depth(), bit_depth);
        assert_eq!(decoder.color_model().map(|m| m as u8), Some(color_type));
        assert_eq!(usize::from(decoder.components()), super::channels(color_type));
        let bits = u32::from(bit_depth) * u32::from(decoder.components());
        assert_eq!(decoder.bits_per_pixel(), bits);
        let format = decoder.format().unwrap();
        assert_eq!(decoder.size(), width as usize * height as usize * format.bytes_per_pixel());
        assert_eq!(
          decoder.pixels().unwrap(),
          expected.as_slice(),
          "{color_type}/{bit_depth} {width}x{height} level {level}"
        );
      }
    }
  }
}

#[test]
fn test_output_formats() {
  let cases = [
    ((0, 1), PixelFormat::Luminance1),
    ((0, 2), PixelFormat::Luminance2),
    ((0, 4), PixelFormat::Luminance4),
    ((0, 8), PixelFormat::Luminance8),
    ((0, 16), PixelFormat::Luminance16),
    ((2, 8), PixelFormat::Rgb8),
    ((2, 16), PixelFormat::Rgb16),
    ((3, 1), PixelFormat::Rgb8),
    ((3, 8), PixelFormat::Rgb8),
    ((4, 8), PixelFormat::LuminanceAlpha8),
    ((4, 16), PixelFormat::LuminanceAlpha16),
    ((6, 8), PixelFormat::Rgba8),
    ((6, 16), PixelFormat::Rgba16),
  ];
  for ((color_type, bit_depth), format) in cases {
    let png = TestImage::random(color_type, bit_depth, 2, 2).encode(6, 1000);
    let mut decoder = PngDecoder::new(&png);
    decoder.parse_header().unwrap();
    assert_eq!(decoder.format(), Some(format));
  }
}

#[test]
fn test_decode_twice_is_the_same() {
  let img = TestImage::random(6, 8, 7, 7);
  let png = img.encode(6, 1000);
  let mut decoder = PngDecoder::new(&png);
  decoder.decode().unwrap();
  let first = decoder.pixels().unwrap().to_vec();
  decoder.decode().unwrap();
  assert_eq!(decoder.pixels().unwrap(), first.as_slice());
  assert_eq!(first, img.expected_pixels());
}

#[test]
fn test_header_only() {
  let png = TestImage::random(2, 16, 19, 3).encode(1, 1000);
  let mut decoder = PngDecoder::new(&png);
  assert_eq!(decoder.width(), 0);
  assert_eq!(decoder.format(), None);
  let header = decoder.parse_header().unwrap();
  assert_eq!(decoder.state(), DecodeState::Header);
  assert_eq!((header.width, header.height), (19, 3));
  assert_eq!((decoder.width(), decoder.height()), (19, 3));
  assert_eq!(decoder.color_model(), Some(ColorModel::Rgb));
  assert_eq!(decoder.bit_depth(), 16);
  assert_eq!(decoder.components(), 3);
  assert_eq!(decoder.bits_per_pixel(), 48);
  assert_eq!(decoder.format(), Some(PixelFormat::Rgb16));
  assert_eq!(decoder.size(), 0);
  assert_eq!(decoder.pixels().unwrap_err().kind, PngErrorKind::InvalidParam);
  // asking twice is fine, and the decode still works after.
  assert_eq!(decoder.parse_header().unwrap(), header);
  decoder.decode().unwrap();
  assert_eq!(decoder.size(), 19 * 3 * 6);
}

#[test]
fn test_owned_source() {
  let img = TestImage::random(0, 4, 9, 9);
  let mut decoder = PngDecoder::from_vec(img.encode(9, 1000));
  decoder.decode().unwrap();
  assert_eq!(decoder.pixels().unwrap(), img.expected_pixels().as_slice());
  // the source is released, so decoding again can't go back to it.
  decoder.decode().unwrap();
  assert_eq!(decoder.into_pixels().unwrap(), img.expected_pixels());
}

#[test]
fn test_into_pixels_before_decode() {
  let png = TestImage::random(0, 8, 2, 2).encode(6, 1000);
  let decoder = PngDecoder::new(&png);
  assert_eq!(decoder.into_pixels().unwrap_err().kind, PngErrorKind::InvalidParam);
}

#[test]
fn test_idat_split_many_ways() {
  let img = TestImage::random(2, 8, 20, 20);
  let expected = img.expected_pixels();
  for idat_size in [1, 2, 7, 100, 100_000] {
    let png = img.encode(6, idat_size);
    let mut decoder = PngDecoder::new(&png);
    decoder.decode().unwrap();
    assert_eq!(decoder.pixels().unwrap(), expected.as_slice(), "IDAT size {idat_size}");
  }
}

#[test]
fn test_bitmap_rgba8() {
  let img = TestImage::random(3, 2, 6, 4);
  let png = img.encode(6, 1000);
  let bitmap = Bitmap::<RGBA8>::try_from_png_bytes(&png).unwrap();
  assert_eq!((bitmap.width, bitmap.height), (6, 4));
  let rgb = img.expected_pixels();
  for (px, rgb) in bitmap.pixels.iter().zip(rgb.chunks_exact(3)) {
    assert_eq!(*px, RGBA8 { r: rgb[0], g: rgb[1], b: rgb[2], a: 255 });
  }

  let img = TestImage::random(4, 16, 3, 3);
  let png = img.encode(6, 1000);
  let bitmap = Bitmap::<RGBA8>::try_from_png_bytes(&png).unwrap();
  let ya = img.expected_pixels();
  for (px, ya) in bitmap.pixels.iter().zip(ya.chunks_exact(4)) {
    assert_eq!(*px, RGBA8::grey(ya[0], ya[2]));
  }

  let png = TestImage::random(0, 1, 3, 3).encode(6, 1000);
  let bitmap = Bitmap::<RGBA8>::try_from_png_bytes(&png).unwrap();
  assert!(bitmap.pixels.iter().all(|px| (px.r == 0 || px.r == 255) && px.a == 255));

  let decoder = PngDecoder::new(&png);
  let e = Bitmap::<RGBA8>::try_from_decoder(&decoder).unwrap_err();
  assert_eq!(e.kind, PngErrorKind::InvalidParam);
}
