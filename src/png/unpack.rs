use super::*;

/// Iterates the `width` samples of a scanline packed at 1, 2, or 4 bits per
/// sample, left-most sample first.
fn packed_samples(line: &[u8], bit_depth: u32, width: u32) -> impl Iterator<Item = u8> + '_ {
  debug_assert!(matches!(bit_depth, 1 | 2 | 4));
  let per_byte = 8 / bit_depth;
  let mask = (1_u8 << bit_depth) - 1;
  line
    .iter()
    .flat_map(move |&byte| {
      (0..per_byte).map(move |i| (byte >> (8 - bit_depth * (i + 1))) & mask)
    })
    .take(width as usize)
}

/// Converts one reconstructed scanline into the output [`PixelFormat`],
/// appending the pixels to `out`.
///
/// * 1, 2, and 4 bit greyscale samples get one byte each, holding the
///   sample's value.
/// * Indexed pixels are looked up in the `palette`, giving RGB8. An index
///   past the end of the palette (or no palette) is
///   [`PngErrorKind::Malformed`].
/// * Everything else is copied as-is, 16-bit samples stay big-endian.
pub fn unpack_scanline(
  pixel_format: PngPixelFormat, width: u32, line: &[u8], palette: Option<&[RGB8]>,
  out: &mut Vec<u8>,
) -> PngResult<()> {
  match pixel_format {
    PngPixelFormat::Y1 | PngPixelFormat::Y2 | PngPixelFormat::Y4 => {
      out.extend(packed_samples(line, u32::from(pixel_format.bit_depth()), width));
    }
    PngPixelFormat::I1 | PngPixelFormat::I2 | PngPixelFormat::I4 | PngPixelFormat::I8 => {
      let palette = palette.unwrap_or(&[]);
      let look_up = |i: u8| match palette.get(usize::from(i)) {
        Some(rgb) => Ok(rgb),
        None => {
          log::debug!("index {i} is past the {} entry palette", palette.len());
          Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Unpack))
        }
      };
      if pixel_format == PngPixelFormat::I8 {
        for &i in line.iter().take(width as usize) {
          out.extend_from_slice(bytemuck::bytes_of(look_up(i)?));
        }
      } else {
        for i in packed_samples(line, u32::from(pixel_format.bit_depth()), width) {
          out.extend_from_slice(bytemuck::bytes_of(look_up(i)?));
        }
      }
    }
    _ => out.extend_from_slice(line),
  }
  Ok(())
}

/// Unfilters the inflated image data and unpacks each scanline, giving the
/// final pixel buffer.
pub fn unfilter_and_unpack(
  header: &IHDR, filtered: &[u8], palette: Option<&[RGB8]>,
) -> PngResult<Vec<u8>> {
  let size = header
    .pixel_buffer_size()
    .ok_or_else(|| PngError::new(PngErrorKind::Unsupported, DecodeStage::Unpack))?;
  let mut pixels: Vec<u8> = Vec::new();
  pixels
    .try_reserve_exact(size)
    .map_err(|_| PngError::new(PngErrorKind::Alloc, DecodeStage::Unpack))?;
  unfilter_scanlines(header, filtered, |_y, line| {
    unpack_scanline(header.pixel_format, header.width, line, palette, &mut pixels)
  })?;
  debug_assert_eq!(pixels.len(), size);
  Ok(pixels)
}

#[test]
fn test_unpack_packed_greyscale() {
  let mut out = Vec::new();
  unpack_scanline(PngPixelFormat::Y1, 10, &[0b1011_0001, 0b1100_0000], None, &mut out).unwrap();
  assert_eq!(out, [1, 0, 1, 1, 0, 0, 0, 1, 1, 1]);

  let mut out = Vec::new();
  unpack_scanline(PngPixelFormat::Y2, 5, &[0b11_10_01_00, 0b10_00_00_00], None, &mut out).unwrap();
  assert_eq!(out, [3, 2, 1, 0, 2]);

  let mut out = Vec::new();
  unpack_scanline(PngPixelFormat::Y4, 3, &[0xA5, 0xF0], None, &mut out).unwrap();
  assert_eq!(out, [0xA, 0x5, 0xF]);
}

#[test]
fn test_unpack_indexed() {
  let palette = [RGB8 { r: 1, g: 2, b: 3 }, RGB8 { r: 4, g: 5, b: 6 }];
  let mut out = Vec::new();
  unpack_scanline(PngPixelFormat::I1, 3, &[0b0100_0000], Some(&palette), &mut out).unwrap();
  assert_eq!(out, [1, 2, 3, 4, 5, 6, 1, 2, 3]);

  let mut out = Vec::new();
  unpack_scanline(PngPixelFormat::I8, 2, &[1, 0], Some(&palette), &mut out).unwrap();
  assert_eq!(out, [4, 5, 6, 1, 2, 3]);

  let mut out = Vec::new();
  let e = unpack_scanline(PngPixelFormat::I8, 2, &[1, 2], Some(&palette), &mut out).unwrap_err();
  assert_eq!(e.kind, PngErrorKind::Malformed);
  let e = unpack_scanline(PngPixelFormat::I2, 1, &[0], None, &mut out).unwrap_err();
  assert_eq!(e.kind, PngErrorKind::Malformed);
}

#[test]
fn test_unpack_wide_formats_copy() {
  let mut out = Vec::new();
  unpack_scanline(PngPixelFormat::RGB16, 1, &[1, 2, 3, 4, 5, 6], None, &mut out).unwrap();
  assert_eq!(out, [1, 2, 3, 4, 5, 6]);
}
