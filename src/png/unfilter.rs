//! From the PNG spec:
//!
//! > Filters are applied to **bytes**, not to pixels, regardless of the bit
//! > depth or color type of the image.

use super::*;

/// Undoes the filter of a single scanline, in place.
///
/// * `line` is the scanline without its filter byte.
/// * `previous` is the already reconstructed scanline above (all zeroes for
///   the first scanline), and must be the same length as `line`.
/// * `filter_chunk_size` is the bytes per pixel, see
///   [`PngPixelFormat::filter_chunk_size`].
///
/// An unknown filter type is [`PngErrorKind::Malformed`].
pub fn reconstruct_scanline(
  filter_type: u8, line: &mut [u8], previous: &[u8], filter_chunk_size: usize,
) -> PngResult<()> {
  debug_assert_eq!(line.len(), previous.len());
  debug_assert!(filter_chunk_size > 0);
  let bpp = filter_chunk_size.min(line.len());
  match filter_type {
    0 => (),
    1 => {
      // the first pixel has nothing to the left, so it's unchanged.
      for i in bpp..line.len() {
        line[i] = reconstruct_sub(line[i], line[i - bpp]);
      }
    }
    2 => {
      for (x, b) in line.iter_mut().zip(previous.iter()) {
        *x = reconstruct_up(*x, *b);
      }
    }
    3 => {
      for (x, b) in line[..bpp].iter_mut().zip(previous.iter()) {
        *x = reconstruct_average(*x, 0, *b);
      }
      for i in bpp..line.len() {
        line[i] = reconstruct_average(line[i], line[i - bpp], previous[i]);
      }
    }
    4 => {
      for (x, b) in line[..bpp].iter_mut().zip(previous.iter()) {
        *x = reconstruct_paeth(*x, 0, *b, 0);
      }
      for i in bpp..line.len() {
        line[i] = reconstruct_paeth(line[i], line[i - bpp], previous[i], previous[i - bpp]);
      }
    }
    _ => {
      log::debug!("illegal filter type {filter_type}");
      return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Unfilter));
    }
  }
  Ok(())
}

/// Unfilters every scanline of the inflated image data.
///
/// Only two scanlines worth of memory are used: the current line, and the
/// previous line. Each reconstructed line is passed to `op` along with its `y`
/// position, and then becomes the "previous" line for the next one.
///
/// ## Failure
/// * `filtered` being shorter than the `header` calls for is
///   [`PngErrorKind::Malformed`]. Extra bytes at the end are ignored.
/// * Any error from `op` stops the process and is passed along.
pub fn unfilter_scanlines<F>(header: &IHDR, filtered: &[u8], mut op: F) -> PngResult<()>
where
  F: FnMut(u32, &[u8]) -> PngResult<()>,
{
  let too_big = || PngError::new(PngErrorKind::Unsupported, DecodeStage::Unfilter);
  let bytes_per_scanline =
    header.pixel_format.bytes_per_scanline(header.width).ok_or_else(too_big)?;
  let bytes_used = header.zlib_decompression_requirement().ok_or_else(too_big)?;
  if filtered.len() < bytes_used {
    log::debug!("{} bytes of filtered data, but {bytes_used} needed", filtered.len());
    return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Unfilter));
  }
  let filter_chunk_size = header.pixel_format.filter_chunk_size();

  let mut current = try_zeroed_vec(bytes_per_scanline, DecodeStage::Unfilter)?;
  let mut previous = try_zeroed_vec(bytes_per_scanline, DecodeStage::Unfilter)?;
  for (y, filterline) in filtered[..bytes_used].chunks_exact(bytes_per_scanline + 1).enumerate() {
    let (filter_type, data) = match filterline {
      [f, data @ ..] => (*f, data),
      [] => return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Unfilter)),
    };
    current.copy_from_slice(data);
    reconstruct_scanline(filter_type, &mut current, &previous, filter_chunk_size)?;
    op(y as u32, &current)?;
    core::mem::swap(&mut current, &mut previous);
  }
  Ok(())
}

/// Reconstruct Filter Type 1
///
/// * `fx` filtered X
/// * `ra` reconstructed `a`:
///   * Bit Depth <8: the byte before this byte
///   * Bit Depth >=8: the corresponding byte from the pixel to the left of this
///     pixel (or skip reconstruction if this is the leftmost pixel)
#[inline]
const fn reconstruct_sub(fx: u8, ra: u8) -> u8 {
  fx.wrapping_add(ra)
}

/// Reconstruct Filter Type 2
///
/// * `fx` filtered X
/// * `rb` reconstructed `b`: The byte corresponding to this byte within the
///   previous scanline.
#[inline]
const fn reconstruct_up(fx: u8, rb: u8) -> u8 {
  fx.wrapping_add(rb)
}

/// Reconstruct Filter Type 3
///
/// * `fx` filtered X
/// * `ra` reconstructed `a` (0 for the leftmost pixel)
/// * `rb` reconstructed `b`
///
/// The average is computed without overflow.
#[inline]
const fn reconstruct_average(fx: u8, ra: u8, rb: u8) -> u8 {
  fx.wrapping_add(((ra as u16 + rb as u16) / 2) as u8)
}

/// Reconstruct Filter Type 4
///
/// * `fx` filtered X
/// * `ra` reconstructed `a` (0 for the leftmost pixel)
/// * `rb` reconstructed `b`
/// * `rc` reconstructed `c`: the byte above `a` (0 for the leftmost pixel)
#[inline]
const fn reconstruct_paeth(fx: u8, ra: u8, rb: u8, rc: u8) -> u8 {
  fx.wrapping_add(paeth_predict(ra, rb, rc))
}

/// The Paeth filter function computes a simple linear function of the three
/// neighboring pixels (left `a`, above `b`, upper left `c`).
///
/// The output is the "predictor" of the neighboring pixel closest to the
/// computed value.
#[inline]
pub(crate) const fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let a_ = a as i32;
  let b_ = b as i32;
  let c_ = c as i32;
  let p: i32 = a_ + b_ - c_;
  let pa = (p - a_).abs();
  let pb = (p - b_).abs();
  let pc = (p - c_).abs();
  // ties go to a, then b, then c.
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Applies a filter to one raw scanline, pushing the filter byte and the
/// filtered bytes.
#[cfg(test)]
pub(crate) fn filter_scanline(
  filter_type: u8, raw: &[u8], previous: &[u8], filter_chunk_size: usize, out: &mut Vec<u8>,
) {
  out.push(filter_type);
  for i in 0..raw.len() {
    let a = if i >= filter_chunk_size { raw[i - filter_chunk_size] } else { 0 };
    let b = previous[i];
    let c = if i >= filter_chunk_size { previous[i - filter_chunk_size] } else { 0 };
    let predicted = match filter_type {
      0 => 0,
      1 => a,
      2 => b,
      3 => ((u16::from(a) + u16::from(b)) / 2) as u8,
      4 => paeth_predict(a, b, c),
      _ => unreachable!(),
    };
    out.push(raw[i].wrapping_sub(predicted));
  }
}

#[test]
fn test_paeth_predict_ties() {
  // all equal distance: a wins
  assert_eq!(paeth_predict(10, 10, 10), 10);
  // p = 20 + 10 - 10 = 20, pa = 0
  assert_eq!(paeth_predict(20, 10, 10), 20);
  // p = 10 + 20 - 10 = 20, pa = 10, pb = 0
  assert_eq!(paeth_predict(10, 20, 10), 20);
  // p = 10 + 10 - 20 = 0, pa = 10, pb = 10, pc = 20: a wins the tie
  assert_eq!(paeth_predict(10, 10, 20), 10);
  // p = 5 + 15 - 20 = 0, pa = 5, pb = 15, pc = 20
  assert_eq!(paeth_predict(5, 15, 20), 5);
  // p = 100 + 50 - 60 = 90, pa = 10, pb = 40, pc = 30
  assert_eq!(paeth_predict(100, 50, 60), 100);
  // p = 50 + 100 - 90 = 60, pa = 10, pb = 40, pc = 30
  assert_eq!(paeth_predict(50, 100, 90), 50);
  // p = 0 + 200 - 100 = 100, pa = 100, pb = 100, pc = 0: c
  assert_eq!(paeth_predict(0, 200, 100), 100);
}

#[test]
fn test_average_does_not_overflow() {
  let mut line = [0_u8; 2];
  let previous = [255, 255];
  // the left byte becomes 127, then (127 + 255) / 2 = 191
  reconstruct_scanline(3, &mut line, &previous, 1).unwrap();
  assert_eq!(line, [127, 191]);
}

#[test]
fn test_filter_round_trip() {
  let rand = |count: usize| {
    let mut buffer = alloc::vec![0; count];
    getrandom::getrandom(&mut buffer).unwrap();
    buffer
  };
  for filter_chunk_size in 1..=8 {
    for pixels in 1..=9 {
      let len = filter_chunk_size * pixels;
      for previous in [alloc::vec![0; len], rand(len)] {
        let raw = rand(len);
        for filter_type in 0..=4 {
          let mut filtered = Vec::new();
          filter_scanline(filter_type, &raw, &previous, filter_chunk_size, &mut filtered);
          assert_eq!(filtered[0], filter_type);
          let mut line = filtered[1..].to_vec();
          reconstruct_scanline(filter_type, &mut line, &previous, filter_chunk_size).unwrap();
          assert_eq!(line, raw, "filter {filter_type}, bpp {filter_chunk_size}, len {len}");
        }
      }
    }
  }
}

#[test]
fn test_unfilter_scanlines() {
  let header = IHDR { width: 2, height: 3, pixel_format: PngPixelFormat::YA8 };
  let rows: [[u8; 4]; 3] = [[1, 2, 3, 4], [5, 6, 7, 8], [250, 251, 252, 253]];
  let mut filtered = Vec::new();
  let mut previous = [0_u8; 4];
  for (row, filter_type) in rows.iter().zip([1, 2, 4]) {
    filter_scanline(filter_type, row, &previous, 2, &mut filtered);
    previous = *row;
  }
  let mut seen = Vec::new();
  unfilter_scanlines(&header, &filtered, |y, line| {
    assert_eq!(line, rows[y as usize]);
    seen.push(y);
    Ok(())
  })
  .unwrap();
  assert_eq!(seen, [0, 1, 2]);

  // not enough data
  let e = unfilter_scanlines(&header, &filtered[..filtered.len() - 1], |_, _| Ok(())).unwrap_err();
  assert_eq!(e.kind, PngErrorKind::Malformed);

  // bad filter byte
  filtered[5] = 5;
  let e = unfilter_scanlines(&header, &filtered, |_, _| Ok(())).unwrap_err();
  assert_eq!(e.kind, PngErrorKind::Malformed);
}
