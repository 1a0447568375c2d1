//! Builds PNG files with `miniz_oxide` and checks what the decoder makes of
//! them.

use upng::png::{png_crc, PNG_SIGNATURE};

mod bad_data;
mod round_trip;

/// Every color type and bit depth pairing that PNG allows.
pub const ALL_FORMATS: [(u8, u8); 15] = [
  (0, 1),
  (0, 2),
  (0, 4),
  (0, 8),
  (0, 16),
  (2, 8),
  (2, 16),
  (3, 1),
  (3, 2),
  (3, 4),
  (3, 8),
  (4, 8),
  (4, 16),
  (6, 8),
  (6, 16),
];

/// Unfiltered image data, along with what's needed to write it out.
#[derive(Debug, Clone)]
pub struct TestImage {
  pub color_type: u8,
  pub bit_depth: u8,
  pub width: u32,
  pub height: u32,
  /// `PLTE` bytes, empty unless indexed.
  pub palette: Vec<u8>,
  pub scanlines: Vec<Vec<u8>>,
}
impl TestImage {
  /// Random pixels (and palette) of the given format.
  pub fn random(color_type: u8, bit_depth: u8, width: u32, height: u32) -> Self {
    let line_len = bytes_per_scanline(color_type, bit_depth, width);
    let scanlines = (0..height).map(|_| super::rand_bytes(line_len)).collect();
    let palette =
      if color_type == 3 { super::rand_bytes(3 << bit_depth) } else { Vec::new() };
    Self { color_type, bit_depth, width, height, palette, scanlines }
  }

  pub fn ihdr(&self) -> Vec<u8> {
    ihdr_bytes(self.width, self.height, self.bit_depth, self.color_type, 0)
  }

  /// The filter byte distance: bytes per pixel, at least 1.
  pub fn filter_chunk_size(&self) -> usize {
    let bits = usize::from(self.bit_depth) * channels(self.color_type);
    ((bits + 7) / 8).max(1)
  }

  /// Filters every scanline, cycling through all five filter types so that
  /// each row uses a different one from the row above.
  pub fn filtered(&self) -> Vec<u8> {
    let bpp = self.filter_chunk_size();
    let mut out = Vec::new();
    let mut previous = vec![0; self.scanlines.first().map_or(0, Vec::len)];
    for (y, line) in self.scanlines.iter().enumerate() {
      let filter_type = ((y + usize::from(self.bit_depth)) % 5) as u8;
      filter_scanline(filter_type, line, &previous, bpp, &mut out);
      previous.clone_from(line);
    }
    out
  }

  /// A full PNG, with the `IDAT` data split into chunks of at most
  /// `idat_size` bytes.
  pub fn encode(&self, level: u8, idat_size: usize) -> Vec<u8> {
    let zlib = miniz_oxide::deflate::compress_to_vec_zlib(&self.filtered(), level);
    let palette = if self.palette.is_empty() { None } else { Some(self.palette.as_slice()) };
    png_with_zlib(&self.ihdr(), palette, &zlib, idat_size)
  }

  /// What the decoder should give back.
  pub fn expected_pixels(&self) -> Vec<u8> {
    let mut out = Vec::new();
    for line in &self.scanlines {
      for x in 0..self.width as usize {
        match (self.color_type, self.bit_depth) {
          (0, 1 | 2 | 4) => out.push(packed_sample(line, self.bit_depth, x)),
          (3, 1 | 2 | 4) => {
            let i = usize::from(packed_sample(line, self.bit_depth, x));
            out.extend_from_slice(&self.palette[i * 3..i * 3 + 3]);
          }
          (3, 8) => {
            let i = usize::from(line[x]);
            out.extend_from_slice(&self.palette[i * 3..i * 3 + 3]);
          }
          _ => {
            let bytes = usize::from(self.bit_depth / 8) * channels(self.color_type);
            out.extend_from_slice(&line[x * bytes..(x + 1) * bytes]);
          }
        }
      }
    }
    out
  }
}

pub fn channels(color_type: u8) -> usize {
  match color_type {
    0 | 3 => 1,
    2 => 3,
    4 => 2,
    6 => 4,
    _ => panic!("bad color type {color_type}"),
  }
}

pub fn bytes_per_scanline(color_type: u8, bit_depth: u8, width: u32) -> usize {
  let bits = width as usize * usize::from(bit_depth) * channels(color_type);
  (bits + 7) / 8
}

fn packed_sample(line: &[u8], bit_depth: u8, x: usize) -> u8 {
  let per_byte = 8 / usize::from(bit_depth);
  let shift = 8 - usize::from(bit_depth) * (x % per_byte + 1);
  (line[x / per_byte] >> shift) & ((1 << bit_depth) - 1)
}

pub fn ihdr_bytes(
  width: u32, height: u32, bit_depth: u8, color_type: u8, interlace: u8,
) -> Vec<u8> {
  let mut v = Vec::new();
  v.extend_from_slice(&width.to_be_bytes());
  v.extend_from_slice(&height.to_be_bytes());
  v.extend_from_slice(&[bit_depth, color_type, 0, 0, interlace]);
  v
}

pub fn push_chunk(out: &mut Vec<u8>, type_: &[u8; 4], data: &[u8]) {
  out.extend_from_slice(&(data.len() as u32).to_be_bytes());
  out.extend_from_slice(type_);
  out.extend_from_slice(data);
  let crc = png_crc(type_.iter().copied().chain(data.iter().copied()));
  out.extend_from_slice(&crc.to_be_bytes());
}

pub fn png_with_zlib(
  ihdr: &[u8], palette: Option<&[u8]>, zlib: &[u8], idat_size: usize,
) -> Vec<u8> {
  let mut out = PNG_SIGNATURE.to_vec();
  push_chunk(&mut out, b"IHDR", ihdr);
  push_chunk(&mut out, b"tEXt", b"Software\0upng tests");
  if let Some(palette) = palette {
    push_chunk(&mut out, b"PLTE", palette);
  }
  for idat in zlib.chunks(idat_size.max(1)) {
    push_chunk(&mut out, b"IDAT", idat);
  }
  push_chunk(&mut out, b"IEND", &[]);
  out
}

fn paeth_predict(a: u8, b: u8, c: u8) -> u8 {
  let p = i16::from(a) + i16::from(b) - i16::from(c);
  let pa = (p - i16::from(a)).abs();
  let pb = (p - i16::from(b)).abs();
  let pc = (p - i16::from(c)).abs();
  if pa <= pb && pa <= pc {
    a
  } else if pb <= pc {
    b
  } else {
    c
  }
}

/// Appends the filter type byte and the filtered `raw` line to `out`.
pub fn filter_scanline(
  filter_type: u8, raw: &[u8], previous: &[u8], bpp: usize, out: &mut Vec<u8>,
) {
  out.push(filter_type);
  for (i, &x) in raw.iter().enumerate() {
    let a = if i >= bpp { raw[i - bpp] } else { 0 };
    let b = previous[i];
    let c = if i >= bpp { previous[i - bpp] } else { 0 };
    out.push(match filter_type {
      0 => x,
      1 => x.wrapping_sub(a),
      2 => x.wrapping_sub(b),
      3 => x.wrapping_sub(((u16::from(a) + u16::from(b)) / 2) as u8),
      4 => x.wrapping_sub(paeth_predict(a, b, c)),
      _ => panic!("bad filter type {filter_type}"),
    });
  }
}
