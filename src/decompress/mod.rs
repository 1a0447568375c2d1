//! Decompression of zlib / DEFLATE data.
//!
//! * [RFC 1950: ZLIB Compressed Data Format](https://www.rfc-editor.org/rfc/rfc1950)
//! * [RFC 1951: DEFLATE Compressed Data Format](https://www.rfc-editor.org/rfc/rfc1951)
//!
//! PNG image data is a single zlib stream, which is a two byte header, a
//! DEFLATE stream, and then an Adler-32 checksum of the decompressed data.
//!
//! The DEFLATE stream is a series of blocks. Each block is either stored
//! (uncompressed), or Huffman coded with a fixed or a dynamic set of codes.
//! A Huffman coded block produces literal bytes and back-references into the
//! last 32k of output. Because the whole output is kept in one `Vec`, that
//! `Vec` is also the sliding window.

use alloc::vec::Vec;

use crate::{DecodeStage, PngError, PngErrorKind, PngResult};

mod adler32;
pub use adler32::*;

mod bit_source;
pub(crate) use bit_source::*;

mod huffman;
pub(crate) use huffman::*;

mod tables;
pub(crate) use tables::*;

mod code_length_alphabet;
pub(crate) use code_length_alphabet::*;

#[inline]
#[track_caller]
fn malformed() -> PngError {
  PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate)
}

/// Decompresses a zlib stream, such as the joined `IDAT` data of a PNG.
///
/// * `limit` is the most output allowed. Inflating past it is an error. PNG
///   decoding passes exactly the size that the image header calls for.
/// * When `verify_adler32` is set, the trailer must be present and match the
///   output.
///
/// ## Failure
/// * Header problems (bad check bits, a method other than DEFLATE, a window
///   over 32k, a preset dictionary) are all [`PngErrorKind::Malformed`].
/// * Any problem within the DEFLATE stream is also `Malformed`.
/// * If the output can't be allocated you get [`PngErrorKind::Alloc`].
pub fn zlib_decompress(zlib: &[u8], limit: usize, verify_adler32: bool) -> PngResult<Vec<u8>> {
  let (cmf, flg, deflate) = match zlib {
    [cmf, flg, rest @ ..] => (*cmf, *flg, rest),
    _ => return Err(malformed()),
  };
  if (u16::from(cmf) * 256 + u16::from(flg)) % 31 != 0 {
    log::debug!("zlib header check bits are wrong: {cmf:02X} {flg:02X}");
    return Err(malformed());
  }
  let method = cmf & 0b1111;
  let window_bits = cmf >> 4;
  if method != 8 || window_bits > 7 {
    log::debug!("zlib method {method} with window bits {window_bits} is not deflate");
    return Err(malformed());
  }
  if (flg & 0b10_0000) != 0 {
    log::debug!("zlib preset dictionaries aren't allowed in PNG");
    return Err(malformed());
  }

  let mut bits = BitSource::new(deflate);
  let mut out = Vec::new();
  inflate_to(&mut bits, &mut out, limit)?;

  if verify_adler32 {
    let declared = match bits.next_bytes(4)? {
      [a, b, c, d] => u32::from_be_bytes([*a, *b, *c, *d]),
      _ => return Err(malformed()),
    };
    let actual = adler32(&out);
    if declared != actual {
      log::debug!("adler32 mismatch: declared {declared:08X}, actual {actual:08X}");
      return Err(malformed());
    }
  }
  Ok(out)
}

/// Decompresses a raw DEFLATE stream (no zlib wrapper).
///
/// `limit` works the same as with [`zlib_decompress`].
pub fn inflate(deflate: &[u8], limit: usize) -> PngResult<Vec<u8>> {
  let mut out = Vec::new();
  inflate_to(&mut BitSource::new(deflate), &mut out, limit)?;
  Ok(out)
}

fn inflate_to(bits: &mut BitSource<'_>, out: &mut Vec<u8>, limit: usize) -> PngResult<()> {
  loop {
    let bfinal = bits.next_one_bit()? != 0;
    let btype = bits.next_bits_lsb(2)?;
    log::trace!("block: bfinal {bfinal}, btype {btype}, output so far {}", out.len());
    match btype {
      0 => stored_block(bits, out, limit)?,
      1 => huffman_block(bits, out, limit, &FIXED_LIT_LEN_TREE, &FIXED_DIST_TREE)?,
      2 => {
        let (lit_len, dist) = read_dynamic_trees(bits)?;
        huffman_block(bits, out, limit, &lit_len, &dist)?
      }
      _ => {
        log::debug!("reserved block type");
        return Err(malformed());
      }
    }
    if bfinal {
      // any bits after the final block belong to the zlib trailer.
      bits.align_to_byte();
      return Ok(());
    }
  }
}

fn stored_block(bits: &mut BitSource<'_>, out: &mut Vec<u8>, limit: usize) -> PngResult<()> {
  let (len, nlen) = match bits.next_bytes(4)? {
    [l0, l1, n0, n1] => (u16::from_le_bytes([*l0, *l1]), u16::from_le_bytes([*n0, *n1])),
    _ => return Err(malformed()),
  };
  if len != !nlen {
    log::debug!("stored block LEN {len:04X} doesn't match NLEN {nlen:04X}");
    return Err(malformed());
  }
  let len = usize::from(len);
  if out.len() + len > limit {
    return Err(malformed());
  }
  bits.copy_bytes_to(len, out)
}

#[inline]
fn reserve_for(out: &mut Vec<u8>, extra: usize, limit: usize) -> PngResult<()> {
  if out.len() + extra > limit {
    log::debug!("inflated data is larger than the {limit} byte limit");
    return Err(malformed());
  }
  out.try_reserve(extra).map_err(|_| PngError::new(PngErrorKind::Alloc, DecodeStage::Inflate))
}

fn huffman_block(
  bits: &mut BitSource<'_>, out: &mut Vec<u8>, limit: usize, lit_len: &LitLenTree,
  dist: &DistTree,
) -> PngResult<()> {
  loop {
    let symbol = usize::from(lit_len.decode(bits)?);
    match symbol {
      0..=255 => {
        reserve_for(out, 1, limit)?;
        out.push(symbol as u8);
      }
      256 => return Ok(()),
      257..=285 => {
        let i = symbol - 257;
        let length =
          usize::from(LENGTH_BASE[i]) + bits.next_bits_lsb(u32::from(LENGTH_EXTRA[i]))? as usize;
        let d = usize::from(dist.decode(bits)?);
        if d >= DIST_BASE.len() {
          return Err(malformed());
        }
        let distance =
          usize::from(DIST_BASE[d]) + bits.next_bits_lsb(u32::from(DIST_EXTRA[d]))? as usize;
        if distance > out.len() {
          log::debug!("distance {distance} reaches before the start of the output");
          return Err(malformed());
        }
        reserve_for(out, length, limit)?;
        // one byte at a time, so that an overlapping copy repeats the pattern.
        let start = out.len() - distance;
        for i in start..start + length {
          let byte = out[i];
          out.push(byte);
        }
      }
      _ => return Err(malformed()),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use alloc::vec;

  fn fixed_codes() -> Vec<(u16, u16)> {
    FIXED_LIT_LEN_TREE.codes(LIT_LEN_SYMBOLS)
  }

  fn zlib_wrap(deflate: &[u8], data: &[u8]) -> Vec<u8> {
    let mut v = vec![0x78, 0x01];
    v.extend_from_slice(deflate);
    v.extend_from_slice(&adler32(data).to_be_bytes());
    v
  }

  #[test]
  fn test_stored_block() {
    let deflate = [0b001, 0x03, 0x00, 0xFC, 0xFF, 0x41, 0x42, 0x43];
    assert_eq!(inflate(&deflate, 100).unwrap(), [0x41, 0x42, 0x43]);
    let zlib = zlib_wrap(&deflate, b"ABC");
    assert_eq!(zlib_decompress(&zlib, 3, true).unwrap(), b"ABC");
  }

  #[test]
  fn test_stored_block_then_fixed_block() {
    let codes = fixed_codes();
    let mut deflate = vec![0b000, 0x02, 0x00, 0xFD, 0xFF, b'h', b'i'];
    let mut stream = Vec::new();
    write_bits(&mut stream, 1, 1);
    write_bits(&mut stream, 1, 2);
    push_code(&mut stream, codes[usize::from(b'!')]);
    push_code(&mut stream, codes[256]);
    deflate.extend(bools_to_bytes(&stream));
    assert_eq!(inflate(&deflate, 100).unwrap(), b"hi!");
  }

  #[test]
  fn test_stored_block_len_mismatch() {
    let deflate = [0b001, 0x03, 0x00, 0xFC, 0xFE, 0x41, 0x42, 0x43];
    assert_eq!(inflate(&deflate, 100).unwrap_err().kind, PngErrorKind::Malformed);
    // truncated payload
    let deflate = [0b001, 0x03, 0x00, 0xFC, 0xFF, 0x41];
    assert_eq!(inflate(&deflate, 100).unwrap_err().kind, PngErrorKind::Malformed);
  }

  #[test]
  fn test_overlapping_back_reference() {
    let codes = fixed_codes();
    let mut stream = Vec::new();
    write_bits(&mut stream, 1, 1);
    write_bits(&mut stream, 1, 2);
    push_code(&mut stream, codes[0x01]);
    // length 5 is symbol 259 with no extra bits
    push_code(&mut stream, codes[259]);
    // distance 1 is distance symbol 0 with no extra bits
    write_bits(&mut stream, 0, 5);
    push_code(&mut stream, codes[256]);
    let deflate = bools_to_bytes(&stream);
    assert_eq!(inflate(&deflate, 100).unwrap(), [0x01; 6]);
    // the limit is enforced
    assert_eq!(inflate(&deflate, 5).unwrap_err().kind, PngErrorKind::Malformed);
  }

  #[test]
  fn test_distance_too_far_back() {
    let codes = fixed_codes();
    let mut stream = Vec::new();
    write_bits(&mut stream, 1, 1);
    write_bits(&mut stream, 1, 2);
    push_code(&mut stream, codes[0x01]);
    push_code(&mut stream, codes[259]);
    // distance symbol 1 is a distance of 2
    push_code(&mut stream, (0b00001, 5));
    push_code(&mut stream, codes[256]);
    let deflate = bools_to_bytes(&stream);
    assert_eq!(inflate(&deflate, 100).unwrap_err().kind, PngErrorKind::Malformed);
  }

  #[test]
  fn test_bad_symbols() {
    let codes = fixed_codes();
    // lit/len symbol 286
    let mut stream = Vec::new();
    write_bits(&mut stream, 0b011, 3);
    push_code(&mut stream, codes[286]);
    assert!(inflate(&bools_to_bytes(&stream), 100).is_err());
    // distance symbol 30
    let mut stream = Vec::new();
    write_bits(&mut stream, 0b011, 3);
    push_code(&mut stream, codes[b'a' as usize]);
    push_code(&mut stream, codes[257]);
    push_code(&mut stream, (30, 5));
    assert!(inflate(&bools_to_bytes(&stream), 100).is_err());
  }

  #[test]
  fn test_reserved_block_type() {
    assert_eq!(inflate(&[0b111], 100).unwrap_err().kind, PngErrorKind::Malformed);
  }

  #[test]
  fn test_zlib_header_checks() {
    let deflate = [0b001, 0x00, 0x00, 0xFF, 0xFF];
    let good = zlib_wrap(&deflate, &[]);
    assert!(zlib_decompress(&good, 0, true).unwrap().is_empty());
    // check bits
    let mut bad = good.clone();
    bad[1] = 0x02;
    assert!(zlib_decompress(&bad, 0, true).is_err());
    // method 7
    let mut bad = good.clone();
    bad[0] = 0x77;
    bad[1] = 0x01 + (31 - ((0x77 * 256 + 0x01) % 31)) as u8;
    assert!(zlib_decompress(&bad, 0, true).is_err());
    // preset dictionary
    let mut bad = good.clone();
    bad[1] = 0x20 | (31 - ((0x78 * 256 + 0x20) % 31)) as u8;
    assert_eq!((0x78 * 256 + u32::from(bad[1])) % 31, 0);
    assert!(zlib_decompress(&bad, 0, true).is_err());
    // too short
    assert!(zlib_decompress(&[0x78], 0, true).is_err());
  }

  #[test]
  fn test_zlib_adler32_checking() {
    let deflate = [0b001, 0x03, 0x00, 0xFC, 0xFF, 0x41, 0x42, 0x43];
    let mut zlib = zlib_wrap(&deflate, b"ABC");
    let last = zlib.len() - 1;
    zlib[last] ^= 1;
    assert_eq!(zlib_decompress(&zlib, 3, true).unwrap_err().kind, PngErrorKind::Malformed);
    assert_eq!(zlib_decompress(&zlib, 3, false).unwrap(), b"ABC");
    // missing trailer
    zlib.truncate(zlib.len() - 4);
    assert!(zlib_decompress(&zlib, 3, true).is_err());
    assert_eq!(zlib_decompress(&zlib, 3, false).unwrap(), b"ABC");
  }

  #[test]
  fn test_against_miniz_oxide() {
    let mut data = Vec::new();
    for i in 0..20_000_u32 {
      data.push((i % 251) as u8 ^ (i / 97) as u8);
    }
    data.extend_from_slice(&rand_bytes(4000));
    data.extend(core::iter::repeat(7).take(3000));
    for level in [0, 1, 6, 9, 10] {
      let zlib = miniz_oxide::deflate::compress_to_vec_zlib(&data, level);
      assert_eq!(zlib_decompress(&zlib, data.len(), true).unwrap(), data, "level {level}");
      let deflate = miniz_oxide::deflate::compress_to_vec(&data, level);
      assert_eq!(inflate(&deflate, data.len()).unwrap(), data, "level {level}");
    }
  }

  #[test]
  fn test_truncated_streams_never_panic() {
    let data: Vec<u8> = (0..5000_u32).map(|i| (i * i % 256) as u8).collect();
    let zlib = miniz_oxide::deflate::compress_to_vec_zlib(&data, 6);
    for end in 0..zlib.len() {
      assert!(zlib_decompress(&zlib[..end], data.len(), true).is_err());
    }
    for _ in 0..50 {
      let junk = rand_bytes(300);
      let _ = inflate(&junk, 1 << 16);
    }
  }

  fn rand_bytes(count: usize) -> Vec<u8> {
    let mut buffer = vec![0; count];
    getrandom::getrandom(&mut buffer).unwrap();
    buffer
  }
}
