use upng::{
  decompress::adler32, png::RawPngChunkIter, DecodeOptions, DecodeStage, PngDecoder, PngErrorKind,
};
use walkdir::WalkDir;

use super::{ihdr_bytes, png_with_zlib, TestImage};

fn decode_kind(png: &[u8], options: DecodeOptions) -> Option<PngErrorKind> {
  let mut decoder = PngDecoder::with_options(png, options);
  decoder.decode().err().map(|e| e.kind)
}

fn zlib_of(filtered: &[u8]) -> Vec<u8> {
  miniz_oxide::deflate::compress_to_vec_zlib(filtered, 6)
}

#[test]
fn test_header_rejections() {
  let zlib = zlib_of(&[0, 0]);
  let o = DecodeOptions::default();

  let png = png_with_zlib(&ihdr_bytes(1, 1, 8, 0, 1), None, &zlib, 1000);
  assert_eq!(decode_kind(&png, o), Some(PngErrorKind::Unsupported));

  let png = png_with_zlib(&ihdr_bytes(1, 1, 16, 3, 0), Some(&[0; 3]), &zlib, 1000);
  assert_eq!(decode_kind(&png, o), Some(PngErrorKind::InvalidFormat));

  let png = png_with_zlib(&ihdr_bytes(1, 1, 8, 5, 0), None, &zlib, 1000);
  assert_eq!(decode_kind(&png, o), Some(PngErrorKind::InvalidFormat));

  let png = png_with_zlib(&ihdr_bytes(0, 1, 8, 0, 0), None, &zlib, 1000);
  assert_eq!(decode_kind(&png, o), Some(PngErrorKind::Malformed));

  let png = png_with_zlib(&ihdr_bytes(100, 1, 8, 0, 0), None, &zlib, 1000);
  let small = DecodeOptions::default().with_max_dimensions(99, 99);
  assert_eq!(decode_kind(&png, small), Some(PngErrorKind::Unsupported));

  let mut gif = png.clone();
  gif[..6].copy_from_slice(b"GIF89a");
  assert_eq!(decode_kind(&gif, o), Some(PngErrorKind::NotPng));
}

#[test]
fn test_every_truncation_is_malformed() {
  let png = TestImage::random(6, 8, 5, 5).encode(6, 40);
  for len in 1..png.len() {
    let mut decoder = PngDecoder::new(&png[..len]);
    match decoder.decode() {
      Ok(()) => panic!("decoded a PNG cut to {len} of {} bytes", png.len()),
      Err(e) => assert_eq!(e.kind, PngErrorKind::Malformed, "cut to {len}: {e}"),
    }
  }
}

#[test]
fn test_short_image_data() {
  // one scanline too few
  let zlib = zlib_of(&[0, 1, 2, 0, 3, 4]);
  let png = png_with_zlib(&ihdr_bytes(2, 3, 8, 0, 0), None, &zlib, 1000);
  let mut decoder = PngDecoder::new(&png);
  let e = decoder.decode().unwrap_err();
  assert_eq!((e.kind, e.stage()), (PngErrorKind::Malformed, DecodeStage::Unfilter));
}

#[test]
fn test_too_much_image_data() {
  let zlib = zlib_of(&[0, 1, 2, 0, 3, 4, 0]);
  let png = png_with_zlib(&ihdr_bytes(2, 2, 8, 0, 0), None, &zlib, 1000);
  let mut decoder = PngDecoder::new(&png);
  let e = decoder.decode().unwrap_err();
  assert_eq!((e.kind, e.stage()), (PngErrorKind::Malformed, DecodeStage::Inflate));
}

#[test]
fn test_bad_filter_type() {
  let zlib = zlib_of(&[0, 1, 2, 5, 3, 4]);
  let png = png_with_zlib(&ihdr_bytes(2, 2, 8, 0, 0), None, &zlib, 1000);
  let mut decoder = PngDecoder::new(&png);
  let e = decoder.decode().unwrap_err();
  assert_eq!((e.kind, e.stage()), (PngErrorKind::Malformed, DecodeStage::Unfilter));
}

#[test]
fn test_index_past_palette() {
  let zlib = zlib_of(&[0, 0, 1, 0, 1, 2]);
  let png = png_with_zlib(&ihdr_bytes(2, 2, 8, 3, 0), Some(&[9, 9, 9, 8, 8, 8]), &zlib, 1000);
  let mut decoder = PngDecoder::new(&png);
  let e = decoder.decode().unwrap_err();
  assert_eq!((e.kind, e.stage()), (PngErrorKind::Malformed, DecodeStage::Unpack));
}

#[test]
fn test_adler32_checking() {
  let filtered = [0, 1, 2, 0, 3, 4];
  let mut zlib = zlib_of(&filtered);
  let n = zlib.len();
  assert_eq!(zlib[n - 4..], adler32(&filtered).to_be_bytes());
  zlib[n - 1] ^= 1;
  let png = png_with_zlib(&ihdr_bytes(2, 2, 8, 0, 0), None, &zlib, 1000);
  assert_eq!(decode_kind(&png, DecodeOptions::default()), Some(PngErrorKind::Malformed));
  assert_eq!(decode_kind(&png, DecodeOptions::default().with_verify_adler32(false)), None);

  // a missing trailer only matters if it's checked.
  let png = png_with_zlib(&ihdr_bytes(2, 2, 8, 0, 0), None, &zlib[..n - 4], 1000);
  assert_eq!(decode_kind(&png, DecodeOptions::default()), Some(PngErrorKind::Malformed));
  assert_eq!(decode_kind(&png, DecodeOptions::default().with_verify_adler32(false)), None);
}

#[test]
fn test_crc_checking() {
  let img = TestImage::random(2, 8, 4, 4);
  let mut png = img.encode(6, 1000);
  // the last byte before the IEND chunk is the end of the IDAT CRC.
  let idat_crc_end = png.len() - 12 - 1;
  png[idat_crc_end] ^= 0xFF;
  assert_eq!(decode_kind(&png, DecodeOptions::default()), Some(PngErrorKind::Malformed));
  assert_eq!(decode_kind(&png, DecodeOptions::default().with_verify_crc(false)), None);

  let mut decoder = PngDecoder::with_options(&png, DecodeOptions::default().without_checksums());
  decoder.decode().unwrap();
  assert_eq!(decoder.pixels().unwrap(), img.expected_pixels().as_slice());
}

#[test]
fn test_corrupt_deflate_never_panics() {
  let header = ihdr_bytes(16, 16, 8, 6, 0);
  let lenient = DecodeOptions::default().without_checksums();
  for _ in 0..200 {
    let mut zlib = vec![0x78, 0x9C];
    zlib.extend(crate::rand_bytes(300));
    let png = png_with_zlib(&header, None, &zlib, 1000);
    let _ = decode_kind(&png, lenient);
  }
  // flip single bytes of a real stream
  let img = TestImage::random(6, 8, 16, 16);
  let png = img.encode(6, 100_000);
  let flips = crate::rand_bytes(200);
  for pair in flips.chunks_exact(2) {
    let mut png = png.clone();
    let i = 8 + (usize::from(pair[0]) * 7 + usize::from(pair[1])) % (png.len() - 8);
    png[i] ^= pair[1] | 1;
    let _ = decode_kind(&png, DecodeOptions::default());
    let _ = decode_kind(&png, lenient);
  }
}

#[test]
fn test_RawPngChunkIter_no_panics() {
  // iter ALL files in the test folder, even non-png files shouldn't panic it.
  for entry in WalkDir::new("tests/").into_iter().filter_map(|e| e.ok()) {
    println!("{}", entry.path().display());
    let v = match std::fs::read(entry.path()) {
      Ok(v) => v,
      Err(e) => {
        println!("Error reading file: {e:?}");
        continue;
      }
    };
    for _ in RawPngChunkIter::new(&v) {
      //
    }
    let _ = PngDecoder::new(&v).decode();
  }
  // even totally random data should never panic the iterator!
  for _ in 0..10 {
    let v = crate::rand_bytes(1024);
    for _ in RawPngChunkIter::new(&v) {
      //
    }
    let _ = PngDecoder::new(&v).decode();
  }
}
