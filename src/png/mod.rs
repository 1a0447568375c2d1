//! The PNG side of decoding: chunks, the header, unfiltering, and unpacking.
//!
//! * [Portable Network Graphics Specification (Second Edition)][png-spec]
//!
//! [png-spec]: https://www.w3.org/TR/2003/REC-PNG-20031110/
//!
//! The general format of a PNG is that the information is stored in "chunks".
//! There's four "critical" chunk types:
//! * **Header** (`IHDR`) - The image's dimensions and pixel format, and if the
//!   image is interlaced or not. This must be the first chunk.
//! * **Palette** (`PLTE`) - If an image uses indexed color it will have a
//!   palette of what index values map to what `RGB8` values.
//! * **Image Data** (`IDAT`) - One or more chunks of compressed data. All of
//!   the compressed data forms a single zlib data stream, and all of the image
//!   data chunks must appear one after the other.
//! * **End** (`IEND`) - The last chunk, lets you know you had the full PNG and
//!   your data wasn't truncated accidentally.
//!
//! Any other chunk is "ancillary" if the first letter of its type is
//! lowercase. Those are skipped. An unknown critical chunk is an error, since
//! there's no telling what it would have changed about the image.
//!
//! ## Decoding a PNG Yourself
//! [`PngDecoder`](crate::PngDecoder) runs all of this for you, but each step
//! is here if you want to do it by hand:
//!
//! 1) [`read_header`] to check the signature and get the [`IHDR`].
//! 2) [`gather_image_data`] to join the `IDAT` payloads and find the palette.
//! 3) [`zlib_decompress`](crate::decompress::zlib_decompress) the joined data,
//!    with [`IHDR::zlib_decompression_requirement`] as the limit.
//! 4) [`unfilter_and_unpack`] to get the final pixels, or use
//!    [`unfilter_scanlines`] with your own per-line callback.

use core::fmt::{Debug, Write};

use alloc::vec::Vec;

use crate::{
  pixel_formats::RGB8, DecodeOptions, DecodeStage, PngError, PngErrorKind, PngResult,
};

mod crc32;
pub use crc32::*;

mod raw_chunk;
pub use raw_chunk::*;

mod pixel_format;
pub use pixel_format::*;

mod ihdr;
pub use ihdr::*;

mod datastream;
pub use datastream::*;

mod unfilter;
pub use unfilter::*;

mod unpack;
pub use unpack::*;


/// A zero filled `Vec`, or an `Alloc` error blamed on `stage`.
#[inline]
fn try_zeroed_vec(len: usize, stage: DecodeStage) -> PngResult<Vec<u8>> {
  let mut v = Vec::new();
  v.try_reserve_exact(len).map_err(|_| PngError::new(PngErrorKind::Alloc, stage))?;
  v.resize(len, 0);
  Ok(v)
}
