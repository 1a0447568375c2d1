#![no_std]
#![cfg_attr(docs_rs, feature(doc_cfg))]
#![forbid(unsafe_code)]
//#![warn(missing_docs)]

//! A minimal PNG decoder.
//!
//! The decoder carries its own DEFLATE implementation, so the only things it
//! needs from the outside world are an allocator and the PNG bytes.
//!
//! ```no_run
//! use upng::{PngDecoder, PixelFormat};
//! let png: &[u8] = unimplemented!("data from somewhere");
//! let mut decoder = PngDecoder::new(png);
//! decoder.decode()?;
//! assert_eq!(decoder.format(), Some(PixelFormat::Rgba8));
//! let pixels: &[u8] = decoder.pixels()?;
//! # Ok::<(), upng::PngError>(())
//! ```
//!
//! Decoding goes through four stages:
//! 1) The chunk parser checks the signature, reads the `IHDR`, and collects
//!    the `IDAT` payloads (plus the `PLTE` of indexed images).
//! 2) The [`decompress`] module inflates the zlib stream.
//! 3) The scanlines are unfiltered.
//! 4) The unfiltered bytes are unpacked into the output [`PixelFormat`].
//!
//! Each stage is also available on its own for people who want to poke at the
//! data themselves, see the [`png`] and [`decompress`] modules.
//!
//! Interlaced images are not supported, and ancillary chunks are skipped.

extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

#[cfg(target_pointer_width = "16")]
compile_error!("this crate assumes 32-bit or bigger pointers!");

mod error;
pub use error::*;

mod options;
pub use options::*;

pub mod decompress;

pub mod png;
pub use png::{ColorModel, PixelFormat, PngPixelFormat, IHDR};

mod decoder;
pub use decoder::*;

pub mod pixel_formats;
pub use pixel_formats::*;

pub mod image;
