use alloc::{borrow::Cow, vec::Vec};

use crate::{
  decompress::zlib_decompress,
  png::{gather_image_data, read_header, unfilter_and_unpack},
  ColorModel, DecodeOptions, DecodeStage, ErrorLocation, PixelFormat, PngError, PngErrorKind,
  PngResult, IHDR,
};

/// Where a [`PngDecoder`] is in its lifecycle.
///
/// `New` → `Header` → `Decoded`, and any failure moves to `Error`, which is
/// permanent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DecodeState {
  /// Nothing has been parsed yet.
  New,
  /// The header has been parsed, the pixels haven't been decoded.
  Header,
  /// The pixels are available.
  Decoded,
  /// Something failed, see [`PngDecoder::error`].
  Error,
}

/// Decodes one PNG image.
///
/// The source bytes are either borrowed from the caller, or owned by the
/// decoder (eg: when loaded from a file). An owned source is released as soon
/// as the pixels are decoded, since it's not needed after that.
///
/// The first error is kept, and every later call gives that same error back
/// without doing any more work.
#[derive(Clone)]
pub struct PngDecoder<'b> {
  source: Cow<'b, [u8]>,
  options: DecodeOptions,
  header: Option<IHDR>,
  pixels: Vec<u8>,
  state: DecodeState,
  error: Option<PngError>,
}
impl core::fmt::Debug for PngDecoder<'_> {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    f.debug_struct("PngDecoder")
      .field("source", &(matches!(self.source, Cow::Owned(_)), self.source.len()))
      .field("options", &self.options)
      .field("header", &self.header)
      .field("pixels", &self.pixels.len())
      .field("state", &self.state)
      .field("error", &self.error)
      .finish()
  }
}

impl<'b> PngDecoder<'b> {
  /// Makes a decoder that borrows the PNG bytes.
  #[inline]
  #[must_use]
  pub fn new(png: &'b [u8]) -> Self {
    Self::with_options(png, DecodeOptions::default())
  }

  /// As [`new`](Self::new), with non-default options.
  #[inline]
  #[must_use]
  pub fn with_options(png: &'b [u8], options: DecodeOptions) -> Self {
    Self::from_source(Cow::Borrowed(png), options)
  }

  /// Makes a decoder that owns the PNG bytes.
  #[inline]
  #[must_use]
  pub fn from_vec(png: Vec<u8>) -> Self {
    Self::from_vec_with_options(png, DecodeOptions::default())
  }

  /// As [`from_vec`](Self::from_vec), with non-default options.
  #[inline]
  #[must_use]
  pub fn from_vec_with_options(png: Vec<u8>, options: DecodeOptions) -> Self {
    Self::from_source(Cow::Owned(png), options)
  }

  /// Reads a whole file and makes a decoder that owns the bytes.
  ///
  /// If the file can't be read the decoder starts out in the
  /// [`Error`](DecodeState::Error) state with [`PngErrorKind::NotFound`].
  #[cfg(feature = "std")]
  #[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
  #[must_use]
  pub fn from_file(path: impl AsRef<std::path::Path>) -> Self {
    Self::from_file_with_options(path, DecodeOptions::default())
  }

  /// As [`from_file`](Self::from_file), with non-default options.
  #[cfg(feature = "std")]
  #[cfg_attr(docs_rs, doc(cfg(feature = "std")))]
  #[must_use]
  pub fn from_file_with_options(path: impl AsRef<std::path::Path>, options: DecodeOptions) -> Self {
    let path = path.as_ref();
    match std::fs::read(path) {
      Ok(png) => Self::from_vec_with_options(png, options),
      Err(e) => {
        log::debug!("couldn't read `{}`: {e}", path.display());
        let mut out = Self::from_source(Cow::Borrowed(&[]), options);
        out.error = Some(PngError::new(PngErrorKind::NotFound, DecodeStage::Source));
        out
      }
    }
  }

  fn from_source(source: Cow<'b, [u8]>, options: DecodeOptions) -> Self {
    let mut out = Self {
      source,
      options,
      header: None,
      pixels: Vec::new(),
      state: DecodeState::New,
      error: None,
    };
    if out.source.is_empty() {
      out.state = DecodeState::Error;
      out.error = Some(PngError::new(PngErrorKind::InvalidParam, DecodeStage::Source));
    }
    out
  }

  /// Moves to the error state, dropping any pixel data.
  fn fail(&mut self, e: PngError) -> PngError {
    log::debug!("decode failed: {e}");
    self.pixels = Vec::new();
    self.state = DecodeState::Error;
    self.error = Some(e);
    e
  }

  #[inline]
  fn stored_error(&self) -> PngError {
    self.error.unwrap_or_else(|| PngError::new(PngErrorKind::InvalidParam, DecodeStage::Access))
  }

  /// Reads just the image header, so that dimensions and formats can be
  /// checked before doing the full decode.
  ///
  /// Calling this again after it succeeded just gives the same header.
  pub fn parse_header(&mut self) -> PngResult<IHDR> {
    match (self.state, self.header) {
      (DecodeState::Error, _) => return Err(self.stored_error()),
      (DecodeState::Header | DecodeState::Decoded, Some(header)) => return Ok(header),
      _ => (),
    }
    match read_header(&self.source, &self.options) {
      Ok(header) => {
        log::trace!("parsed header: {header:?}");
        self.header = Some(header);
        self.state = DecodeState::Header;
        Ok(header)
      }
      Err(e) => Err(self.fail(e)),
    }
  }

  /// Decodes the image, parsing the header first if needed.
  ///
  /// Once this has succeeded, calling it again does nothing.
  pub fn decode(&mut self) -> PngResult<()> {
    let header = self.parse_header()?;
    if self.state == DecodeState::Decoded {
      return Ok(());
    }
    match decode_pixels(&self.source, &header, &self.options) {
      Ok(pixels) => {
        log::debug!("decoded {}x{} {:?}", header.width, header.height, header.pixel_format);
        self.pixels = pixels;
        self.state = DecodeState::Decoded;
        if matches!(self.source, Cow::Owned(_)) {
          self.source = Cow::Borrowed(&[]);
        }
        Ok(())
      }
      Err(e) => Err(self.fail(e)),
    }
  }

  /// Releases everything the decoder holds.
  ///
  /// Dropping the decoder does the same thing.
  #[inline]
  pub fn teardown(self) {
    log::trace!("teardown: {self:?}");
  }

  /// The decoded pixels.
  ///
  /// Before a successful [`decode`](Self::decode) this is an
  /// [`InvalidParam`](PngErrorKind::InvalidParam) error, or the stored error
  /// if decoding failed.
  #[inline]
  pub fn pixels(&self) -> PngResult<&[u8]> {
    match self.state {
      DecodeState::Decoded => Ok(&self.pixels),
      DecodeState::Error => Err(self.stored_error()),
      _ => Err(PngError::new(PngErrorKind::InvalidParam, DecodeStage::Access)),
    }
  }

  /// Takes the decoded pixels out of the decoder.
  #[inline]
  pub fn into_pixels(self) -> PngResult<Vec<u8>> {
    match self.state {
      DecodeState::Decoded => Ok(self.pixels),
      DecodeState::Error => Err(self.stored_error()),
      _ => Err(PngError::new(PngErrorKind::InvalidParam, DecodeStage::Access)),
    }
  }

  /// Bytes of pixel data (0 until decoded).
  #[inline]
  #[must_use]
  pub fn size(&self) -> usize {
    self.pixels.len()
  }

  #[inline]
  #[must_use]
  pub const fn state(&self) -> DecodeState {
    self.state
  }

  #[inline]
  #[must_use]
  pub const fn options(&self) -> &DecodeOptions {
    &self.options
  }

  /// The parsed header, if any.
  #[inline]
  #[must_use]
  pub const fn header(&self) -> Option<IHDR> {
    self.header
  }

  /// Image width, or 0 if the header hasn't been parsed.
  #[inline]
  #[must_use]
  pub fn width(&self) -> u32 {
    self.header.map_or(0, |h| h.width)
  }

  /// Image height, or 0 if the header hasn't been parsed.
  #[inline]
  #[must_use]
  pub fn height(&self) -> u32 {
    self.header.map_or(0, |h| h.height)
  }

  #[inline]
  #[must_use]
  pub fn color_model(&self) -> Option<ColorModel> {
    self.header.map(|h| h.pixel_format.color_model())
  }

  /// Bits per channel of the stored image, or 0 if the header hasn't been
  /// parsed.
  #[inline]
  #[must_use]
  pub fn bit_depth(&self) -> u8 {
    self.header.map_or(0, |h| h.pixel_format.bit_depth())
  }

  /// Channels per stored pixel (indexed images count as 1).
  #[inline]
  #[must_use]
  pub fn components(&self) -> u8 {
    self.header.map_or(0, |h| h.pixel_format.channels())
  }

  /// Bits per stored pixel, which is the bit depth times the components.
  #[inline]
  #[must_use]
  pub fn bits_per_pixel(&self) -> u32 {
    self.header.map_or(0, |h| h.pixel_format.bits_per_pixel())
  }

  /// The format that the decoded pixels will be in.
  #[inline]
  #[must_use]
  pub fn format(&self) -> Option<PixelFormat> {
    self.header.map(|h| h.pixel_format.output_format())
  }

  #[inline]
  #[must_use]
  pub const fn error(&self) -> Option<PngError> {
    self.error
  }

  #[inline]
  #[must_use]
  pub fn error_kind(&self) -> Option<PngErrorKind> {
    self.error.map(|e| e.kind)
  }

  #[inline]
  #[must_use]
  pub fn error_location(&self) -> Option<ErrorLocation> {
    self.error.map(|e| e.location)
  }
}

/// Everything after the header: gather, inflate, unfilter, unpack.
fn decode_pixels(png: &[u8], header: &IHDR, options: &DecodeOptions) -> PngResult<Vec<u8>> {
  let data = gather_image_data(png, header, options)?;
  log::trace!("{} bytes of zlib data", data.zlib_data.len());
  let limit = header
    .zlib_decompression_requirement()
    .ok_or_else(|| PngError::new(PngErrorKind::Unsupported, DecodeStage::Inflate))?;
  let filtered = zlib_decompress(&data.zlib_data, limit, options.verify_adler32)?;
  drop(data.zlib_data);
  unfilter_and_unpack(header, &filtered, data.palette)
}

#[test]
fn test_empty_source_is_invalid_param() {
  let mut d = PngDecoder::new(&[]);
  assert_eq!(d.state(), DecodeState::Error);
  assert_eq!(d.error_kind(), Some(PngErrorKind::InvalidParam));
  assert_eq!(d.decode().unwrap_err().kind, PngErrorKind::InvalidParam);
  assert_eq!(d.parse_header().unwrap_err().kind, PngErrorKind::InvalidParam);
  assert_eq!(d.width(), 0);
  assert_eq!(d.format(), None);
}

#[test]
fn test_not_png_is_sticky() {
  let mut d = PngDecoder::from_vec(alloc::vec![1, 2, 3, 4, 5, 6, 7, 8, 9]);
  assert_eq!(d.state(), DecodeState::New);
  let e = d.decode().unwrap_err();
  assert_eq!(e.kind, PngErrorKind::NotPng);
  assert_eq!(e.stage(), DecodeStage::Header);
  assert_eq!(d.state(), DecodeState::Error);
  assert_eq!(d.error(), Some(e));
  assert_eq!(d.decode().unwrap_err(), e);
  assert_eq!(d.pixels().unwrap_err(), e);
  assert_eq!(d.size(), 0);
  assert_eq!(d.into_pixels().unwrap_err(), e);
}

#[test]
fn test_truncated_signature_is_malformed() {
  let mut d = PngDecoder::new(&[137, 80, 78]);
  assert_eq!(d.parse_header().unwrap_err().kind, PngErrorKind::Malformed);
  let mut d = PngDecoder::new(&[137, 80, 78, 0]);
  assert_eq!(d.parse_header().unwrap_err().kind, PngErrorKind::NotPng);
}

#[cfg(feature = "std")]
#[test]
fn test_missing_file_is_not_found() {
  let mut d = PngDecoder::from_file("this/file/does/not/exist.png");
  assert_eq!(d.state(), DecodeState::Error);
  assert_eq!(d.decode().unwrap_err().kind, PngErrorKind::NotFound);
  assert_eq!(d.error_location().map(|l| l.stage), Some(DecodeStage::Source));
  assert_eq!(d.pixels().unwrap_err().kind, PngErrorKind::NotFound);
}

#[test]
fn test_teardown_releases_an_owned_source() {
  let d = PngDecoder::from_vec(alloc::vec![1, 2, 3]);
  d.teardown();
  let mut d = PngDecoder::from_vec(alloc::vec![1, 2, 3]);
  assert!(d.decode().is_err());
  d.teardown();
}
