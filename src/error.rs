use core::fmt::{Display, Formatter};

/// The broad category of a decoding failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum PngErrorKind {
  /// The allocator couldn't give us enough space.
  #[error("memory allocation failed")]
  Alloc,

  /// The file to decode couldn't be read.
  #[error("file could not be read")]
  NotFound,

  /// The data doesn't start with the PNG signature.
  #[error("not a png datastream")]
  NotPng,

  /// The data is a PNG, but it's broken or truncated somewhere.
  ///
  /// This also covers every problem inside the zlib stream, as well as CRC
  /// and Adler-32 mismatches when checksum verification is on.
  #[error("malformed png data")]
  Malformed,

  /// The PNG is well formed but uses something this decoder doesn't do.
  ///
  /// This is interlacing, or image dimensions above the configured limits.
  #[error("unsupported png feature")]
  Unsupported,

  /// The color type and bit depth pair isn't one that PNG allows.
  #[error("invalid color type and bit depth combination")]
  InvalidFormat,

  /// The decoder was used incorrectly (eg: empty input, or asking for pixels
  /// before decoding).
  #[error("invalid parameter")]
  InvalidParam,
}

/// Which part of the decoder raised an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[allow(missing_docs)]
pub enum DecodeStage {
  Source,
  Header,
  Chunks,
  Inflate,
  Unfilter,
  Unpack,
  Access,
}
impl Display for DecodeStage {
  #[inline]
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    f.write_str(match self {
      Self::Source => "source",
      Self::Header => "header",
      Self::Chunks => "chunks",
      Self::Inflate => "inflate",
      Self::Unfilter => "unfilter",
      Self::Unpack => "unpack",
      Self::Access => "access",
    })
  }
}

/// Where an error was raised: the stage, and the source line within this
/// crate that noticed the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ErrorLocation {
  /// The decode stage.
  pub stage: DecodeStage,
  /// 1-based source line.
  pub line: u32,
}
impl Display for ErrorLocation {
  #[inline]
  fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
    write!(f, "{} stage (line {})", self.stage, self.line)
  }
}

/// An error from the `upng` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("{kind} during {location}")]
pub struct PngError {
  /// What went wrong.
  pub kind: PngErrorKind,
  /// Where it went wrong.
  pub location: ErrorLocation,
}
impl PngError {
  /// Makes a new error, recording the line of the caller.
  #[inline]
  #[must_use]
  #[track_caller]
  pub fn new(kind: PngErrorKind, stage: DecodeStage) -> Self {
    let line = core::panic::Location::caller().line();
    Self { kind, location: ErrorLocation { stage, line } }
  }

  /// The error's kind.
  #[inline]
  #[must_use]
  pub const fn kind(&self) -> PngErrorKind {
    self.kind
  }

  /// The error's stage.
  #[inline]
  #[must_use]
  pub const fn stage(&self) -> DecodeStage {
    self.location.stage
  }
}

/// Alias for a `Result` with [`PngError`].
pub type PngResult<T> = Result<T, PngError>;

#[test]
fn test_error_records_the_calling_line() {
  let here = line!() + 1;
  let e = PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate);
  assert_eq!(e.location.line, here);
  assert_eq!(e.stage(), DecodeStage::Inflate);
  assert_eq!(e.kind(), PngErrorKind::Malformed);
}
