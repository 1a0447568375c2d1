use super::*;

/// The first eight bytes of a PNG datastream should match these bytes.
pub const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// Checks if the bytes start with the PNG signature.
#[inline]
#[must_use]
pub fn is_png_signature(bytes: &[u8]) -> bool {
  bytes.starts_with(&PNG_SIGNATURE)
}

/// Like [`is_png_signature`], but tells apart "not a PNG" from "a PNG that was
/// cut off inside the signature".
#[inline]
#[track_caller]
pub(crate) fn check_signature(bytes: &[u8]) -> PngResult<()> {
  if is_png_signature(bytes) {
    Ok(())
  } else if bytes.len() < PNG_SIGNATURE.len() && PNG_SIGNATURE.starts_with(bytes) {
    Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Header))
  } else {
    Err(PngError::new(PngErrorKind::NotPng, DecodeStage::Header))
  }
}

/// Checks the signature and reads the `IHDR`, which must be the first chunk.
pub fn read_header(png: &[u8], options: &DecodeOptions) -> PngResult<IHDR> {
  check_signature(png)?;
  let chunk = match RawPngChunkIter::new(png).next() {
    Some(Ok(chunk)) => chunk,
    // the signature was fine, so the data was cut short.
    Some(Err(_)) | None => {
      return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Header))
    }
  };
  if chunk.type_ != PngChunkType::IHDR {
    log::debug!("first chunk is {:?}", chunk.type_);
    return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Header));
  }
  if options.verify_crc && !chunk.crc_is_valid() {
    log::debug!("IHDR CRC mismatch");
    return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Header));
  }
  let ihdr = IHDR::try_from_data(chunk.data, options)?;
  log::trace!("{ihdr:?}");
  Ok(ihdr)
}

/// The critical data pulled out of the chunks after the `IHDR`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageData<'b> {
  /// All `IDAT` payloads, joined in order. This is a zlib stream.
  pub zlib_data: Vec<u8>,
  /// The `PLTE` entries, if there was a palette.
  pub palette: Option<&'b [RGB8]>,
}

/// Walks the chunks following the `IHDR`, collecting the image data.
///
/// `png` is the full datastream (signature included) that `header` came
/// from.
///
/// ## Failure
/// All of these are [`PngErrorKind::Malformed`]:
/// * A chunk that's cut short, or has a bad CRC (when checked).
/// * A second `IHDR`, or a critical chunk this decoder doesn't know.
/// * `IDAT` chunks that aren't all next to each other, or no `IDAT` at all.
/// * A `PLTE` that's empty, more than 256 entries, not a multiple of 3 bytes,
///   after the `IDAT`, repeated, or in a greyscale image.
/// * An indexed image with no `PLTE`.
/// * No `IEND`.
pub fn gather_image_data<'b>(
  png: &'b [u8], header: &IHDR, options: &DecodeOptions,
) -> PngResult<ImageData<'b>> {
  let malformed = || PngError::new(PngErrorKind::Malformed, DecodeStage::Chunks);
  let color_model = header.pixel_format.color_model();
  let mut zlib_data: Vec<u8> = Vec::new();
  let mut palette: Option<&'b [RGB8]> = None;
  let mut idat_seen = false;
  let mut idat_ended = false;
  let mut iend_seen = false;

  // skip the IHDR, it was already read.
  for chunk in RawPngChunkIter::new(png).skip(1) {
    let chunk = chunk?;
    if options.verify_crc && !chunk.crc_is_valid() {
      log::debug!("{:?} CRC mismatch", chunk.type_);
      return Err(malformed());
    }
    if idat_seen && chunk.type_ != PngChunkType::IDAT {
      idat_ended = true;
    }
    match chunk.type_ {
      PngChunkType::IDAT => {
        if idat_ended {
          log::debug!("IDAT chunks are split up by other chunks");
          return Err(malformed());
        }
        zlib_data
          .try_reserve(chunk.data.len())
          .map_err(|_| PngError::new(PngErrorKind::Alloc, DecodeStage::Chunks))?;
        zlib_data.extend_from_slice(chunk.data);
        idat_seen = true;
      }
      PngChunkType::PLTE => {
        let greyscale = matches!(color_model, ColorModel::Luminance | ColorModel::LuminanceAlpha);
        if palette.is_some() || idat_seen || greyscale {
          log::debug!("PLTE is out of place");
          return Err(malformed());
        }
        if chunk.data.is_empty() || chunk.data.len() > 256 * 3 {
          return Err(malformed());
        }
        palette = Some(bytemuck::try_cast_slice(chunk.data).map_err(|_| malformed())?);
      }
      PngChunkType::IEND => {
        iend_seen = true;
        break;
      }
      PngChunkType::IHDR => {
        log::debug!("a second IHDR");
        return Err(malformed());
      }
      other if other.is_critical() => {
        log::debug!("unknown critical chunk {other:?}");
        return Err(malformed());
      }
      other => log::trace!("skipping {other:?} ({} bytes)", chunk.data.len()),
    }
  }

  if !iend_seen {
    log::debug!("no IEND");
    return Err(malformed());
  }
  if !idat_seen {
    log::debug!("no IDAT");
    return Err(malformed());
  }
  if color_model == ColorModel::Indexed && palette.is_none() {
    log::debug!("indexed color without a PLTE");
    return Err(malformed());
  }
  Ok(ImageData { zlib_data, palette })
}
