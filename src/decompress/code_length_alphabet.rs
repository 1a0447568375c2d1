use super::*;

/// Code length symbols: 0-15 are literal lengths, 16-18 are repeat codes.
const CODE_LENGTH_SYMBOLS: usize = 19;

/// The Huffman code that a dynamic block uses to store the code lengths of
/// its other two trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CodeLengthAlphabet {
  tree: HuffmanTree<CODE_LENGTH_SYMBOLS>,
}
impl CodeLengthAlphabet {
  /// Reads `hclen` 3-bit lengths, stored in [`CODE_LENGTH_ORDER`].
  pub fn read(hclen: usize, bits: &mut BitSource<'_>) -> PngResult<Self> {
    let mut lengths = [0_u8; CODE_LENGTH_SYMBOLS];
    for &i in CODE_LENGTH_ORDER.iter().take(hclen) {
      lengths[i] = bits.next_bits_lsb(3)? as u8;
    }
    Ok(Self { tree: HuffmanTree::from_code_lengths(&lengths)? })
  }

  /// Decodes enough code length symbols to fill in all of `lengths`.
  ///
  /// A repeat that would run past the end of `lengths` is an error, as is
  /// repeating the previous length when there isn't one yet.
  pub fn fill_lengths(&self, lengths: &mut [u8], bits: &mut BitSource<'_>) -> PngResult<()> {
    let mut acquired = 0_usize;
    while acquired < lengths.len() {
      let (value, repeat_count) = match self.tree.decode(bits)? {
        literal @ 0..=15 => (literal as u8, 1),
        16 => {
          // copy the previous length 3 to 6 times
          let previous = match acquired.checked_sub(1) {
            Some(i) => lengths[i],
            None => return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate)),
          };
          (previous, 3 + bits.next_bits_lsb(2)? as usize)
        }
        // zero, 3 to 10 times
        17 => (0, 3 + bits.next_bits_lsb(3)? as usize),
        // zero, 11 to 138 times
        18 => (0, 11 + bits.next_bits_lsb(7)? as usize),
        _ => return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate)),
      };
      let end = acquired + repeat_count;
      if end > lengths.len() {
        log::debug!("code length repeat overruns the tables");
        return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate));
      }
      lengths[acquired..end].fill(value);
      acquired = end;
    }
    Ok(())
  }
}

/// Reads the header of a dynamic block and builds its two trees.
pub(crate) fn read_dynamic_trees(bits: &mut BitSource<'_>) -> PngResult<(LitLenTree, DistTree)> {
  let hlit = bits.next_bits_lsb(5)? as usize + 257;
  let hdist = bits.next_bits_lsb(5)? as usize + 1;
  let hclen = bits.next_bits_lsb(4)? as usize + 4;
  log::trace!("dynamic block: hlit {hlit}, hdist {hdist}, hclen {hclen}");
  if hlit > 286 || hdist > 30 {
    return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate));
  }

  let alphabet = CodeLengthAlphabet::read(hclen, bits)?;
  let mut lengths = [0_u8; 286 + 30];
  let lengths = &mut lengths[..hlit + hdist];
  alphabet.fill_lengths(lengths, bits)?;

  // without an end of block code the block could never end.
  if lengths[256] == 0 {
    return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate));
  }
  let (lit_len_lengths, dist_lengths) = lengths.split_at(hlit);
  Ok((LitLenTree::from_code_lengths(lit_len_lengths)?, DistTree::from_code_lengths(dist_lengths)?))
}

#[test]
fn test_fill_lengths_repeat_codes() {
  let mut cl_lengths = [0_u8; CODE_LENGTH_SYMBOLS];
  cl_lengths[3] = 2;
  cl_lengths[16] = 2;
  cl_lengths[17] = 2;
  cl_lengths[18] = 2;
  let alphabet =
    CodeLengthAlphabet { tree: HuffmanTree::from_code_lengths(&cl_lengths).unwrap() };
  let codes = alphabet.tree.codes(CODE_LENGTH_SYMBOLS);

  let mut stream = Vec::new();
  push_code(&mut stream, codes[3]);
  push_code(&mut stream, codes[16]);
  write_bits(&mut stream, 1, 2); // 4 copies of the 3
  push_code(&mut stream, codes[17]);
  write_bits(&mut stream, 0, 3); // 3 zeros
  push_code(&mut stream, codes[18]);
  write_bits(&mut stream, 2, 7); // 13 zeros
  let bytes = bools_to_bytes(&stream);

  let mut lengths = [9_u8; 21];
  alphabet.fill_lengths(&mut lengths, &mut BitSource::new(&bytes)).unwrap();
  assert_eq!(lengths[..5], [3; 5]);
  assert_eq!(lengths[5..], [0; 16]);

  // one less slot than the stream fills
  let mut lengths = [9_u8; 20];
  assert!(alphabet.fill_lengths(&mut lengths, &mut BitSource::new(&bytes)).is_err());
}

#[test]
fn test_fill_lengths_repeat_without_previous() {
  let mut cl_lengths = [0_u8; CODE_LENGTH_SYMBOLS];
  cl_lengths[16] = 1;
  cl_lengths[0] = 1;
  let alphabet =
    CodeLengthAlphabet { tree: HuffmanTree::from_code_lengths(&cl_lengths).unwrap() };
  let codes = alphabet.tree.codes(CODE_LENGTH_SYMBOLS);
  let mut stream = Vec::new();
  push_code(&mut stream, codes[16]);
  write_bits(&mut stream, 0, 2);
  let bytes = bools_to_bytes(&stream);
  let mut lengths = [0_u8; 8];
  let e = alphabet.fill_lengths(&mut lengths, &mut BitSource::new(&bytes)).unwrap_err();
  assert_eq!(e.kind, PngErrorKind::Malformed);
}

#[test]
fn test_dynamic_header_limits() {
  // hlit of 287 and hdist of 32 are rejected before anything else is read.
  let mut stream = Vec::new();
  write_bits(&mut stream, 30, 5);
  write_bits(&mut stream, 0, 5);
  write_bits(&mut stream, 0, 4);
  let bytes = bools_to_bytes(&stream);
  let e = read_dynamic_trees(&mut BitSource::new(&bytes)).unwrap_err();
  assert_eq!(e.kind, PngErrorKind::Malformed);

  let mut stream = Vec::new();
  write_bits(&mut stream, 0, 5);
  write_bits(&mut stream, 31, 5);
  write_bits(&mut stream, 0, 4);
  let bytes = bools_to_bytes(&stream);
  let e = read_dynamic_trees(&mut BitSource::new(&bytes)).unwrap_err();
  assert_eq!(e.kind, PngErrorKind::Malformed);

  // hlit 257, hdist 1, and a code length code where only 1 and 18 have
  // (1-bit) codes. 18 is third in the stored order and 1 is eighteenth.
  let header = |stream: &mut Vec<bool>| {
    write_bits(stream, 0, 5);
    write_bits(stream, 0, 5);
    write_bits(stream, 14, 4);
    for &i in CODE_LENGTH_ORDER.iter().take(18) {
      write_bits(stream, u32::from(i == 1 || i == 18), 3);
    }
  };
  let mut cl_lengths = [0_u8; CODE_LENGTH_SYMBOLS];
  cl_lengths[1] = 1;
  cl_lengths[18] = 1;
  let codes = HuffmanTree::<CODE_LENGTH_SYMBOLS>::from_code_lengths(&cl_lengths)
    .unwrap()
    .codes(CODE_LENGTH_SYMBOLS);

  // 256 zeros, then a length for the end of block code and one distance.
  let mut stream = Vec::new();
  header(&mut stream);
  push_code(&mut stream, codes[18]);
  write_bits(&mut stream, 127, 7);
  push_code(&mut stream, codes[18]);
  write_bits(&mut stream, 107, 7);
  push_code(&mut stream, codes[1]);
  push_code(&mut stream, codes[1]);
  let bytes = bools_to_bytes(&stream);
  assert!(read_dynamic_trees(&mut BitSource::new(&bytes)).is_ok());

  // 257 zeros leaves the end of block code without a length.
  let mut stream = Vec::new();
  header(&mut stream);
  push_code(&mut stream, codes[18]);
  write_bits(&mut stream, 127, 7);
  push_code(&mut stream, codes[18]);
  write_bits(&mut stream, 108, 7);
  push_code(&mut stream, codes[1]);
  let bytes = bools_to_bytes(&stream);
  let e = read_dynamic_trees(&mut BitSource::new(&bytes)).unwrap_err();
  assert_eq!(e.kind, PngErrorKind::Malformed);
}
