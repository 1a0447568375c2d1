use super::*;

/// The longest code DEFLATE allows.
pub(crate) const MAX_CODE_BITS: usize = 15;

/// A canonical Huffman code, stored as the number of codes of each length and
/// the symbols sorted by (code length, symbol).
///
/// That's all the information you need to decode a canonical code, because
/// the codes of each length are consecutive values, and the first code of
/// each length is determined by the counts of the shorter lengths.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct HuffmanTree<const N: usize> {
  counts: [u16; MAX_CODE_BITS + 1],
  symbols: [u16; N],
}
impl<const N: usize> core::fmt::Debug for HuffmanTree<N> {
  fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
    f.debug_struct("HuffmanTree").field("counts", &self.counts).finish()
  }
}

impl<const N: usize> HuffmanTree<N> {
  /// Builds a tree from lengths that are known to be good (eg: the fixed
  /// tables).
  pub(crate) const fn from_valid_lengths(lengths: &[u8; N]) -> Self {
    let mut counts = [0_u16; MAX_CODE_BITS + 1];
    let mut i = 0;
    while i < N {
      counts[lengths[i] as usize] += 1;
      i += 1;
    }
    counts[0] = 0;
    let mut offsets = [0_u16; MAX_CODE_BITS + 2];
    let mut len = 1;
    while len <= MAX_CODE_BITS {
      offsets[len + 1] = offsets[len] + counts[len];
      len += 1;
    }
    let mut symbols = [0_u16; N];
    let mut symbol = 0;
    while symbol < N {
      let len = lengths[symbol] as usize;
      if len != 0 {
        symbols[offsets[len] as usize] = symbol as u16;
        offsets[len] += 1;
      }
      symbol += 1;
    }
    Self { counts, symbols }
  }

  /// Builds a tree from the code lengths of a dynamic block.
  ///
  /// * There can be fewer lengths than `N`, the rest are unused symbols.
  /// * Lengths above 15, or too many codes of some length (over-subscribed),
  ///   are an error.
  /// * Too few codes (incomplete) is also an error, except for the two cases
  ///   DEFLATE allows: no codes at all, and a single code of length 1. You
  ///   can build an empty tree, but decoding with it always fails.
  pub(crate) fn from_code_lengths(lengths: &[u8]) -> PngResult<Self> {
    if lengths.len() > N {
      return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate));
    }
    let mut counts = [0_u16; MAX_CODE_BITS + 1];
    for &len in lengths {
      let len = usize::from(len);
      if len > MAX_CODE_BITS {
        return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate));
      }
      counts[len] += 1;
    }
    counts[0] = 0;

    let mut left: i32 = 1;
    for &count in &counts[1..] {
      left <<= 1;
      left -= i32::from(count);
      if left < 0 {
        log::debug!("over-subscribed code lengths");
        return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate));
      }
    }
    let used: u16 = counts.iter().sum();
    if left > 0 && used != 0 && !(used == 1 && counts[1] == 1) {
      log::debug!("incomplete code lengths ({used} codes)");
      return Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate));
    }

    let mut offsets = [0_u16; MAX_CODE_BITS + 2];
    for len in 1..=MAX_CODE_BITS {
      offsets[len + 1] = offsets[len] + counts[len];
    }
    let mut symbols = [0_u16; N];
    for (symbol, &len) in lengths.iter().enumerate() {
      let len = usize::from(len);
      if len != 0 {
        symbols[usize::from(offsets[len])] = symbol as u16;
        offsets[len] += 1;
      }
    }
    Ok(Self { counts, symbols })
  }

  /// Decodes one symbol, reading a bit at a time.
  ///
  /// `code` is the bits read so far (first bit highest), `first` is the first
  /// code of the current length, and `index` is where that length's symbols
  /// start.
  #[inline]
  pub(crate) fn decode(&self, bits: &mut BitSource<'_>) -> PngResult<u16> {
    let mut code: i32 = 0;
    let mut first: i32 = 0;
    let mut index: i32 = 0;
    for &count in &self.counts[1..] {
      code |= bits.next_one_bit()? as i32;
      let count = i32::from(count);
      if code - count < first {
        return Ok(self.symbols[(index + (code - first)) as usize]);
      }
      index += count;
      first += count;
      first <<= 1;
      code <<= 1;
    }
    Err(PngError::new(PngErrorKind::Malformed, DecodeStage::Inflate))
  }

  /// Gives the code assigned to each symbol as `(bit_pattern, bit_count)`,
  /// with `bit_count` 0 for unused symbols.
  #[cfg(test)]
  pub(crate) fn codes(&self, symbol_count: usize) -> Vec<(u16, u16)> {
    let mut out = alloc::vec![(0, 0); symbol_count];
    let mut code = 0_u16;
    let mut index = 0_usize;
    for len in 1..=MAX_CODE_BITS {
      for _ in 0..self.counts[len] {
        out[usize::from(self.symbols[index])] = (code, len as u16);
        code += 1;
        index += 1;
      }
      code <<= 1;
    }
    out
  }
}

/// Test helper: writes a Huffman code into a bit buffer, highest code bit
/// first, the way DEFLATE packs them.
#[cfg(test)]
pub(crate) fn push_code(out: &mut Vec<bool>, (pattern, count): (u16, u16)) {
  for i in (0..count).rev() {
    out.push((pattern >> i) & 1 != 0);
  }
}

/// Test helper: writes `count` bits of a plain value, lowest bit first.
#[cfg(test)]
pub(crate) fn write_bits(out: &mut Vec<bool>, value: u32, count: u32) {
  for i in 0..count {
    out.push((value >> i) & 1 != 0);
  }
}

#[cfg(test)]
pub(crate) fn bools_to_bytes(bits: &[bool]) -> Vec<u8> {
  let mut out = alloc::vec![0_u8; (bits.len() + 7) / 8];
  for (i, b) in bits.iter().copied().enumerate() {
    if b {
      out[i / 8] |= 1 << (i % 8);
    }
  }
  out
}

#[test]
fn test_canonical_codes_small_example() {
  let tree = HuffmanTree::<4>::from_code_lengths(&[2, 1, 3, 3]).unwrap();
  assert_eq!(tree.codes(4), [(0b10, 2), (0b0, 1), (0b110, 3), (0b111, 3)]);
}

#[test]
fn test_canonical_codes_bigger_example() {
  let tree = HuffmanTree::<8>::from_code_lengths(&[3, 3, 3, 3, 3, 2, 4, 4]).unwrap();
  assert_eq!(
    tree.codes(8),
    [
      (0b010, 3),
      (0b011, 3),
      (0b100, 3),
      (0b101, 3),
      (0b110, 3),
      (0b00, 2),
      (0b1110, 4),
      (0b1111, 4)
    ]
  );
}

#[test]
fn test_fixed_literal_length_codes() {
  let codes = FIXED_LIT_LEN_TREE.codes(288);
  assert_eq!(codes[0], (0b00110000, 8));
  assert_eq!(codes[143], (0b10111111, 8));
  assert_eq!(codes[144], (0b110010000, 9));
  assert_eq!(codes[255], (0b111111111, 9));
  assert_eq!(codes[256], (0b0000000, 7));
  assert_eq!(codes[279], (0b0010111, 7));
  assert_eq!(codes[280], (0b11000000, 8));
  assert_eq!(codes[287], (0b11000111, 8));
}

#[test]
fn test_bad_code_lengths() {
  // over-subscribed
  assert!(HuffmanTree::<3>::from_code_lengths(&[1, 1, 1]).is_err());
  // incomplete
  assert!(HuffmanTree::<3>::from_code_lengths(&[2, 2, 2]).is_err());
  assert!(HuffmanTree::<2>::from_code_lengths(&[0, 2]).is_err());
  // too long
  assert!(HuffmanTree::<2>::from_code_lengths(&[16, 1]).is_err());
  // more lengths than symbols
  assert!(HuffmanTree::<2>::from_code_lengths(&[1, 1, 0]).is_err());
}

#[test]
fn test_allowed_incomplete_trees() {
  let single = HuffmanTree::<30>::from_code_lengths(&[0, 0, 1]).unwrap();
  let mut bits = BitSource::new(&[0b0]);
  assert_eq!(single.decode(&mut bits).unwrap(), 2);
  let mut bits = BitSource::new(&[0b1]);
  assert!(single.decode(&mut bits).is_err());

  let empty = HuffmanTree::<30>::from_code_lengths(&[0; 30]).unwrap();
  let mut bits = BitSource::new(&[0; 4]);
  assert!(empty.decode(&mut bits).is_err());
}

#[test]
fn test_decode_each_symbol() {
  let lengths = [3, 3, 3, 3, 3, 2, 4, 4];
  let tree = HuffmanTree::<8>::from_code_lengths(&lengths).unwrap();
  let mut stream = Vec::new();
  let codes = tree.codes(8);
  for symbol in [7, 0, 5, 5, 6, 1, 2, 3, 4] {
    push_code(&mut stream, codes[symbol]);
  }
  let bytes = bools_to_bytes(&stream);
  let mut bits = BitSource::new(&bytes);
  for symbol in [7, 0, 5, 5, 6, 1, 2, 3, 4] {
    assert_eq!(tree.decode(&mut bits).unwrap(), symbol);
  }
}
