use super::*;

/// Base match length for length symbols 257 through 285.
pub(crate) const LENGTH_BASE: [u16; 29] = [
  3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
  163, 195, 227, 258,
];

/// Extra bits to read after length symbols 257 through 285.
pub(crate) const LENGTH_EXTRA: [u8; 29] =
  [0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0];

/// Base distance for distance symbols 0 through 29.
pub(crate) const DIST_BASE: [u16; 30] = [
  1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537, 2049,
  3073, 4097, 6145, 8193, 12289, 16385, 24577,
];

/// Extra bits to read after distance symbols 0 through 29.
pub(crate) const DIST_EXTRA: [u8; 30] =
  [0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13, 13];

/// The order that the code length alphabet's own code lengths are stored in.
pub(crate) const CODE_LENGTH_ORDER: [usize; 19] =
  [16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15];

/// Literal/length symbols, including the two that can't be used.
pub(crate) const LIT_LEN_SYMBOLS: usize = 288;

/// Distance symbols, including the two that can't be used.
pub(crate) const DIST_SYMBOLS: usize = 32;

pub(crate) type LitLenTree = HuffmanTree<LIT_LEN_SYMBOLS>;
pub(crate) type DistTree = HuffmanTree<DIST_SYMBOLS>;

const fn fixed_lit_len_lengths() -> [u8; LIT_LEN_SYMBOLS] {
  let mut out = [0; LIT_LEN_SYMBOLS];
  let mut i = 0;
  while i < LIT_LEN_SYMBOLS {
    out[i] = match i {
      0..=143 => 8,
      144..=255 => 9,
      256..=279 => 7,
      _ => 8,
    };
    i += 1;
  }
  out
}

pub(crate) static FIXED_LIT_LEN_TREE: LitLenTree =
  HuffmanTree::from_valid_lengths(&fixed_lit_len_lengths());

pub(crate) static FIXED_DIST_TREE: DistTree = HuffmanTree::from_valid_lengths(&[5; DIST_SYMBOLS]);
