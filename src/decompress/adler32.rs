const MOD_ADLER: u32 = 65521;

/// The most bytes that can be summed before `b` could overflow a `u32`.
const NMAX: usize = 5552;

/// The Adler-32 checksum that trails a zlib stream.
#[inline]
#[must_use]
pub fn adler32(bytes: &[u8]) -> u32 {
  let mut a: u32 = 1;
  let mut b: u32 = 0;
  for chunk in bytes.chunks(NMAX) {
    for &byte in chunk {
      a += u32::from(byte);
      b += a;
    }
    a %= MOD_ADLER;
    b %= MOD_ADLER;
  }
  (b << 16) | a
}

#[test]
fn test_adler32() {
  assert_eq!(adler32(&[]), 1);
  assert_eq!(adler32(b"Wikipedia"), 0x11E6_0398);
  // long enough to need the modulo step several times
  let big = [0xFF_u8; NMAX * 3 + 17];
  let mut a: u64 = 1;
  let mut b: u64 = 0;
  for &x in big.iter() {
    a = (a + u64::from(x)) % u64::from(MOD_ADLER);
    b = (b + a) % u64::from(MOD_ADLER);
  }
  assert_eq!(adler32(&big), ((b << 16) | a) as u32);
}
