use base_encode::to_string;
use xxhash_rust::xxh3::xxh3_128;

const CHARACTERS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

pub fn xxhash_with_base(input: &[u8], base: u8) -> String {
  let hash = xxh3_128(input).to_le_bytes();
  // `to_string` only fails for a base larger than the alphabet.
  to_string(&hash, base, CHARACTERS).unwrap_or_default()
}

/// Alphanumeric hash of `input`, truncated to `len` characters. Stable across builds and platforms.
pub fn short_hash(input: &str, len: usize) -> String {
  let mut hash = xxhash_with_base(input.as_bytes(), 62);
  hash.truncate(len);
  hash
}

#[test]
fn test_xxhash_with_base() {
  assert_eq!(&xxhash_with_base(b"hello", 64), "YOFJeqs95x38-Gwetwem1");
  assert_eq!(&xxhash_with_base(b"hello", 16), "1838525eaacf79c77f3e1b07adc1e9b5");
}

#[test]
fn test_short_hash() {
  let a = short_hash("loader&/src/content.ts", 8);
  assert_eq!(a.len(), 8);
  assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
  assert_eq!(a, short_hash("loader&/src/content.ts", 8));
  assert_ne!(a, short_hash("module&/src/content.ts", 8));
}
