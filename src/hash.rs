const HASHSTART: u32 = 0x1505;

/// Fold one byte into a running hash.
pub fn add(h: u32, c: u8) -> u32 {
    //(h + (h << 5)) ^ (c as u32)
    h.wrapping_shl(5).wrapping_add(h) ^ (c as u32)
}

/// The CDB hash of a key: `h = (h * 33) ^ c`, starting at 5381.
pub fn hash(buf: &[u8]) -> u32 {
    buf.iter().fold(HASHSTART, |h, c| add(h, *c))
}

/// Header bucket a hash falls into.
pub fn bucket(h: u32) -> usize {
    (h & 0xff) as usize
}

/// First slot to probe in a table of `slots` entries. `slots` must be nonzero.
pub fn start_slot(h: u32, slots: u32) -> u32 {
    (h >> 8) % slots
}

#[test]
fn samples() {
    assert_eq!(hash(b""), 0x0001505);
    assert_eq!(hash(b"Hello, world!"), 0x564369e8);
    assert_eq!(hash(b"aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"), 0x40032705);
}

#[test]
fn high_bytes_are_unsigned() {
    // A sign-extended byte would flip all the upper bits.
    assert_eq!(hash(&[0xff]), (0x1505u32 * 33) ^ 0xff);
}

#[test]
fn full_collision() {
    assert_eq!(hash(&[0x00, 0x61]), hash(&[0x01, 0x00]));
    assert_eq!(bucket(hash(b"foo")), 163);
    assert_eq!(start_slot(0x1234_5678, 4), 0x12_3456 % 4);
}
