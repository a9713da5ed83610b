//! On-disk layout constants.
//!
//! ```text
//! offset 0     : 256 x (u32 table_pointer, u32 table_length)   header
//! offset 2048  : (u32 key_len, u32 val_len, key, val) ...      records
//! offset ...   : 256 x table_length x (u32 hash, u32 record)   hash tables
//! ```
//!
//! All integers are little-endian.

use crate::uint32;

/// Number of buckets (and header slots).
pub const BUCKETS: usize = 256;

/// Size of one header or hash table slot.
pub const SLOT_SIZE: usize = 8;

/// Size of the header, which is also the offset of the first record.
pub const HEADER_SIZE: usize = BUCKETS * SLOT_SIZE;

/// Size of the `(key_len, val_len)` prefix of a record.
pub const RECORD_HEADER_SIZE: u32 = 8;

/// Returns the `(table_pointer, table_length)` pair stored for `bucket`.
pub fn header_slot(header: &[u8], bucket: usize) -> (u32, u32) {
    let x = bucket * SLOT_SIZE;
    uint32::unpack2(&header[x..x + SLOT_SIZE])
}

/// Offset at which the record region ends, given a full header.
///
/// Hash tables are always written after every record, so the lowest table
/// pointer bounds the records. Pointers of zero mark empty buckets and
/// are skipped; a header with no pointers at all describes an empty
/// database.
pub fn records_end(header: &[u8]) -> u32 {
    (0..BUCKETS)
        .map(|i| header_slot(header, i).0)
        .filter(|&p| p != 0)
        .min()
        .unwrap_or(HEADER_SIZE as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_end_skips_zero_pointers() {
        let mut header = [0u8; HEADER_SIZE];
        assert_eq!(records_end(&header), 2048);

        uint32::pack2(&mut header[8..16], 4096, 2);
        uint32::pack2(&mut header[80..88], 3000, 0);
        assert_eq!(records_end(&header), 3000);
        assert_eq!(header_slot(&header, 1), (4096, 2));
        assert_eq!(header_slot(&header, 0), (0, 0));
    }
}
