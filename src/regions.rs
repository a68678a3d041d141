//! Multi-region buffer layout.
//!
//! Output is `[one u32 LE absolute offset per region][region bodies]`, each
//! body padded to a 4-byte boundary before the next offset is recorded, so
//! firmware can seek straight into any region.

pub fn pack_regions(regions: &[Vec<u8>]) -> Vec<u8> {
    let header_len = 4 * regions.len();

    let mut header = Vec::with_capacity(header_len);
    let mut data = Vec::new();

    for region in regions {
        let offset = (header_len + data.len()) as u32;
        header.extend_from_slice(&offset.to_le_bytes());
        data.extend_from_slice(region);
        while data.len() % 4 != 0 {
            data.push(0);
        }
    }

    header.extend_from_slice(&data);
    header
}
