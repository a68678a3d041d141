//! Firmware font blob encoder.
//!
//! Blob layout:
//!
//! ```text
//! 0   ascent            u8
//! 1   descent           u8
//! 2   start encoding    u8
//! 3   end encoding      u8
//! 4   offset table      one entry per encoding in [start, end];
//!                       u32 LE at 8 bpp, u16 BE at 1 bpp
//! ...  glyph records in encoding order
//! ```
//!
//! A glyph record is `[dx i8][width u8][height u8][x i8][y i8][pixels]`; an
//! encoding with no glyph (or no pixels) is a single `255` byte. Offsets are
//! relative to the start of the blob and recorded for every encoding, empty
//! ones included.

use crate::model::Font;

pub fn font_data(font: &Font) -> Vec<u8> {
    let start_encoding = font.glyphs.iter().map(|g| g.encoding).min().unwrap_or(32);
    let end_encoding = font.glyphs.iter().map(|g| g.encoding).max().unwrap_or(127);

    let mut data = Vec::new();
    if start_encoding > end_encoding {
        return data;
    }

    data.push(font.ascent);
    data.push(font.descent);
    data.push(start_encoding as u8);
    data.push(end_encoding as u8);

    let entry_size = if font.bpp == 8 { 4 } else { 2 };
    let table_start = data.len();
    data.resize(table_start + entry_size * (end_encoding - start_encoding + 1) as usize, 0);

    for encoding in start_encoding..=end_encoding {
        let entry = table_start + entry_size * (encoding - start_encoding) as usize;
        let offset = data.len();
        if font.bpp == 8 {
            data[entry..entry + 4].copy_from_slice(&(offset as u32).to_le_bytes());
        } else {
            data[entry..entry + 2].copy_from_slice(&(offset as u16).to_be_bytes());
        }

        let glyph = font.glyphs.iter().find(|g| g.encoding == encoding);
        match glyph.and_then(|g| g.pixels.as_ref().map(|p| (g, p))) {
            Some((glyph, pixels)) => {
                data.push(glyph.dx as u8);
                data.push(glyph.width);
                data.push(glyph.height);
                data.push(glyph.x as u8);
                data.push(glyph.y as u8);
                data.extend_from_slice(pixels);
            }
            None => data.push(255),
        }
    }

    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Glyph;

    fn font(bpp: u8, glyphs: Vec<Glyph>) -> Font {
        Font {
            name: "f".to_string(),
            ascent: 12,
            descent: 3,
            bpp,
            glyphs,
            always_build: false,
        }
    }

    fn glyph(encoding: u32, pixels: Option<Vec<u8>>) -> Glyph {
        Glyph {
            encoding,
            dx: 6,
            width: 5,
            height: 7,
            x: -1,
            y: 2,
            pixels,
        }
    }

    #[test]
    fn eight_bpp_single_glyph_layout() {
        let data = font_data(&font(8, vec![glyph(65, Some(vec![0xaa, 0xbb]))]));

        assert_eq!(&data[0..4], &[12, 3, 65, 65]);
        // One u32 LE offset pointing just past the table.
        assert_eq!(&data[4..8], &[8, 0, 0, 0]);
        // dx, width, height, x (-1 wraps), y, pixels.
        assert_eq!(&data[8..], &[6, 5, 7, 0xff, 2, 0xaa, 0xbb]);
    }

    #[test]
    fn one_bpp_offsets_are_u16_big_endian() {
        let data = font_data(&font(
            1,
            vec![glyph(48, Some(vec![1])), glyph(49, Some(vec![2]))],
        ));

        // Header 4 + table 2x2 = glyphs start at 8.
        assert_eq!(&data[4..6], &[0, 8]);
        // First glyph record is 5 header bytes + 1 pixel byte.
        assert_eq!(&data[6..8], &[0, 14]);
    }

    #[test]
    fn missing_encoding_in_range_encodes_as_single_marker_byte() {
        let data = font_data(&font(
            8,
            vec![glyph(65, Some(vec![9])), glyph(67, Some(vec![9]))],
        ));

        // Encodings 65..=67, table of 3 u32 entries at offset 4.
        let off_66 = u32::from_le_bytes(data[8..12].try_into().unwrap()) as usize;
        assert_eq!(data[off_66], 255);
        let off_67 = u32::from_le_bytes(data[12..16].try_into().unwrap()) as usize;
        assert_eq!(off_67, off_66 + 1);
    }

    #[test]
    fn empty_font_covers_ascii_range_with_empty_glyphs() {
        let data = font_data(&font(8, vec![]));
        assert_eq!(&data[2..4], &[32, 127]);
        // 4 header + 96 u32 offsets + 96 marker bytes.
        assert_eq!(data.len(), 4 + 96 * 4 + 96);
        assert_eq!(data[4 + 96 * 4], 255);
    }
}
