//! Exact-color quantization into an [`IndexedBitmap`].

use alloc::collections::BTreeMap;
use alloc::vec::Vec;

use rgb::RGB16;

use crate::bitmap::{Bitmap, IndexedBitmap};
use crate::pixel::alpha_of;

/// Smallest packable depth (1, 2, 4 or 8) holding `color_count` values.
pub fn image_depth(color_count: u32) -> u32 {
    let mut depth = 1;
    while color_count > (1 << depth) {
        depth <<= 1;
    }
    depth
}

fn widen(channel: u8) -> u16 {
    u16::from(channel) * 0x101
}

/// Index a bitmap against an exact palette of its distinct colors.
///
/// Returns `None` when the bitmap cannot be represented: more than 256
/// distinct values, or any fractional alpha. Fully transparent pixels map to
/// one palette slot appended after the opaque colors and reported as
/// `transparent_index`; with `ignore_transparent` their RGB is indexed as if
/// opaque instead.
pub fn convert_bitmap_to_indexed(bitmap: &Bitmap, ignore_transparent: bool) -> Option<IndexedBitmap> {
    let mut color_map: BTreeMap<u32, u8> = BTreeMap::new();
    let mut palette: Vec<RGB16> = Vec::new();
    let mut has_transparent = false;

    for &px in bitmap.pixels() {
        let a = alpha_of(px);
        if !ignore_transparent && a == 0 {
            has_transparent = true;
            continue;
        }
        if !ignore_transparent && a != 0xFF {
            return None;
        }
        let key = px & 0x00FF_FFFF;
        if !color_map.contains_key(&key) {
            if palette.len() + usize::from(has_transparent) >= 256 {
                return None;
            }
            color_map.insert(key, palette.len() as u8);
            palette.push(RGB16 {
                r: widen((key >> 16) as u8),
                g: widen((key >> 8) as u8),
                b: widen(key as u8),
            });
        }
    }

    let transparent_index = if has_transparent {
        if palette.len() >= 256 {
            return None;
        }
        let index = palette.len() as u8;
        palette.push(RGB16 { r: 0, g: 0, b: 0 });
        Some(index)
    } else {
        None
    };

    let mut data = Vec::with_capacity(bitmap.pixels().len());
    for &px in bitmap.pixels() {
        let a = alpha_of(px);
        if !ignore_transparent && a == 0 {
            data.push(transparent_index.unwrap_or(0));
        } else {
            data.push(color_map[&(px & 0x00FF_FFFF)]);
        }
    }

    Some(IndexedBitmap::new(
        bitmap.width(),
        bitmap.height(),
        data,
        palette,
        transparent_index,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn depth_steps() {
        assert_eq!(image_depth(0), 1);
        assert_eq!(image_depth(2), 1);
        assert_eq!(image_depth(3), 2);
        assert_eq!(image_depth(4), 2);
        assert_eq!(image_depth(5), 4);
        assert_eq!(image_depth(16), 4);
        assert_eq!(image_depth(17), 8);
        assert_eq!(image_depth(256), 8);
    }

    #[test]
    fn indexes_distinct_colors_in_first_seen_order() {
        let mut b = Bitmap::new(2, 2).unwrap();
        b.set_pixel(0, 0, 0xFFFF0000);
        b.set_pixel(1, 0, 0xFF00FF00);
        b.set_pixel(0, 1, 0xFFFF0000);
        b.set_pixel(1, 1, 0xFF0000FF);

        let ix = convert_bitmap_to_indexed(&b, false).unwrap();
        assert_eq!(ix.indices(), &[0, 1, 0, 2]);
        assert_eq!(ix.palette().len(), 3);
        assert_eq!(ix.palette()[0], RGB16 { r: 0xFFFF, g: 0, b: 0 });
        assert_eq!(ix.transparent_index(), None);
    }

    #[test]
    fn transparent_pixels_get_appended_slot() {
        let mut b = Bitmap::new(2, 1).unwrap();
        b.set_pixel(0, 0, 0xFFFFFFFF);
        b.set_pixel(1, 0, 0x00000000);

        let ix = convert_bitmap_to_indexed(&b, false).unwrap();
        assert_eq!(ix.transparent_index(), Some(1));
        assert_eq!(ix.indices(), &[0, 1]);
        assert_eq!(ix.palette().len(), 2);
    }

    #[test]
    fn fractional_alpha_declines() {
        let mut b = Bitmap::new(1, 1).unwrap();
        b.set_pixel(0, 0, 0x80FFFFFF);
        assert!(convert_bitmap_to_indexed(&b, false).is_none());
        // ignore_transparent indexes the RGB regardless of alpha
        assert!(convert_bitmap_to_indexed(&b, true).is_some());
    }

    #[test]
    fn too_many_colors_declines() {
        let mut b = Bitmap::new(17, 17).unwrap();
        for y in 0..17 {
            for x in 0..17 {
                b.set_pixel(x, y, 0xFF000000 | (y * 17 + x));
            }
        }
        assert!(convert_bitmap_to_indexed(&b, false).is_none());
    }
}
