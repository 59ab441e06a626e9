use enough::Unstoppable;
use retrobitmaps::*;

/// A 4x3 opaque image with two colors (quantizes to an indexed BMP).
fn two_color_bitmap() -> Bitmap {
    let mut bitmap = Bitmap::new(4, 3).unwrap();
    for y in 0..3 {
        for x in 0..4 {
            let argb = if (x + y) % 2 == 0 {
                0xFFFF_0080
            } else {
                0xFF00_C832
            };
            bitmap.set_pixel(x, y, argb);
        }
    }
    bitmap
}

/// A 20x20 opaque gradient with more than 256 distinct colors (forces the
/// 24-bit BMP path).
fn gradient_bitmap() -> Bitmap {
    let mut bitmap = Bitmap::new(20, 20).unwrap();
    for y in 0..20 {
        for x in 0..20 {
            bitmap.set_pixel(x, y, 0xFF00_0000 | (x * 12) << 16 | (y * 12) << 8 | (x + y));
        }
    }
    bitmap
}

#[test]
fn bmp_indexed_roundtrip() {
    let bitmap = two_color_bitmap();
    let encoded = encode_bmp(&bitmap, Unstoppable).unwrap();
    assert_eq!(&encoded[0..2], b"BM");
    // 2 colors pack at 1 bpp
    assert_eq!(encoded[28], 1);

    let decoded = decode_bmp(&encoded, Unstoppable).unwrap();
    assert_eq!(decoded.hotspot, Hotspot::default());
    assert_eq!(decoded.bitmap.pixels(), bitmap.pixels());
}

#[test]
fn bmp_24bit_roundtrip() {
    let bitmap = gradient_bitmap();
    let encoded = encode_bmp(&bitmap, Unstoppable).unwrap();
    assert_eq!(encoded[28], 24);

    let decoded = decode_bmp(&encoded, Unstoppable).unwrap();
    assert_eq!(decoded.bitmap.pixels(), bitmap.pixels());
}

#[test]
fn bmp_odd_width_indexed_roundtrip() {
    // 5 pixels per row at 4 bpp: rows pad from 3 bytes to 4.
    let colors = [0xFF102030u32, 0xFF405060, 0xFF708090];
    let mut bitmap = Bitmap::new(5, 2).unwrap();
    for y in 0..2 {
        for x in 0..5 {
            bitmap.set_pixel(x, y, colors[(y * 5 + x) as usize % 3]);
        }
    }
    let encoded = encode_bmp(&bitmap, Unstoppable).unwrap();
    assert_eq!(encoded[28], 4);

    let decoded = decode_bmp(&encoded, Unstoppable).unwrap();
    assert_eq!(decoded.bitmap.pixels(), bitmap.pixels());
}

#[test]
fn ppm_roundtrip_drops_alpha() {
    let mut bitmap = two_color_bitmap();
    bitmap.set_pixel(0, 0, 0x80FF_0080);

    let encoded = encode_ppm(&bitmap, Unstoppable).unwrap();
    assert!(encoded.starts_with(b"P6\n4 3\n255\n"));

    let decoded = decode_netpbm(&encoded, Unstoppable).unwrap();
    assert_eq!(decoded.pixel(0, 0), 0xFFFF_0080);
    for y in 0..3 {
        for x in 1..4 {
            assert_eq!(decoded.pixel(x, y), bitmap.pixel(x, y));
        }
    }
}

#[test]
fn pbm_roundtrip_is_identity_on_masks() {
    // Decoded PBM pixels are opaque white/black; re-encoding must emit the
    // same bits.
    let data = b"P4\n9 2\n\xA5\x80\x5A\x00";
    let first = decode_netpbm(data, Unstoppable).unwrap();
    let encoded = encode_pbm(&first, Unstoppable).unwrap();
    assert_eq!(&encoded[..], &b"P4\n9 2\n\xA5\x80\x5A\x00"[..]);

    let second = decode_netpbm(&encoded, Unstoppable).unwrap();
    assert_eq!(first.pixels(), second.pixels());
}

#[test]
fn raw_true_color_layouts() {
    let mut bitmap = Bitmap::new(2, 1).unwrap();
    bitmap.set_pixel(0, 0, 0x8011_2233);
    bitmap.set_pixel(1, 0, 0xFF44_5566);

    let rgba = encode_raw_true_color(&bitmap, PixelLayout::Rgba, Unstoppable).unwrap();
    assert_eq!(rgba, [0x11, 0x22, 0x33, 0x80, 0x44, 0x55, 0x66, 0xFF]);

    let bgra = encode_raw_true_color(&bitmap, PixelLayout::Bgra, Unstoppable).unwrap();
    assert_eq!(bgra, [0x33, 0x22, 0x11, 0x80, 0x66, 0x55, 0x44, 0xFF]);

    let argb = encode_raw_true_color(&bitmap, PixelLayout::Argb, Unstoppable).unwrap();
    assert_eq!(argb, [0x80, 0x11, 0x22, 0x33, 0xFF, 0x44, 0x55, 0x66]);

    let abgr = encode_raw_true_color(&bitmap, PixelLayout::Abgr, Unstoppable).unwrap();
    assert_eq!(abgr, [0x80, 0x33, 0x22, 0x11, 0xFF, 0x66, 0x55, 0x44]);

    assert!(matches!(
        encode_raw_true_color(&bitmap, PixelLayout::Rgb, Unstoppable),
        Err(BitmapError::UnsupportedFormat(_))
    ));
}

#[test]
fn raw_indexed_packs_to_depth() {
    let bitmap = two_color_bitmap();
    // 2 colors at 1 bpp: 4 pixels pack into one byte per row.
    let encoded = encode_raw_indexed(&bitmap, Unstoppable).unwrap();
    assert_eq!(encoded.len(), 3);
    // Checkerboard of palette indices 0 and 1, MSB first.
    assert_eq!(encoded, [0b0101_0000, 0b1010_0000, 0b0101_0000]);
}

#[test]
fn raw_indexed_declines_gradients() {
    assert!(matches!(
        encode_raw_indexed(&gradient_bitmap(), Unstoppable),
        Err(BitmapError::UnsupportedFormat(_))
    ));
}

#[test]
fn detect_format_on_encoder_output() {
    let bitmap = two_color_bitmap();
    let bmp = encode_bmp(&bitmap, Unstoppable).unwrap();
    assert_eq!(detect_format(&bmp), Some(ImageFormat::Bmp));

    let ppm = encode_ppm(&bitmap, Unstoppable).unwrap();
    assert_eq!(detect_format(&ppm), Some(ImageFormat::Netpbm));

    let pbm = encode_pbm(&bitmap, Unstoppable).unwrap();
    assert_eq!(detect_format(&pbm), Some(ImageFormat::Netpbm));
}

#[test]
fn dispatch_decodes_encoder_output() {
    let bitmap = two_color_bitmap();
    let encoded = encode_bmp(&bitmap, Unstoppable).unwrap();
    let decoded = decode(&encoded, Unstoppable).unwrap();
    assert_eq!(decoded.pixels(), bitmap.pixels());
}

#[test]
fn decode_unrecognized_format() {
    assert!(matches!(
        decode(b"JPEG is elsewhere", Unstoppable),
        Err(BitmapError::UnsupportedFormat(_))
    ));
    assert_eq!(detect_format(&[]), None);
}

#[test]
fn limits_reject_large_images() {
    let bitmap = two_color_bitmap();
    let encoded = encode_ppm(&bitmap, Unstoppable).unwrap();
    let limits = Limits {
        max_pixels: Some(4),
        ..Limits::default()
    };
    assert!(matches!(
        decode_with_limits(&encoded, &limits, Unstoppable),
        Err(BitmapError::LimitExceeded(_))
    ));

    let relaxed = Limits {
        max_pixels: Some(1000),
        ..Limits::default()
    };
    assert!(decode_with_limits(&encoded, &relaxed, Unstoppable).is_ok());
}
