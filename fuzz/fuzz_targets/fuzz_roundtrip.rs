#![no_main]
use libfuzzer_sys::fuzz_target;
use retrobitmaps::*;

fuzz_target!(|data: &[u8]| {
    // If it decodes, re-encoding and decoding again must reproduce the
    // pixels up to the formats' declared precision loss.
    let Ok(decoded) = decode(data, enough::Unstoppable) else {
        return;
    };

    // PPM keeps RGB, drops alpha.
    if let Ok(ppm) = encode_ppm(&decoded, enough::Unstoppable) {
        let again = decode(&ppm, enough::Unstoppable).expect("encoded PPM failed to decode");
        assert_eq!(again.width(), decoded.width());
        assert_eq!(again.height(), decoded.height());
        for (a, b) in again.pixels().iter().zip(decoded.pixels()) {
            assert_eq!(a & 0xFF_FFFF, b & 0xFF_FFFF, "PPM roundtrip RGB mismatch");
        }
    }

    // BMP preserves pixels exactly for images it accepts as fully
    // opaque or cleanly indexed.
    if !decoded.has_alpha() && !decoded.has_transparency() {
        let bmp = encode_bmp(&decoded, enough::Unstoppable).expect("BMP encode failed");
        let again = decode(&bmp, enough::Unstoppable).expect("encoded BMP failed to decode");
        assert_eq!(again.pixels(), decoded.pixels(), "BMP roundtrip mismatch");
    }
});
