#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Auto-detect decode — must never panic
    let _ = retrobitmaps::decode(data, enough::Unstoppable);

    // Each format explicitly — must never panic
    let _ = retrobitmaps::decode_bmp(data, enough::Unstoppable);
    let _ = retrobitmaps::decode_netpbm(data, enough::Unstoppable);
    let _ = retrobitmaps::decode_xbm(data, enough::Unstoppable);
    let _ = retrobitmaps::decode_xpm(data, enough::Unstoppable);
    let _ = retrobitmaps::decode_xwd(data, enough::Unstoppable);
});
