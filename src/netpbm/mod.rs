//! Netpbm family: PBM/PGM/PPM, ASCII (P1/P2/P3) and binary (P4/P5/P6).
//!
//! Decoding accepts all six magic numbers. Encoding writes binary PPM (P6)
//! and binary PBM (P4).
//!
//! PBM bit orientation: bit 1 is white. Decoding scales the sample value 1
//! to 255; encoding sets a bit where the pixel's alpha-weighted channel
//! average is non-zero. The two directions invert each other, so PBM data
//! round-trips bit-for-bit.

mod decode;
mod encode;

pub(crate) use decode::decode_netpbm;
pub(crate) use encode::{encode_pbm, encode_ppm};
