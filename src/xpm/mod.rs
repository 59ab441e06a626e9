//! XPM (X11 pixmap) decoder, versions 1 and 3.
//!
//! An XPM v3 file opens with `/* XPM */` and carries a hints line, a color
//! table, and quoted pixel rows inside one `static char` array. The older
//! v1 form spreads the header over `#define` lines and splits the color and
//! pixel data into `<name>_colors[]` and `<name>_pixels[]` arrays. Both
//! share the pixel encoding: `chars_per_pixel` ASCII characters per pixel
//! (up to 4, packed big-endian into a lookup key).

mod colors;
mod decode;

pub use colors::lookup_color;

pub(crate) use decode::decode_xpm;
