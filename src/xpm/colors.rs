//! X11 color-name lookup for XPM color entries.
//!
//! A static subset of the X11 `rgb.txt` database covering the names legacy
//! XPM art actually uses. Matching is case-insensitive; channels are 16-bit
//! per the X color convention (8-bit values widened as `v * 0x101`).

use rgb::RGB16;

macro_rules! color_table {
    ($(($name:literal, $r:literal, $g:literal, $b:literal),)*) => {
        const NAMED_COLORS: &[(&str, RGB16)] = &[
            $((
                $name,
                RGB16 {
                    r: $r * 0x101,
                    g: $g * 0x101,
                    b: $b * 0x101,
                },
            ),)*
        ];
    };
}

color_table![
    ("aquamarine", 127, 255, 212),
    ("azure", 240, 255, 255),
    ("beige", 245, 245, 220),
    ("black", 0, 0, 0),
    ("blue", 0, 0, 255),
    ("brown", 165, 42, 42),
    ("chartreuse", 127, 255, 0),
    ("coral", 255, 127, 80),
    ("cornflowerblue", 100, 149, 237),
    ("cyan", 0, 255, 255),
    ("darkblue", 0, 0, 139),
    ("darkcyan", 0, 139, 139),
    ("darkgray", 169, 169, 169),
    ("darkgreen", 0, 100, 0),
    ("darkgrey", 169, 169, 169),
    ("darkmagenta", 139, 0, 139),
    ("darkorange", 255, 140, 0),
    ("darkred", 139, 0, 0),
    ("darkslategray", 47, 79, 79),
    ("darkviolet", 148, 0, 211),
    ("dimgray", 105, 105, 105),
    ("firebrick", 178, 34, 34),
    ("forestgreen", 34, 139, 34),
    ("gainsboro", 220, 220, 220),
    ("gold", 255, 215, 0),
    ("goldenrod", 218, 165, 32),
    ("gray", 190, 190, 190),
    ("gray25", 64, 64, 64),
    ("gray50", 127, 127, 127),
    ("gray75", 191, 191, 191),
    ("green", 0, 255, 0),
    ("greenyellow", 173, 255, 47),
    ("grey", 190, 190, 190),
    ("hotpink", 255, 105, 180),
    ("indianred", 205, 92, 92),
    ("ivory", 255, 255, 240),
    ("khaki", 240, 230, 140),
    ("lavender", 230, 230, 250),
    ("lightblue", 173, 216, 230),
    ("lightgray", 211, 211, 211),
    ("lightgreen", 144, 238, 144),
    ("lightgrey", 211, 211, 211),
    ("lightpink", 255, 182, 193),
    ("lightyellow", 255, 255, 224),
    ("limegreen", 50, 205, 50),
    ("magenta", 255, 0, 255),
    ("maroon", 176, 48, 96),
    ("midnightblue", 25, 25, 112),
    ("navy", 0, 0, 128),
    ("navyblue", 0, 0, 128),
    ("olivedrab", 107, 142, 35),
    ("orange", 255, 165, 0),
    ("orangered", 255, 69, 0),
    ("orchid", 218, 112, 214),
    ("pink", 255, 192, 203),
    ("plum", 221, 160, 221),
    ("purple", 160, 32, 240),
    ("red", 255, 0, 0),
    ("royalblue", 65, 105, 225),
    ("salmon", 250, 128, 114),
    ("seagreen", 46, 139, 87),
    ("sienna", 160, 82, 45),
    ("skyblue", 135, 206, 235),
    ("slateblue", 106, 90, 205),
    ("slategray", 112, 128, 144),
    ("snow", 255, 250, 250),
    ("springgreen", 0, 255, 127),
    ("steelblue", 70, 130, 180),
    ("tan", 210, 180, 140),
    ("thistle", 216, 191, 216),
    ("tomato", 255, 99, 71),
    ("turquoise", 64, 224, 208),
    ("violet", 238, 130, 238),
    ("wheat", 245, 222, 179),
    ("white", 255, 255, 255),
    ("yellow", 255, 255, 0),
    ("yellowgreen", 154, 205, 50),
];

/// Resolve a color name (spaces ignored, case-insensitive), e.g. both
/// `"cornflower blue"` and `"CornflowerBlue"`.
pub fn lookup_color(name: &[u8]) -> Option<RGB16> {
    let mut compact = [0u8; 24];
    let mut len = 0;
    for &b in name {
        if b == b' ' || b == b'\t' {
            continue;
        }
        if len == compact.len() {
            return None;
        }
        compact[len] = b.to_ascii_lowercase();
        len += 1;
    }
    let needle = &compact[..len];

    NAMED_COLORS
        .iter()
        .find(|(candidate, _)| candidate.as_bytes() == needle)
        .map(|&(_, color)| color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_and_space_insensitive() {
        assert_eq!(
            lookup_color(b"Cornflower Blue"),
            Some(RGB16 { r: 100 * 0x101, g: 149 * 0x101, b: 237 * 0x101 })
        );
        assert_eq!(lookup_color(b"WHITE"), lookup_color(b"white"));
        assert_eq!(lookup_color(b"no such color"), None);
    }
}
