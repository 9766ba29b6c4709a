//! Colour to height mapping
//!
//! Each pixel colour snaps to the nearest entry of a fixed seven-colour
//! palette; the entry's index is the carving height in millimeters.

/// A palette entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaletteEntry {
    /// Human-readable colour name
    pub name: &'static str,
    /// RGB triple
    pub rgb: [u8; 3],
    /// Height assigned to this colour
    pub height: u8,
}

/// The palette, in declaration order. Ties resolve to the earlier entry.
pub const COLOR_HEIGHT_TABLE: [PaletteEntry; 7] = [
    PaletteEntry { name: "white", rgb: [255, 255, 255], height: 0 },
    PaletteEntry { name: "yellow", rgb: [255, 255, 0], height: 1 },
    PaletteEntry { name: "green", rgb: [0, 255, 0], height: 2 },
    PaletteEntry { name: "blue", rgb: [0, 0, 255], height: 3 },
    PaletteEntry { name: "purple", rgb: [128, 0, 128], height: 4 },
    PaletteEntry { name: "red", rgb: [255, 0, 0], height: 5 },
    PaletteEntry { name: "black", rgb: [0, 0, 0], height: 6 },
];

/// Tallest height in the palette
pub const MAX_PALETTE_HEIGHT: u8 = 6;

fn squared_distance(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&p, &q)| {
            let d = p as i32 - q as i32;
            (d * d) as u32
        })
        .sum()
}

/// Maps pixel colours and intensities to heights
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorHeightMapper;

impl ColorHeightMapper {
    /// Create a mapper over the fixed palette
    pub fn new() -> Self {
        Self
    }

    /// Palette entry closest to `rgb` by squared RGB distance
    pub fn nearest(&self, rgb: [u8; 3]) -> &'static PaletteEntry {
        let mut best = &COLOR_HEIGHT_TABLE[0];
        let mut best_distance = squared_distance(rgb, best.rgb);

        for entry in COLOR_HEIGHT_TABLE.iter().skip(1) {
            let distance = squared_distance(rgb, entry.rgb);
            if distance < best_distance {
                best = entry;
                best_distance = distance;
            }
        }

        best
    }

    /// Height for a pixel colour
    pub fn height_for(&self, rgb: [u8; 3]) -> u8 {
        self.nearest(rgb).height
    }

    /// Binary classification: active when strictly darker than `threshold`
    pub fn is_active(&self, intensity: u8, threshold: u8) -> bool {
        intensity < threshold
    }
}
