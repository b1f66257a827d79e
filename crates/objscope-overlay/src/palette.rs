use image::Rgba;

pub type Color = Rgba<u8>;

/// Box colours, cycled by detection index.
pub const PALETTE: [Color; 10] = [
    Rgba([255, 0, 0, 255]),     // red
    Rgba([0, 200, 0, 255]),     // green
    Rgba([0, 90, 255, 255]),    // blue
    Rgba([255, 200, 0, 255]),   // amber
    Rgba([255, 0, 255, 255]),   // magenta
    Rgba([0, 200, 200, 255]),   // teal
    Rgba([255, 120, 0, 255]),   // orange
    Rgba([140, 60, 220, 255]),  // purple
    Rgba([120, 220, 0, 255]),   // lime
    Rgba([255, 100, 160, 255]), // pink
];

/// Label text colour, readable on every palette entry.
pub const TEXT_COLOR: Color = Rgba([255, 255, 255, 255]);

/// Colour for the `index`-th detection of a batch.
pub fn color_for_index(index: usize) -> Color {
    PALETTE[index % PALETTE.len()]
}
