use crate::constants::{DISPLAY_HEIGHT, DISPLAY_WIDTH};

/// # FrameBuffer
/// The display is composed of 64x32 monochrome pixels, stored as rows indexed `[y][x]`.
///
/// Coordinates wrap in both directions, so a sprite drawn past the right or bottom edge
/// reappears on the opposite side of the screen.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameBuffer {
    pixels: [[bool; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
}

impl FrameBuffer {
    pub fn new() -> Self {
        FrameBuffer {
            pixels: [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        }
    }

    /// Returns the pixel at `x`, `y` after wrapping both coordinates
    pub fn get_pixel(&self, x: usize, y: usize) -> bool {
        self.pixels[y % DISPLAY_HEIGHT][x % DISPLAY_WIDTH]
    }

    /// Sets the pixel at `x`, `y` after wrapping both coordinates
    pub fn set_pixel(&mut self, x: usize, y: usize, on: bool) {
        self.pixels[y % DISPLAY_HEIGHT][x % DISPLAY_WIDTH] = on;
    }

    /// XORs one 8-bit sprite row onto the screen starting at `x`, `y`.
    /// The most significant bit lands on `x`.
    ///
    /// Returns true if any lit pixel was switched off (a collision).
    pub fn paint(&mut self, x: usize, y: usize, row: u8) -> bool {
        let mut erased = false;
        for bit in 0..8 {
            if (row >> (7 - bit)) & 1 == 0 {
                continue;
            }
            let column = x.wrapping_add(bit);
            let existing = self.get_pixel(column, y);
            erased |= existing;
            self.set_pixel(column, y, !existing);
        }
        erased
    }

    pub fn clear_screen(&mut self) {
        self.pixels = [[false; DISPLAY_WIDTH]; DISPLAY_HEIGHT];
    }

    /// Rows of pixels from top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[bool; DISPLAY_WIDTH]> {
        self.pixels.iter()
    }

    pub fn is_blank(&self) -> bool {
        self.rows().all(|row| row.iter().all(|&pixel| !pixel))
    }
}

impl Default for FrameBuffer {
    fn default() -> Self {
        Self::new()
    }
}
