//! Snapshot rendering
//!
//! Rendering never fails from the caller's point of view: if encoding goes
//! wrong the renderer logs it and hands back a tiny placeholder PNG.

use std::io::Cursor;
use std::sync::Arc;

use image::{ImageFormat, Rgb, RgbImage};
use tracing::warn;

use crate::config::DEFAULT_CELL_SIZE;
use crate::game::location::MAX_GRID_SIZE;
use crate::game::{ArenaSnapshot, Location};

/// Encoded image bytes, cheap to clone
pub type Frame = Arc<[u8]>;

/// Largest image side we are willing to allocate
const MAX_IMAGE_SIDE: u32 = 4096;

const BACKGROUND: Rgb<u8> = Rgb([0, 0, 0]);
const GRID_LINE: Rgb<u8> = Rgb([50, 50, 50]);
const FOOD: Rgb<u8> = Rgb([255, 0, 0]);
const OUTLINE: Rgb<u8> = Rgb([255, 255, 255]);

/// 1x1 PNG returned when encoding fails
pub const FALLBACK_PNG: [u8; 69] = [
    0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00, 0x00, 0x00, 0x0D, 0x49, 0x48, 0x44,
    0x52, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x01, 0x08, 0x02, 0x00, 0x00, 0x00, 0x90,
    0x77, 0x53, 0xDE, 0x00, 0x00, 0x00, 0x0C, 0x49, 0x44, 0x41, 0x54, 0x08, 0xD7, 0x63, 0xF8,
    0xFF, 0xFF, 0x3F, 0x00, 0x05, 0xFE, 0x02, 0xFE, 0xDC, 0xCC, 0x59, 0xE7, 0x00, 0x00, 0x00,
    0x00, 0x49, 0x45, 0x4E, 0x44, 0xAE, 0x42, 0x60, 0x82,
];

/// Turns a snapshot into a displayable image
pub trait Renderer: Send + Sync {
    /// Always returns a valid image
    fn render(&self, snapshot: &ArenaSnapshot) -> Frame;
}

/// Draws the board as a PNG
pub struct PngRenderer {
    cell_size: u32,
}

impl PngRenderer {
    pub fn new(cell_size: u32) -> Self {
        Self {
            cell_size: cell_size.max(1),
        }
    }

    fn draw(&self, snapshot: &ArenaSnapshot) -> RgbImage {
        let cells = snapshot.grid_size.max(1) as u32;
        let cell = self.cell_size.min(MAX_IMAGE_SIDE / cells).max(1);
        let side = cells * cell;
        let mut canvas = Canvas {
            image: RgbImage::from_pixel(side, side, BACKGROUND),
            cells,
            cell,
        };

        canvas.grid_lines();

        for food in &snapshot.food {
            canvas.disc(*food, FOOD);
        }

        for snake in snapshot.snakes.iter().filter(|s| s.alive) {
            let color = parse_hex_color(&snake.color).unwrap_or(OUTLINE);
            for (i, segment) in snake.body.iter().enumerate() {
                if i == 0 {
                    canvas.square(*segment, 1, OUTLINE);
                    canvas.square(*segment, 2, color);
                } else {
                    canvas.square(*segment, 2, color);
                }
            }
        }

        if snapshot.terminal {
            canvas.dim();
        }

        canvas.image
    }

    fn encode(image: &RgbImage) -> Result<Vec<u8>, image::ImageError> {
        let mut buffer = Cursor::new(Vec::new());
        image.write_to(&mut buffer, ImageFormat::Png)?;
        Ok(buffer.into_inner())
    }
}

impl Default for PngRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl Renderer for PngRenderer {
    fn render(&self, snapshot: &ArenaSnapshot) -> Frame {
        let in_range = u32::try_from(snapshot.grid_size)
            .map(|size| (1..=MAX_GRID_SIZE).contains(&size))
            .unwrap_or(false);
        if !in_range {
            warn!(
                "Grid size {} out of range, using placeholder",
                snapshot.grid_size
            );
            return Arc::from(&FALLBACK_PNG[..]);
        }

        let image = self.draw(snapshot);
        match Self::encode(&image) {
            Ok(bytes) => Arc::from(bytes),
            Err(e) => {
                warn!("Rendering tick {} failed, using placeholder: {}", snapshot.tick, e);
                Arc::from(&FALLBACK_PNG[..])
            }
        }
    }
}

struct Canvas {
    image: RgbImage,
    cells: u32,
    cell: u32,
}

impl Canvas {
    /// Top-left pixel of a cell, `None` if the cell is off the board
    fn origin(&self, loc: Location) -> Option<(u32, u32)> {
        let inside = |v: i32| v >= 0 && (v as u32) < self.cells;
        if !inside(loc.x) || !inside(loc.y) {
            return None;
        }
        Some((loc.x as u32 * self.cell, loc.y as u32 * self.cell))
    }

    fn grid_lines(&mut self) {
        let side = self.image.width();
        for line in (0..side).step_by(self.cell as usize) {
            for along in 0..side {
                self.image.put_pixel(line, along, GRID_LINE);
                self.image.put_pixel(along, line, GRID_LINE);
            }
        }
    }

    /// Fill a cell, leaving `inset` pixels free on each side
    fn square(&mut self, loc: Location, inset: u32, color: Rgb<u8>) {
        let Some((ox, oy)) = self.origin(loc) else {
            return;
        };
        let inset = inset.min(self.cell / 2);
        for y in inset..self.cell - inset {
            for x in inset..self.cell - inset {
                self.image.put_pixel(ox + x, oy + y, color);
            }
        }
    }

    fn disc(&mut self, loc: Location, color: Rgb<u8>) {
        let Some((ox, oy)) = self.origin(loc) else {
            return;
        };
        let center = self.cell as f32 / 2.0;
        let radius = (center - 2.0).max(0.5);
        for y in 0..self.cell {
            for x in 0..self.cell {
                let dx = x as f32 + 0.5 - center;
                let dy = y as f32 + 0.5 - center;
                if dx * dx + dy * dy <= radius * radius {
                    self.image.put_pixel(ox + x, oy + y, color);
                }
            }
        }
    }

    /// Darken the whole board to mark the game as over
    fn dim(&mut self) {
        for pixel in self.image.pixels_mut() {
            for channel in pixel.0.iter_mut() {
                *channel /= 2;
            }
        }
    }
}

/// Parse `#RRGGBB`
pub fn parse_hex_color(hex: &str) -> Option<Rgb<u8>> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Arena, GameMode, SnakeSnapshot};

    const PNG_MAGIC: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

    fn decode(frame: &Frame) -> RgbImage {
        image::load_from_memory(frame).unwrap().to_rgb8()
    }

    #[test]
    fn test_parse_hex_color() {
        assert_eq!(parse_hex_color("#00FF00"), Some(Rgb([0, 255, 0])));
        assert_eq!(parse_hex_color("0000ff"), Some(Rgb([0, 0, 255])));
        assert_eq!(parse_hex_color("#12345"), None);
        assert_eq!(parse_hex_color("#GG0000"), None);
    }

    #[test]
    fn test_render_board() {
        let mut arena = Arena::with_seed(10, GameMode::SinglePlayer, 3, 8);
        arena.clear_food();
        arena.place_food(Location::new(0, 0));
        arena.add_player("player", "#00FF00");

        let renderer = PngRenderer::new(10);
        let frame = renderer.render(&arena.snapshot());
        assert_eq!(&frame[0..8], &PNG_MAGIC);

        let image = decode(&frame);
        assert_eq!(image.dimensions(), (100, 100));
        // Food centre
        assert_eq!(*image.get_pixel(5, 5), FOOD);
        // Snake head at (2,2): white outline ring, green fill
        assert_eq!(*image.get_pixel(21, 21), OUTLINE);
        assert_eq!(*image.get_pixel(25, 25), Rgb([0, 255, 0]));
    }

    #[test]
    fn test_terminal_board_is_dimmed() {
        let mut arena = Arena::with_seed(10, GameMode::SinglePlayer, 3, 8);
        arena.clear_food();
        arena.place_food(Location::new(0, 0));
        arena.force_stop();

        let image = decode(&PngRenderer::new(10).render(&arena.snapshot()));
        assert_eq!(*image.get_pixel(5, 5), Rgb([127, 0, 0]));
    }

    #[test]
    fn test_malformed_snapshot_still_renders() {
        let snapshot = ArenaSnapshot {
            grid_size: 5,
            mode: GameMode::TwoPlayer,
            snakes: vec![SnakeSnapshot {
                id: "x".to_string(),
                body: vec![Location::new(-3, 99)],
                color: "not a colour".to_string(),
                score: 0,
                alive: true,
            }],
            food: vec![Location::new(400, 400)],
            terminal: false,
            winner: None,
            tick: 0,
        };

        let frame = PngRenderer::default().render(&snapshot);
        assert_eq!(&frame[0..8], &PNG_MAGIC);
    }

    #[test]
    fn test_oversized_grid_gets_placeholder() {
        let mut snapshot = Arena::with_seed(8, GameMode::SinglePlayer, 3, 1).snapshot();
        snapshot.grid_size = i32::MAX;
        let frame = PngRenderer::default().render(&snapshot);
        assert_eq!(&frame[..], &FALLBACK_PNG[..]);

        snapshot.grid_size = -4;
        let frame = PngRenderer::default().render(&snapshot);
        assert_eq!(&frame[..], &FALLBACK_PNG[..]);
    }

    #[test]
    fn test_fallback_png_is_valid() {
        let image = image::load_from_memory(&FALLBACK_PNG).unwrap();
        assert_eq!((image.width(), image.height()), (1, 1));
    }
}
