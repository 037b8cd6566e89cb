//! Text rasterization into a glyph atlas.
//!
//! Characters are rasterized once per (character, pixel size) with rusttype
//! and packed into a single-channel coverage atlas. [`GlyphAtlas::layout`]
//! turns a string into per-character rectangles on the canvas plus their
//! atlas coordinates, which the quad builder emits as textured quads.
//!
//! When the atlas fills up it is cleared and repacked from scratch; the
//! [`GlyphAtlas::generation`] counter tells callers that coordinates they
//! already handed out are stale.

use std::collections::HashMap;
use std::path::Path;

use glam::Vec2;
use rusttype::{point, Scale};

use crate::canvas::{Rect, TextAlign};
use crate::error::TextError;

/// Edge length of the default atlas texture, in pixels.
pub const ATLAS_SIZE: u32 = 1024;

/// Gap left between packed glyphs so linear sampling never bleeds.
const PADDING: u32 = 1;

/// Fonts tried, in order, when no font file is configured.
const SYSTEM_FONTS: &[&str] = &[
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
    "/System/Library/Fonts/Supplemental/Arial.ttf",
    "/Library/Fonts/Arial.ttf",
    "C:\\Windows\\Fonts\\arial.ttf",
];

/// Coverage bitmap of one rasterized character.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphBitmap {
    pub width: u32,
    pub height: u32,
    /// Row-major coverage, one byte per pixel.
    pub coverage: Vec<u8>,
    /// Top-left corner relative to the pen position on the baseline (y-down).
    pub offset: Vec2,
    /// How far the pen moves after this character.
    pub advance: f32,
}

/// Something that can turn characters into coverage bitmaps.
pub trait GlyphSource {
    /// Rasterize `c` at `size_px`. Returns `None` when the font has no
    /// glyph for `c`; blank characters return an empty bitmap.
    fn rasterize(&self, c: char, size_px: f32) -> Option<GlyphBitmap>;
}

/// A TrueType/OpenType font rasterized with rusttype.
pub struct FontGlyphs {
    font: rusttype::Font<'static>,
}

impl FontGlyphs {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, TextError> {
        rusttype::Font::try_from_vec(bytes)
            .map(|font| Self { font })
            .ok_or(TextError::InvalidFont)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, TextError> {
        let path = path.as_ref();
        let font = Self::from_bytes(std::fs::read(path)?)?;
        log::info!("loaded font '{}'", path.display());
        Ok(font)
    }

    /// First usable font from the usual system locations.
    pub fn find_system() -> Option<Self> {
        SYSTEM_FONTS
            .iter()
            .map(Path::new)
            .filter(|path| path.is_file())
            .find_map(|path| match Self::from_file(path) {
                Ok(font) => Some(font),
                Err(e) => {
                    log::debug!("skipping font '{}': {}", path.display(), e);
                    None
                }
            })
    }
}

impl GlyphSource for FontGlyphs {
    fn rasterize(&self, c: char, size_px: f32) -> Option<GlyphBitmap> {
        let glyph = self.font.glyph(c);
        // Glyph 0 is .notdef
        if glyph.id().0 == 0 {
            return None;
        }
        let scaled = glyph.scaled(Scale::uniform(size_px));
        let advance = scaled.h_metrics().advance_width;
        let positioned = scaled.positioned(point(0.0, 0.0));

        let Some(bounds) = positioned.pixel_bounding_box() else {
            return Some(GlyphBitmap {
                width: 0,
                height: 0,
                coverage: Vec::new(),
                offset: Vec2::ZERO,
                advance,
            });
        };

        let width = bounds.width().max(0) as u32;
        let height = bounds.height().max(0) as u32;
        let mut coverage = vec![0u8; width as usize * height as usize];
        positioned.draw(|x, y, value| {
            let index = y as usize * width as usize + x as usize;
            if let Some(texel) = coverage.get_mut(index) {
                *texel = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
            }
        });

        Some(GlyphBitmap {
            width,
            height,
            coverage,
            offset: Vec2::new(bounds.min.x as f32, bounds.min.y as f32),
            advance,
        })
    }
}

/// Pixel rectangle inside the atlas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtlasRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Row-based rectangle packer: fills a shelf left to right, then opens a
/// new shelf below the tallest item of the current one.
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    width: u32,
    height: u32,
    cursor_x: u32,
    shelf_y: u32,
    shelf_height: u32,
}

impl ShelfPacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cursor_x: 0,
            shelf_y: 0,
            shelf_height: 0,
        }
    }

    /// Reserve a `width` x `height` region, or `None` when the packer is full.
    pub fn allocate(&mut self, width: u32, height: u32) -> Option<AtlasRect> {
        let padded_w = width + PADDING;
        let padded_h = height + PADDING;
        if padded_w > self.width || padded_h > self.height {
            return None;
        }
        if self.cursor_x + padded_w > self.width {
            self.shelf_y += self.shelf_height;
            self.cursor_x = 0;
            self.shelf_height = 0;
        }
        if self.shelf_y + padded_h > self.height {
            return None;
        }

        let rect = AtlasRect {
            x: self.cursor_x,
            y: self.shelf_y,
            width,
            height,
        };
        self.cursor_x += padded_w;
        self.shelf_height = self.shelf_height.max(padded_h);
        Some(rect)
    }

    pub fn reset(&mut self) {
        self.cursor_x = 0;
        self.shelf_y = 0;
        self.shelf_height = 0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct CachedGlyph {
    /// `None` for blank characters such as spaces.
    region: Option<AtlasRect>,
    offset: Vec2,
    advance: f32,
}

/// One character of laid-out text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedGlyph {
    /// Quad on the canvas, in the space the text was drawn in.
    pub rect: Rect,
    /// Atlas coordinates: min u, min v, max u, max v.
    pub uv: [f32; 4],
}

/// Cache of rasterized glyphs backed by one R8 texture image.
pub struct GlyphAtlas {
    source: Box<dyn GlyphSource>,
    packer: ShelfPacker,
    size: u32,
    pixels: Vec<u8>,
    cache: HashMap<(char, u32), Option<CachedGlyph>>,
    dirty: bool,
    generation: u32,
}

impl GlyphAtlas {
    pub fn new(source: impl GlyphSource + 'static) -> Self {
        Self::with_size(source, ATLAS_SIZE)
    }

    pub fn with_size(source: impl GlyphSource + 'static, size: u32) -> Self {
        Self {
            source: Box::new(source),
            packer: ShelfPacker::new(size, size),
            size,
            pixels: vec![0; size as usize * size as usize],
            cache: HashMap::new(),
            dirty: true,
            generation: 0,
        }
    }

    /// Edge length of the square atlas image.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// Row-major coverage of the whole atlas.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Bumped every time the atlas is cleared and repacked.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// True once after the pixels change; the presenter re-uploads then.
    pub fn take_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Whether the font can draw `c` at all.
    pub fn has_glyph(&mut self, c: char, size_px: f32) -> bool {
        self.glyph(c, size_px).is_some()
    }

    /// Lay out `text` with its baseline anchored at `position`.
    ///
    /// Characters the font lacks are skipped. Sizes are rasterized at the
    /// nearest whole pixel and scaled to the exact size.
    pub fn layout(&mut self, text: &str, size_px: f32, align: TextAlign, position: Vec2) -> Vec<PlacedGlyph> {
        if !(size_px.is_finite() && size_px > 0.0) {
            return Vec::new();
        }
        let scale = size_px / size_key(size_px) as f32;

        let mut pen = 0.0;
        let mut placed = Vec::with_capacity(text.len());
        for c in text.chars() {
            let Some(glyph) = self.glyph(c, size_px) else {
                continue;
            };
            if let Some(region) = glyph.region {
                let corner = Vec2::new(pen, 0.0) + glyph.offset * scale;
                placed.push(PlacedGlyph {
                    rect: Rect::new(
                        corner.x,
                        corner.y,
                        region.width as f32 * scale,
                        region.height as f32 * scale,
                    ),
                    uv: self.uv(region),
                });
            }
            pen += glyph.advance * scale;
        }

        let shift = match align {
            TextAlign::Start => 0.0,
            TextAlign::Center => -pen / 2.0,
            TextAlign::End => -pen,
        };
        for glyph in &mut placed {
            glyph.rect.x += position.x + shift;
            glyph.rect.y += position.y;
        }
        placed
    }

    fn glyph(&mut self, c: char, size_px: f32) -> Option<CachedGlyph> {
        let key = (c, size_key(size_px));
        if let Some(entry) = self.cache.get(&key) {
            return *entry;
        }
        let entry = self
            .source
            .rasterize(c, key.1 as f32)
            .map(|bitmap| self.insert(&bitmap));
        self.cache.insert(key, entry);
        entry
    }

    fn insert(&mut self, bitmap: &GlyphBitmap) -> CachedGlyph {
        let region = if bitmap.width == 0 || bitmap.height == 0 {
            None
        } else {
            let allocated = match self.packer.allocate(bitmap.width, bitmap.height) {
                Some(rect) => Some(rect),
                None => {
                    self.clear();
                    self.packer.allocate(bitmap.width, bitmap.height)
                }
            };
            if allocated.is_none() {
                log::warn!(
                    "glyph of {}x{} does not fit a {}px atlas",
                    bitmap.width,
                    bitmap.height,
                    self.size
                );
            }
            allocated
        };

        if let Some(rect) = region {
            let row = rect.width as usize;
            for (y, src) in bitmap.coverage.chunks_exact(row).enumerate() {
                let start = (rect.y as usize + y) * self.size as usize + rect.x as usize;
                self.pixels[start..start + row].copy_from_slice(src);
            }
            self.dirty = true;
        }

        CachedGlyph {
            region,
            offset: bitmap.offset,
            advance: bitmap.advance,
        }
    }

    fn clear(&mut self) {
        self.packer.reset();
        self.pixels.fill(0);
        self.cache.clear();
        self.dirty = true;
        self.generation = self.generation.wrapping_add(1);
        log::debug!("glyph atlas full, repacking (generation {})", self.generation);
    }

    fn uv(&self, rect: AtlasRect) -> [f32; 4] {
        let size = self.size as f32;
        [
            rect.x as f32 / size,
            rect.y as f32 / size,
            (rect.x + rect.width) as f32 / size,
            (rect.y + rect.height) as f32 / size,
        ]
    }
}

fn size_key(size_px: f32) -> u32 {
    size_px.round().max(1.0) as u32
}
