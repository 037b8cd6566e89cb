//! Flattening a [`DisplayList`] into GPU quad instances.
//!
//! Every draw becomes one or more painted quads: the rectangle in local
//! space, the affine transform it was drawn under, a shape (plain rect, suit
//! glyph mask or atlas text) and a paint (solid, two-stop gradient, or the
//! sprite).
//!
//! Gradients use their first and last stops, and radial gradients are
//! treated as concentric around the outer center. Text becomes one quad per
//! character sampled from a [`GlyphAtlas`]. A lone card suit the font
//! cannot draw, or any suit when there is no atlas at all, falls back to a
//! distance-field mask; other text needs the atlas.

use bytemuck::{Pod, Zeroable};
use glam::{Affine2, Vec2};

use crate::canvas::{Color, DisplayList, DrawCommand, Gradient, ImageHandle, Paint, Rect, TextAlign};
use crate::particle::Suit;

use super::text::GlyphAtlas;

pub const SHAPE_RECT: u32 = 0;
pub const SHAPE_GLYPH: u32 = 1;
pub const SHAPE_TEXT: u32 = 2;

pub const PAINT_SOLID: u32 = 0;
pub const PAINT_LINEAR: u32 = 1;
pub const PAINT_RADIAL: u32 = 2;
pub const PAINT_IMAGE: u32 = 3;

/// Fraction of the em box above the text baseline.
const GLYPH_ASCENT: f32 = 0.8;

/// One instanced quad, laid out to match `QuadIn` in the shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct QuadInstance {
    /// Linear part of the local-to-surface transform, column by column.
    pub axis_x: [f32; 2],
    pub axis_y: [f32; 2],
    pub origin: [f32; 2],
    /// Local rectangle: x, y, width, height.
    pub rect: [f32; 4],
    /// Shape, paint, glyph index, unused.
    pub kinds: [u32; 4],
    pub color0: [f32; 4],
    pub color1: [f32; 4],
    /// Linear: start.xy, end.xy. Radial: center.xy, inner radius, outer radius.
    pub geometry: [f32; 4],
    /// Offsets of `color0` and `color1` along the gradient.
    pub stops: [f32; 4],
    /// Atlas region for text: min u, min v, max u, max v.
    pub atlas_uv: [f32; 4],
}

impl QuadInstance {
    fn new(transform: &Affine2, rect: Rect, shape: u32, glyph: u32, paint: PaintParams) -> Self {
        Self {
            axis_x: transform.matrix2.x_axis.to_array(),
            axis_y: transform.matrix2.y_axis.to_array(),
            origin: transform.translation.to_array(),
            rect: [rect.x, rect.y, rect.width, rect.height],
            kinds: [shape, paint.kind, glyph, 0],
            color0: paint.color0.to_array(),
            color1: paint.color1.to_array(),
            geometry: paint.geometry,
            stops: [paint.offsets[0], paint.offsets[1], 0.0, 0.0],
            atlas_uv: [0.0; 4],
        }
    }

    fn text(transform: &Affine2, rect: Rect, uv: [f32; 4], paint: PaintParams) -> Self {
        Self {
            atlas_uv: uv,
            ..Self::new(transform, rect, SHAPE_TEXT, 0, paint)
        }
    }

    pub fn shape(&self) -> u32 {
        self.kinds[0]
    }

    pub fn paint(&self) -> u32 {
        self.kinds[1]
    }

    pub fn glyph(&self) -> u32 {
        self.kinds[2]
    }
}

struct PaintParams {
    kind: u32,
    color0: Color,
    color1: Color,
    geometry: [f32; 4],
    offsets: [f32; 2],
}

impl PaintParams {
    fn image() -> Self {
        Self {
            kind: PAINT_IMAGE,
            color0: Color::WHITE,
            color1: Color::WHITE,
            geometry: [0.0; 4],
            offsets: [0.0, 1.0],
        }
    }
}

fn paint_params(paint: &Paint) -> PaintParams {
    match paint {
        Paint::Solid(color) => PaintParams {
            kind: PAINT_SOLID,
            color0: *color,
            color1: *color,
            geometry: [0.0; 4],
            offsets: [0.0, 1.0],
        },
        Paint::Gradient(gradient) => {
            let stops = gradient.stops();
            let (first, last) = match (stops.first(), stops.last()) {
                (Some(first), Some(last)) => (*first, *last),
                // A gradient with no stops paints nothing
                _ => {
                    return PaintParams {
                        kind: PAINT_SOLID,
                        color0: Color::TRANSPARENT,
                        color1: Color::TRANSPARENT,
                        geometry: [0.0; 4],
                        offsets: [0.0, 1.0],
                    }
                }
            };
            let (kind, geometry) = match gradient {
                Gradient::Linear { start, end, .. } => (PAINT_LINEAR, [start.x, start.y, end.x, end.y]),
                Gradient::Radial {
                    inner_radius,
                    outer_center,
                    outer_radius,
                    ..
                } => (
                    PAINT_RADIAL,
                    [outer_center.x, outer_center.y, *inner_radius, *outer_radius],
                ),
            };
            PaintParams {
                kind,
                color0: first.color,
                color1: last.color,
                geometry,
                offsets: [first.offset, last.offset],
            }
        }
    }
}

/// Em box of a glyph drawn at `position` (baseline anchor).
pub fn glyph_box(position: Vec2, size: f32, align: TextAlign) -> Rect {
    let left = match align {
        TextAlign::Start => position.x,
        TextAlign::Center => position.x - size / 2.0,
        TextAlign::End => position.x - size,
    };
    Rect::new(left, position.y - size * GLYPH_ASCENT, size, size)
}

fn single_suit(text: &str) -> Option<Suit> {
    let mut chars = text.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Suit::from_symbol(c),
        _ => None,
    }
}

/// Convert one frame's draws into quads, in draw order, without text.
///
/// `sprite` is the only image the presenter holds; draws of any other
/// handle are dropped. Card suits still draw as glyph masks.
pub fn build_quads(list: &DisplayList, sprite: Option<ImageHandle>) -> Vec<QuadInstance> {
    build(list, sprite, None)
}

/// Like [`build_quads`], with text rasterized through `atlas`.
///
/// If the atlas has to repack partway through, quads built before that
/// point hold stale coordinates, so the frame is built again.
pub fn build_quads_with_text(
    list: &DisplayList,
    sprite: Option<ImageHandle>,
    atlas: &mut GlyphAtlas,
) -> Vec<QuadInstance> {
    let generation = atlas.generation();
    let quads = build(list, sprite, Some(&mut *atlas));
    if atlas.generation() == generation {
        return quads;
    }
    build(list, sprite, Some(atlas))
}

fn build(list: &DisplayList, sprite: Option<ImageHandle>, mut atlas: Option<&mut GlyphAtlas>) -> Vec<QuadInstance> {
    let mut quads = Vec::with_capacity(list.len());
    for command in list.commands() {
        match command {
            // The presenter clears the whole target at the start of a pass
            DrawCommand::Clear { .. } => {}
            DrawCommand::FillRect { rect, paint, transform } => {
                quads.push(QuadInstance::new(transform, *rect, SHAPE_RECT, 0, paint_params(paint)));
            }
            DrawCommand::FillText {
                text,
                position,
                font,
                align,
                paint,
                transform,
            } => {
                let suit = single_suit(text);
                let mut font_atlas = atlas.as_deref_mut();
                if let (Some(glyphs), Some(suit)) = (font_atlas.as_deref_mut(), suit) {
                    if !glyphs.has_glyph(suit.symbol(), font.size_px) {
                        font_atlas = None;
                    }
                }
                match (font_atlas, suit) {
                    (Some(glyphs), _) => {
                        for glyph in glyphs.layout(text, font.size_px, *align, *position) {
                            quads.push(QuadInstance::text(transform, glyph.rect, glyph.uv, paint_params(paint)));
                        }
                    }
                    (None, Some(suit)) => {
                        let rect = glyph_box(*position, font.size_px, *align);
                        quads.push(QuadInstance::new(
                            transform,
                            rect,
                            SHAPE_GLYPH,
                            suit.index() as u32,
                            paint_params(paint),
                        ));
                    }
                    (None, None) => {}
                }
            }
            DrawCommand::DrawImage { image, rect, transform } => {
                if sprite == Some(*image) {
                    quads.push(QuadInstance::new(transform, *rect, SHAPE_RECT, 0, PaintParams::image()));
                }
            }
        }
    }
    quads
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, Font};
    use crate::gpu::text::{GlyphBitmap, GlyphSource};

    /// Square blocks for ASCII only, so suits need the fallback.
    struct AsciiBlocks;

    impl GlyphSource for AsciiBlocks {
        fn rasterize(&self, c: char, size_px: f32) -> Option<GlyphBitmap> {
            if !c.is_ascii_graphic() {
                return None;
            }
            let side = size_px as u32 / 2;
            Some(GlyphBitmap {
                width: side,
                height: side,
                coverage: vec![255; (side * side) as usize],
                offset: Vec2::new(0.0, -(side as f32)),
                advance: side as f32,
            })
        }
    }

    /// Like `AsciiBlocks`, but suits draw as blocks too.
    struct AllBlocks;

    impl GlyphSource for AllBlocks {
        fn rasterize(&self, c: char, size_px: f32) -> Option<GlyphBitmap> {
            AsciiBlocks.rasterize(if c.is_ascii() { c } else { 'x' }, size_px)
        }
    }

    fn fps_and_suit() -> DisplayList {
        let mut list = DisplayList::new();
        list.clear_rect(0.0, 0.0, 800.0, 600.0);
        list.set_font(Font::px(30.0, "Arial"));
        list.set_fill_style(Paint::Solid(Color::WHITE));
        list.fill_text("FPS: 60.0", 10.0, 50.0);
        list.set_text_align(TextAlign::Center);
        list.fill_text("♠", 100.0, 200.0);
        list
    }

    #[test]
    fn test_instance_is_tightly_packed() {
        assert_eq!(std::mem::size_of::<QuadInstance>(), 34 * 4);
    }

    #[test]
    fn test_clear_and_plain_text_are_skipped() {
        let mut list = DisplayList::new();
        list.clear_rect(0.0, 0.0, 800.0, 600.0);
        list.set_font(Font::px(30.0, "Arial"));
        list.fill_text("FPS: 60.0", 10.0, 50.0);
        assert!(build_quads(&list, None).is_empty());
    }

    #[test]
    fn test_suit_text_becomes_glyph_quad() {
        let mut list = DisplayList::new();
        list.set_font(Font::px(40.0, "Arial"));
        list.set_text_align(TextAlign::Center);
        list.set_fill_style(Paint::Solid(Color::WHITE));
        list.fill_text("♦", 100.0, 200.0);

        let quads = build_quads(&list, None);
        assert_eq!(quads.len(), 1);
        let quad = &quads[0];
        assert_eq!(quad.shape(), SHAPE_GLYPH);
        assert_eq!(quad.paint(), PAINT_SOLID);
        assert_eq!(quad.glyph(), Suit::Diamond.index() as u32);
        assert_eq!(quad.rect, [80.0, 168.0, 40.0, 40.0]);
        assert_eq!(quad.color0, [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_text_draws_through_atlas() {
        let mut atlas = GlyphAtlas::with_size(AsciiBlocks, 128);
        let quads = build_quads_with_text(&fps_and_suit(), None, &mut atlas);

        // Eight visible characters in "FPS: 60.0", then the suit mask
        let text: Vec<_> = quads.iter().filter(|q| q.shape() == SHAPE_TEXT).collect();
        assert_eq!(text.len(), 8);
        assert_eq!(text[0].rect, [10.0, 35.0, 15.0, 15.0]);
        assert_eq!(text[0].color0, [1.0, 1.0, 1.0, 1.0]);
        assert!(text[0].atlas_uv[2] > text[0].atlas_uv[0]);
        assert_eq!(quads.last().unwrap().shape(), SHAPE_GLYPH);
        assert_eq!(quads.last().unwrap().glyph(), Suit::Spade.index() as u32);
    }

    #[test]
    fn test_suits_use_the_font_when_it_has_them() {
        let mut atlas = GlyphAtlas::with_size(AllBlocks, 128);
        let quads = build_quads_with_text(&fps_and_suit(), None, &mut atlas);
        assert_eq!(quads.len(), 9);
        assert!(quads.iter().all(|q| q.shape() == SHAPE_TEXT));
    }

    #[test]
    fn test_repacked_atlas_rebuilds_the_frame() {
        // A 64px atlas holds sixteen 15px blocks; fill twelve slots up front
        let mut atlas = GlyphAtlas::with_size(AsciiBlocks, 64);
        atlas.layout("HIJKLMNOPQRS", 30.0, TextAlign::Start, Vec2::ZERO);

        let mut list = DisplayList::new();
        list.set_font(Font::px(30.0, "Arial"));
        list.fill_text("ABCDEFG", 0.0, 20.0);

        // E overflows and repacks, so A..D are rasterized again after E..G
        let quads = build_quads_with_text(&list, None, &mut atlas);
        assert_eq!(atlas.generation(), 1);
        assert_eq!(quads.len(), 7);
        assert_eq!(&quads[0].atlas_uv[..2], &[0.75, 0.0]);
        assert_eq!(&quads[4].atlas_uv[..2], &[0.0, 0.0]);
    }

    #[test]
    fn test_glyph_box_alignment() {
        let p = Vec2::new(50.0, 100.0);
        assert_eq!(glyph_box(p, 20.0, TextAlign::Start).x, 50.0);
        assert_eq!(glyph_box(p, 20.0, TextAlign::Center).x, 40.0);
        assert_eq!(glyph_box(p, 20.0, TextAlign::End).x, 30.0);
        assert_eq!(glyph_box(p, 20.0, TextAlign::End).y, 84.0);
    }

    #[test]
    fn test_gradient_params() {
        let mut list = DisplayList::new();
        let gradient = Gradient::linear(Vec2::new(0.0, 10.0), Vec2::new(0.0, 0.0))
            .with_stop(0.0, Color::WHITE.with_alpha(0.5))
            .with_stop(1.0, Color::TRANSPARENT);
        list.set_fill_style(gradient.into());
        list.fill_rect(0.0, 0.0, 10.0, 10.0);

        let radial = Gradient::radial(Vec2::new(5.0, 5.0), 1.0, Vec2::new(5.0, 5.0), 35.0)
            .with_stop(0.0, Color::WHITE)
            .with_stop(0.5, Color::TRANSPARENT);
        list.set_fill_style(radial.into());
        list.fill_rect(0.0, 0.0, 10.0, 10.0);

        let quads = build_quads(&list, None);
        assert_eq!(quads[0].paint(), PAINT_LINEAR);
        assert_eq!(quads[0].geometry, [0.0, 10.0, 0.0, 0.0]);
        assert_eq!(quads[0].color0[3], 0.5);
        assert_eq!(quads[1].paint(), PAINT_RADIAL);
        assert_eq!(quads[1].geometry, [5.0, 5.0, 1.0, 35.0]);
        assert_eq!(&quads[1].stops[..2], &[0.0, 0.5]);
    }

    #[test]
    fn test_empty_gradient_is_transparent() {
        let mut list = DisplayList::new();
        list.set_fill_style(Gradient::linear(Vec2::ZERO, Vec2::X).into());
        list.fill_rect(0.0, 0.0, 10.0, 10.0);
        let quads = build_quads(&list, None);
        assert_eq!(quads[0].color0[3], 0.0);
    }

    #[test]
    fn test_images_need_a_matching_sprite() {
        let mut list = DisplayList::new();
        list.draw_image(ImageHandle(0), 0.0, 0.0, 16.0, 16.0);
        assert!(build_quads(&list, None).is_empty());
        assert!(build_quads(&list, Some(ImageHandle(1))).is_empty());

        let quads = build_quads(&list, Some(ImageHandle(0)));
        assert_eq!(quads.len(), 1);
        assert_eq!(quads[0].paint(), PAINT_IMAGE);
    }

    #[test]
    fn test_transform_is_carried() {
        let mut list = DisplayList::new();
        list.translate(10.0, 20.0);
        list.fill_rect(0.0, 0.0, 1.0, 1.0);
        let quads = build_quads(&list, None);
        assert_eq!(quads[0].origin, [10.0, 20.0]);
        assert_eq!(quads[0].axis_x, [1.0, 0.0]);
        assert_eq!(quads[0].axis_y, [0.0, 1.0]);
    }
}
