//! Immediate-mode 2D drawing surface.
//!
//! Particles draw through the [`Canvas`] trait, which covers the slice of a
//! 2D context the animation needs: clearing, filled rectangles, text, linear
//! and radial gradients, images, and a save/restore transform stack.
//!
//! [`DisplayList`] is the recording implementation. It tracks the current
//! transform, fill, font and alignment exactly like a live context would, and
//! stores every draw with the state it was issued under. The GPU presenter
//! replays it each frame; tests inspect it directly.
//!
//! # Example
//!
//! ```ignore
//! use glowfall::canvas::{Canvas, Color, DisplayList, Paint};
//!
//! let mut list = DisplayList::new();
//! list.set_fill_style(Paint::Solid(Color::BLACK));
//! list.fill_rect(10.0, 10.0, 20.0, 20.0);
//! assert_eq!(list.len(), 1);
//! ```

use glam::{Affine2, Vec2};
use std::fmt;

/// Pixel dimensions of the drawing surface.
///
/// Read fresh from the host on every call, so a resize is picked up on the
/// next frame without the core listening for it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SurfaceSize {
    pub width: f32,
    pub height: f32,
}

impl SurfaceSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Visual center of the surface.
    #[inline]
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Whether either dimension is zero or negative.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }
}

/// Straight-alpha RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// A color pinned to a position along a gradient (`0.0` = start, `1.0` = end).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Color,
}

/// Gradient fill, in the coordinate space current when it is used.
#[derive(Debug, Clone, PartialEq)]
pub enum Gradient {
    /// Varies along the line from `start` to `end`.
    Linear {
        start: Vec2,
        end: Vec2,
        stops: Vec<ColorStop>,
    },
    /// Varies between two circles.
    Radial {
        inner_center: Vec2,
        inner_radius: f32,
        outer_center: Vec2,
        outer_radius: f32,
        stops: Vec<ColorStop>,
    },
}

impl Gradient {
    pub fn linear(start: Vec2, end: Vec2) -> Self {
        Gradient::Linear {
            start,
            end,
            stops: Vec::new(),
        }
    }

    pub fn radial(inner_center: Vec2, inner_radius: f32, outer_center: Vec2, outer_radius: f32) -> Self {
        Gradient::Radial {
            inner_center,
            inner_radius,
            outer_center,
            outer_radius,
            stops: Vec::new(),
        }
    }

    /// Add a color stop. Offsets are clamped to `0.0..=1.0`.
    pub fn with_stop(mut self, offset: f32, color: Color) -> Self {
        let stop = ColorStop {
            offset: offset.clamp(0.0, 1.0),
            color,
        };
        match &mut self {
            Gradient::Linear { stops, .. } | Gradient::Radial { stops, .. } => stops.push(stop),
        }
        self
    }

    pub fn stops(&self) -> &[ColorStop] {
        match self {
            Gradient::Linear { stops, .. } | Gradient::Radial { stops, .. } => stops,
        }
    }
}

/// What a fill operation paints with.
#[derive(Debug, Clone, PartialEq)]
pub enum Paint {
    Solid(Color),
    Gradient(Gradient),
}

impl Default for Paint {
    fn default() -> Self {
        Paint::Solid(Color::BLACK)
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Paint::Solid(color)
    }
}

impl From<Gradient> for Paint {
    fn from(gradient: Gradient) -> Self {
        Paint::Gradient(gradient)
    }
}

/// Font used for text draws.
#[derive(Debug, Clone, PartialEq)]
pub struct Font {
    /// Em size in pixels. May be zero or negative; such text draws nothing.
    pub size_px: f32,
    pub family: String,
}

impl Font {
    pub fn px(size_px: f32, family: impl Into<String>) -> Self {
        Self {
            size_px,
            family: family.into(),
        }
    }
}

impl Default for Font {
    fn default() -> Self {
        Font::px(10.0, "sans-serif")
    }
}

impl fmt::Display for Font {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}px {}", self.size_px, self.family)
    }
}

/// Horizontal anchoring of text relative to its draw position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    #[default]
    Start,
    Center,
    End,
}

/// Opaque handle to an image registered with the host renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ImageHandle(pub u32);

/// Axis-aligned rectangle in the coordinate space of its draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// True when the rectangle covers no area and a fill would be a no-op.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }
}

/// A 2D drawing context.
///
/// Mirrors the semantics of an HTML canvas context: fill style, font and
/// alignment are sticky state, `save`/`restore` push and pop all of it along
/// with the transform, and transforms compose onto the current one.
pub trait Canvas {
    /// Erase a region back to the background.
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Fill a rectangle with the current fill style.
    ///
    /// Non-positive extents are a no-op.
    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32);

    /// Draw text with the current font, alignment and fill style.
    fn fill_text(&mut self, text: &str, x: f32, y: f32);

    fn set_fill_style(&mut self, paint: Paint);

    fn set_font(&mut self, font: Font);

    fn set_text_align(&mut self, align: TextAlign);

    /// Draw an image stretched to the destination rectangle.
    ///
    /// Non-positive extents are a no-op.
    fn draw_image(&mut self, image: ImageHandle, x: f32, y: f32, width: f32, height: f32);

    fn save(&mut self);

    /// Pop the most recent `save`. Unbalanced calls are ignored.
    fn restore(&mut self);

    fn translate(&mut self, x: f32, y: f32);

    /// Rotate by `angle` radians, clockwise on a y-down surface.
    fn rotate(&mut self, angle: f32);

    /// Rotate about `pivot` instead of the current origin.
    fn rotate_about(&mut self, pivot: Vec2, angle: f32) {
        self.translate(pivot.x, pivot.y);
        self.rotate(angle);
        self.translate(-pivot.x, -pivot.y);
    }
}

/// A single recorded draw, with the state it was issued under.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Clear {
        rect: Rect,
    },
    FillRect {
        rect: Rect,
        paint: Paint,
        transform: Affine2,
    },
    FillText {
        text: String,
        position: Vec2,
        font: Font,
        align: TextAlign,
        paint: Paint,
        transform: Affine2,
    },
    DrawImage {
        image: ImageHandle,
        rect: Rect,
        transform: Affine2,
    },
}

#[derive(Debug, Clone, PartialEq)]
struct DrawState {
    transform: Affine2,
    fill: Paint,
    font: Font,
    align: TextAlign,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            transform: Affine2::IDENTITY,
            fill: Paint::default(),
            font: Font::default(),
            align: TextAlign::default(),
        }
    }
}

/// Recording [`Canvas`] that keeps one frame's draws.
#[derive(Debug, Clone, Default)]
pub struct DisplayList {
    commands: Vec<DrawCommand>,
    state: DrawState,
    stack: Vec<DrawState>,
}

impl DisplayList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop all recorded draws and reset the context state for a new frame.
    pub fn reset(&mut self) {
        self.commands.clear();
        self.state = DrawState::default();
        self.stack.clear();
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Current transform.
    pub fn transform(&self) -> Affine2 {
        self.state.transform
    }

    /// Number of unmatched `save` calls.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn fill_style(&self) -> &Paint {
        &self.state.fill
    }

    pub fn font(&self) -> &Font {
        &self.state.font
    }

    pub fn text_align(&self) -> TextAlign {
        self.state.align
    }
}

impl Canvas for DisplayList {
    fn clear_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.commands.push(DrawCommand::Clear {
            rect: Rect::new(x, y, width, height),
        });
    }

    fn fill_rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        let rect = Rect::new(x, y, width, height);
        if rect.is_degenerate() {
            return;
        }
        self.commands.push(DrawCommand::FillRect {
            rect,
            paint: self.state.fill.clone(),
            transform: self.state.transform,
        });
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32) {
        if text.is_empty() || self.state.font.size_px <= 0.0 {
            return;
        }
        self.commands.push(DrawCommand::FillText {
            text: text.to_owned(),
            position: Vec2::new(x, y),
            font: self.state.font.clone(),
            align: self.state.align,
            paint: self.state.fill.clone(),
            transform: self.state.transform,
        });
    }

    fn set_fill_style(&mut self, paint: Paint) {
        self.state.fill = paint;
    }

    fn set_font(&mut self, font: Font) {
        self.state.font = font;
    }

    fn set_text_align(&mut self, align: TextAlign) {
        self.state.align = align;
    }

    fn draw_image(&mut self, image: ImageHandle, x: f32, y: f32, width: f32, height: f32) {
        let rect = Rect::new(x, y, width, height);
        if rect.is_degenerate() {
            return;
        }
        self.commands.push(DrawCommand::DrawImage {
            image,
            rect,
            transform: self.state.transform,
        });
    }

    fn save(&mut self) {
        self.stack.push(self.state.clone());
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, x: f32, y: f32) {
        self.state.transform = self.state.transform * Affine2::from_translation(Vec2::new(x, y));
    }

    fn rotate(&mut self, angle: f32) {
        self.state.transform = self.state.transform * Affine2::from_angle(angle);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::{FRAC_PI_2, PI};

    #[test]
    fn test_surface_center() {
        let surface = SurfaceSize::new(800.0, 600.0);
        assert_eq!(surface.center(), Vec2::new(400.0, 300.0));
        assert!(!surface.is_empty());
        assert!(SurfaceSize::new(0.0, 600.0).is_empty());
    }

    #[test]
    fn test_fill_rect_records_state() {
        let mut list = DisplayList::new();
        list.set_fill_style(Paint::Solid(Color::WHITE));
        list.translate(5.0, 0.0);
        list.fill_rect(1.0, 2.0, 3.0, 4.0);

        match &list.commands()[0] {
            DrawCommand::FillRect { rect, paint, transform } => {
                assert_eq!(*rect, Rect::new(1.0, 2.0, 3.0, 4.0));
                assert_eq!(*paint, Paint::Solid(Color::WHITE));
                assert_eq!(transform.transform_point2(Vec2::ZERO), Vec2::new(5.0, 0.0));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_degenerate_draws_are_noops() {
        let mut list = DisplayList::new();
        list.fill_rect(0.0, 0.0, 0.0, 10.0);
        list.fill_rect(0.0, 0.0, -5.0, -5.0);
        list.draw_image(ImageHandle(0), 0.0, 0.0, 10.0, -1.0);
        list.set_font(Font::px(-2.0, "Arial"));
        list.fill_text("x", 0.0, 0.0);
        assert!(list.is_empty());
    }

    #[test]
    fn test_save_restore_roundtrips_state() {
        let mut list = DisplayList::new();
        list.save();
        list.set_font(Font::px(30.0, "Arial"));
        list.set_text_align(TextAlign::Center);
        list.rotate(FRAC_PI_2);
        list.restore();

        assert_eq!(list.transform(), Affine2::IDENTITY);
        assert_eq!(*list.font(), Font::default());
        assert_eq!(list.text_align(), TextAlign::Start);
        assert_eq!(list.save_depth(), 0);
    }

    #[test]
    fn test_unbalanced_restore_is_ignored() {
        let mut list = DisplayList::new();
        list.translate(3.0, 4.0);
        list.restore();
        assert_eq!(list.transform().transform_point2(Vec2::ZERO), Vec2::new(3.0, 4.0));
    }

    #[test]
    fn test_rotate_about_pivot_keeps_pivot_fixed() {
        let mut list = DisplayList::new();
        let pivot = Vec2::new(100.0, 50.0);
        list.rotate_about(pivot, PI);

        let mapped = list.transform().transform_point2(pivot);
        assert!(mapped.abs_diff_eq(pivot, 1e-4));

        // Half-turn reflects points through the pivot
        let mapped = list.transform().transform_point2(Vec2::new(100.0, 60.0));
        assert!(mapped.abs_diff_eq(Vec2::new(100.0, 40.0), 1e-4));
    }

    #[test]
    fn test_gradient_stops_are_clamped() {
        let gradient = Gradient::linear(Vec2::ZERO, Vec2::X)
            .with_stop(-1.0, Color::WHITE)
            .with_stop(2.0, Color::TRANSPARENT);
        let offsets: Vec<f32> = gradient.stops().iter().map(|s| s.offset).collect();
        assert_eq!(offsets, vec![0.0, 1.0]);
    }

    #[test]
    fn test_font_display_matches_css() {
        assert_eq!(Font::px(30.0, "Arial").to_string(), "30px Arial");
    }

    #[test]
    fn test_reset_clears_frame() {
        let mut list = DisplayList::new();
        list.save();
        list.translate(1.0, 1.0);
        list.clear_rect(0.0, 0.0, 10.0, 10.0);
        list.reset();
        assert!(list.is_empty());
        assert_eq!(list.save_depth(), 0);
        assert_eq!(list.transform(), Affine2::IDENTITY);
    }
}
