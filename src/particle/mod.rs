//! Particle variants and the lifecycle they share.
//!
//! A particle is created from its variant's tuning, `init`-ed against the
//! current surface (spawn position, floor, random direction), then rendered
//! once per frame until its system replaces it.
//!
//! Each variant keeps its kinematic state in a `Copy` struct advanced by a
//! pure `step` function, so physics can be tested without a canvas:
//!
//! | Variant | Drag | Floor | Visual |
//! |---------|------|-------|--------|
//! | [`GlyphParticle`] | multiplicative | skewed by `direction.y` | card suit with glow and reflection |
//! | [`SpriteParticle`] | additive | flat | rotated sprite, or a black box |

pub mod glyph;
pub mod sprite;

use crate::canvas::{Canvas, ImageHandle, SurfaceSize};
use crate::random::RandomSource;
use glam::Vec2;

pub use glyph::{GlyphParticle, GlyphState, GlyphTuning, Suit};
pub use sprite::{SpriteParticle, SpriteState, SpriteTuning};

/// Host-provided resources particles may draw with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Assets {
    /// Sprite image, if one was loaded. Absence is a valid state.
    pub sprite: Option<ImageHandle>,
}

/// Shared `init`/`render` contract for both particle variants.
pub trait Particle: Clone {
    /// Hand-tuned constants for this variant.
    type Tuning: Clone;

    /// Create a particle that has not been spawned yet.
    fn new(tuning: &Self::Tuning) -> Self;

    /// Place the particle for the given surface, drawing all random
    /// spawn parameters from `rng`.
    fn init(&mut self, surface: SurfaceSize, rng: &mut dyn RandomSource);

    /// Advance the simulation by `dt` seconds.
    fn update(&mut self, surface: SurfaceSize, dt: f32);

    /// Draw the current state.
    fn draw(&self, canvas: &mut dyn Canvas, surface: SurfaceSize, assets: &Assets);

    /// Advance then draw, once per frame.
    fn render(&mut self, canvas: &mut dyn Canvas, surface: SurfaceSize, dt: f32, assets: &Assets) {
        self.update(surface, dt);
        self.draw(canvas, surface, assets);
    }

    fn position(&self) -> Vec2;

    fn velocity(&self) -> Vec2;
}

/// Stalled or reversed clocks integrate as a zero step.
#[inline]
pub(crate) fn sanitize_dt(dt: f32) -> f32 {
    if dt.is_finite() {
        dt.max(0.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_dt() {
        assert_eq!(sanitize_dt(0.016), 0.016);
        assert_eq!(sanitize_dt(-0.5), 0.0);
        assert_eq!(sanitize_dt(f32::NAN), 0.0);
        assert_eq!(sanitize_dt(f32::INFINITY), 0.0);
    }
}
