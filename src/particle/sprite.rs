//! Sprite particles that swell as they approach the midline.
//!
//! A sprite spawns centered on the surface, is thrown downward, and bounces
//! on a flat floor at its spawn height. Drag is additive and never pushes a
//! velocity component through zero. The sprite is drawn tilted 45° and then
//! swung around the canvas center by its own fixed angle.

use super::{sanitize_dt, Assets, Particle};
use crate::canvas::{Canvas, Color, Paint, SurfaceSize};
use crate::random::RandomSource;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::{FRAC_PI_4, PI};

/// Motion constants for sprite particles.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteTuning {
    pub max_velocity: f32,
    pub gravity: f32,
    /// Per-axis speed removed per second, toward zero.
    pub drag: Vec2,
    /// Fraction of vertical speed kept after hitting the floor.
    pub bounciness: f32,
    /// Edge length at spawn, before the first step recomputes it.
    pub spawn_size: f32,
}

impl Default for SpriteTuning {
    fn default() -> Self {
        Self {
            max_velocity: 15.0,
            gravity: 20.0,
            drag: Vec2::new(2.0, 2.0),
            bounciness: 0.6,
            spawn_size: 50.0,
        }
    }
}

/// Kinematic state of one sprite particle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct SpriteState {
    /// Top-left corner of the sprite.
    pub position: Vec2,
    pub velocity: Vec2,
    /// Edge length (width = height). Goes negative past the midline.
    pub size: f32,
    /// Flat floor; `position.y` never ends a step below it.
    pub y_bounds: f32,
    /// Fixed swing angle around the canvas center, in radians.
    pub direction: f32,
}

impl SpriteState {
    /// Spawn centered on the surface.
    ///
    /// Draws, in order: horizontal speed, vertical speed, swing angle.
    pub fn spawn(surface: SurfaceSize, spawn_size: f32, rng: &mut dyn RandomSource) -> Self {
        let position = surface.center() - Vec2::splat(spawn_size / 2.0);
        let velocity = Vec2::new(rng.range(-4.0, 4.0), rng.range(4.0, 12.0));
        let direction = rng.range(-PI, PI);
        Self {
            position,
            velocity,
            size: spawn_size,
            y_bounds: position.y,
            direction,
        }
    }

    /// Center of the sprite's bounds.
    #[inline]
    pub fn center(&self) -> Vec2 {
        self.position + Vec2::splat(self.size / 2.0)
    }
}

/// Nudge one velocity component toward zero by `amount`, unless that
/// would flip its sign, then hard-clamp to `±max`.
fn apply_drag(v: f32, amount: f32, max: f32) -> f32 {
    let nudged = if v > 0.0 && v - amount >= 0.0 {
        (v - amount).min(max)
    } else if v < 0.0 && v + amount <= 0.0 {
        (v + amount).max(-max)
    } else {
        v
    };
    nudged.clamp(-max, max)
}

/// Advance a sprite particle by one frame.
pub fn step(state: SpriteState, tuning: &SpriteTuning, surface: SurfaceSize, dt: f32) -> SpriteState {
    let dt = sanitize_dt(dt);
    let mut next = state;
    let max = tuning.max_velocity;

    next.velocity.y += tuning.gravity * dt;
    next.velocity.x = apply_drag(next.velocity.x, tuning.drag.x * dt, max);
    next.velocity.y = apply_drag(next.velocity.y, tuning.drag.y * dt, max);

    next.position += next.velocity;
    next.size = surface.height / 2.0 - next.position.y;

    if next.position.y > next.y_bounds {
        next.position.y = next.y_bounds;
        next.velocity.y = -next.velocity.y.abs() * tuning.bounciness;
    }

    next
}

/// A rotated sprite, or a black box when no sprite is loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct SpriteParticle {
    pub state: SpriteState,
    pub tuning: SpriteTuning,
}

impl SpriteParticle {
    pub fn size(&self) -> f32 {
        self.state.size
    }

    pub fn y_bounds(&self) -> f32 {
        self.state.y_bounds
    }
}

impl Particle for SpriteParticle {
    type Tuning = SpriteTuning;

    fn new(tuning: &SpriteTuning) -> Self {
        Self {
            state: SpriteState {
                size: tuning.spawn_size,
                ..SpriteState::default()
            },
            tuning: *tuning,
        }
    }

    fn init(&mut self, surface: SurfaceSize, rng: &mut dyn RandomSource) {
        self.state = SpriteState::spawn(surface, self.tuning.spawn_size, rng);
    }

    fn update(&mut self, surface: SurfaceSize, dt: f32) {
        self.state = step(self.state, &self.tuning, surface, dt);
    }

    fn draw(&self, canvas: &mut dyn Canvas, surface: SurfaceSize, assets: &Assets) {
        let SpriteState { position: p, size, direction, .. } = self.state;

        let Some(image) = assets.sprite else {
            canvas.set_fill_style(Paint::Solid(Color::BLACK));
            canvas.fill_rect(p.x, p.y, size, size);
            return;
        };

        let pivot = self.state.center();
        let center = surface.center();

        canvas.rotate_about(pivot, -FRAC_PI_4);
        canvas.rotate_about(center, direction);
        canvas.draw_image(image, p.x, p.y, size, size);
        canvas.rotate_about(center, -direction);
        canvas.rotate_about(pivot, FRAC_PI_4);
    }

    fn position(&self) -> Vec2 {
        self.state.position
    }

    fn velocity(&self) -> Vec2 {
        self.state.velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawCommand, ImageHandle, Rect};
    use crate::random::{SeededRandom, SequenceRandom};

    const SURFACE: SurfaceSize = SurfaceSize {
        width: 800.0,
        height: 600.0,
    };

    #[test]
    fn test_spawn_centers_by_half_size() {
        let mut rng = SequenceRandom::new(vec![0.5, 0.5, 0.5]);
        let state = SpriteState::spawn(SURFACE, 50.0, &mut rng);
        assert_eq!(state.position, Vec2::new(375.0, 275.0));
        assert_eq!(state.y_bounds, 275.0);
        assert_eq!(state.velocity, Vec2::new(0.0, 8.0));
        assert_eq!(state.direction, 0.0);
        assert_eq!(state.center(), SURFACE.center());
    }

    #[test]
    fn test_drag_moves_toward_zero() {
        assert_eq!(apply_drag(5.0, 1.0, 15.0), 4.0);
        assert_eq!(apply_drag(-5.0, 1.0, 15.0), -4.0);
    }

    #[test]
    fn test_drag_never_crosses_zero() {
        assert_eq!(apply_drag(0.5, 1.0, 15.0), 0.5);
        assert_eq!(apply_drag(-0.5, 1.0, 15.0), -0.5);
        assert_eq!(apply_drag(0.0, 1.0, 15.0), 0.0);
        assert_eq!(apply_drag(1.0, 1.0, 15.0), 0.0);
    }

    #[test]
    fn test_drag_caps_at_max_velocity() {
        assert_eq!(apply_drag(40.0, 1.0, 15.0), 15.0);
        assert_eq!(apply_drag(-40.0, 1.0, 15.0), -15.0);
        // Too small to drag, still clamped
        assert_eq!(apply_drag(40.0, 100.0, 15.0), 15.0);
    }

    #[test]
    fn test_flat_floor_bounce() {
        let tuning = SpriteTuning::default();
        let state = SpriteState {
            position: Vec2::new(375.0, 275.0),
            velocity: Vec2::new(0.0, 8.0),
            size: 50.0,
            y_bounds: 275.0,
            direction: 0.0,
        };
        let next = step(state, &tuning, SURFACE, 0.016);

        let pre_bounce = 8.0 + 20.0 * 0.016 - 2.0 * 0.016;
        assert_eq!(next.position.y, 275.0);
        assert!((next.velocity.y + pre_bounce * 0.6).abs() < 1e-5);
        assert!(next.velocity.y.abs() < pre_bounce);
    }

    #[test]
    fn test_size_tracks_distance_to_midline() {
        let state = SpriteState {
            position: Vec2::new(100.0, 100.0),
            velocity: Vec2::new(0.0, -4.0),
            size: 50.0,
            y_bounds: 275.0,
            direction: 0.0,
        };
        let next = step(state, &SpriteTuning::default(), SURFACE, 0.0);
        assert_eq!(next.position.y, 96.0);
        assert_eq!(next.size, 300.0 - 96.0);
    }

    #[test]
    fn test_size_goes_negative_past_midline() {
        let state = SpriteState {
            position: Vec2::new(100.0, 320.0),
            velocity: Vec2::ZERO,
            size: 50.0,
            y_bounds: 400.0,
            direction: 0.0,
        };
        let next = step(state, &SpriteTuning::default(), SURFACE, 0.0);
        assert_eq!(next.size, -20.0);

        let particle = SpriteParticle { state: next, tuning: SpriteTuning::default() };
        let mut list = DisplayList::new();
        particle.draw(&mut list, SURFACE, &Assets::default());
        assert!(list.is_empty());
    }

    #[test]
    fn test_invariants_hold_over_many_frames() {
        for seed in 0..20 {
            let mut rng = SeededRandom::new(seed);
            let mut particle = SpriteParticle::new(&SpriteTuning::default());
            particle.init(SURFACE, &mut rng);
            for frame in 0..600 {
                particle.update(SURFACE, 0.016);
                let s = particle.state;
                assert!(s.velocity.x.abs() <= 15.0);
                assert!(s.velocity.y.abs() <= 15.0);
                assert!(s.position.y <= s.y_bounds, "seed {seed} frame {frame}");
            }
        }
    }

    #[test]
    fn test_fallback_rectangle_without_sprite() {
        let particle = SpriteParticle {
            state: SpriteState {
                position: Vec2::new(10.0, 20.0),
                size: 40.0,
                ..SpriteState::default()
            },
            tuning: SpriteTuning::default(),
        };
        let mut list = DisplayList::new();
        particle.draw(&mut list, SURFACE, &Assets::default());

        assert_eq!(
            list.commands(),
            &[DrawCommand::FillRect {
                rect: Rect::new(10.0, 20.0, 40.0, 40.0),
                paint: Paint::Solid(Color::BLACK),
                transform: glam::Affine2::IDENTITY,
            }]
        );
    }

    #[test]
    fn test_sprite_rotation_is_undone() {
        let particle = SpriteParticle {
            state: SpriteState {
                position: Vec2::new(100.0, 50.0),
                size: 40.0,
                direction: 1.2,
                ..SpriteState::default()
            },
            tuning: SpriteTuning::default(),
        };
        let assets = Assets {
            sprite: Some(ImageHandle(0)),
        };
        let mut list = DisplayList::new();
        particle.draw(&mut list, SURFACE, &assets);

        assert_eq!(list.len(), 1);
        assert!(list.transform().abs_diff_eq(glam::Affine2::IDENTITY, 1e-3));

        match &list.commands()[0] {
            DrawCommand::DrawImage { image, rect, transform } => {
                assert_eq!(*image, ImageHandle(0));
                assert_eq!(*rect, Rect::new(100.0, 50.0, 40.0, 40.0));
                let expected = glam::Affine2::from_translation(Vec2::new(120.0, 70.0))
                    * glam::Affine2::from_angle(-FRAC_PI_4)
                    * glam::Affine2::from_translation(Vec2::new(-120.0, -70.0))
                    * glam::Affine2::from_translation(Vec2::new(400.0, 300.0))
                    * glam::Affine2::from_angle(1.2)
                    * glam::Affine2::from_translation(Vec2::new(-400.0, -300.0));
                assert!(transform.abs_diff_eq(expected, 1e-3));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_init_is_deterministic_for_seed() {
        let mut a = SpriteParticle::new(&SpriteTuning::default());
        let mut b = SpriteParticle::new(&SpriteTuning::default());
        a.init(SURFACE, &mut SeededRandom::new(77));
        b.init(SURFACE, &mut SeededRandom::new(77));
        assert_eq!(a, b);
    }
}
