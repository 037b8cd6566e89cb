//! Card-suit particles that hop along a tilted floor.
//!
//! Each particle spawns at the surface center, kicks upward and sideways,
//! and bounces on a floor line whose tilt (`direction.y`) is fixed at spawn.
//! The glyph glows on a triangle wave and is mirrored below the floor.

use super::{sanitize_dt, Assets, Particle};
use crate::canvas::{Canvas, Color, Font, Gradient, Paint, SurfaceSize, TextAlign};
use crate::random::RandomSource;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

const GLOW_PEAK: f32 = 1.0;
const GLOW_TROUGH: f32 = 0.25;
const GLOW_RADIUS: f32 = 35.0;
const GLOW_LIFT: f32 = 10.0;
const BASE_FONT_PX: f32 = 30.0;
const FONT_FAMILY: &str = "Arial";

/// The four card suits a glyph particle can show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Suit {
    Heart,
    Diamond,
    Spade,
    Club,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Diamond, Suit::Spade, Suit::Club];

    pub fn symbol(self) -> char {
        match self {
            Suit::Heart => '♥',
            Suit::Diamond => '♦',
            Suit::Spade => '♠',
            Suit::Club => '♣',
        }
    }

    pub fn from_symbol(symbol: char) -> Option<Suit> {
        Suit::ALL.into_iter().find(|s| s.symbol() == symbol)
    }

    /// Position in [`Suit::ALL`].
    pub fn index(self) -> usize {
        self as usize
    }

    /// Pick a suit uniformly from a roll in `0.0..1.0`.
    pub fn from_roll(roll: f32) -> Suit {
        let index = (roll.clamp(0.0, 1.0) * Suit::ALL.len() as f32) as usize;
        Suit::ALL[index.min(Suit::ALL.len() - 1)]
    }
}

/// Motion constants for glyph particles.
///
/// Velocities are per-frame displacements; gravity and drag are tuned for
/// that, not for true per-second units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlyphTuning {
    pub max_velocity: f32,
    pub gravity: f32,
    /// Per-axis velocity multiplier applied every frame.
    pub drag: Vec2,
    /// Fraction of vertical speed kept after hitting the floor.
    pub restitution: f32,
}

impl Default for GlyphTuning {
    fn default() -> Self {
        Self {
            max_velocity: 15.0,
            gravity: 20.0,
            drag: Vec2::new(0.97, 0.96),
            restitution: 0.75,
        }
    }
}

/// Kinematic and glow state of one glyph particle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphState {
    pub position: Vec2,
    pub velocity: Vec2,
    /// Floor height at the spawn column.
    pub initial_ground: f32,
    /// Floor height under the particle, recomputed every step.
    pub ground: f32,
    /// `x` is the drift sign (`±1`), `y` the floor slope.
    pub direction: Vec2,
    pub glow: f32,
    pub glow_rising: bool,
}

impl Default for GlyphState {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::new(1.0, -7.0),
            initial_ground: 0.0,
            ground: 0.0,
            direction: Vec2::ZERO,
            glow: 0.0,
            glow_rising: true,
        }
    }
}

impl GlyphState {
    /// Spawn at the surface center with random drift, tilt and glow phase.
    ///
    /// Consumes six draws from `rng` in a fixed order: drift sign, floor
    /// slope, horizontal speed, vertical kick, suit, glow phase.
    pub fn spawn(surface: SurfaceSize, rng: &mut dyn RandomSource) -> (Self, Suit) {
        let position = surface.center();
        let direction = Vec2::new(
            if rng.chance(0.5) { -1.0 } else { 1.0 },
            rng.range(-1.0, 1.0),
        );
        let velocity = Vec2::new(direction.x * rng.range(2.0, 5.0), -7.0 * rng.range(0.5, 2.0));
        let suit = Suit::from_roll(rng.next_f32());
        let glow = rng.next_f32();

        let state = Self {
            position,
            velocity,
            initial_ground: position.y,
            ground: position.y,
            direction,
            glow,
            glow_rising: true,
        };
        (state, suit)
    }

    /// Font size in pixels; grows as the floor slopes downward.
    #[inline]
    pub fn font_size(&self) -> f32 {
        (self.ground - self.initial_ground) / 15.0 + BASE_FONT_PX
    }
}

/// Advance a glyph particle by one frame.
pub fn step(state: GlyphState, tuning: &GlyphTuning, surface: SurfaceSize, dt: f32) -> GlyphState {
    let dt = sanitize_dt(dt);
    let mut next = state;
    let max = tuning.max_velocity;

    next.velocity.y += tuning.gravity * dt;
    next.velocity = (next.velocity * tuning.drag).clamp(Vec2::splat(-max), Vec2::splat(max));

    next.position += next.velocity;

    next.ground = next.initial_ground + (next.position.x - surface.center().x) * next.direction.y;
    if next.position.y > next.ground {
        next.position.y = next.ground;
        next.velocity.y = -next.velocity.y.abs() * tuning.restitution;
    }

    advance_glow(&mut next, dt);
    next
}

fn advance_glow(state: &mut GlyphState, dt: f32) {
    if state.glow_rising {
        state.glow += dt / 2.0;
        if state.glow >= GLOW_PEAK {
            state.glow = GLOW_PEAK;
            state.glow_rising = false;
        }
    } else {
        state.glow -= dt / 2.0;
        if state.glow <= GLOW_TROUGH {
            state.glow = GLOW_TROUGH;
            state.glow_rising = true;
        }
    }
}

/// A glowing card-suit glyph with a floor reflection.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphParticle {
    pub state: GlyphState,
    pub suit: Suit,
    pub tuning: GlyphTuning,
}

impl GlyphParticle {
    pub fn ground(&self) -> f32 {
        self.state.ground
    }

    pub fn glow(&self) -> f32 {
        self.state.glow
    }

    fn draw_glow(&self, canvas: &mut dyn Canvas) {
        let p = self.state.position;
        let center = p - Vec2::new(0.0, GLOW_LIFT);
        let halo = Gradient::radial(center, 1.0, center, GLOW_RADIUS)
            .with_stop(0.0, Color::WHITE.with_alpha(self.state.glow * 0.1))
            .with_stop(0.5, Color::WHITE.with_alpha(0.0));
        canvas.set_fill_style(halo.into());
        canvas.fill_rect(p.x - 50.0, p.y - 60.0, 100.0, 100.0);
    }

    fn draw_reflection(&self, canvas: &mut dyn Canvas, symbol: &str) {
        let p = self.state.position;
        let ground = self.state.ground;
        let fade_length = (ground - self.state.initial_ground) / 15.0 + BASE_FONT_PX / 2.0;

        canvas.rotate_about(p, PI);
        canvas.set_font(Font::px(self.state.font_size(), FONT_FAMILY));

        let fade = Gradient::linear(Vec2::new(p.x, ground), Vec2::new(p.x, ground - fade_length))
            .with_stop(0.0, Color::WHITE.with_alpha(self.state.glow * 0.25))
            .with_stop(1.0, Color::WHITE.with_alpha(0.0));
        canvas.set_fill_style(fade.into());
        canvas.set_text_align(TextAlign::Center);
        canvas.fill_text(symbol, p.x, p.y + (p.y - ground));
    }
}

impl Particle for GlyphParticle {
    type Tuning = GlyphTuning;

    fn new(tuning: &GlyphTuning) -> Self {
        Self {
            state: GlyphState::default(),
            suit: Suit::Heart,
            tuning: *tuning,
        }
    }

    fn init(&mut self, surface: SurfaceSize, rng: &mut dyn RandomSource) {
        let (state, suit) = GlyphState::spawn(surface, rng);
        self.state = state;
        self.suit = suit;
    }

    fn update(&mut self, surface: SurfaceSize, dt: f32) {
        self.state = step(self.state, &self.tuning, surface, dt);
    }

    fn draw(&self, canvas: &mut dyn Canvas, _surface: SurfaceSize, _assets: &Assets) {
        let mut buf = [0u8; 4];
        let symbol: &str = self.suit.symbol().encode_utf8(&mut buf);
        let p = self.state.position;

        canvas.save();

        self.draw_glow(canvas);

        canvas.set_font(Font::px(self.state.font_size(), FONT_FAMILY));
        canvas.set_fill_style(Paint::Solid(Color::WHITE.with_alpha(self.state.glow)));
        canvas.set_text_align(TextAlign::Center);
        canvas.fill_text(symbol, p.x, p.y);

        self.draw_reflection(canvas, symbol);

        canvas.restore();
    }

    fn position(&self) -> Vec2 {
        self.state.position
    }

    fn velocity(&self) -> Vec2 {
        self.state.velocity
    }
}
