//! # glowfall - falling particle animation
//!
//! A small 2D particle animation: particles are flung out from the center of
//! a drawing surface, fall under gravity, lose speed to drag, and bounce off a
//! floor until they are respawned.
//!
//! Two particle variants share one system:
//!
//! - [`GlyphParticle`]: a card-suit glyph that bounces on a skewed ground,
//!   pulses a glow, and draws a fading mirror reflection below itself.
//! - [`SpriteParticle`]: an image (or a black box when no image is loaded)
//!   that bounces off a floor tracking its own height and shrinks as it
//!   rises.
//!
//! ## Quick Start
//!
//! ```ignore
//! use glowfall::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     let config = AnimationConfig {
//!         mode: Mode::Glyph,
//!         particle_count: 10,
//!         ..Default::default()
//!     };
//!     glowfall::run(config)
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Canvas
//!
//! Particles draw through the [`Canvas`] trait, a 2D immediate-mode context
//! with a save/restore transform stack. [`DisplayList`] records the calls;
//! the window host replays them on the GPU, and tests inspect them directly.
//!
//! ### Stepping
//!
//! Each variant's physics is a pure function of its state, tuning, surface
//! size and `dt` ([`particle::glyph::step`], [`particle::sprite::step`]).
//! Randomness only enters at spawn time, through a [`RandomSource`].
//!
//! ### Frames
//!
//! [`AnimationLoop`] turns frame callbacks into `dt` values for a
//! [`FrameRenderer`] such as [`Scene`], which owns a [`ParticleSystem`] and
//! handles the periodic respawn.

pub mod animation;
mod app;
pub mod canvas;
pub mod config;
pub mod error;
pub mod gpu;
pub mod particle;
pub mod random;
pub mod scene;
pub mod sprite;
pub mod system;
pub mod time;

pub use animation::{AnimationLoop, FrameRenderer, FrameScheduler, LoopState};
pub use app::run;
pub use canvas::{Canvas, Color, DisplayList, DrawCommand, Font, Gradient, ImageHandle, Paint, SurfaceSize, TextAlign};
pub use config::{AnimationConfig, Mode, WindowConfig};
pub use error::{AppError, ConfigError, GpuError, SpriteError, TextError};
pub use glam::{Affine2, Vec2};
pub use particle::{Assets, GlyphParticle, GlyphTuning, Particle, SpriteParticle, SpriteTuning, Suit};
pub use random::{RandomSource, SeededRandom, SequenceRandom};
pub use scene::Scene;
pub use sprite::SpriteImage;
pub use system::ParticleSystem;
pub use time::FrameClock;

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use glowfall::prelude::*;
/// ```
pub mod prelude {
    pub use crate::animation::{AnimationLoop, FrameRenderer, FrameScheduler};
    pub use crate::canvas::{Canvas, Color, DisplayList, SurfaceSize};
    pub use crate::config::{AnimationConfig, Mode};
    pub use crate::error::AppError;
    pub use crate::particle::{GlyphParticle, Particle, SpriteParticle};
    pub use crate::random::{RandomSource, SeededRandom};
    pub use crate::scene::Scene;
    pub use crate::system::ParticleSystem;
    pub use crate::Vec2;
}
