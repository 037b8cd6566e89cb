//! The configured particle scene.
//!
//! A [`Scene`] picks one particle variant from the [`Mode`] in its config and
//! wraps the matching [`ParticleSystem`]. Both variants share the same
//! `init`/`render` shape, so the animation loop never needs to know which
//! one is running.

use crate::animation::FrameRenderer;
use crate::canvas::{Canvas, ImageHandle, SurfaceSize};
use crate::config::{AnimationConfig, Mode};
use crate::particle::{Assets, GlyphParticle, Particle, SpriteParticle};
use crate::random::{RandomSource, SeededRandom};
use crate::system::ParticleSystem;
use glam::Vec2;

enum Systems {
    Glyph(ParticleSystem<GlyphParticle>),
    Sprite(ParticleSystem<SpriteParticle>),
}

/// A particle system selected by configuration, plus the assets it draws with.
pub struct Scene {
    systems: Systems,
    assets: Assets,
}

impl Scene {
    /// Build the scene described by `config`.
    ///
    /// Uses `config.seed` when set, otherwise a clock seed.
    pub fn from_config(config: &AnimationConfig) -> Self {
        let rng = match config.seed {
            Some(seed) => SeededRandom::new(seed),
            None => SeededRandom::from_clock(),
        };
        log::info!(
            "scene: {:?} mode, {} particles, respawn {:?}, seed {}",
            config.mode,
            config.particle_count,
            config.respawn_interval(),
            rng.seed()
        );
        Self::with_rng(config, Box::new(rng))
    }

    /// Build the scene with an explicit randomness source.
    pub fn with_rng(config: &AnimationConfig, rng: Box<dyn RandomSource>) -> Self {
        let count = config.particle_count;
        let respawn = config.respawn_interval();
        let systems = match config.mode {
            Mode::Glyph => Systems::Glyph(
                ParticleSystem::new(count, config.glyph, rng).with_respawn_interval(respawn),
            ),
            Mode::Sprite => Systems::Sprite(
                ParticleSystem::new(count, config.sprite, rng).with_respawn_interval(respawn),
            ),
        };
        Self {
            systems,
            assets: Assets::default(),
        }
    }

    pub fn mode(&self) -> Mode {
        match self.systems {
            Systems::Glyph(_) => Mode::Glyph,
            Systems::Sprite(_) => Mode::Sprite,
        }
    }

    /// Hand the scene a loaded sprite, or take it away.
    pub fn set_sprite(&mut self, sprite: Option<ImageHandle>) {
        self.assets.sprite = sprite;
    }

    pub fn assets(&self) -> &Assets {
        &self.assets
    }

    pub fn particle_count(&self) -> usize {
        match &self.systems {
            Systems::Glyph(system) => system.particle_count(),
            Systems::Sprite(system) => system.particle_count(),
        }
    }

    pub fn respawn_count(&self) -> u64 {
        match &self.systems {
            Systems::Glyph(system) => system.respawn_count(),
            Systems::Sprite(system) => system.respawn_count(),
        }
    }

    /// Current particle positions, in draw order.
    pub fn positions(&self) -> Vec<Vec2> {
        match &self.systems {
            Systems::Glyph(system) => system.particles().iter().map(Particle::position).collect(),
            Systems::Sprite(system) => system.particles().iter().map(Particle::position).collect(),
        }
    }

    /// Current particle velocities, in draw order.
    pub fn velocities(&self) -> Vec<Vec2> {
        match &self.systems {
            Systems::Glyph(system) => system.particles().iter().map(Particle::velocity).collect(),
            Systems::Sprite(system) => system.particles().iter().map(Particle::velocity).collect(),
        }
    }

    pub fn glyph_system(&self) -> Option<&ParticleSystem<GlyphParticle>> {
        match &self.systems {
            Systems::Glyph(system) => Some(system),
            Systems::Sprite(_) => None,
        }
    }

    pub fn sprite_system(&self) -> Option<&ParticleSystem<SpriteParticle>> {
        match &self.systems {
            Systems::Sprite(system) => Some(system),
            Systems::Glyph(_) => None,
        }
    }
}

impl FrameRenderer for Scene {
    fn init(&mut self, surface: SurfaceSize) {
        match &mut self.systems {
            Systems::Glyph(system) => system.init(surface),
            Systems::Sprite(system) => system.init(surface),
        }
    }

    fn render_frame(&mut self, canvas: &mut dyn Canvas, surface: SurfaceSize, dt: f32) {
        match &mut self.systems {
            Systems::Glyph(system) => system.render(canvas, surface, dt, &self.assets),
            Systems::Sprite(system) => system.render(canvas, surface, dt, &self.assets),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawCommand};

    const SURFACE: SurfaceSize = SurfaceSize {
        width: 800.0,
        height: 600.0,
    };

    fn config(mode: Mode) -> AnimationConfig {
        AnimationConfig {
            mode,
            particle_count: 4,
            seed: Some(11),
            ..AnimationConfig::default()
        }
    }

    #[test]
    fn test_mode_selects_system() {
        let glyphs = Scene::from_config(&config(Mode::Glyph));
        assert_eq!(glyphs.mode(), Mode::Glyph);
        assert!(glyphs.glyph_system().is_some());
        assert_eq!(glyphs.glyph_system().unwrap().respawn_interval(), Some(2.5));

        let sprites = Scene::from_config(&config(Mode::Sprite));
        assert_eq!(sprites.mode(), Mode::Sprite);
        assert_eq!(sprites.sprite_system().unwrap().respawn_interval(), None);
    }

    #[test]
    fn test_same_seed_same_scene() {
        let mut a = Scene::from_config(&config(Mode::Glyph));
        let mut b = Scene::from_config(&config(Mode::Glyph));
        let mut list = DisplayList::new();
        for _ in 0..30 {
            a.render_frame(&mut list, SURFACE, 0.016);
            b.render_frame(&mut list, SURFACE, 0.016);
        }
        assert_eq!(a.positions(), b.positions());
        assert_eq!(a.velocities(), b.velocities());
    }

    #[test]
    fn test_sprite_scene_uses_assets() {
        let mut scene = Scene::from_config(&config(Mode::Sprite));
        scene.set_sprite(Some(ImageHandle(3)));
        scene.init(SURFACE);

        // First step lands every sprite on its floor, above the midline
        let mut list = DisplayList::new();
        scene.render_frame(&mut list, SURFACE, 0.0);
        let images = list
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::DrawImage { image: ImageHandle(3), .. }))
            .count();
        let boxes = list
            .commands()
            .iter()
            .filter(|c| matches!(c, DrawCommand::FillRect { .. }))
            .count();
        assert_eq!(boxes, 0);
        assert_eq!(images, 4);
    }
}
