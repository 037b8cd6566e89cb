//! Fixed-size particle collections with optional periodic respawn.

use crate::canvas::{Canvas, Color, Font, Paint, SurfaceSize};
use crate::particle::{Assets, Particle};
use crate::random::RandomSource;
use glam::Vec2;

/// Where and how the FPS readout is drawn.
const FPS_FONT_PX: f32 = 30.0;
const FPS_ORIGIN: Vec2 = Vec2::new(10.0, 50.0);

/// Text shown by the FPS readout for a frame of `dt` seconds.
///
/// A stalled frame (`dt <= 0`) has no meaningful rate and shows `--`.
pub fn fps_label(dt: f32) -> String {
    if dt > 0.0 && dt.is_finite() {
        format!("FPS: {:.1}", 1.0 / dt)
    } else {
        "FPS: --".to_string()
    }
}

/// Owns `particle_count` particles of one variant and renders them in order.
///
/// Respawning is driven by frame time rather than a separate timer: every
/// [`render`](Self::render) adds `dt` to an accumulator and replaces the
/// whole collection once it reaches the interval. Each particle is replaced
/// by a fully initialised value, never patched field by field.
pub struct ParticleSystem<P: Particle> {
    particles: Vec<P>,
    particle_count: usize,
    tuning: P::Tuning,
    respawn_interval: Option<f32>,
    since_respawn: f32,
    respawn_count: u64,
    rng: Box<dyn RandomSource>,
}

impl<P: Particle> ParticleSystem<P> {
    /// Create an empty system. Call [`init`](Self::init) before rendering,
    /// or let the first [`render`](Self::render) do it.
    pub fn new(particle_count: usize, tuning: P::Tuning, rng: Box<dyn RandomSource>) -> Self {
        Self {
            particles: Vec::with_capacity(particle_count),
            particle_count,
            tuning,
            respawn_interval: None,
            since_respawn: 0.0,
            respawn_count: 0,
            rng,
        }
    }

    /// Replace the whole collection every `interval` seconds.
    ///
    /// `None`, or an interval that is not a positive number, disables respawn.
    pub fn with_respawn_interval(mut self, interval: Option<f32>) -> Self {
        self.respawn_interval = interval.filter(|secs| secs.is_finite() && *secs > 0.0);
        self
    }

    pub fn particles(&self) -> &[P] {
        &self.particles
    }

    pub fn particle_count(&self) -> usize {
        self.particle_count
    }

    pub fn respawn_interval(&self) -> Option<f32> {
        self.respawn_interval
    }

    /// How many respawns have happened since creation.
    pub fn respawn_count(&self) -> u64 {
        self.respawn_count
    }

    pub fn is_initialized(&self) -> bool {
        self.particles.len() == self.particle_count
    }

    fn spawn(&mut self, surface: SurfaceSize) -> P {
        let mut particle = P::new(&self.tuning);
        particle.init(surface, self.rng.as_mut());
        particle
    }

    /// Create and spawn every particle against the current surface.
    pub fn init(&mut self, surface: SurfaceSize) {
        let fresh: Vec<P> = (0..self.particle_count).map(|_| self.spawn(surface)).collect();
        self.particles = fresh;
        self.since_respawn = 0.0;
    }

    /// Discard every particle and spawn a fresh collection.
    pub fn respawn(&mut self, surface: SurfaceSize) {
        self.init(surface);
        self.respawn_count += 1;
        log::debug!(
            "respawned {} particles (respawn #{})",
            self.particle_count,
            self.respawn_count
        );
    }

    /// Feed frame time to the respawn accumulator. Returns `true` if the
    /// collection was replaced.
    ///
    /// A long stall triggers one respawn, not one per missed interval.
    pub fn advance_respawn(&mut self, surface: SurfaceSize, dt: f32) -> bool {
        let Some(interval) = self.respawn_interval else {
            return false;
        };
        if dt.is_finite() && dt > 0.0 {
            self.since_respawn += dt;
        }
        if self.since_respawn < interval {
            return false;
        }
        let carry = self.since_respawn % interval;
        self.respawn(surface);
        self.since_respawn = carry;
        true
    }

    /// Render one frame: respawn if due, clear, draw the FPS readout, then
    /// advance and draw every particle in collection order.
    pub fn render(&mut self, canvas: &mut dyn Canvas, surface: SurfaceSize, dt: f32, assets: &Assets) {
        if !self.is_initialized() {
            self.init(surface);
        }
        self.advance_respawn(surface, dt);

        canvas.clear_rect(0.0, 0.0, surface.width, surface.height);

        canvas.set_font(Font::px(FPS_FONT_PX, "Arial"));
        canvas.set_fill_style(Paint::Solid(Color::WHITE));
        canvas.fill_text(&fps_label(dt), FPS_ORIGIN.x, FPS_ORIGIN.y);

        canvas.save();
        for particle in &mut self.particles {
            particle.render(canvas, surface, dt, assets);
        }
        canvas.restore();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{DisplayList, DrawCommand};
    use crate::particle::{GlyphParticle, GlyphTuning, SpriteParticle, SpriteTuning};
    use crate::random::SeededRandom;

    const SURFACE: SurfaceSize = SurfaceSize {
        width: 800.0,
        height: 600.0,
    };

    fn glyph_system(count: usize, interval: Option<f32>) -> ParticleSystem<GlyphParticle> {
        ParticleSystem::new(count, GlyphTuning::default(), Box::new(SeededRandom::new(5)))
            .with_respawn_interval(interval)
    }

    #[test]
    fn test_fps_label() {
        assert_eq!(fps_label(0.016), "FPS: 62.5");
        assert_eq!(fps_label(0.5), "FPS: 2.0");
        assert_eq!(fps_label(0.0), "FPS: --");
        assert_eq!(fps_label(-1.0), "FPS: --");
    }

    #[test]
    fn test_init_spawns_count_at_center() {
        let mut system = glyph_system(10, None);
        assert!(!system.is_initialized());
        system.init(SURFACE);
        assert_eq!(system.particles().len(), 10);
        for particle in system.particles() {
            assert_eq!(particle.position(), SURFACE.center());
        }
    }

    #[test]
    fn test_respawn_after_interval() {
        let mut system = glyph_system(10, Some(2.5));
        let mut list = DisplayList::new();
        system.init(SURFACE);

        for _ in 0..155 {
            list.reset();
            system.render(&mut list, SURFACE, 0.016, &Assets::default());
        }
        // 155 * 0.016 = 2.48s, not yet due
        assert_eq!(system.respawn_count(), 0);

        let moved = system.particles()[0].position();
        assert_ne!(moved, SURFACE.center());

        assert!(system.advance_respawn(SURFACE, 0.05));
        assert_eq!(system.respawn_count(), 1);
        assert_eq!(system.particles().len(), 10);
        for particle in system.particles() {
            assert_eq!(particle.position(), SURFACE.center());
        }
    }

    #[test]
    fn test_respawn_uses_surface_at_respawn_time() {
        let mut system = glyph_system(4, Some(1.0));
        system.init(SURFACE);

        let resized = SurfaceSize::new(1024.0, 768.0);
        assert!(system.advance_respawn(resized, 1.0));
        for particle in system.particles() {
            assert_eq!(particle.position(), Vec2::new(512.0, 384.0));
        }
    }

    #[test]
    fn test_long_stall_respawns_once() {
        let mut system = glyph_system(3, Some(2.5));
        system.init(SURFACE);
        assert!(system.advance_respawn(SURFACE, 10.0));
        assert_eq!(system.respawn_count(), 1);
        assert!(!system.advance_respawn(SURFACE, 0.0));
    }

    #[test]
    fn test_no_respawn_when_disabled() {
        let mut system = ParticleSystem::<SpriteParticle>::new(
            5,
            SpriteTuning::default(),
            Box::new(SeededRandom::new(1)),
        )
        .with_respawn_interval(None);
        system.init(SURFACE);
        assert!(!system.advance_respawn(SURFACE, 1000.0));
        assert_eq!(system.respawn_count(), 0);
    }

    #[test]
    fn test_invalid_interval_disables_respawn() {
        assert_eq!(glyph_system(1, Some(0.0)).respawn_interval(), None);
        assert_eq!(glyph_system(1, Some(-2.0)).respawn_interval(), None);
        assert_eq!(glyph_system(1, Some(f32::NAN)).respawn_interval(), None);
        assert_eq!(glyph_system(1, Some(2.5)).respawn_interval(), Some(2.5));
    }

    #[test]
    fn test_render_frame_layout() {
        let mut system = glyph_system(2, None);
        let mut list = DisplayList::new();
        system.render(&mut list, SURFACE, 0.016, &Assets::default());

        // clear, FPS text, then three draws per glyph particle
        assert_eq!(list.len(), 2 + 2 * 3);
        assert!(matches!(list.commands()[0], DrawCommand::Clear { .. }));
        match &list.commands()[1] {
            DrawCommand::FillText { text, position, font, .. } => {
                assert_eq!(text, "FPS: 62.5");
                assert_eq!(*position, Vec2::new(10.0, 50.0));
                assert_eq!(font.size_px, 30.0);
            }
            other => panic!("unexpected command {:?}", other),
        }
        assert_eq!(list.save_depth(), 0);
    }

    #[test]
    fn test_zero_count_renders_only_chrome() {
        let mut system = glyph_system(0, Some(2.5));
        let mut list = DisplayList::new();
        system.render(&mut list, SURFACE, 0.016, &Assets::default());
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn test_zero_size_surface_does_not_panic() {
        let mut system = glyph_system(3, Some(2.5));
        let mut list = DisplayList::new();
        for _ in 0..10 {
            system.render(&mut list, SurfaceSize::default(), 0.016, &Assets::default());
        }
        assert_eq!(system.particles().len(), 3);
    }
}
