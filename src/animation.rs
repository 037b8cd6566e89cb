//! Frame-driven animation loop.
//!
//! [`AnimationLoop`] is a small state machine that turns host frame callbacks
//! into `dt` values for a [`FrameRenderer`]:
//!
//! ```text
//! Idle --start--> Running --stop--> Stopped
//! ```
//!
//! While running, each frame computes `dt = (now - last_frame) / 1000`
//! seconds, renders, and asks the [`FrameScheduler`] for the next refresh.
//! Stopping cancels the outstanding request, and any callback that still
//! arrives afterwards is ignored.

use crate::canvas::{Canvas, SurfaceSize};

/// Something the loop can drive once per frame.
pub trait FrameRenderer {
    /// Called once when the loop starts, with the first surface size.
    fn init(&mut self, surface: SurfaceSize);

    /// Draw one frame that is `dt` seconds after the previous one.
    fn render_frame(&mut self, canvas: &mut dyn Canvas, surface: SurfaceSize, dt: f32);
}

/// Host hook for display-refresh callbacks.
pub trait FrameScheduler {
    /// Ask for [`AnimationLoop::frame`] to be called at the next refresh.
    fn request_frame(&mut self);

    /// Drop an outstanding request. Hosts that cannot cancel may ignore it.
    fn cancel_frame(&mut self) {}
}

/// Lifecycle of an [`AnimationLoop`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoopState {
    #[default]
    Idle,
    Running,
    Stopped,
}

/// Drives a [`FrameRenderer`] from host frame callbacks.
#[derive(Debug, Default)]
pub struct AnimationLoop {
    state: LoopState,
    last_frame_ms: f64,
    pending: bool,
    frames: u64,
}

impl AnimationLoop {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == LoopState::Running
    }

    /// Whether a frame has been requested and not yet delivered.
    pub fn has_pending_frame(&self) -> bool {
        self.pending
    }

    /// Frames rendered since start.
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Start on first surface acquisition: initialise the renderer, stamp the
    /// clock, and request the first frame.
    ///
    /// Returns `false` (and does nothing) unless the loop is idle.
    pub fn start<R: FrameRenderer + ?Sized>(
        &mut self,
        now_ms: f64,
        renderer: &mut R,
        surface: SurfaceSize,
        scheduler: &mut dyn FrameScheduler,
    ) -> bool {
        if self.state != LoopState::Idle {
            return false;
        }
        renderer.init(surface);
        self.state = LoopState::Running;
        self.last_frame_ms = now_ms;
        self.request(scheduler);
        log::debug!("animation loop started at {:.1}ms", now_ms);
        true
    }

    /// Handle a frame callback.
    ///
    /// `target` is the drawing context and its current size, or `None` if
    /// the host has no surface this frame; the frame is then skipped without
    /// touching the clock, so the next frame's `dt` covers the gap.
    ///
    /// Returns the `dt` that was rendered, or `None` if nothing was drawn.
    pub fn frame<R: FrameRenderer + ?Sized>(
        &mut self,
        now_ms: f64,
        renderer: &mut R,
        target: Option<(&mut dyn Canvas, SurfaceSize)>,
        scheduler: &mut dyn FrameScheduler,
    ) -> Option<f32> {
        if self.state != LoopState::Running || !self.pending {
            return None;
        }
        self.pending = false;

        let rendered = match target {
            Some((canvas, surface)) => {
                let dt = ((now_ms - self.last_frame_ms) / 1000.0) as f32;
                renderer.render_frame(canvas, surface, dt);
                self.last_frame_ms = now_ms;
                self.frames += 1;
                Some(dt)
            }
            None => {
                log::warn!("no drawing surface, skipping frame");
                None
            }
        };

        self.request(scheduler);
        rendered
    }

    /// Tear down: cancel the pending frame and refuse further callbacks.
    pub fn stop(&mut self, scheduler: &mut dyn FrameScheduler) {
        if self.pending {
            scheduler.cancel_frame();
            self.pending = false;
        }
        if self.state != LoopState::Stopped {
            log::debug!("animation loop stopped after {} frames", self.frames);
        }
        self.state = LoopState::Stopped;
    }

    fn request(&mut self, scheduler: &mut dyn FrameScheduler) {
        self.pending = true;
        scheduler.request_frame();
    }
}
