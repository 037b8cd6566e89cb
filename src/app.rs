//! Window host: runs a [`Scene`] in a winit window presented through wgpu.
//!
//! The event loop owns an [`AnimationLoop`]. Every `RedrawRequested` event
//! is one frame callback: the scene records into a [`DisplayList`], the
//! [`Presenter`] draws it, and the loop asks the window for the next redraw.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::animation::{AnimationLoop, FrameScheduler};
use crate::canvas::{Canvas, DisplayList};
use crate::config::AnimationConfig;
use crate::error::AppError;
use crate::gpu::{FontGlyphs, GlyphAtlas, Presenter};
use crate::scene::Scene;
use crate::sprite::SpriteImage;
use crate::time::FrameClock;

/// Schedules frames as window redraws.
struct WindowScheduler<'a> {
    window: &'a Window,
}

impl FrameScheduler for WindowScheduler<'_> {
    fn request_frame(&mut self) {
        self.window.request_redraw();
    }
}

struct App {
    config: AnimationConfig,
    sprite: Option<SpriteImage>,
    font: Option<FontGlyphs>,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    scene: Scene,
    animation: AnimationLoop,
    display_list: DisplayList,
    clock: FrameClock,
    error: Option<AppError>,
}

impl App {
    fn new(config: AnimationConfig, sprite: Option<SpriteImage>, font: Option<FontGlyphs>) -> Self {
        let scene = Scene::from_config(&config);
        Self {
            config,
            sprite,
            font,
            window: None,
            presenter: None,
            scene,
            animation: AnimationLoop::new(),
            display_list: DisplayList::new(),
            clock: FrameClock::new(),
            error: None,
        }
    }

    /// Create the window and presenter, then start the loop.
    fn acquire_surface(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.config.window.title.clone())
            .with_inner_size(LogicalSize::new(
                self.config.window.width,
                self.config.window.height,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let atlas = self.font.take().map(GlyphAtlas::new);
        let presenter = pollster::block_on(Presenter::new(window.clone(), self.sprite.as_ref(), atlas))?;

        self.scene.set_sprite(presenter.sprite_handle());
        let surface = presenter.surface_size();
        let mut scheduler = WindowScheduler { window: &window };
        self.animation
            .start(self.clock.now_ms(), &mut self.scene, surface, &mut scheduler);

        self.window = Some(window);
        self.presenter = Some(presenter);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(presenter)) = (&self.window, &mut self.presenter) else {
            return;
        };
        let mut scheduler = WindowScheduler { window };

        self.display_list.reset();
        let inner = window.inner_size();
        let target = if inner.width == 0 || inner.height == 0 {
            // Minimized
            None
        } else {
            Some((&mut self.display_list as &mut dyn Canvas, presenter.surface_size()))
        };

        let now = self.clock.now_ms();
        if self
            .animation
            .frame(now, &mut self.scene, target, &mut scheduler)
            .is_none()
        {
            return;
        }

        match presenter.present(&self.display_list) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost) => {
                log::warn!("surface lost, reconfiguring");
                presenter.resize(PhysicalSize::new(
                    presenter.config.width,
                    presenter.config.height,
                ));
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("out of GPU memory, exiting");
                self.animation.stop(&mut scheduler);
                event_loop.exit();
                return;
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }

        if self.clock.tick() {
            window.set_title(&format!(
                "{} | FPS: {:.1}",
                self.config.window.title,
                self.clock.fps()
            ));
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.acquire_surface(event_loop) {
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                if let Some(window) = &self.window {
                    self.animation.stop(&mut WindowScheduler { window });
                }
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(physical_size);
                }
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// Open a window and run the animation until it is closed.
///
/// Loads `config.sprite_path` and `config.font_path` first when set; either
/// one failing to load is an error rather than a silent fallback. Without a
/// configured font a system font is used, and failing that only the card
/// suits are drawn.
pub fn run(config: AnimationConfig) -> Result<(), AppError> {
    config.validate()?;

    let sprite = match &config.sprite_path {
        Some(path) => Some(SpriteImage::from_file(path)?),
        None => None,
    };

    let font = match &config.font_path {
        Some(path) => Some(FontGlyphs::from_file(path)?),
        None => {
            let found = FontGlyphs::find_system();
            if found.is_none() {
                log::warn!("no system font found; set font_path to draw the FPS readout");
            }
            found
        }
    };

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config, sprite, font);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
