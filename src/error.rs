//! Error types for glowfall.
//!
//! The particle core never fails; these cover the host side: configuration
//! loading, sprite and font decoding, and window/GPU setup.

use thiserror::Error;

/// Errors that can occur during GPU initialization.
#[derive(Debug, Error)]
pub enum GpuError {
    /// Failed to create a surface for rendering.
    #[error("Failed to create GPU surface: {0}")]
    SurfaceCreation(#[from] wgpu::CreateSurfaceError),
    /// No compatible GPU adapter found.
    #[error("No compatible GPU adapter found. Ensure your system has a GPU with WebGPU/Vulkan/Metal/DX12 support.")]
    NoAdapter,
    /// Failed to create GPU device.
    #[error("Failed to create GPU device: {0}")]
    DeviceCreation(#[from] wgpu::RequestDeviceError),
    /// The adapter reports no texture format or alpha mode for the surface.
    #[error("GPU surface is incompatible with the adapter: no supported {0}")]
    IncompatibleSurface(&'static str),
}

/// Errors that can occur while loading a sprite image.
#[derive(Debug, Error)]
pub enum SpriteError {
    /// Failed to decode the image data.
    #[error("Failed to decode sprite image: {0}")]
    ImageLoad(#[from] image::ImageError),
    /// Failed to read the file from disk.
    #[error("Failed to read sprite file: {0}")]
    Io(#[from] std::io::Error),
    /// Raw pixel data does not match the stated dimensions.
    #[error("RGBA data size mismatch: expected {expected} bytes, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Errors that can occur while loading a font for text rendering.
#[derive(Debug, Error)]
pub enum TextError {
    /// Failed to read the font file.
    #[error("Failed to read font file: {0}")]
    Io(#[from] std::io::Error),
    /// The bytes are not a TrueType/OpenType font.
    #[error("Font data is not a valid TrueType/OpenType font")]
    InvalidFont,
}

/// Errors that can occur while loading or saving configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or write the config file.
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not valid JSON for [`AnimationConfig`](crate::AnimationConfig).
    #[error("Failed to parse config: {0}")]
    Json(#[from] serde_json::Error),
    /// The config parsed but holds values the animation cannot use.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors that can occur when running the animation.
#[derive(Debug, Error)]
pub enum AppError {
    /// Failed to create event loop.
    #[error("Failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),
    /// Failed to create window.
    #[error("Failed to create window: {0}")]
    Window(#[from] winit::error::OsError),
    /// GPU initialization failed.
    #[error("GPU error: {0}")]
    Gpu(#[from] GpuError),
    /// The configured sprite could not be loaded.
    #[error("Sprite error: {0}")]
    Sprite(#[from] SpriteError),
    /// The configured font could not be loaded.
    #[error("Font error: {0}")]
    Text(#[from] TextError),
    /// The configuration is unusable.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}
