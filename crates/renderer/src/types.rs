use crate::runtime::RenderPolicy;

/// Opacity the background is composited at unless configured otherwise.
pub const DEFAULT_OPACITY: f32 = 0.3;

/// Surface dimensions in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero (e.g. a minimised window).
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_vec2(&self) -> [f32; 2] {
        [self.width as f32, self.height as f32]
    }
}

/// Output color handling for the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorSpaceMode {
    /// Match the browser canvas: values are written as-is (non-sRGB swapchain).
    #[default]
    Auto,
    /// Treat shader outputs as gamma-encoded; use non-sRGB surfaces.
    Gamma,
    /// Treat shader outputs as linear and let an sRGB swapchain encode them.
    Linear,
}

/// Stacking order of the host window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowLayer {
    /// Below every other toplevel, like a page background.
    #[default]
    Background,
    Normal,
}

/// Immutable configuration passed to the renderer at start-up.
///
/// The ripple itself takes no parameters; everything here describes the
/// window that stands in for the page's full-viewport canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct RendererConfig {
    /// Window title.
    pub title: String,
    /// Initial window size in physical pixels.
    pub surface_size: (u32, u32),
    /// Cover the current monitor instead of using `surface_size`.
    pub fullscreen: bool,
    /// Show window decorations.
    pub decorations: bool,
    /// Stacking order of the window.
    pub layer: WindowLayer,
    /// Let clicks fall through to whatever lies beneath the window.
    pub click_through: bool,
    /// Compositing opacity applied at output; the ripple values are untouched.
    pub opacity: f32,
    /// Desired color handling for the swapchain.
    pub color_space: ColorSpaceMode,
    /// Present in sync with the display refresh.
    pub vsync: bool,
    /// Animation behaviour.
    pub policy: RenderPolicy,
}

impl RendererConfig {
    /// Frames are presented on a transparent surface whenever they are not
    /// fully opaque.
    pub fn wants_transparency(&self) -> bool {
        self.opacity < 1.0
    }
}

impl Default for RendererConfig {
    /// Provides a 1080p background window at the page's default opacity.
    fn default() -> Self {
        Self {
            title: "ripplewall".to_string(),
            surface_size: (1920, 1080),
            fullscreen: false,
            decorations: false,
            layer: WindowLayer::default(),
            click_through: false,
            opacity: DEFAULT_OPACITY,
            color_space: ColorSpaceMode::default(),
            vsync: true,
            policy: RenderPolicy::default(),
        }
    }
}
