//! Renderer crate for ripplewall.
//!
//! Draws an animated grayscale ripple field across a full-viewport background
//! window. The field is computed per pixel on the GPU from three inputs: the
//! seconds since mount, the surface resolution and the last pointer position.
//!
//! ```text
//!   ripplewall CLI
//!          │ RendererConfig
//!          ▼
//!   Renderer::run ──▶ winit event loop ──▶ Host (events, animation frames)
//!                                              │
//!                                              ▼
//!                              RippleRenderer ──▶ RippleBackend (wgpu)
//! ```
//!
//! [`RippleRenderer`] holds the lifecycle: fail-fast initialisation, resize and
//! pointer tracking, a self-rescheduling frame loop and an idempotent teardown.
//! It is generic over [`RippleBackend`] so the same lifecycle drives the wgpu
//! backend in the window and recording backends in tests.

mod backend;
mod compile;
mod error;
pub mod field;
mod gpu;
mod host;
mod ripple;
mod runtime;
mod types;
mod window;

#[cfg(test)]
mod testing;

use anyhow::Result;

pub use backend::{FrameUniforms, RippleBackend, QUAD_COMPONENTS, QUAD_VERTEX_COUNT, QUAD_VERTICES};
pub use error::{DrawError, RippleError, ShaderStageKind};
pub use host::{EventKind, FrameHandle, Host, HostEvent, Subscription};
pub use ripple::{FrameState, RendererStatus, RippleRenderer};
pub use runtime::{
    time_source_for_policy, BoxedTimeSource, FixedTimeSource, FramePacer, RenderPolicy,
    SystemTimeSource, TimeSample, TimeSource,
};
pub use types::{ColorSpaceMode, RendererConfig, SurfaceSize, WindowLayer, DEFAULT_OPACITY};

/// GLSL sources of the two ripple stages, for backends other than the
/// built-in wgpu one.
pub mod shaders {
    pub use crate::compile::{FRAGMENT_SHADER_GLSL as FRAGMENT, VERTEX_SHADER_GLSL as VERTEX};
}

/// Entry point that owns the chosen configuration.
pub struct Renderer {
    config: RendererConfig,
}

impl Renderer {
    pub fn new(config: RendererConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Opens the background window and renders until it is closed.
    ///
    /// Returns an error only when the window or event loop cannot be created.
    /// A missing GPU context or a shader failure is logged and leaves the
    /// window blank.
    pub fn run(&mut self) -> Result<()> {
        window::run_window(&self.config)
    }
}
