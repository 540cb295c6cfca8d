//! wgpu implementation of the ripple backend.
//!
//! - `context` owns instance/device/surface wiring and reconfigures the
//!   swapchain when the window resizes.
//! - `pipeline` links the two GLSL stages into a render pipeline with one
//!   uniform bind group and the quad's vertex layout.
//! - `uniforms` mirrors the fragment stage's uniform block.
//! - `state` implements [`crate::backend::RippleBackend`] on top of the rest.

mod context;
mod pipeline;
mod state;
mod uniforms;

pub(crate) use context::GpuOptions;
pub(crate) use state::GpuBackend;
