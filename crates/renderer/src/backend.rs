use crate::error::{DrawError, ShaderStageKind};
use crate::types::SurfaceSize;

/// Full-screen quad as two triangles in normalized device coordinates.
pub const QUAD_VERTICES: [f32; 12] = [
    -1.0, -1.0, //
    1.0, -1.0, //
    -1.0, 1.0, //
    -1.0, 1.0, //
    1.0, -1.0, //
    1.0, 1.0,
];

/// Components per vertex in [`QUAD_VERTICES`].
pub const QUAD_COMPONENTS: usize = 2;

/// Number of vertices drawn every frame.
pub const QUAD_VERTEX_COUNT: u32 = (QUAD_VERTICES.len() / QUAD_COMPONENTS) as u32;

/// Values pushed into the shader uniforms each frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameUniforms {
    /// Seconds since mount.
    pub time: f32,
    /// Surface size in pixels.
    pub resolution: [f32; 2],
    /// Pointer position in pixels, bottom-left origin.
    pub pointer: [f32; 2],
}

/// Graphics pipeline the ripple renderer drives.
///
/// The renderer calls the initialisation methods exactly once and in
/// declaration order (`compile_stage` for the vertex then the fragment stage,
/// `link_program`, `upload_geometry`, `bind_uniforms`, then `resize`). A
/// failure at any step stops the sequence. Dropping the backend releases every
/// graphics object it created.
pub trait RippleBackend {
    type Stage;
    type Program;

    /// Size of the drawing surface at the time the context was acquired.
    fn surface_size(&self) -> SurfaceSize;

    /// Compiles one stage; `Err` carries the compiler diagnostic.
    fn compile_stage(
        &mut self,
        stage: ShaderStageKind,
        source: &str,
    ) -> Result<Self::Stage, String>;

    /// Links both stages into a program; `Err` carries the linker diagnostic.
    fn link_program(
        &mut self,
        vertex: Self::Stage,
        fragment: Self::Stage,
    ) -> Result<Self::Program, String>;

    /// Uploads static geometry bound to the program's `position` input.
    fn upload_geometry(&mut self, program: &mut Self::Program, vertices: &[f32]);

    /// Resolves the time, resolution and pointer uniform inputs.
    fn bind_uniforms(&mut self, program: &mut Self::Program);

    /// Resizes the surface and viewport and writes the new resolution uniform
    /// immediately.
    fn resize(&mut self, program: &mut Self::Program, size: SurfaceSize);

    fn set_uniforms(&mut self, program: &mut Self::Program, uniforms: &FrameUniforms);

    fn draw(&mut self, program: &mut Self::Program, vertex_count: u32) -> Result<(), DrawError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quad_covers_clip_space_with_two_triangles() {
        assert_eq!(QUAD_VERTEX_COUNT, 6);
        let corners: Vec<(f32, f32)> = QUAD_VERTICES
            .chunks(QUAD_COMPONENTS)
            .map(|pair| (pair[0], pair[1]))
            .collect();
        for corner in [(-1.0, -1.0), (1.0, -1.0), (-1.0, 1.0), (1.0, 1.0)] {
            assert!(corners.contains(&corner), "missing corner {corner:?}");
        }
    }
}
