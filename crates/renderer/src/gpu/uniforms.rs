use bytemuck::{Pod, Zeroable};

use crate::backend::FrameUniforms;
use crate::types::SurfaceSize;

/// CPU copy of the fragment stage's `RippleParams` block (std140, 32 bytes).
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub(crate) struct RippleUniforms {
    pub time: f32,
    pub opacity: f32,
    pub resolution: [f32; 2],
    pub mouse: [f32; 2],
    pub _padding: [f32; 2],
}

impl RippleUniforms {
    pub fn new(size: SurfaceSize, opacity: f32) -> Self {
        Self {
            time: 0.0,
            opacity: opacity.clamp(0.0, 1.0),
            resolution: size.as_vec2(),
            mouse: [0.0, 0.0],
            _padding: [0.0, 0.0],
        }
    }

    pub fn set_resolution(&mut self, size: SurfaceSize) {
        self.resolution = size.as_vec2();
    }

    pub fn apply(&mut self, frame: &FrameUniforms) {
        self.time = frame.time;
        self.resolution = frame.resolution;
        self.mouse = frame.pointer;
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

pub(crate) const UNIFORM_SIZE: u64 = std::mem::size_of::<RippleUniforms>() as u64;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn layout_matches_std140_block() {
        assert_eq!(UNIFORM_SIZE, 32);
        assert_eq!(std::mem::offset_of!(RippleUniforms, time), 0);
        assert_eq!(std::mem::offset_of!(RippleUniforms, opacity), 4);
        assert_eq!(std::mem::offset_of!(RippleUniforms, resolution), 8);
        assert_eq!(std::mem::offset_of!(RippleUniforms, mouse), 16);
    }

    #[test]
    fn frame_values_are_copied_verbatim() {
        let mut uniforms = RippleUniforms::new(SurfaceSize::new(800, 600), 0.3);
        uniforms.apply(&FrameUniforms {
            time: 12.5,
            resolution: [1024.0, 768.0],
            pointer: [10.0, 758.0],
        });
        assert_eq!(uniforms.time, 12.5);
        assert_eq!(uniforms.resolution, [1024.0, 768.0]);
        assert_eq!(uniforms.mouse, [10.0, 758.0]);
        assert_eq!(uniforms.opacity, 0.3);
    }

    #[test]
    fn opacity_is_clamped_into_range() {
        assert_eq!(RippleUniforms::new(SurfaceSize::new(1, 1), 1.7).opacity, 1.0);
        assert_eq!(RippleUniforms::new(SurfaceSize::new(1, 1), -0.2).opacity, 0.0);
    }

    #[test]
    fn byte_view_has_block_size() {
        let uniforms = RippleUniforms::new(SurfaceSize::new(2, 2), 0.5);
        assert_eq!(uniforms.as_bytes().len() as u64, UNIFORM_SIZE);
    }
}
