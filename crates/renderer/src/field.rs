//! CPU mirror of the ripple fragment shader.
//!
//! The fragment GLSL in `compile.rs` and [`ripple_gray`] must stay in lockstep;
//! the tests here pin the numeric behaviour the shader is expected to have.

/// Brightness of the field before any ripple is added.
pub const BASE_GRAY: f32 = 0.95;

const AMBIENT_FREQUENCY: f32 = 20.0;
const AMBIENT_SPEED: f32 = 2.0;
const AMBIENT_AMPLITUDE: f32 = 0.02;

const POINTER_FREQUENCY: f32 = 30.0;
const POINTER_SPEED: f32 = 5.0;
const POINTER_AMPLITUDE: f32 = 0.05;
const POINTER_FALLOFF: f32 = 3.0;

/// Inputs of a single fragment evaluation, all in surface pixels with a
/// bottom-left origin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RippleInputs {
    pub frag_coord: [f32; 2],
    pub resolution: [f32; 2],
    pub pointer: [f32; 2],
    pub time: f32,
}

/// Ripple centred on the surface, driven by time only.
pub fn ambient_ripple(dist: f32, time: f32) -> f32 {
    (dist * AMBIENT_FREQUENCY - time * AMBIENT_SPEED).sin() * AMBIENT_AMPLITUDE
}

/// Ripple centred on the pointer, decaying with distance.
pub fn pointer_ripple(dist: f32, time: f32) -> f32 {
    (dist * POINTER_FREQUENCY - time * POINTER_SPEED).sin()
        * POINTER_AMPLITUDE
        * (-dist * POINTER_FALLOFF).exp()
}

/// Grayscale value the fragment stage writes for `inputs`.
///
/// The result is not clamped; values outside `0.0..=1.0` are left to the
/// output stage.
pub fn ripple_gray(inputs: &RippleInputs) -> f32 {
    let [width, height] = inputs.resolution;
    let aspect = width / height;

    let uv = [inputs.frag_coord[0] / width * aspect, inputs.frag_coord[1] / height];
    let center = [0.5 * aspect, 0.5];
    let dist = distance(uv, center);

    let mouse = [inputs.pointer[0] / width * aspect, inputs.pointer[1] / height];
    let mouse_dist = distance(uv, mouse);

    let strength = ambient_ripple(dist, inputs.time) + pointer_ripple(mouse_dist, inputs.time);
    BASE_GRAY + strength
}

fn distance(a: [f32; 2], b: [f32; 2]) -> f32 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    (dx * dx + dy * dy).sqrt()
}
