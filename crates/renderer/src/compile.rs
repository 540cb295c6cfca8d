use std::borrow::Cow;

use wgpu::naga::ShaderStage;

use crate::error::ShaderStageKind;

/// Compiles one GLSL stage, returning the compiler diagnostic on failure.
///
/// Compilation errors surface through a validation error scope rather than
/// the device's uncaptured error handler, so a broken shader never panics.
pub(crate) fn compile_stage(
    device: &wgpu::Device,
    stage: ShaderStageKind,
    source: &str,
) -> Result<wgpu::ShaderModule, String> {
    device.push_error_scope(wgpu::ErrorFilter::Validation);
    let module = device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(stage_label(stage)),
        source: wgpu::ShaderSource::Glsl {
            shader: Cow::Owned(source.to_owned()),
            stage: naga_stage(stage),
            defines: &[],
        },
    });
    match pollster::block_on(device.pop_error_scope()) {
        Some(err) => Err(err.to_string()),
        None => Ok(module),
    }
}

pub(crate) fn naga_stage(stage: ShaderStageKind) -> ShaderStage {
    match stage {
        ShaderStageKind::Vertex => ShaderStage::Vertex,
        ShaderStageKind::Fragment => ShaderStage::Fragment,
    }
}

fn stage_label(stage: ShaderStageKind) -> &'static str {
    match stage {
        ShaderStageKind::Vertex => "ripple vertex",
        ShaderStageKind::Fragment => "ripple fragment",
    }
}

/// Passes the quad's clip-space positions straight through.
pub const VERTEX_SHADER_GLSL: &str = r"#version 450
layout(location = 0) in vec2 position;

void main() {
    gl_Position = vec4(position, 0.0, 1.0);
}
";

/// Ripple field. The arithmetic in `ripple_gray` mirrors `field::ripple_gray`.
///
/// The uniform block layout must match `RippleUniforms` in `gpu/uniforms.rs`.
/// `gl_FragCoord` has a top-left origin under wgpu, so `main` flips it before
/// evaluating the field. The gray value is clamped only where it is written,
/// then premultiplied by the output opacity.
pub const FRAGMENT_SHADER_GLSL: &str = r"#version 450
layout(location = 0) out vec4 outColor;

layout(std140, set = 0, binding = 0) uniform RippleParams {
    float time;
    float opacity;
    vec2 resolution;
    vec2 mouse;
    vec2 _padding;
} params;

float ripple_gray(vec2 fragCoord) {
    float aspect = params.resolution.x / params.resolution.y;

    vec2 uv = fragCoord / params.resolution;
    uv.x *= aspect;
    vec2 center = vec2(0.5 * aspect, 0.5);
    float dist = distance(uv, center);

    vec2 mouse = params.mouse / params.resolution;
    mouse.x *= aspect;
    float mouseDist = distance(uv, mouse);

    float ripple = sin(dist * 20.0 - params.time * 2.0) * 0.02;
    float mouseRipple = sin(mouseDist * 30.0 - params.time * 5.0) * 0.05 * exp(-mouseDist * 3.0);

    return 0.95 + ripple + mouseRipple;
}

void main() {
    vec2 fragCoord = vec2(gl_FragCoord.x, params.resolution.y - gl_FragCoord.y);
    // Canvas output clamp, applied before the opacity composite.
    float gray = clamp(ripple_gray(fragCoord), 0.0, 1.0);
    outColor = vec4(vec3(gray) * params.opacity, params.opacity);
}
";
