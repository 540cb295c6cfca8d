use anyhow::{anyhow, bail, Context as AnyhowContext, Result};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};

use crate::types::{ColorSpaceMode, SurfaceSize};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SurfaceColorSpace {
    Gamma,
    Linear,
}

impl SurfaceColorSpace {
    pub(crate) fn from_mode(mode: ColorSpaceMode) -> Self {
        match mode {
            ColorSpaceMode::Auto | ColorSpaceMode::Gamma => SurfaceColorSpace::Gamma,
            ColorSpaceMode::Linear => SurfaceColorSpace::Linear,
        }
    }
}

/// Surface options fixed at start-up.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GpuOptions {
    pub initial_size: SurfaceSize,
    pub color_space: ColorSpaceMode,
    /// Present premultiplied alpha so the desktop shows through.
    pub transparent: bool,
    pub vsync: bool,
}

pub(crate) struct GpuContext {
    pub _instance: wgpu::Instance,
    pub surface: wgpu::Surface<'static>,
    pub device: wgpu::Device,
    pub queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    pub size: SurfaceSize,
    pub surface_format: wgpu::TextureFormat,
    pub color_space: SurfaceColorSpace,
}

impl GpuContext {
    /// Creates the surface, adapter and device for `target`.
    ///
    /// # Safety contract
    ///
    /// The surface is created from raw handles; `target` must outlive the
    /// returned context. The window loop drops the renderer before the window.
    pub(crate) fn new<T>(target: &T, options: GpuOptions) -> Result<Self>
    where
        T: HasDisplayHandle + HasWindowHandle,
    {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            flags: wgpu::InstanceFlags::default(),
            memory_budget_thresholds: wgpu::MemoryBudgetThresholds::default(),
            backend_options: wgpu::BackendOptions::default(),
        });

        let window_handle = target
            .window_handle()
            .map_err(|err| anyhow!("failed to acquire window handle: {err}"))?;
        let display_handle = target
            .display_handle()
            .map_err(|err| anyhow!("failed to acquire display handle: {err}"))?;

        let surface = unsafe {
            instance.create_surface_unsafe(wgpu::SurfaceTargetUnsafe::RawHandle {
                raw_display_handle: display_handle.as_raw(),
                raw_window_handle: window_handle.as_raw(),
            })
        }
        .context("failed to create rendering surface")?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::LowPower,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("failed to find a suitable GPU adapter")?;

        let adapter_info = adapter.get_info();
        tracing::debug!(
            name = %adapter_info.name,
            backend = ?adapter_info.backend,
            device_type = ?adapter_info.device_type,
            "selected GPU adapter"
        );

        let limits = adapter.limits();
        let max_dimension = limits.max_texture_dimension_2d;
        let requested_width = options.initial_size.width.max(1);
        let requested_height = options.initial_size.height.max(1);
        if requested_width > max_dimension || requested_height > max_dimension {
            bail!(
                "GPU max texture dimension is {max_dimension}, requested surface is {requested_width}x{requested_height}"
            );
        }

        let surface_caps = surface.get_capabilities(&adapter);
        let Some(&first_format) = surface_caps.formats.first() else {
            bail!("surface is not compatible with adapter {}", adapter_info.name);
        };

        let color_space = SurfaceColorSpace::from_mode(options.color_space);
        let surface_format = match color_space {
            SurfaceColorSpace::Linear => surface_caps
                .formats
                .iter()
                .copied()
                .find(|format| format.is_srgb())
                .unwrap_or_else(|| {
                    tracing::warn!(
                        fallback = ?first_format,
                        "no sRGB surface format available; falling back"
                    );
                    first_format
                }),
            SurfaceColorSpace::Gamma => surface_caps
                .formats
                .iter()
                .copied()
                .find(|format| !format.is_srgb())
                .unwrap_or_else(|| {
                    tracing::warn!(
                        fallback = ?first_format,
                        "no non-sRGB surface format available; falling back"
                    );
                    first_format
                }),
        };

        let (device, queue) = pollster::block_on(adapter.request_device(&wgpu::DeviceDescriptor {
            label: Some("ripplewall device"),
            required_features: wgpu::Features::empty(),
            required_limits: limits,
            memory_hints: wgpu::MemoryHints::MemoryUsage,
            trace: wgpu::Trace::default(),
        }))
        .context("failed to create GPU device")?;

        let present_mode = select_present_mode(&surface_caps.present_modes, options.vsync);
        let alpha_mode = select_alpha_mode(&surface_caps.alpha_modes, options.transparent);
        tracing::debug!(?present_mode, ?alpha_mode, ?surface_format, "configuring surface");

        let size = SurfaceSize::new(requested_width, requested_height);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width,
            height: size.height,
            present_mode,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        Ok(Self {
            _instance: instance,
            surface,
            device,
            queue,
            config,
            size,
            surface_format,
            color_space,
        })
    }

    /// Reconfigures the swapchain; empty sizes are ignored.
    pub(crate) fn resize(&mut self, new_size: SurfaceSize) {
        if new_size.is_empty() {
            return;
        }

        self.size = new_size;
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
    }

    pub(crate) fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }
}

/// Fifo when vsync is requested, otherwise Immediate, then Mailbox, then
/// whatever the surface offers first.
pub(crate) fn select_present_mode(modes: &[wgpu::PresentMode], vsync: bool) -> wgpu::PresentMode {
    let fallback = modes.first().copied().unwrap_or(wgpu::PresentMode::Fifo);
    let preferred: &[wgpu::PresentMode] = if vsync {
        &[wgpu::PresentMode::Fifo]
    } else {
        &[wgpu::PresentMode::Immediate, wgpu::PresentMode::Mailbox]
    };
    preferred
        .iter()
        .copied()
        .find(|mode| modes.contains(mode))
        .unwrap_or(fallback)
}

/// The fragment stage writes premultiplied color, so transparent surfaces
/// want `PreMultiplied`; `Inherit` lets the platform decide when that is not
/// offered.
pub(crate) fn select_alpha_mode(
    modes: &[wgpu::CompositeAlphaMode],
    transparent: bool,
) -> wgpu::CompositeAlphaMode {
    let fallback = modes
        .first()
        .copied()
        .unwrap_or(wgpu::CompositeAlphaMode::Auto);
    if !transparent {
        return if modes.contains(&wgpu::CompositeAlphaMode::Opaque) {
            wgpu::CompositeAlphaMode::Opaque
        } else {
            fallback
        };
    }
    [
        wgpu::CompositeAlphaMode::PreMultiplied,
        wgpu::CompositeAlphaMode::Inherit,
    ]
    .into_iter()
    .find(|mode| modes.contains(mode))
    .unwrap_or_else(|| {
        tracing::warn!(
            ?modes,
            "surface cannot present premultiplied alpha; background will not be translucent"
        );
        fallback
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wgpu::{CompositeAlphaMode, PresentMode};

    #[test]
    fn vsync_prefers_fifo() {
        let modes = [PresentMode::Immediate, PresentMode::Fifo];
        assert_eq!(select_present_mode(&modes, true), PresentMode::Fifo);
    }

    #[test]
    fn vsync_off_prefers_immediate_then_mailbox() {
        assert_eq!(
            select_present_mode(&[PresentMode::Fifo, PresentMode::Immediate], false),
            PresentMode::Immediate
        );
        assert_eq!(
            select_present_mode(&[PresentMode::Fifo, PresentMode::Mailbox], false),
            PresentMode::Mailbox
        );
        assert_eq!(
            select_present_mode(&[PresentMode::Fifo], false),
            PresentMode::Fifo
        );
    }

    #[test]
    fn transparent_surfaces_prefer_premultiplied() {
        let modes = [CompositeAlphaMode::Opaque, CompositeAlphaMode::PreMultiplied];
        assert_eq!(
            select_alpha_mode(&modes, true),
            CompositeAlphaMode::PreMultiplied
        );
        assert_eq!(select_alpha_mode(&modes, false), CompositeAlphaMode::Opaque);
    }

    #[test]
    fn missing_premultiplied_falls_back_to_first_mode() {
        let modes = [CompositeAlphaMode::Opaque];
        assert_eq!(select_alpha_mode(&modes, true), CompositeAlphaMode::Opaque);
    }

    #[test]
    fn auto_color_space_writes_values_unencoded() {
        assert_eq!(
            SurfaceColorSpace::from_mode(ColorSpaceMode::Auto),
            SurfaceColorSpace::Gamma
        );
        assert_eq!(
            SurfaceColorSpace::from_mode(ColorSpaceMode::Linear),
            SurfaceColorSpace::Linear
        );
    }
}
