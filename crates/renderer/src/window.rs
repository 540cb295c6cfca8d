use std::sync::Arc;
use std::time::Instant;

use anyhow::{anyhow, Result};
use winit::dpi::{PhysicalPosition, PhysicalSize};
use winit::event::{Event, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoopBuilder};
use winit::window::{Fullscreen, Window, WindowBuilder, WindowLevel};

use tracing::{info, trace, warn};

use crate::gpu::{GpuBackend, GpuOptions};
use crate::host::{Host, HostEvent};
use crate::ripple::{RendererStatus, RippleRenderer};
use crate::runtime::FramePacer;
use crate::types::{RendererConfig, SurfaceSize, WindowLayer};

/// Everything the event loop closure owns.
///
/// Fields drop in declaration order: the renderer releases its surface before
/// the window it was created from goes away.
struct WindowSession {
    renderer: RippleRenderer<GpuBackend>,
    host: Host,
    pacer: FramePacer,
    reported_status: RendererStatus,
    window: Arc<Window>,
}

impl WindowSession {
    fn handle_window_event(&mut self, event: WindowEvent) -> bool {
        match event {
            WindowEvent::CloseRequested | WindowEvent::Destroyed => return false,
            WindowEvent::Resized(size) => {
                self.host.dispatch(&HostEvent::Resized(surface_size(size)));
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.host.dispatch(&pointer_event(position));
            }
            WindowEvent::RedrawRequested => {
                let now = Instant::now();
                if self.host.frame_pending() && self.pacer.ready_for_frame(now) {
                    self.host.run_frames(now);
                    self.pacer.mark_rendered(now);
                    self.report_status();
                }
            }
            _ => {}
        }
        true
    }

    fn schedule(&self, now: Instant) -> ControlFlow {
        if !self.host.frame_pending() {
            trace!("scheduler: idle (no frame requested)");
            return ControlFlow::Wait;
        }
        if self.pacer.ready_for_frame(now) {
            self.window.request_redraw();
            return ControlFlow::Wait;
        }
        match self.pacer.next_deadline() {
            Some(deadline) => ControlFlow::WaitUntil(deadline),
            None => ControlFlow::Wait,
        }
    }

    fn report_status(&mut self) {
        let status = self.renderer.status();
        if status != self.reported_status {
            if status == RendererStatus::Disposed {
                warn!("ripple renderer stopped; window stays open without a background");
            }
            self.reported_status = status;
        }
    }
}

fn surface_size(size: PhysicalSize<u32>) -> SurfaceSize {
    SurfaceSize::new(size.width, size.height)
}

fn pointer_event(position: PhysicalPosition<f64>) -> HostEvent {
    HostEvent::PointerMoved {
        x: position.x,
        y: position.y,
    }
}

fn build_window<T>(
    config: &RendererConfig,
    event_loop: &winit::event_loop::EventLoop<T>,
) -> Result<Window> {
    let (width, height) = config.surface_size;
    let mut builder = WindowBuilder::new()
        .with_title(config.title.clone())
        .with_inner_size(PhysicalSize::new(width, height))
        .with_decorations(config.decorations)
        .with_transparent(config.wants_transparency())
        .with_window_level(match config.layer {
            WindowLayer::Background => WindowLevel::AlwaysOnBottom,
            WindowLayer::Normal => WindowLevel::Normal,
        });
    if config.fullscreen {
        builder = builder.with_fullscreen(Some(Fullscreen::Borderless(None)));
    }
    let window = builder
        .build(event_loop)
        .map_err(|err| anyhow!("failed to create background window: {err}"))?;

    if config.click_through {
        if let Err(err) = window.set_cursor_hittest(false) {
            warn!(error = %err, "click-through is not supported on this platform");
        } else {
            info!("click-through enabled; pointer ripples only follow events the platform still delivers");
        }
    }
    Ok(window)
}

/// Opens the background window and drives the ripple renderer until the
/// window closes.
pub(crate) fn run_window(config: &RendererConfig) -> Result<()> {
    let event_loop = EventLoopBuilder::new()
        .build()
        .map_err(|err| anyhow!("failed to create event loop: {err}"))?;
    let window = Arc::new(build_window(config, &event_loop)?);

    let options = GpuOptions {
        initial_size: surface_size(window.inner_size()),
        color_space: config.color_space,
        transparent: config.wants_transparency(),
        vsync: config.vsync,
    };
    let opacity = config.opacity;
    let host = Host::new();
    let renderer = RippleRenderer::mount(&host, &config.policy, Instant::now(), || {
        GpuBackend::acquire(window.as_ref(), options, opacity)
    });
    let reported_status = renderer.status();

    let mut session = Some(WindowSession {
        renderer,
        host,
        pacer: FramePacer::new(config.policy.target_fps()),
        reported_status,
        window: Arc::clone(&window),
    });
    window.request_redraw();

    let run_result = event_loop.run(move |event, elwt| match event {
        Event::WindowEvent { window_id, event } if window_id == window.id() => {
            let keep_running = session
                .as_mut()
                .is_some_and(|session| session.handle_window_event(event));
            if !keep_running {
                if let Some(mut session) = session.take() {
                    session.renderer.dispose();
                }
                elwt.exit();
            }
        }
        Event::AboutToWait => {
            if let Some(session) = session.as_ref() {
                elwt.set_control_flow(session.schedule(Instant::now()));
            }
        }
        Event::LoopExiting => {
            if let Some(mut session) = session.take() {
                session.renderer.dispose();
            }
        }
        _ => {}
    });

    run_result.map_err(|err| anyhow!("window event loop error: {err}"))
}
