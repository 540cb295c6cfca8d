//! The ripple background renderer.
//!
//! [`RippleRenderer::mount`] runs the fail-fast initialisation sequence
//! against a [`RippleBackend`], subscribes to resize and pointer events on the
//! [`Host`] and starts a self-rescheduling animation loop. The renderer keeps
//! the handle of its pending frame so [`RippleRenderer::dispose`] can cancel it
//! before removing its listeners and releasing the backend.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::Instant;

use tracing::{debug, error, info, warn};

use crate::backend::{FrameUniforms, RippleBackend, QUAD_VERTEX_COUNT, QUAD_VERTICES};
use crate::compile::{FRAGMENT_SHADER_GLSL, VERTEX_SHADER_GLSL};
use crate::error::{DrawError, RippleError, ShaderStageKind};
use crate::host::{EventKind, FrameHandle, Host, HostEvent, Subscription};
use crate::runtime::{time_source_for_policy, BoxedTimeSource, RenderPolicy};
use crate::types::SurfaceSize;

/// The three values the shader reads every frame.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameState {
    /// Seconds since mount.
    pub elapsed: f64,
    /// Last pointer position, bottom-left origin.
    pub pointer: [f32; 2],
    pub surface: SurfaceSize,
}

impl FrameState {
    pub fn uniforms(&self) -> FrameUniforms {
        FrameUniforms {
            time: self.elapsed as f32,
            resolution: self.surface.as_vec2(),
            pointer: self.pointer,
        }
    }

    /// Records a pointer position given relative to the surface's top-left
    /// corner, flipping the vertical axis.
    pub fn track_pointer(&mut self, x: f64, y: f64) {
        self.pointer = [x as f32, self.surface.height as f32 - y as f32];
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererStatus {
    Running,
    Failed(RippleError),
    Disposed,
}

enum FrameOutcome {
    Continue,
    Halt,
    Inactive,
}

struct Active<B: RippleBackend> {
    backend: B,
    program: B::Program,
    state: FrameState,
    time_source: BoxedTimeSource,
    pending_frame: Option<FrameHandle>,
    subscriptions: Vec<Subscription>,
    frames_drawn: u64,
}

impl<B: RippleBackend> Active<B> {
    fn resize(&mut self, size: SurfaceSize) {
        if size.is_empty() {
            debug!(width = size.width, height = size.height, "ignoring empty resize");
            return;
        }
        self.state.surface = size;
        self.backend.resize(&mut self.program, size);
        debug!(width = size.width, height = size.height, "ripple surface resized");
    }

    fn frame(&mut self, now: Instant) -> FrameOutcome {
        self.pending_frame = None;
        let sample = self.time_source.sample(now);
        self.state.elapsed = sample.seconds;

        if self.state.surface.is_empty() {
            return FrameOutcome::Continue;
        }

        let uniforms = self.state.uniforms();
        self.backend.set_uniforms(&mut self.program, &uniforms);
        match self.backend.draw(&mut self.program, QUAD_VERTEX_COUNT) {
            Ok(()) => {
                self.frames_drawn = self.frames_drawn.saturating_add(1);
                FrameOutcome::Continue
            }
            Err(DrawError::SurfaceLost) => {
                warn!("ripple surface lost; reconfiguring");
                let size = self.state.surface;
                self.backend.resize(&mut self.program, size);
                FrameOutcome::Continue
            }
            Err(DrawError::Transient(reason)) => {
                debug!(%reason, "ripple frame skipped");
                FrameOutcome::Continue
            }
            Err(err @ DrawError::Fatal(_)) => {
                error!(error = %err, "ripple renderer stopped");
                FrameOutcome::Halt
            }
        }
    }
}

enum Phase<B: RippleBackend> {
    Active(Active<B>),
    Failed(RippleError),
    Disposed,
}

struct Core<B: RippleBackend> {
    host: Host,
    phase: Phase<B>,
}

impl<B: RippleBackend> Core<B> {
    fn active_mut(&mut self) -> Option<&mut Active<B>> {
        match &mut self.phase {
            Phase::Active(active) => Some(active),
            _ => None,
        }
    }

    fn resize(&mut self, size: SurfaceSize) {
        if let Some(active) = self.active_mut() {
            active.resize(size);
        }
    }

    fn pointer_moved(&mut self, x: f64, y: f64) {
        if let Some(active) = self.active_mut() {
            active.state.track_pointer(x, y);
        }
    }

    fn frame(&mut self, now: Instant) -> FrameOutcome {
        match self.active_mut() {
            Some(active) => active.frame(now),
            None => FrameOutcome::Inactive,
        }
    }

    fn set_pending(&mut self, handle: FrameHandle) {
        if let Some(active) = self.active_mut() {
            active.pending_frame = Some(handle);
        } else {
            self.host.cancel_frame(handle);
        }
    }

    /// Cancels the pending frame, removes the listeners, then releases the
    /// backend.
    fn teardown(&mut self) {
        let phase = std::mem::replace(&mut self.phase, Phase::Disposed);
        if let Phase::Active(mut active) = phase {
            if let Some(handle) = active.pending_frame.take() {
                self.host.cancel_frame(handle);
            }
            for subscription in &mut active.subscriptions {
                subscription.dispose();
            }
            info!(frames = active.frames_drawn, "ripple renderer disposed");
            drop(active);
        }
    }
}

fn schedule_frame<B: RippleBackend + 'static>(core: &Rc<RefCell<Core<B>>>) {
    let weak: Weak<RefCell<Core<B>>> = Rc::downgrade(core);
    let host = core.borrow().host.clone();
    let handle = host.request_frame(move |now| {
        if let Some(core) = weak.upgrade() {
            run_frame(&core, now);
        }
    });
    core.borrow_mut().set_pending(handle);
}

fn run_frame<B: RippleBackend + 'static>(core: &Rc<RefCell<Core<B>>>, now: Instant) {
    let outcome = core.borrow_mut().frame(now);
    match outcome {
        FrameOutcome::Continue => schedule_frame(core),
        FrameOutcome::Halt => core.borrow_mut().teardown(),
        FrameOutcome::Inactive => {}
    }
}

fn initialise<B, F>(acquire: F) -> Result<(B, B::Program), RippleError>
where
    B: RippleBackend,
    F: FnOnce() -> Result<B, RippleError>,
{
    let mut backend = acquire()?;
    let vertex = backend
        .compile_stage(ShaderStageKind::Vertex, VERTEX_SHADER_GLSL)
        .map_err(|diagnostic| RippleError::ShaderCompile {
            stage: ShaderStageKind::Vertex,
            diagnostic,
        })?;
    let fragment = backend
        .compile_stage(ShaderStageKind::Fragment, FRAGMENT_SHADER_GLSL)
        .map_err(|diagnostic| RippleError::ShaderCompile {
            stage: ShaderStageKind::Fragment,
            diagnostic,
        })?;
    let mut program = backend
        .link_program(vertex, fragment)
        .map_err(|diagnostic| RippleError::ProgramLink { diagnostic })?;
    backend.upload_geometry(&mut program, &QUAD_VERTICES);
    backend.bind_uniforms(&mut program);
    Ok((backend, program))
}

/// Mounted ripple background.
pub struct RippleRenderer<B: RippleBackend + 'static> {
    core: Rc<RefCell<Core<B>>>,
}

impl<B: RippleBackend + 'static> RippleRenderer<B> {
    /// Initialises the renderer on `host`.
    ///
    /// Initialisation failures are logged and leave the renderer in
    /// [`RendererStatus::Failed`]: nothing is drawn, scheduled or subscribed.
    pub fn mount<F>(host: &Host, policy: &RenderPolicy, now: Instant, acquire: F) -> Self
    where
        F: FnOnce() -> Result<B, RippleError>,
    {
        let phase = match initialise(acquire) {
            Ok((backend, program)) => Phase::Active(Active {
                backend,
                program,
                state: FrameState::default(),
                time_source: time_source_for_policy(policy, now),
                pending_frame: None,
                subscriptions: Vec::with_capacity(2),
                frames_drawn: 0,
            }),
            Err(err) => {
                error!(error = %err, "ripple renderer failed to initialise; background stays blank");
                Phase::Failed(err)
            }
        };

        let core = Rc::new(RefCell::new(Core {
            host: host.clone(),
            phase,
        }));

        let subscriptions = subscribe(host, &core);
        let mut started = false;
        {
            let mut guard = core.borrow_mut();
            if let Some(active) = guard.active_mut() {
                active.subscriptions = subscriptions;
                let initial = active.backend.surface_size();
                active.resize(initial);
                info!(
                    width = initial.width,
                    height = initial.height,
                    ?policy,
                    "ripple renderer mounted"
                );
                started = true;
            }
        }
        if started {
            schedule_frame(&core);
        }

        Self { core }
    }

    pub fn status(&self) -> RendererStatus {
        match &self.core.borrow().phase {
            Phase::Active(_) => RendererStatus::Running,
            Phase::Failed(err) => RendererStatus::Failed(err.clone()),
            Phase::Disposed => RendererStatus::Disposed,
        }
    }

    pub fn is_running(&self) -> bool {
        matches!(self.core.borrow().phase, Phase::Active(_))
    }

    /// Current frame state, while running.
    pub fn frame_state(&self) -> Option<FrameState> {
        match &self.core.borrow().phase {
            Phase::Active(active) => Some(active.state),
            _ => None,
        }
    }

    pub fn frames_drawn(&self) -> u64 {
        match &self.core.borrow().phase {
            Phase::Active(active) => active.frames_drawn,
            _ => 0,
        }
    }

    pub fn pending_frame(&self) -> Option<FrameHandle> {
        match &self.core.borrow().phase {
            Phase::Active(active) => active.pending_frame,
            _ => None,
        }
    }

    /// Stops the animation loop, removes the listeners and releases the
    /// graphics resources. Safe to call more than once.
    pub fn dispose(&mut self) {
        self.core.borrow_mut().teardown();
    }
}

impl<B: RippleBackend + 'static> Drop for RippleRenderer<B> {
    fn drop(&mut self) {
        if let Ok(mut core) = self.core.try_borrow_mut() {
            core.teardown();
        }
    }
}

fn subscribe<B: RippleBackend + 'static>(
    host: &Host,
    core: &Rc<RefCell<Core<B>>>,
) -> Vec<Subscription> {
    if !matches!(core.borrow().phase, Phase::Active(_)) {
        return Vec::new();
    }

    let resize_core = Rc::downgrade(core);
    let resize = host.subscribe(EventKind::Resize, move |event| {
        if let HostEvent::Resized(size) = event {
            if let Some(core) = resize_core.upgrade() {
                core.borrow_mut().resize(*size);
            }
        }
    });

    let pointer_core = Rc::downgrade(core);
    let pointer = host.subscribe(EventKind::PointerMove, move |event| {
        if let HostEvent::PointerMoved { x, y } = event {
            if let Some(core) = pointer_core.upgrade() {
                core.borrow_mut().pointer_moved(*x, *y);
            }
        }
    });

    vec![resize, pointer]
}
