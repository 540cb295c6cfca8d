//! Recording backend used by the renderer tests.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use crate::backend::{FrameUniforms, RippleBackend};
use crate::error::{DrawError, ShaderStageKind};
use crate::types::SurfaceSize;

#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    Compile(ShaderStageKind),
    Link,
    Upload(Vec<f32>),
    BindUniforms,
    Resize(SurfaceSize),
    SetUniforms(FrameUniforms),
    Draw(u32),
}

#[derive(Debug, Default)]
pub struct BackendLog {
    pub calls: Vec<BackendCall>,
    /// Last resolution written to the uniforms.
    pub resolution: Option<[f32; 2]>,
    pub released: bool,
}

impl BackendLog {
    pub fn draw_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, BackendCall::Draw(_)))
            .count()
    }

    pub fn uniform_writes(&self) -> Vec<FrameUniforms> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                BackendCall::SetUniforms(uniforms) => Some(*uniforms),
                _ => None,
            })
            .collect()
    }
}

pub struct RecordingBackend {
    size: SurfaceSize,
    log: Rc<RefCell<BackendLog>>,
    fail_stage: Option<(ShaderStageKind, String)>,
    fail_link: Option<String>,
    draw_results: VecDeque<Result<(), DrawError>>,
}

impl RecordingBackend {
    pub fn new(size: SurfaceSize) -> Self {
        Self {
            size,
            log: Rc::new(RefCell::new(BackendLog::default())),
            fail_stage: None,
            fail_link: None,
            draw_results: VecDeque::new(),
        }
    }

    pub fn log(&self) -> Rc<RefCell<BackendLog>> {
        Rc::clone(&self.log)
    }

    pub fn failing_compile(mut self, stage: ShaderStageKind, diagnostic: &str) -> Self {
        self.fail_stage = Some((stage, diagnostic.to_string()));
        self
    }

    pub fn failing_link(mut self, diagnostic: &str) -> Self {
        self.fail_link = Some(diagnostic.to_string());
        self
    }

    /// Results returned by the next draws, in order; later draws succeed.
    pub fn with_draw_results(mut self, results: Vec<Result<(), DrawError>>) -> Self {
        self.draw_results = results.into();
        self
    }

    fn record(&self, call: BackendCall) {
        self.log.borrow_mut().calls.push(call);
    }
}

impl RippleBackend for RecordingBackend {
    type Stage = ShaderStageKind;
    type Program = ();

    fn surface_size(&self) -> SurfaceSize {
        self.size
    }

    fn compile_stage(
        &mut self,
        stage: ShaderStageKind,
        source: &str,
    ) -> Result<Self::Stage, String> {
        assert!(!source.is_empty());
        self.record(BackendCall::Compile(stage));
        match &self.fail_stage {
            Some((failing, diagnostic)) if *failing == stage => Err(diagnostic.clone()),
            _ => Ok(stage),
        }
    }

    fn link_program(
        &mut self,
        vertex: Self::Stage,
        fragment: Self::Stage,
    ) -> Result<Self::Program, String> {
        assert_eq!(vertex, ShaderStageKind::Vertex);
        assert_eq!(fragment, ShaderStageKind::Fragment);
        self.record(BackendCall::Link);
        match &self.fail_link {
            Some(diagnostic) => Err(diagnostic.clone()),
            None => Ok(()),
        }
    }

    fn upload_geometry(&mut self, _program: &mut Self::Program, vertices: &[f32]) {
        self.record(BackendCall::Upload(vertices.to_vec()));
    }

    fn bind_uniforms(&mut self, _program: &mut Self::Program) {
        self.record(BackendCall::BindUniforms);
    }

    fn resize(&mut self, _program: &mut Self::Program, size: SurfaceSize) {
        self.size = size;
        let mut log = self.log.borrow_mut();
        log.calls.push(BackendCall::Resize(size));
        log.resolution = Some(size.as_vec2());
    }

    fn set_uniforms(&mut self, _program: &mut Self::Program, uniforms: &FrameUniforms) {
        let mut log = self.log.borrow_mut();
        log.calls.push(BackendCall::SetUniforms(*uniforms));
        log.resolution = Some(uniforms.resolution);
    }

    fn draw(&mut self, _program: &mut Self::Program, vertex_count: u32) -> Result<(), DrawError> {
        match self.draw_results.pop_front() {
            Some(Err(err)) => Err(err),
            _ => {
                self.record(BackendCall::Draw(vertex_count));
                Ok(())
            }
        }
    }
}

impl Drop for RecordingBackend {
    fn drop(&mut self) {
        self.log.borrow_mut().released = true;
    }
}
