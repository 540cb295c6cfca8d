use std::fmt;

/// Pipeline stage a shader source belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStageKind {
    Vertex,
    Fragment,
}

impl fmt::Display for ShaderStageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShaderStageKind::Vertex => f.write_str("vertex"),
            ShaderStageKind::Fragment => f.write_str("fragment"),
        }
    }
}

/// Initialisation failures. Each one is fatal to the renderer only: the host
/// keeps running with a blank background.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RippleError {
    #[error("graphics context unavailable: {reason}")]
    ContextUnavailable { reason: String },
    #[error("failed to compile {stage} shader: {diagnostic}")]
    ShaderCompile {
        stage: ShaderStageKind,
        diagnostic: String,
    },
    #[error("failed to link shader program: {diagnostic}")]
    ProgramLink { diagnostic: String },
}

impl RippleError {
    pub fn context_unavailable(reason: impl Into<String>) -> Self {
        RippleError::ContextUnavailable {
            reason: reason.into(),
        }
    }
}

/// Errors a backend may report while presenting a frame.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DrawError {
    /// The surface must be reconfigured before the next frame.
    #[error("surface lost or outdated")]
    SurfaceLost,
    /// The frame was dropped; the next one may succeed.
    #[error("frame skipped: {0}")]
    Transient(String),
    /// The backend cannot continue.
    #[error("fatal draw error: {0}")]
    Fatal(String),
}
