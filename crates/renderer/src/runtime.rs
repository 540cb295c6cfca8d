use std::time::{Duration, Instant};

/// High-level behaviour requested by the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderPolicy {
    /// Animate continuously, optionally capping the frame rate.
    Animate {
        /// Optional requested frames-per-second cap; `None` renders on every
        /// redraw the platform grants.
        target_fps: Option<f32>,
    },
    /// Freeze the ripple clock at `time` seconds. Pointer ripples still track
    /// the pointer.
    Still { time: f32 },
}

impl Default for RenderPolicy {
    fn default() -> Self {
        Self::Animate { target_fps: None }
    }
}

impl RenderPolicy {
    pub fn target_fps(&self) -> Option<f32> {
        match self {
            RenderPolicy::Animate { target_fps } => *target_fps,
            RenderPolicy::Still { .. } => None,
        }
    }
}

/// Snapshot of the clock supplied to the shader uniforms.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeSample {
    /// Seconds since the renderer was mounted. Kept in `f64` so long sessions
    /// never lose precision before the uniform conversion.
    pub seconds: f64,
    /// Monotonic frame counter for the running session.
    pub frame_index: u64,
}

impl TimeSample {
    pub fn new(seconds: f64, frame_index: u64) -> Self {
        Self {
            seconds,
            frame_index,
        }
    }
}

/// Abstraction over where time values originate from.
pub trait TimeSource {
    /// Produces a time sample for the frame running at `now`.
    fn sample(&mut self, now: Instant) -> TimeSample;
}

/// Elapsed time since a fixed origin (the mount instant).
#[derive(Debug, Clone, Copy)]
pub struct SystemTimeSource {
    origin: Instant,
    frame: u64,
}

impl SystemTimeSource {
    pub fn new(origin: Instant) -> Self {
        Self { origin, frame: 0 }
    }
}

impl TimeSource for SystemTimeSource {
    fn sample(&mut self, now: Instant) -> TimeSample {
        let elapsed = now.saturating_duration_since(self.origin);
        let sample = TimeSample::new(elapsed.as_secs_f64(), self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Time source that always reports a fixed timestamp.
#[derive(Debug, Clone, Copy)]
pub struct FixedTimeSource {
    time: f64,
    frame: u64,
}

impl FixedTimeSource {
    pub fn new(time: f64) -> Self {
        Self { time, frame: 0 }
    }
}

impl TimeSource for FixedTimeSource {
    fn sample(&mut self, _now: Instant) -> TimeSample {
        let sample = TimeSample::new(self.time, self.frame);
        self.frame = self.frame.saturating_add(1);
        sample
    }
}

/// Convenient alias for owning time sources behind trait objects.
pub type BoxedTimeSource = Box<dyn TimeSource>;

/// Builds a time source suited to the requested render policy.
pub fn time_source_for_policy(policy: &RenderPolicy, origin: Instant) -> BoxedTimeSource {
    match policy {
        RenderPolicy::Animate { .. } => Box::new(SystemTimeSource::new(origin)),
        RenderPolicy::Still { time } => Box::new(FixedTimeSource::new(f64::from(*time))),
    }
}

/// Decides when the window loop may issue the next redraw.
#[derive(Debug, Clone)]
pub struct FramePacer {
    interval: Option<Duration>,
    last_frame: Option<Instant>,
}

impl FramePacer {
    pub fn new(target_fps: Option<f32>) -> Self {
        let interval = target_fps
            .filter(|fps| *fps > 0.0 && fps.is_finite())
            .and_then(|fps| Duration::try_from_secs_f32(1.0 / fps).ok());
        Self {
            interval,
            last_frame: None,
        }
    }

    pub fn interval(&self) -> Option<Duration> {
        self.interval
    }

    pub fn ready_for_frame(&self, now: Instant) -> bool {
        match (self.interval, self.last_frame) {
            (Some(interval), Some(last)) => now
                .checked_duration_since(last)
                .is_some_and(|elapsed| elapsed >= interval),
            _ => true,
        }
    }

    /// Earliest instant the next frame may run, if pacing applies and the
    /// deadline is representable.
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.interval, self.last_frame) {
            (Some(interval), Some(last)) => last.checked_add(interval),
            _ => None,
        }
    }

    pub fn mark_rendered(&mut self, now: Instant) {
        self.last_frame = Some(now);
    }
}
