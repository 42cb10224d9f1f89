//! Capture port contract
//!
//! The core never touches a device or an encoder directly. Everything that
//! opens hardware and writes encoded bytes lives behind [`CapturePort`]; the
//! session engine drives it and treats every call as brief blocking I/O.

mod sim;

pub use sim::SimulatedCapturePort;

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::config::SessionConfig;
use crate::error::RecorderResult;

/// Resolution class requested from the capture backend
///
/// Selecting a class is as far as device negotiation goes; probing actual
/// device capabilities is the backend's problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionClass {
    /// 1280x720
    #[default]
    Hd,
    /// 1920x1080
    FullHd,
    /// Whatever the device natively produces
    Native,
}

/// Quality class requested from the capture backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityClass {
    Low,
    #[default]
    Standard,
    High,
}

/// Capture parameters handed to the port when opening a segment
#[derive(Debug, Clone, Copy)]
pub struct CaptureSpec {
    pub resolution: ResolutionClass,
    pub quality: QualityClass,
    pub audio_enabled: bool,
}

impl Default for CaptureSpec {
    fn default() -> Self {
        Self {
            resolution: ResolutionClass::default(),
            quality: QualityClass::default(),
            audio_enabled: true,
        }
    }
}

/// Handle for the single open segment of a session
///
/// Returned by [`CapturePort::open_segment`] and consumed by
/// [`CapturePort::close_segment`]; a session holds at most one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentHandle {
    /// Monotonic sequence number within the session, starting at 0
    pub seq: u32,

    /// File the backend writes to
    pub location: PathBuf,
}

impl SegmentHandle {
    pub fn new(seq: u32, location: impl Into<PathBuf>) -> Self {
        Self {
            seq,
            location: location.into(),
        }
    }
}

/// Contract between the session engine and the capture backend
///
/// The engine serializes all calls; implementations never see two of these
/// methods run concurrently. Calls may block briefly on device or file I/O.
/// Faults that arise outside these calls (a device yanked mid-segment) are
/// reported through `SessionHandle::report_capture_fault` instead.
pub trait CapturePort: Send {
    /// Acquire the capture device for the session
    fn open_device(&mut self, config: &SessionConfig) -> RecorderResult<()>;

    /// Open a new output segment at the given location
    fn open_segment(
        &mut self,
        seq: u32,
        location: &Path,
        spec: &CaptureSpec,
    ) -> RecorderResult<SegmentHandle>;

    /// Close the segment and report its final size in bytes
    fn close_segment(&mut self, handle: SegmentHandle) -> RecorderResult<u64>;

    /// Release the capture device; must not fail
    fn release_device(&mut self);
}
