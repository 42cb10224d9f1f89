//! Simulated capture backend
//!
//! Stands in for a real device so the whole pipeline - rotation, commit,
//! eviction - runs against real files without an encoder. Each segment file
//! is created on open and padded to `bytes_per_sec * elapsed` on close.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use std::time::Instant;

use tracing::{debug, info};

use crate::config::SessionConfig;
use crate::error::{RecorderError, RecorderResult};

use super::{CapturePort, CaptureSpec, SegmentHandle};

pub struct SimulatedCapturePort {
    bytes_per_sec: u64,
    device_open: bool,
    open_since: Option<Instant>,
}

impl SimulatedCapturePort {
    pub fn new(bytes_per_sec: u64) -> Self {
        Self {
            bytes_per_sec,
            device_open: false,
            open_since: None,
        }
    }
}

impl CapturePort for SimulatedCapturePort {
    fn open_device(&mut self, config: &SessionConfig) -> RecorderResult<()> {
        info!(
            resolution = ?config.capture.resolution,
            quality = ?config.capture.quality,
            audio = config.capture.audio_enabled,
            "Opening simulated capture device"
        );
        self.device_open = true;
        Ok(())
    }

    fn open_segment(
        &mut self,
        seq: u32,
        location: &Path,
        _spec: &CaptureSpec,
    ) -> RecorderResult<SegmentHandle> {
        if !self.device_open {
            return Err(RecorderError::capture("device is not open"));
        }
        if self.open_since.is_some() {
            return Err(RecorderError::capture("a segment is already open"));
        }

        std::fs::File::create(location)
            .map_err(|e| RecorderError::capture(format!("create {:?}: {}", location, e)))?;

        debug!(seq, ?location, "Opened simulated segment");
        self.open_since = Some(Instant::now());
        Ok(SegmentHandle::new(seq, location))
    }

    fn close_segment(&mut self, handle: SegmentHandle) -> RecorderResult<u64> {
        let opened_at = self
            .open_since
            .take()
            .ok_or_else(|| RecorderError::capture("no segment is open"))?;

        let elapsed = opened_at.elapsed().as_secs_f64();
        let size = ((elapsed * self.bytes_per_sec as f64) as u64).max(1);

        let mut file = OpenOptions::new()
            .append(true)
            .open(&handle.location)
            .map_err(|e| RecorderError::capture(format!("open {:?}: {}", handle.location, e)))?;
        file.write_all(&vec![0u8; size as usize])
            .map_err(|e| RecorderError::capture(format!("write {:?}: {}", handle.location, e)))?;

        debug!(seq = handle.seq, size, "Closed simulated segment");
        Ok(size)
    }

    fn release_device(&mut self) {
        if self.device_open {
            info!("Releasing simulated capture device");
        }
        self.device_open = false;
        self.open_since = None;
    }
}
