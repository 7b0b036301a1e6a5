#![allow(dead_code)]

//! Client-side capture flow, modeled as a pure state machine so the
//! recording rules can be pinned down by tests.

use std::time::Duration;

/// How long a product recording may run before it stops on its own.
pub const MAX_RECORDING: Duration = Duration::from_secs(5);

/// Recorder formats in preference order; the first one the platform
/// supports wins.
pub const RECORDER_MIME_CANDIDATES: &[&str] =
    &["video/webm;codecs=vp8,opus", "video/webm", "video/mp4"];

pub fn pick_recorder_mime(supported: impl Fn(&str) -> bool) -> Option<&'static str> {
    RECORDER_MIME_CANDIDATES
        .iter()
        .copied()
        .find(|mime| supported(mime))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapturePhase {
    #[default]
    Idle,
    Recording,
    Encoding,
    Uploading,
    Succeeded,
    Failed,
}

impl CapturePhase {
    pub fn as_str(self) -> &'static str {
        match self {
            CapturePhase::Idle => "idle",
            CapturePhase::Recording => "recording",
            CapturePhase::Encoding => "encoding",
            CapturePhase::Uploading => "uploading",
            CapturePhase::Succeeded => "succeeded",
            CapturePhase::Failed => "failed",
        }
    }
}

/// Drives one capture round-trip: record, encode, upload.
///
/// Transitions out of the wrong phase are ignored rather than rejected, so
/// UI event handlers can fire in any order without corrupting the flow.
#[derive(Debug, Default)]
pub struct CaptureFlow {
    phase: CapturePhase,
    started_at: Option<Duration>,
}

impl CaptureFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// Begins recording. Returns false when a capture is already underway.
    pub fn start(&mut self, now: Duration) -> bool {
        if self.phase != CapturePhase::Idle {
            return false;
        }
        self.phase = CapturePhase::Recording;
        self.started_at = Some(now);
        true
    }

    /// Reports the countdown remainder and fires the automatic stop once
    /// the recording window is spent.
    pub fn tick(&mut self, now: Duration) -> Duration {
        let Some(started_at) = self.started_at else {
            return Duration::ZERO;
        };
        if self.phase != CapturePhase::Recording {
            return Duration::ZERO;
        }

        let elapsed = now.saturating_sub(started_at);
        let remaining = MAX_RECORDING.saturating_sub(elapsed);
        if remaining.is_zero() {
            self.stop();
        }
        remaining
    }

    /// Ends the recording. Safe to call repeatedly or out of phase.
    pub fn stop(&mut self) {
        if self.phase == CapturePhase::Recording {
            self.phase = CapturePhase::Encoding;
            self.started_at = None;
        }
    }

    pub fn encoded(&mut self) {
        if self.phase == CapturePhase::Encoding {
            self.phase = CapturePhase::Uploading;
        }
    }

    pub fn upload_finished(&mut self, success: bool) {
        if self.phase == CapturePhase::Uploading {
            self.phase = if success {
                CapturePhase::Succeeded
            } else {
                CapturePhase::Failed
            };
        }
    }

    /// Returns to `Idle` from any phase, dropping whatever was in flight.
    pub fn reset(&mut self) {
        self.phase = CapturePhase::Idle;
        self.started_at = None;
    }
}
