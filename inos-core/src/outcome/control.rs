//! UI hooks driven by the outcome stream adapter.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::assessment::{Assessment, Surface};

/// Presentation requests for full-screen surfaces and the count prompt.
pub trait SurfaceControl: Send + Sync {
    /// Show or dismiss a test surface.
    fn present(&self, surface: Surface, visible: bool);

    /// Ask for the perceived trial count of `assessment`, or withdraw the
    /// request with `None`.
    fn request_count(&self, assessment: Option<Assessment>);
}

/// A presentation request seen by [`RecordingSurfaces`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceRequest {
    Present(Surface),
    Dismiss(Surface),
    RequestCount(Assessment),
    WithdrawCount,
}

/// SurfaceControl that only records what it was asked to do.
#[derive(Debug, Default)]
pub struct RecordingSurfaces {
    requests: Mutex<Vec<SurfaceRequest>>,
}

impl RecordingSurfaces {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<SurfaceRequest>> {
        self.requests.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn requests(&self) -> Vec<SurfaceRequest> {
        self.lock().clone()
    }
}

impl SurfaceControl for RecordingSurfaces {
    fn present(&self, surface: Surface, visible: bool) {
        let request = if visible {
            SurfaceRequest::Present(surface)
        } else {
            SurfaceRequest::Dismiss(surface)
        };
        self.lock().push(request);
    }

    fn request_count(&self, assessment: Option<Assessment>) {
        let request = match assessment {
            Some(assessment) => SurfaceRequest::RequestCount(assessment),
            None => SurfaceRequest::WithdrawCount,
        };
        self.lock().push(request);
    }
}
