//! Drop guards that release probe resources on every exit path.

use std::sync::Arc;

use tracing::trace;

use super::control::SurfaceControl;
use crate::assessment::{Assessment, Surface};
use crate::driver::AssessmentDriver;

/// Stops the driver's probe when dropped.
pub(crate) struct ProbeGuard {
    driver: Arc<dyn AssessmentDriver>,
    assessment: Assessment,
}

impl ProbeGuard {
    pub(crate) fn new(driver: Arc<dyn AssessmentDriver>, assessment: Assessment) -> Self {
        Self { driver, assessment }
    }
}

impl Drop for ProbeGuard {
    fn drop(&mut self) {
        trace!(assessment = %self.assessment, "Stopping probe");
        self.driver.stop(self.assessment);
    }
}

/// Keeps a surface presented until dropped.
pub(crate) struct SurfaceGuard {
    surfaces: Arc<dyn SurfaceControl>,
    surface: Surface,
}

impl SurfaceGuard {
    pub(crate) fn present(surfaces: Arc<dyn SurfaceControl>, surface: Surface) -> Self {
        surfaces.present(surface, true);
        Self { surfaces, surface }
    }
}

impl Drop for SurfaceGuard {
    fn drop(&mut self) {
        self.surfaces.present(self.surface, false);
    }
}

/// Keeps the count prompt open until dropped.
pub(crate) struct CountPromptGuard {
    surfaces: Arc<dyn SurfaceControl>,
}

impl CountPromptGuard {
    pub(crate) fn request(surfaces: Arc<dyn SurfaceControl>, assessment: Assessment) -> Self {
        surfaces.request_count(Some(assessment));
        Self { surfaces }
    }
}

impl Drop for CountPromptGuard {
    fn drop(&mut self) {
        self.surfaces.request_count(None);
    }
}
