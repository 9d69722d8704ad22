//! Assessment orchestrator
//!
//! The orchestrator drives single and serial runs, applies the catalog's
//! run policy (pre-run pause, confirmation gate), records outcomes and
//! persists them. The UI observes [`OrchestratorState`] through a watch
//! channel and answers prompts through [`Orchestrator::confirm`] and the
//! event bus.
//!
//! At most one run is active. Starting a run cancels the previous one, and
//! every state write of a run checks its cancellation token under the
//! watch lock, so nothing from a cancelled run lands after [`Orchestrator::cancel`]
//! has reset the state.

pub mod gate;
pub mod state;
pub mod status;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::assessment::{AppGate, Assessment, Catalog, DeviceShape, PassedAssessments, Surface};
use crate::config::TimingConfig;
use crate::driver::DriverSet;
use crate::error::{AssessmentError, StoreError};
use crate::events::{DeviceEvent, EventBus, EventSeq};
use crate::outcome::{ProbeContext, SurfaceControl, outcome_stream};
use crate::store::ResultStore;

pub use gate::{ConfirmationGate, Decision};
pub use state::{CurrentAssessment, OrchestratorState, RunMode};
pub use status::{DeviceStatus, StatusKind, load_status};

/// Fire-and-forget haptic/UI feedback.
pub trait Feedback: Send + Sync {
    /// A serial step recorded an outcome.
    fn step_finished(&self, assessment: Assessment, passed: bool);
}

/// Feedback that does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoFeedback;

impl Feedback for NoFeedback {
    fn step_finished(&self, _assessment: Assessment, _passed: bool) {}
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every step recorded a result.
    Completed,
    /// The user said no at a confirmation gate.
    Declined,
    /// The run was cancelled or replaced by another run.
    Cancelled,
}

/// Result of one step of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StepOutcome {
    Recorded(bool),
    Declined,
    Cancelled,
}

/// Handle to a spawned run.
pub struct RunHandle {
    task: JoinHandle<RunOutcome>,
    token: CancellationToken,
    shared: Arc<Shared>,
}

impl RunHandle {
    /// Wait for the run to end.
    pub async fn wait(self) -> RunOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Run task did not finish");
                RunOutcome::Cancelled
            }
        }
    }

    /// Cancel this run only if it is still the one in flight, returning
    /// to idle immediately.
    pub fn cancel(&self) {
        if !self.shared.abort(Some(&self.token)) {
            debug!("Run already ended or replaced");
        }
    }
}

/// Collaborators and policy the orchestrator is built from.
pub struct OrchestratorParts {
    pub catalog: Catalog,
    pub shape: DeviceShape,
    pub drivers: DriverSet,
    pub bus: Arc<dyn EventBus>,
    pub results: ResultStore,
    pub timing: TimingConfig,
    pub feedback: Arc<dyn Feedback>,
}

struct Shared {
    catalog: Catalog,
    shape: DeviceShape,
    drivers: DriverSet,
    bus: Arc<dyn EventBus>,
    results: ResultStore,
    timing: TimingConfig,
    feedback: Arc<dyn Feedback>,
    gate: ConfirmationGate,
    state: watch::Sender<OrchestratorState>,
    active: Mutex<Option<CancellationToken>>,
}

/// Runs assessments and owns their observable state.
pub struct Orchestrator {
    shared: Arc<Shared>,
}

impl Orchestrator {
    pub fn new(parts: OrchestratorParts) -> Self {
        let (state, _) = watch::channel(OrchestratorState::default());
        Self {
            shared: Arc::new(Shared {
                catalog: parts.catalog,
                shape: parts.shape,
                drivers: parts.drivers,
                bus: parts.bus,
                results: parts.results,
                timing: parts.timing,
                feedback: parts.feedback,
                gate: ConfirmationGate::new(),
                state,
                active: Mutex::new(None),
            }),
        }
    }

    /// Observe state changes.
    pub fn subscribe(&self) -> watch::Receiver<OrchestratorState> {
        self.shared.state.subscribe()
    }

    /// Snapshot of the current state.
    pub fn state(&self) -> OrchestratorState {
        self.shared.state.borrow().clone()
    }

    pub fn catalog(&self) -> &Catalog {
        &self.shared.catalog
    }

    pub fn device_shape(&self) -> DeviceShape {
        self.shared.shape
    }

    pub fn enabled_assessments(&self) -> Vec<Assessment> {
        self.shared.catalog.enabled_assessments(&self.shared.shape)
    }

    pub fn app_gate(&self) -> AppGate {
        self.shared.catalog.app_gate()
    }

    /// Run one assessment, cancelling any run in flight.
    pub fn run_single(&self, assessment: Assessment) -> RunHandle {
        let token = self.shared.begin(RunMode::RunningSingle { assessment });
        info!(assessment = %assessment, "Starting single run");

        let shared = Arc::clone(&self.shared);
        let run_token = token.clone();
        let task = tokio::spawn(async move {
            let outcome = match shared.run_step(assessment, false, &run_token).await {
                StepOutcome::Recorded(_) => RunOutcome::Completed,
                StepOutcome::Declined => RunOutcome::Declined,
                StepOutcome::Cancelled => RunOutcome::Cancelled,
            };
            shared.finish(&run_token, outcome);
            outcome
        });
        RunHandle {
            task,
            token,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Run every enabled assessment in catalog order, cancelling any run in
    /// flight. The accumulated results are cleared first.
    pub fn run_serial(&self) -> RunHandle {
        let token = self.shared.begin(RunMode::RunningSerial {
            index: 0,
            awaiting_confirmation: false,
        });

        let shared = Arc::clone(&self.shared);
        let run_token = token.clone();
        let task = tokio::spawn(async move {
            let outcome = shared.run_serial(&run_token).await;
            shared.finish(&run_token, outcome);
            outcome
        });
        RunHandle {
            task,
            token,
            shared: Arc::clone(&self.shared),
        }
    }

    /// Cancel the run in flight and return to idle immediately.
    pub fn cancel(&self) {
        if !self.shared.abort(None) {
            debug!("Cancel requested with no active run");
        }
    }

    /// Answer the pending confirmation gate. Returns false when no
    /// assessment is waiting.
    pub fn confirm(&self, confirmed: bool) -> bool {
        let answered = self.shared.gate.resolve(confirmed);
        if !answered {
            debug!(confirmed, "No confirmation pending");
        }
        answered
    }

    /// Publish a test surface verdict for the probe waiting on it.
    pub async fn submit_surface_result(&self, surface: Surface, passed: bool) -> EventSeq {
        self.shared
            .bus
            .publish(DeviceEvent::SurfaceResult { surface, passed })
            .await
    }

    /// Publish the trial count the user typed back.
    pub async fn submit_count(&self, count: u32) -> EventSeq {
        self.shared
            .bus
            .publish(DeviceEvent::CountEntered { count })
            .await
    }

    /// Load persisted results into the state.
    pub async fn load_results(&self) -> Result<PassedAssessments, StoreError> {
        let passed = self.shared.results.load().await?;
        debug!(count = passed.len(), "Loaded stored results");
        self.shared.state.send_modify(|state| state.passed = passed.clone());
        Ok(passed)
    }

    /// Forget every recorded result, in memory and in the store.
    pub async fn reset_results(&self) -> Result<(), StoreError> {
        self.shared.state.send_modify(|state| {
            state.passed.clear();
            state.failures.clear();
            state.scroll_index = 0.0;
        });
        self.shared.results.clear().await
    }

    /// Device status summary.
    pub async fn load_status(&self) -> Vec<DeviceStatus> {
        load_status(&self.shared.drivers, &self.shared.shape).await
    }
}

impl Drop for Orchestrator {
    fn drop(&mut self) {
        let mut active = self.shared.active();
        if let Some(token) = active.take() {
            token.cancel();
        }
    }
}

impl Shared {
    fn active(&self) -> MutexGuard<'_, Option<CancellationToken>> {
        self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the active run with a new one in `mode`.
    ///
    /// Tokens are cancelled only while the active slot is locked, so a run
    /// whose token is still live is the active one.
    fn begin(&self, mode: RunMode) -> CancellationToken {
        let token = CancellationToken::new();
        let mut active = self.active();
        if let Some(previous) = active.replace(token.clone()) {
            debug!("Cancelling previous run");
            previous.cancel();
        }
        self.gate.clear();
        self.state.send_modify(|state| {
            state.reset_run();
            state.mode = mode;
        });
        token
    }

    /// Cancel the active run and return to idle. With `only`, nothing
    /// happens unless that run is still the active one.
    fn abort(&self, only: Option<&CancellationToken>) -> bool {
        let mut active = self.active();
        if only.is_some_and(CancellationToken::is_cancelled) {
            return false;
        }
        let Some(token) = active.take() else {
            return false;
        };
        info!("Cancelling run");
        token.cancel();
        self.gate.clear();
        self.state.send_modify(OrchestratorState::reset_run);
        true
    }

    /// Return to idle if `token` is still the active run.
    fn finish(&self, token: &CancellationToken, outcome: RunOutcome) {
        let mut active = self.active();
        if token.is_cancelled() {
            debug!(?outcome, "Superseded run finished");
            return;
        }
        active.take();
        self.state.send_modify(OrchestratorState::reset_run);
        info!(?outcome, "Run finished");
    }

    /// Apply `change` unless the run owning `token` has been cancelled.
    fn update(
        &self,
        token: &CancellationToken,
        change: impl FnOnce(&mut OrchestratorState),
    ) -> bool {
        self.state.send_if_modified(|state| {
            if token.is_cancelled() {
                return false;
            }
            change(state);
            true
        })
    }

    async fn run_serial(self: &Arc<Self>, token: &CancellationToken) -> RunOutcome {
        let enabled = self.catalog.enabled_assessments(&self.shape);
        info!(count = enabled.len(), "Starting serial run");
        self.update(token, |state| {
            state.passed.clear();
            state.failures.clear();
            state.scroll_index = 0.0;
        });

        for (index, assessment) in enabled.into_iter().enumerate() {
            if token.is_cancelled() {
                return RunOutcome::Cancelled;
            }
            self.update(token, |state| {
                state.mode = RunMode::RunningSerial {
                    index,
                    awaiting_confirmation: false,
                };
            });
            match self.run_step(assessment, true, token).await {
                StepOutcome::Recorded(_) => {}
                StepOutcome::Declined => {
                    info!(assessment = %assessment, "Serial run stopped at confirmation");
                    return RunOutcome::Declined;
                }
                StepOutcome::Cancelled => return RunOutcome::Cancelled,
            }
        }
        RunOutcome::Completed
    }

    /// The single-assessment protocol shared by both run modes.
    async fn run_step(
        self: &Arc<Self>,
        assessment: Assessment,
        serial: bool,
        token: &CancellationToken,
    ) -> StepOutcome {
        if !self.update(token, |state| {
            state.current = Some(CurrentAssessment::started(assessment));
        }) {
            return StepOutcome::Cancelled;
        }

        let pause = self.timing.pre_run_pause();
        if !self.catalog.is_undelayed(assessment) && !pause.is_zero() {
            debug!(assessment = %assessment, ?pause, "Pausing before probe");
            tokio::select! {
                biased;
                _ = token.cancelled() => return StepOutcome::Cancelled,
                _ = tokio::time::sleep(pause) => {}
            }
        }

        if self.catalog.needs_confirmation(assessment) {
            match self.await_confirmation(assessment, token).await {
                Decision::Confirmed => {}
                Decision::Declined => {
                    self.update(token, |state| {
                        state.current = Some(CurrentAssessment::finished(assessment));
                    });
                    return StepOutcome::Declined;
                }
                Decision::Cancelled => return StepOutcome::Cancelled,
            }
        }

        let context = ProbeContext {
            drivers: self.drivers.clone(),
            bus: Arc::clone(&self.bus),
            surfaces: Arc::new(RunSurfaces {
                shared: Arc::clone(self),
                token: token.clone(),
            }),
        };
        let mut outcomes = outcome_stream(assessment, context, token.clone());
        let (passed, failure) = match outcomes.next().await {
            Some(Ok(passed)) => (passed, None),
            Some(Err(AssessmentError::Cancelled)) | None => return StepOutcome::Cancelled,
            Some(Err(e)) => {
                warn!(assessment = %assessment, error = %e, "Assessment failed");
                (false, Some(e))
            }
        };
        drop(outcomes);

        let recorded = self.update(token, |state| {
            state.passed.record(assessment, passed);
            state.current = Some(CurrentAssessment::finished(assessment));
            match failure {
                Some(e) => {
                    state.failures.insert(assessment, e);
                }
                None => {
                    state.failures.remove(&assessment);
                }
            }
        });
        if !recorded {
            return StepOutcome::Cancelled;
        }
        info!(assessment = %assessment, passed, "Assessment finished");

        let snapshot = self.state.borrow().passed.clone();
        if let Err(e) = self.results.save(&snapshot).await {
            warn!(error = %e, "Failed to persist results");
        }

        if serial {
            self.feedback.step_finished(assessment, passed);
            let step = self.timing.scroll_step;
            self.update(token, |state| state.scroll_index += step);
        }
        StepOutcome::Recorded(passed)
    }

    async fn await_confirmation(
        &self,
        assessment: Assessment,
        token: &CancellationToken,
    ) -> Decision {
        let request = self.gate.arm();
        self.update(token, |state| {
            state.awaiting_confirmation = Some(assessment);
            if let RunMode::RunningSerial {
                awaiting_confirmation,
                ..
            } = &mut state.mode
            {
                *awaiting_confirmation = true;
            }
        });
        debug!(assessment = %assessment, "Awaiting confirmation");

        let decision = gate::wait(request, token).await;
        self.update(token, |state| {
            state.awaiting_confirmation = None;
            if let RunMode::RunningSerial {
                awaiting_confirmation,
                ..
            } = &mut state.mode
            {
                *awaiting_confirmation = false;
            }
        });
        debug!(assessment = %assessment, ?decision, "Confirmation resolved");
        decision
    }
}

/// Surface requests of one run, reflected into the observable state.
struct RunSurfaces {
    shared: Arc<Shared>,
    token: CancellationToken,
}

impl SurfaceControl for RunSurfaces {
    fn present(&self, surface: Surface, visible: bool) {
        if visible {
            self.shared
                .update(&self.token, |state| state.presented = Some(surface));
        } else {
            self.shared.state.send_if_modified(|state| {
                if state.presented == Some(surface) {
                    state.presented = None;
                    true
                } else {
                    false
                }
            });
        }
    }

    fn request_count(&self, assessment: Option<Assessment>) {
        match assessment {
            Some(assessment) => {
                self.shared
                    .update(&self.token, |state| state.count_entry = Some(assessment));
            }
            None => {
                self.shared.state.send_if_modified(|state| state.count_entry.take().is_some());
            }
        }
    }
}
