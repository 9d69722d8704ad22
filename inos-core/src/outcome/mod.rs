//! Outcome stream adapter
//!
//! Turns one assessment's probe into a lazy stream that yields at most one
//! pass/fail value. The probe does not start until the stream is first
//! polled, every subscription is taken before anything is triggered, and
//! dropping the stream (or cancelling its token) stops the driver, drops
//! the bus receiver and dismisses whatever was presented.

pub mod control;
mod guard;

use std::pin::Pin;
use std::sync::Arc;

use futures_util::stream;
use tokio::sync::broadcast;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::assessment::{Assessment, ProbePattern, Surface, SystemTrigger};
use crate::driver::{AssessmentDriver, DriverSet, Measurement, ProbeUpdate, probe_channel};
use crate::error::AssessmentError;
use crate::events::{DeviceEvent, EventBus, EventSeq};

pub use control::{RecordingSurfaces, SurfaceControl, SurfaceRequest};
use guard::{CountPromptGuard, ProbeGuard, SurfaceGuard};

/// The per-assessment result sequence.
pub type OutcomeStream = Pin<Box<dyn Stream<Item = Result<bool, AssessmentError>> + Send>>;

type Outcome = Result<bool, AssessmentError>;
type BusReceiver = broadcast::Receiver<(EventSeq, DeviceEvent)>;

/// Collaborators a probe needs.
#[derive(Clone)]
pub struct ProbeContext {
    pub drivers: DriverSet,
    pub bus: Arc<dyn EventBus>,
    pub surfaces: Arc<dyn SurfaceControl>,
}

/// Build the outcome stream for `assessment`.
///
/// Cancelling `token` ends the stream with [`AssessmentError::Cancelled`].
pub fn outcome_stream(
    assessment: Assessment,
    context: ProbeContext,
    token: CancellationToken,
) -> OutcomeStream {
    Box::pin(stream::once(async move {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(assessment = %assessment, "Probe cancelled");
                Err(AssessmentError::Cancelled)
            }
            outcome = probe(assessment, &context) => outcome,
        }
    }))
}

async fn probe(assessment: Assessment, context: &ProbeContext) -> Outcome {
    let driver = Arc::clone(context.drivers.for_assessment(assessment));
    trace!(assessment = %assessment, pattern = ?assessment.pattern(), "Probing");
    match assessment.pattern() {
        ProbePattern::Immediate => immediate(assessment, driver.as_ref()),
        ProbePattern::SingleCallback => single_callback(assessment, driver, false).await,
        ProbePattern::FailureSensitive => single_callback(assessment, driver, true).await,
        ProbePattern::EventTrigger(trigger) => {
            event_trigger(assessment, trigger, context.bus.subscribe()).await
        }
        ProbePattern::Surface(surface) => surface_verdict(assessment, surface, context).await,
        ProbePattern::CountConfirmation => count_confirmation(assessment, driver, context).await,
    }
}

fn immediate(assessment: Assessment, driver: &dyn AssessmentDriver) -> Outcome {
    if let Some(error) = driver
        .measurements()
        .get(&assessment)
        .and_then(|measurement| measurement.failure(assessment))
    {
        return Err(error);
    }
    Ok(driver_verdict(assessment, driver))
}

async fn single_callback(
    assessment: Assessment,
    driver: Arc<dyn AssessmentDriver>,
    failure_sensitive: bool,
) -> Outcome {
    let (tx, mut rx) = probe_channel();
    let _probe = ProbeGuard::new(Arc::clone(&driver), assessment);
    driver.start(assessment, tx);

    while let Some(update) = rx.recv().await {
        match update {
            ProbeUpdate::Reported(measurement) => {
                if failure_sensitive && let Some(error) = measurement.failure(assessment) {
                    return Err(error);
                }
                if let Some(passed) = measurement.verdict() {
                    return Ok(passed);
                }
            }
            ProbeUpdate::Completed => {
                if failure_sensitive
                    && let Some(error) = driver
                        .measurements()
                        .get(&assessment)
                        .and_then(|measurement| measurement.failure(assessment))
                {
                    return Err(error);
                }
                return Ok(driver_verdict(assessment, driver.as_ref()));
            }
        }
    }
    Err(AssessmentError::ProbeClosed { assessment })
}

async fn event_trigger(
    assessment: Assessment,
    trigger: SystemTrigger,
    mut events: BusReceiver,
) -> Outcome {
    loop {
        match next_event(&mut events).await {
            Some(event) if event.trigger() == Some(trigger) => return Ok(true),
            Some(_) => continue,
            None => return Err(AssessmentError::ProbeClosed { assessment }),
        }
    }
}

async fn surface_verdict(
    assessment: Assessment,
    surface: Surface,
    context: &ProbeContext,
) -> Outcome {
    let mut events = context.bus.subscribe();
    let _surface = SurfaceGuard::present(Arc::clone(&context.surfaces), surface);

    loop {
        match next_event(&mut events).await {
            Some(event) => {
                if let Some(passed) = event.surface_verdict(surface) {
                    return Ok(passed);
                }
            }
            None => return Err(AssessmentError::ProbeClosed { assessment }),
        }
    }
}

async fn count_confirmation(
    assessment: Assessment,
    driver: Arc<dyn AssessmentDriver>,
    context: &ProbeContext,
) -> Outcome {
    let mut events = context.bus.subscribe();
    let (tx, mut rx) = probe_channel();
    let _probe = ProbeGuard::new(Arc::clone(&driver), assessment);
    driver.start(assessment, tx);

    let mut prompt: Option<CountPromptGuard> = None;
    let mut trials: Option<u32> = None;
    let mut entered: Option<u32> = None;
    let mut probe_open = true;

    loop {
        if let (Some(trials), Some(entered)) = (trials, entered) {
            debug!(assessment = %assessment, trials, entered, "Count confirmed");
            return Ok(trials == entered);
        }

        tokio::select! {
            update = rx.recv(), if probe_open => {
                let played = match update {
                    Some(ProbeUpdate::Reported(measurement)) => {
                        if let Some(error) = measurement.failure(assessment) {
                            return Err(error);
                        }
                        if let Some(count) = measurement.as_trial_count() {
                            trials = Some(count);
                        }
                        false
                    }
                    Some(ProbeUpdate::Completed) => true,
                    None => {
                        probe_open = false;
                        true
                    }
                };
                if played {
                    trials = trials.or_else(|| stored_trial_count(assessment, driver.as_ref()));
                    if trials.is_none() {
                        return Err(AssessmentError::ProbeClosed { assessment });
                    }
                    // Ask only once the trials have been played.
                    if prompt.is_none() {
                        prompt = Some(CountPromptGuard::request(
                            Arc::clone(&context.surfaces),
                            assessment,
                        ));
                    }
                }
            }
            event = next_event(&mut events) => match event {
                Some(DeviceEvent::CountEntered { count }) if prompt.is_some() => {
                    entered = Some(count);
                }
                Some(DeviceEvent::CountEntered { count }) => {
                    trace!(assessment = %assessment, count, "Count entered before prompt");
                }
                Some(_) => {}
                None => return Err(AssessmentError::ProbeClosed { assessment }),
            },
        }
    }
}

/// Next event from the bus, skipping over lag. `None` once the bus is gone.
async fn next_event(events: &mut BusReceiver) -> Option<DeviceEvent> {
    loop {
        match events.recv().await {
            Ok((_, event)) => return Some(event),
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                trace!(skipped, "Event receiver lagged");
            }
            Err(broadcast::error::RecvError::Closed) => return None,
        }
    }
}

fn stored_trial_count(assessment: Assessment, driver: &dyn AssessmentDriver) -> Option<u32> {
    driver
        .measurements()
        .get(&assessment)
        .and_then(Measurement::as_trial_count)
}

/// Outcome from the driver's snapshots: `has_passed` first, then the
/// payload's own pass rule, failing when neither is known.
fn driver_verdict(assessment: Assessment, driver: &dyn AssessmentDriver) -> bool {
    if let Some(passed) = driver.has_passed().get(&assessment) {
        return *passed;
    }
    driver
        .measurements()
        .get(&assessment)
        .and_then(Measurement::verdict)
        .unwrap_or(false)
}
