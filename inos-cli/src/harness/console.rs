//! Terminal stand-in for the assessment screens.
//!
//! Watches orchestrator state and answers what a device UI would: the
//! confirmation gate, full-screen test surfaces and the trial count prompt.

use std::sync::Arc;

use anyhow::Result;
use dialoguer::console::style;
use inos_core::surface::{CompassTracker, DeadpixelSequence, MultitouchPairs, Side, TouchGrid};
use inos_core::{Assessment, Orchestrator, OrchestratorState, Surface};
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::prompts::{ask, ask_count, ask_line};

/// Prompts already shown, so repeated state notifications don't re-ask.
#[derive(Debug, Default)]
struct Answered {
    confirmation: Option<Assessment>,
    surface: Option<Surface>,
    count: Option<Assessment>,
    announced: Option<(Assessment, bool)>,
}

impl Answered {
    fn forget_resolved(&mut self, state: &OrchestratorState) {
        if state.awaiting_confirmation.is_none() {
            self.confirmation = None;
        }
        if state.presented.is_none() {
            self.surface = None;
        }
        if state.count_entry.is_none() {
            self.count = None;
        }
    }
}

/// Answer the orchestrator's prompts until `token` is cancelled.
pub async fn drive(orchestrator: Arc<Orchestrator>, token: CancellationToken) {
    let mut rx = orchestrator.subscribe();
    let mut answered = Answered::default();

    loop {
        let state = rx.borrow_and_update().clone();
        answered.forget_resolved(&state);
        announce(&state, &mut answered);

        if let Some(assessment) = state.awaiting_confirmation
            && answered.confirmation != Some(assessment)
        {
            answered.confirmation = Some(assessment);
            let question = format!("Run the {} check now?", assessment.title());
            let go = ask(question, true).await.unwrap_or_else(|e| {
                warn!(error = %e, "Confirmation prompt failed");
                false
            });
            orchestrator.confirm(go);
        } else if let Some(surface) = state.presented
            && answered.surface != Some(surface)
        {
            answered.surface = Some(surface);
            let passed = walk_surface(surface).await.unwrap_or_else(|e| {
                warn!(surface = ?surface, error = %e, "Surface prompt failed");
                false
            });
            orchestrator.submit_surface_result(surface, passed).await;
        } else if let Some(assessment) = state.count_entry
            && answered.count != Some(assessment)
        {
            answered.count = Some(assessment);
            let question = format!("How many {} trials did you notice?", assessment.title());
            let count = ask_count(question).await.unwrap_or_else(|e| {
                warn!(error = %e, "Count prompt failed");
                0
            });
            orchestrator.submit_count(count).await;
        }

        tokio::select! {
            _ = token.cancelled() => return,
            changed = rx.changed() => {
                if changed.is_err() {
                    return;
                }
            }
        }
    }
}

fn announce(state: &OrchestratorState, answered: &mut Answered) {
    let Some(current) = &state.current else {
        return;
    };
    let key = (current.assessment, current.is_running);
    if answered.announced == Some(key) {
        return;
    }
    answered.announced = Some(key);

    let assessment = current.assessment;
    if current.is_running {
        let message = if current.is_testing {
            assessment.testing_message().to_string()
        } else {
            format!("Checking {}...", assessment.title())
        };
        println!("{} {}", style("▶").cyan().bold(), message);
    } else if let Some(passed) = state.passed.get(assessment) {
        let mark = if passed {
            style("✓").green().bold()
        } else {
            style("✗").red().bold()
        };
        println!("{} {}", mark, assessment.finished_message());
    }
}

async fn walk_surface(surface: Surface) -> Result<bool> {
    match surface {
        Surface::Camera => ask("Did the camera preview show a live image?".to_string(), true).await,
        Surface::Touchscreen => {
            let cells = TouchGrid::ROWS * TouchGrid::COLUMNS;
            ask(format!("Were all {cells} cells of the touch grid covered?"), true).await
        }
        Surface::Deadpixel => {
            let mut sequence = DeadpixelSequence::new();
            loop {
                let color = sequence.current();
                let question = format!("Screen filled {color}. Is every pixel {color}?");
                if !ask(question, true).await? {
                    return Ok(false);
                }
                if sequence.advance() {
                    return Ok(true);
                }
            }
        }
        Surface::Multitouch => {
            let line = ask_line(format!(
                "Touch order seen, L or R per touch ({} left-then-right pairs)",
                MultitouchPairs::REQUIRED_PAIRS
            ))
            .await?;
            Ok(multitouch_passes(&line))
        }
        Surface::Compass => {
            let line = ask_line("Headings read while turning, in degrees".to_string()).await?;
            Ok(compass_passes(&line))
        }
    }
}

fn multitouch_passes(line: &str) -> bool {
    let mut pairs = MultitouchPairs::new();
    line.chars()
        .filter_map(|c| match c.to_ascii_uppercase() {
            'L' => Some(Side::Left),
            'R' => Some(Side::Right),
            _ => None,
        })
        .for_each(|side| {
            pairs.touch(side);
        });
    pairs.is_passed()
}

fn compass_passes(line: &str) -> bool {
    let mut tracker = CompassTracker::new();
    line.split([',', ' '])
        .filter_map(|heading| heading.trim().parse::<f64>().ok())
        .for_each(|heading| {
            tracker.update_heading(heading);
        });
    tracker.has_completed_rotation()
}

#[cfg(test)]
mod tests {
    use super::*;
    use inos_core::orchestrator::CurrentAssessment;

    #[test]
    fn multitouch_needs_three_left_right_pairs() {
        assert!(multitouch_passes("LRLRLR"));
        assert!(multitouch_passes("l r l r l r"));
        assert!(!multitouch_passes("LRLR"));
        assert!(!multitouch_passes("RLRLRL"));
    }

    #[test]
    fn compass_needs_a_wrap_through_north() {
        assert!(compass_passes("90, 180, 270, 350, 10"));
        assert!(!compass_passes("10 90 180 270"));
        assert!(!compass_passes(""));
    }

    #[test]
    fn resolved_prompts_are_forgotten() {
        let mut answered = Answered {
            confirmation: Some(Assessment::Wifi),
            surface: Some(Surface::Camera),
            count: Some(Assessment::Vibration),
            announced: None,
        };
        answered.forget_resolved(&OrchestratorState {
            presented: Some(Surface::Camera),
            ..Default::default()
        });

        assert_eq!(answered.confirmation, None);
        assert_eq!(answered.surface, Some(Surface::Camera));
        assert_eq!(answered.count, None);
    }

    #[test]
    fn each_transition_is_announced_once() {
        let mut answered = Answered::default();
        let state = OrchestratorState {
            current: Some(CurrentAssessment::started(Assessment::Torch)),
            ..Default::default()
        };

        announce(&state, &mut answered);
        assert_eq!(answered.announced, Some((Assessment::Torch, true)));
        announce(&state, &mut answered);
        assert_eq!(answered.announced, Some((Assessment::Torch, true)));
    }
}
