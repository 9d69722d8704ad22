//! Operator-answered probes for hardware the bench cannot observe itself.

use std::net::Ipv4Addr;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input};
use inos_core::Assessment;
use inos_core::driver::{LinkMonitor, Measurement, SensorFailureReason, SensorHub};
use tokio::net::UdpSocket;
use tracing::{debug, warn};

/// Gap between two emitted trials.
const TRIAL_GAP: Duration = Duration::from_millis(700);

/// Ask a yes/no question without blocking the runtime.
pub async fn ask(prompt: String, default: bool) -> Result<bool> {
    let answer = tokio::task::spawn_blocking(move || {
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(default)
            .interact()
    })
    .await??;
    Ok(answer)
}

/// Ask for a number without blocking the runtime.
pub async fn ask_count(prompt: String) -> Result<u32> {
    let count = tokio::task::spawn_blocking(move || {
        Input::<u32>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact_text()
    })
    .await??;
    Ok(count)
}

/// Ask for a line of text, empty allowed.
pub async fn ask_line(prompt: String) -> Result<String> {
    let line = tokio::task::spawn_blocking(move || {
        Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()
    })
    .await??;
    Ok(line)
}

fn answered(assessment: Assessment, answer: Result<bool>) -> Measurement {
    match answer {
        Ok(passed) => Measurement::Flag(passed),
        Err(e) => {
            warn!(assessment = %assessment, error = %e, "Prompt failed");
            Measurement::SensorFailure(SensorFailureReason::Other(e.to_string()))
        }
    }
}

/// Sensor hub answered by the operator at the bench.
#[derive(Debug, Default)]
pub struct OperatorSensorHub;

#[async_trait]
impl SensorHub for OperatorSensorHub {
    async fn probe(&self, assessment: Assessment) -> Measurement {
        let question = match assessment.testing_message() {
            "" => format!("Did the {} check pass?", assessment.title()),
            message => format!("{message} Did the {} work?", assessment.title()),
        };
        answered(assessment, ask(question, true).await)
    }

    async fn emit_trials(&self, assessment: Assessment, count: u32) {
        println!("Playing {} trials. Count them.", assessment.title());
        for trial in 0..count {
            if trial > 0 {
                tokio::time::sleep(TRIAL_GAP).await;
            }
            println!("  *");
        }
    }

    fn release(&self, assessment: Assessment) {
        debug!(assessment = %assessment, "Released sensor");
    }
}

/// Link checks: routed interfaces for IP links, the operator for the rest.
#[derive(Debug, Default)]
pub struct BenchLinkMonitor;

impl BenchLinkMonitor {
    /// Whether the host has a route out through a non-loopback interface.
    /// Connecting a UDP socket only selects a route; nothing is sent.
    async fn has_route() -> bool {
        let Ok(socket) = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await else {
            return false;
        };
        if socket.connect((Ipv4Addr::new(192, 0, 2, 1), 9)).await.is_err() {
            return false;
        }
        socket
            .local_addr()
            .is_ok_and(|addr| !addr.ip().is_loopback() && !addr.ip().is_unspecified())
    }
}

#[async_trait]
impl LinkMonitor for BenchLinkMonitor {
    async fn check(&self, assessment: Assessment) -> Measurement {
        match assessment {
            Assessment::Wifi | Assessment::Cellular => {
                let routed = Self::has_route().await;
                debug!(assessment = %assessment, routed, "Checked route");
                Measurement::Flag(routed)
            }
            _ => {
                let question = format!("Is {} available on the device?", assessment.title());
                answered(assessment, ask(question, true).await)
            }
        }
    }
}
