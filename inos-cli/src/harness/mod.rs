//! Wires the engine to host collaborators.

pub mod console;
pub mod host;
pub mod prompts;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use inos_core::driver::{ConnectivityDriver, DeviceDriver, DriverSet, PhysicalDriver, PowerDriver};
use inos_core::{
    Assessment, Catalog, Feedback, FileKeyValueStore, InosConfig, MemoryEventBus, Orchestrator,
    OrchestratorParts, ResultStore,
};
use tracing::debug;

use host::{HostDeviceSource, HostPowerSource};
use prompts::{BenchLinkMonitor, OperatorSensorHub};

/// Rings the terminal bell after each serial step.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Feedback for TerminalBell {
    fn step_finished(&self, assessment: Assessment, passed: bool) {
        debug!(assessment = %assessment, passed, "Serial step feedback");
        print!("\x07");
    }
}

/// Build an orchestrator backed by this machine and the operator, with the
/// stored results already loaded.
pub async fn build_orchestrator(
    config: &InosConfig,
    device_root: Option<PathBuf>,
) -> Result<Orchestrator> {
    let store_path = config.store.resolved_path();
    let kv = FileKeyValueStore::load(&store_path)
        .await
        .with_context(|| format!("Failed to open results at {}", store_path.display()))?;
    debug!(path = %store_path.display(), "Opened result store");

    let drivers = DriverSet::new(
        Arc::new(DeviceDriver::new(Arc::new(HostDeviceSource::new(device_root)))),
        Arc::new(ConnectivityDriver::new(Arc::new(BenchLinkMonitor))),
        Arc::new(PhysicalDriver::new(
            Arc::new(OperatorSensorHub),
            config.timing.trial_count_max,
        )),
        Arc::new(PowerDriver::new(
            Arc::new(HostPowerSource::new()),
            config.timing.battery_remeasure(),
        )),
    );

    let orchestrator = Orchestrator::new(OrchestratorParts {
        catalog: Catalog::from_config(&config.catalog),
        shape: config.device,
        drivers,
        bus: Arc::new(MemoryEventBus::new(config.events.capacity)),
        results: ResultStore::new(Arc::new(kv)),
        timing: config.timing.clone(),
        feedback: Arc::new(TerminalBell),
    });
    orchestrator
        .load_results()
        .await
        .with_context(|| format!("Failed to load results from {}", store_path.display()))?;
    Ok(orchestrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use inos_core::AppGate;
    use tempfile::TempDir;

    #[tokio::test]
    async fn builds_from_config_with_results_file() {
        let dir = TempDir::new().unwrap();
        let mut config = InosConfig::default();
        config.store.path = Some(dir.path().join("results.json"));
        config.catalog.disabled = vec![Assessment::Gps];
        config.device.is_tablet = true;

        let orchestrator = build_orchestrator(&config, Some(dir.path().to_path_buf()))
            .await
            .unwrap();

        let enabled = orchestrator.enabled_assessments();
        assert!(!enabled.contains(&Assessment::Gps));
        assert!(!enabled.contains(&Assessment::Vibration));
        assert_eq!(orchestrator.app_gate(), AppGate::Ready);
        assert!(orchestrator.load_results().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn jailbreak_check_reads_device_root() {
        let dir = TempDir::new().unwrap();
        let mut config = InosConfig::default();
        config.store.path = Some(dir.path().join("results.json"));
        config.timing = inos_core::TimingConfig::immediate();

        let orchestrator = build_orchestrator(&config, Some(dir.path().to_path_buf()))
            .await
            .unwrap();
        orchestrator.run_single(Assessment::Jailbreak).wait().await;

        let passed = orchestrator.state().passed;
        assert_eq!(passed.get(Assessment::Jailbreak), Some(true));
        assert!(dir.path().join("results.json").exists());
    }

    #[tokio::test]
    async fn later_runs_keep_earlier_results() {
        let dir = TempDir::new().unwrap();
        let mut config = InosConfig::default();
        config.store.path = Some(dir.path().join("results.json"));
        config.timing = inos_core::TimingConfig::immediate();
        let root = Some(dir.path().to_path_buf());

        let first = build_orchestrator(&config, root.clone()).await.unwrap();
        first.run_single(Assessment::Cpu).wait().await;
        drop(first);

        let second = build_orchestrator(&config, root.clone()).await.unwrap();
        assert!(second.state().passed.contains(Assessment::Cpu));
        second.run_single(Assessment::Jailbreak).wait().await;
        drop(second);

        let third = build_orchestrator(&config, root).await.unwrap();
        let stored = third.load_results().await.unwrap();
        assert!(stored.contains(Assessment::Cpu));
        assert_eq!(stored.get(Assessment::Jailbreak), Some(true));
    }
}
