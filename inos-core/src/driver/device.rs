//! Device information driver: cpu, storage and jailbreak checks.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use super::measurement::{CpuInfo, Measurement, StorageInfo};
use super::registry::ProbeRegistry;
use super::traits::{AssessmentDriver, DriverKind, ProbeSender, ProbeUpdate};
use crate::assessment::Assessment;

/// Paths whose presence indicates a jailbroken device.
pub const JAILBREAK_MARKERS: [&str; 6] = [
    "/bin/bash",
    "/usr/sbin/sshd",
    "/etc/apt",
    "/private/var/lib/apt/",
    "/Applications/Cydia.app",
    "/Library/MobileSubstrate/MobileSubstrate.dylib",
];

/// Size of the scratch file used by the storage speed test.
pub const STORAGE_PROBE_BYTES: usize = 1024 * 1024;

/// Disk capacity in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DiskCapacity {
    pub total: u64,
    pub free: u64,
}

/// Static device facts the driver reads.
pub trait DeviceSource: Send + Sync {
    fn cpu(&self) -> CpuInfo;

    fn disk_capacity(&self) -> Option<DiskCapacity>;

    /// Physical memory in bytes, zero when unknown.
    fn physical_memory(&self) -> u64;

    fn path_exists(&self, path: &Path) -> bool;

    /// Directory the storage probe writes its scratch file into.
    fn scratch_dir(&self) -> PathBuf {
        std::env::temp_dir()
    }
}

/// Driver for assessments answered from device information.
///
/// Cpu and jailbreak outcomes are known as soon as the driver is built;
/// storage runs a short write/read speed test when started.
pub struct DeviceDriver {
    source: Arc<dyn DeviceSource>,
    registry: ProbeRegistry,
}

impl DeviceDriver {
    pub fn new(source: Arc<dyn DeviceSource>) -> Self {
        let driver = Self {
            source,
            registry: ProbeRegistry::new(),
        };
        driver.refresh();
        driver
    }

    /// Re-read the static facts behind the immediate assessments.
    pub fn refresh(&self) {
        let cpu = self.source.cpu();
        let identified = cpu.is_identified();
        self.registry
            .record(Assessment::Cpu, Measurement::Cpu(cpu), identified);

        let clean = !is_jailbroken(self.source.as_ref());
        self.registry
            .record(Assessment::Jailbreak, Measurement::Flag(clean), clean);
    }

    fn start_storage(&self, updates: ProbeSender) {
        let source = Arc::clone(&self.source);
        let registry = self.registry.clone();
        let task = tokio::spawn(async move {
            let info = measure_storage(source.as_ref()).await;
            let complete = info.is_complete();
            debug!(
                read_mbps = info.read_speed_mbps,
                write_mbps = info.write_speed_mbps,
                complete,
                "Storage probe finished"
            );
            registry.record(Assessment::Storage, Measurement::Storage(info), complete);
            let _ = updates.send(ProbeUpdate::Completed);
        });
        self.registry.track(Assessment::Storage, task);
    }
}

impl AssessmentDriver for DeviceDriver {
    fn kind(&self) -> DriverKind {
        DriverKind::Device
    }

    fn start(&self, assessment: Assessment, updates: ProbeSender) {
        match assessment {
            Assessment::Cpu | Assessment::Jailbreak => {
                self.refresh();
                let _ = updates.send(ProbeUpdate::Completed);
            }
            Assessment::Storage => self.start_storage(updates),
            other => debug!(assessment = %other, "Device driver does not probe this assessment"),
        }
    }

    fn stop(&self, assessment: Assessment) {
        self.registry.abort(assessment);
    }

    fn has_passed(&self) -> HashMap<Assessment, bool> {
        self.registry.passed()
    }

    fn measurements(&self) -> HashMap<Assessment, Measurement> {
        self.registry.measurements()
    }
}

/// True when any jailbreak marker path exists.
pub fn is_jailbroken(source: &dyn DeviceSource) -> bool {
    JAILBREAK_MARKERS
        .iter()
        .any(|marker| source.path_exists(Path::new(marker)))
}

async fn measure_storage(source: &dyn DeviceSource) -> StorageInfo {
    let capacity = source.disk_capacity().unwrap_or_default();
    let (write_speed_mbps, read_speed_mbps) = match measure_speeds(&source.scratch_dir()).await {
        Ok(speeds) => speeds,
        Err(e) => {
            warn!(error = %e, "Storage speed test failed");
            (0.0, 0.0)
        }
    };
    StorageInfo {
        read_speed_mbps,
        write_speed_mbps,
        total_space: capacity.total,
        free_space: capacity.free,
        total_ram: source.physical_memory(),
    }
}

/// Write then read a scratch file, returning (write, read) speeds in MB/s.
async fn measure_speeds(dir: &Path) -> std::io::Result<(f64, f64)> {
    let scratch = tempfile::tempdir_in(dir)?;
    let path = scratch.path().join("storage-probe.bin");
    let payload = vec![0xA5u8; STORAGE_PROBE_BYTES];

    let started = Instant::now();
    tokio::fs::write(&path, &payload).await?;
    let write = mb_per_sec(started.elapsed());

    let started = Instant::now();
    let read_back = tokio::fs::read(&path).await?;
    let read = mb_per_sec(started.elapsed());

    if read_back.len() != payload.len() {
        return Err(std::io::Error::other("short read from storage scratch file"));
    }
    Ok((write, read))
}

fn mb_per_sec(elapsed: Duration) -> f64 {
    let megabytes = STORAGE_PROBE_BYTES as f64 / (1024.0 * 1024.0);
    megabytes / elapsed.as_secs_f64().max(1e-6)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::driver::traits::probe_channel;

    struct FakeDevice {
        model: Option<String>,
        existing: HashSet<PathBuf>,
        scratch: PathBuf,
    }

    impl FakeDevice {
        fn new(scratch: &Path) -> Self {
            Self {
                model: Some("A15 Bionic".to_string()),
                existing: HashSet::new(),
                scratch: scratch.to_path_buf(),
            }
        }
    }

    impl DeviceSource for FakeDevice {
        fn cpu(&self) -> CpuInfo {
            CpuInfo {
                model: self.model.clone(),
                core_count: 6,
                architecture: "arm64".to_string(),
                frequency: Some("3.2 GHz".to_string()),
            }
        }

        fn disk_capacity(&self) -> Option<DiskCapacity> {
            Some(DiskCapacity {
                total: 128 << 30,
                free: 40 << 30,
            })
        }

        fn physical_memory(&self) -> u64 {
            4 << 30
        }

        fn path_exists(&self, path: &Path) -> bool {
            self.existing.contains(path)
        }

        fn scratch_dir(&self) -> PathBuf {
            self.scratch.clone()
        }
    }

    #[test]
    fn cpu_and_jailbreak_are_known_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let driver = DeviceDriver::new(Arc::new(FakeDevice::new(dir.path())));
        let passed = driver.has_passed();
        assert_eq!(passed.get(&Assessment::Cpu), Some(&true));
        assert_eq!(passed.get(&Assessment::Jailbreak), Some(&true));
    }

    #[test]
    fn marker_path_fails_jailbreak() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = FakeDevice::new(dir.path());
        device.existing.insert(PathBuf::from("/Applications/Cydia.app"));
        device.model = None;
        let driver = DeviceDriver::new(Arc::new(device));
        let passed = driver.has_passed();
        assert_eq!(passed.get(&Assessment::Jailbreak), Some(&false));
        assert_eq!(passed.get(&Assessment::Cpu), Some(&false));
    }

    #[tokio::test]
    async fn storage_probe_reports_completion() {
        let dir = tempfile::tempdir().unwrap();
        let driver = DeviceDriver::new(Arc::new(FakeDevice::new(dir.path())));
        let (tx, mut rx) = probe_channel();
        driver.start(Assessment::Storage, tx);

        assert_eq!(rx.recv().await, Some(ProbeUpdate::Completed));
        assert_eq!(driver.has_passed().get(&Assessment::Storage), Some(&true));
        match driver.measurements().get(&Assessment::Storage) {
            Some(Measurement::Storage(info)) => {
                assert_eq!(info.total_ram, 4 << 30);
                assert!(info.write_speed_mbps > 0.0);
            }
            other => panic!("unexpected measurement: {other:?}"),
        }
    }

    #[tokio::test]
    async fn unrelated_assessment_closes_probe() {
        let dir = tempfile::tempdir().unwrap();
        let driver = DeviceDriver::new(Arc::new(FakeDevice::new(dir.path())));
        let (tx, mut rx) = probe_channel();
        driver.start(Assessment::Wifi, tx);
        assert_eq!(rx.recv().await, None);
    }
}
