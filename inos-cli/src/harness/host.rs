//! Device and power information read from the machine the harness runs on.

use std::path::{Path, PathBuf};

use inos_core::driver::{BatteryState, CpuInfo, DeviceSource, DiskCapacity, PowerSource};
use tokio::sync::broadcast;
use tracing::debug;

/// Device information from the host OS.
///
/// Jailbreak markers are only looked up under a mounted device `root`. The
/// host's own filesystem carries several of them (`/bin/bash`, `/etc/apt`),
/// so without a root none are reported.
pub struct HostDeviceSource {
    root: Option<PathBuf>,
}

impl HostDeviceSource {
    pub fn new(root: Option<PathBuf>) -> Self {
        Self { root }
    }

    fn resolve(&self, path: &Path) -> Option<PathBuf> {
        let root = self.root.as_ref()?;
        Some(root.join(path.strip_prefix("/").unwrap_or(path)))
    }
}

impl DeviceSource for HostDeviceSource {
    fn cpu(&self) -> CpuInfo {
        CpuInfo {
            model: cpu_model(),
            core_count: std::thread::available_parallelism()
                .map(usize::from)
                .unwrap_or(1),
            architecture: std::env::consts::ARCH.to_string(),
            frequency: cpu_frequency(),
        }
    }

    fn disk_capacity(&self) -> Option<DiskCapacity> {
        disk_capacity(self.root.as_deref().unwrap_or(Path::new("/")))
    }

    fn physical_memory(&self) -> u64 {
        physical_memory()
    }

    fn path_exists(&self, path: &Path) -> bool {
        self.resolve(path).is_some_and(|path| path.exists())
    }
}

fn cpu_model() -> Option<String> {
    cpuinfo_field("model name").or_else(|| cpuinfo_field("Hardware"))
}

fn cpu_frequency() -> Option<String> {
    let mhz: f64 = cpuinfo_field("cpu MHz")?.parse().ok()?;
    Some(format!("{:.2} GHz", mhz / 1000.0))
}

fn cpuinfo_field(name: &str) -> Option<String> {
    let cpuinfo = std::fs::read_to_string("/proc/cpuinfo").ok()?;
    parse_cpuinfo_field(&cpuinfo, name)
}

fn parse_cpuinfo_field(cpuinfo: &str, name: &str) -> Option<String> {
    cpuinfo.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == name && !value.trim().is_empty()).then(|| value.trim().to_string())
    })
}

#[cfg(unix)]
fn disk_capacity(path: &Path) -> Option<DiskCapacity> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes()).ok()?;
    let mut stat = std::mem::MaybeUninit::<libc::statvfs>::uninit();
    // SAFETY: c_path is NUL-terminated and stat is only read after success
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), stat.as_mut_ptr()) };
    if rc != 0 {
        debug!(path = %path.display(), "statvfs failed");
        return None;
    }
    // SAFETY: statvfs returned 0 and filled the struct
    let stat = unsafe { stat.assume_init() };
    let block = stat.f_frsize as u64;
    Some(DiskCapacity {
        total: stat.f_blocks as u64 * block,
        free: stat.f_bavail as u64 * block,
    })
}

#[cfg(not(unix))]
fn disk_capacity(_path: &Path) -> Option<DiskCapacity> {
    None
}

#[cfg(unix)]
fn physical_memory() -> u64 {
    // SAFETY: sysconf has no preconditions
    let (pages, page_size) =
        unsafe { (libc::sysconf(libc::_SC_PHYS_PAGES), libc::sysconf(libc::_SC_PAGESIZE)) };
    if pages <= 0 || page_size <= 0 {
        return 0;
    }
    pages as u64 * page_size as u64
}

#[cfg(not(unix))]
fn physical_memory() -> u64 {
    0
}

const POWER_SUPPLY_DIR: &str = "/sys/class/power_supply";

/// Battery and charger state from the kernel's power supply class.
pub struct HostPowerSource {
    dir: PathBuf,
    // Sysfs has no change notification; the sender only keeps receivers open.
    changes: broadcast::Sender<BatteryState>,
}

impl HostPowerSource {
    pub fn new() -> Self {
        Self::with_dir(POWER_SUPPLY_DIR)
    }

    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        let (changes, _) = broadcast::channel(8);
        Self {
            dir: dir.into(),
            changes,
        }
    }

    /// Supplies of the given sysfs `type` ("Battery", "Mains", "USB", ...).
    fn supplies(&self, kind: &str) -> Vec<PathBuf> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };
        let mut supplies: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| read_attr(path, "type").as_deref() == Some(kind))
            .collect();
        supplies.sort();
        supplies
    }

    fn battery(&self) -> Option<PathBuf> {
        self.supplies("Battery").into_iter().next()
    }

    fn any_online(&self, kind: &str) -> bool {
        self.supplies(kind)
            .iter()
            .any(|supply| read_attr(supply, "online").as_deref() == Some("1"))
    }
}

impl Default for HostPowerSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerSource for HostPowerSource {
    fn battery_level(&self) -> Option<f32> {
        let capacity: f32 = read_attr(&self.battery()?, "capacity")?.parse().ok()?;
        Some((capacity / 100.0).clamp(0.0, 1.0))
    }

    fn battery_state(&self) -> BatteryState {
        let Some(battery) = self.battery() else {
            return BatteryState::Unknown;
        };
        match read_attr(&battery, "status").as_deref() {
            Some("Charging") => BatteryState::Charging,
            Some("Full") => BatteryState::Full,
            Some("Discharging") | Some("Not charging") => BatteryState::Unplugged,
            _ => BatteryState::Unknown,
        }
    }

    fn state_changes(&self) -> broadcast::Receiver<BatteryState> {
        self.changes.subscribe()
    }

    fn accessory_connected(&self) -> bool {
        self.any_online("USB") || self.any_online("Mains")
    }
}

fn read_attr(supply: &Path, name: &str) -> Option<String> {
    std::fs::read_to_string(supply.join(name))
        .ok()
        .map(|value| value.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn supply(dir: &TempDir, name: &str, attrs: &[(&str, &str)]) {
        let path = dir.path().join(name);
        std::fs::create_dir_all(&path).unwrap();
        for (attr, value) in attrs {
            std::fs::write(path.join(attr), format!("{value}\n")).unwrap();
        }
    }

    // ==================== Device Tests ====================

    #[test]
    fn parses_cpuinfo_fields() {
        let cpuinfo = "processor\t: 0\nmodel name\t: Example CPU @ 3.00GHz\ncpu MHz\t\t: 2995.201\n";
        assert_eq!(
            parse_cpuinfo_field(cpuinfo, "model name").as_deref(),
            Some("Example CPU @ 3.00GHz")
        );
        assert_eq!(parse_cpuinfo_field(cpuinfo, "Hardware"), None);
    }

    #[test]
    fn markers_resolve_under_root() {
        let root = TempDir::new().unwrap();
        std::fs::create_dir_all(root.path().join("etc/apt")).unwrap();
        let source = HostDeviceSource::new(Some(root.path().to_path_buf()));

        assert!(source.path_exists(Path::new("/etc/apt")));
        assert!(!source.path_exists(Path::new("/Applications/Cydia.app")));
    }

    #[test]
    fn host_filesystem_is_not_searched_without_root() {
        let source = HostDeviceSource::new(None);
        assert!(!source.path_exists(Path::new("/bin/bash")));
        assert!(!source.path_exists(Path::new("/")));
    }

    #[cfg(unix)]
    #[test]
    fn reports_disk_and_memory() {
        let root = TempDir::new().unwrap();
        let source = HostDeviceSource::new(Some(root.path().to_path_buf()));

        let disk = source.disk_capacity().unwrap();
        assert!(disk.total >= disk.free);
        assert!(source.physical_memory() > 0);
        assert!(source.cpu().core_count >= 1);
    }

    // ==================== Power Tests ====================

    #[test]
    fn reads_battery_from_sysfs() {
        let dir = TempDir::new().unwrap();
        supply(
            &dir,
            "BAT0",
            &[("type", "Battery"), ("capacity", "64"), ("status", "Charging")],
        );
        supply(&dir, "AC", &[("type", "Mains"), ("online", "1")]);
        let power = HostPowerSource::with_dir(dir.path());

        assert_eq!(power.battery_level(), Some(0.64));
        assert_eq!(power.battery_state(), BatteryState::Charging);
        assert!(power.accessory_connected());
    }

    #[test]
    fn no_battery_is_unknown() {
        let dir = TempDir::new().unwrap();
        let power = HostPowerSource::with_dir(dir.path());

        assert_eq!(power.battery_level(), None);
        assert_eq!(power.battery_state(), BatteryState::Unknown);
        assert!(!power.accessory_connected());
    }
}
