//! Plattform‑ und Geräte‑Discovery.
//!
//! Jede Plattform wird in einen eigenen [`PlatformInfo`] abgefragt; Namen und
//! Versionen landen in frischen `String`s pro Plattform.

use crate::{ClError, DeviceKind, PlatformChoice, Result};
use log::{debug, info};
use opencl3::device::Device;
use opencl3::platform::{get_platforms, Platform};
use std::fmt;

/// `CL_PLATFORM_NOT_FOUND_KHR` – ICD-Loader ohne installierte Treiber
const PLATFORM_NOT_FOUND_KHR: i32 = -1001;
/// `CL_DEVICE_NOT_FOUND`
const DEVICE_NOT_FOUND: i32 = -1;

// ─── Version ─────────────────────────────────────────────────────────

/// OpenCL-Version `major.minor`, geordnet nach (major, minor).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClVersion {
    pub major: u32,
    pub minor: u32,
}

impl ClVersion {
    pub const V2_0: ClVersion = ClVersion { major: 2, minor: 0 };

    pub const fn new(major: u32, minor: u32) -> Self {
        Self { major, minor }
    }

    /// Parst das erste `x.y`-Token aus Strings wie `"OpenCL 2.1 AMD-APP (3513.0)"`
    /// oder `"OpenCL C 1.2 "`.
    pub fn parse(s: &str) -> Option<Self> {
        s.split_whitespace().find_map(|tok| {
            let (major, rest) = tok.split_once('.')?;
            let minor: String = rest.chars().take_while(char::is_ascii_digit).collect();
            Some(Self {
                major: major.parse().ok()?,
                minor: minor.parse().ok()?,
            })
        })
    }
}

impl fmt::Display for ClVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)
    }
}

// ─── Plattform ───────────────────────────────────────────────────────

/// Eine aufgezählte OpenCL-Plattform samt abgefragter Strings.
#[derive(Debug, Clone)]
pub struct PlatformInfo {
    pub index: usize,
    pub name: String,
    pub vendor: String,
    pub version_string: String,
    /// `None`, wenn der Treiber einen unlesbaren Versions-String liefert
    pub version: Option<ClVersion>,
    pub(crate) platform: Platform,
}

impl PlatformInfo {
    fn query(index: usize, platform: Platform) -> Result<Self> {
        let name = platform.name().map_err(ClError::at("query platform name"))?;
        let vendor = platform.vendor().map_err(ClError::at("query platform vendor"))?;
        let version_string = platform
            .version()
            .map_err(ClError::at("query platform version"))?;
        let version = ClVersion::parse(&version_string);
        debug!("platform {index}: {name} ({version_string})");

        Ok(Self { index, name, vendor, version_string, version, platform })
    }

    /// Erstes Gerät der gewünschten Art auf dieser Plattform.
    pub fn first_device(&self, kind: DeviceKind) -> Result<(Device, DeviceInfo)> {
        let ids = match self.platform.get_devices(kind.cl_type()) {
            Ok(ids) => ids,
            Err(e) if e.0 == DEVICE_NOT_FOUND => Vec::new(),
            Err(e) => return Err(ClError::at("enumerate devices")(e)),
        };
        let id = *ids.first().ok_or_else(|| ClError::NoDevice {
            platform: self.name.clone(),
        })?;

        let device = Device::new(id);
        let info = DeviceInfo::query(&device)?;
        info!("selected device '{}' on platform '{}'", info.name, self.name);
        Ok((device, info))
    }
}

/// Listet alle Plattformen; keine Plattform ist ein fataler Konfigurationsfehler.
pub fn enumerate_platforms() -> Result<Vec<PlatformInfo>> {
    let platforms = match get_platforms() {
        Ok(p) => p,
        Err(e) if e.0 == PLATFORM_NOT_FOUND_KHR => Vec::new(),
        Err(e) => return Err(ClError::at("enumerate platforms")(e)),
    };
    if platforms.is_empty() {
        return Err(ClError::NoPlatforms);
    }

    platforms
        .into_iter()
        .enumerate()
        .map(|(index, platform)| PlatformInfo::query(index, platform))
        .collect()
}

/// Wählt eine Plattform aus der Liste, mit Bounds-Check.
pub fn select_platform(platforms: &[PlatformInfo], choice: PlatformChoice) -> Result<&PlatformInfo> {
    let index = match choice {
        PlatformChoice::First => 0,
        PlatformChoice::Index(i) => i,
    };
    platforms.get(index).ok_or(ClError::PlatformIndex {
        index,
        count: platforms.len(),
    })
}

// ─── Gerät ───────────────────────────────────────────────────────────

/// Versions- und Fähigkeits-Strings eines Geräts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceInfo {
    pub name: String,
    pub vendor: String,
    pub version_string: String,
    pub opencl_c_version: String,
    pub driver_version: String,
    pub max_work_group_size: usize,
}

impl DeviceInfo {
    pub fn query(device: &Device) -> Result<Self> {
        Ok(Self {
            name: device.name().map_err(ClError::at("query device name"))?,
            vendor: device.vendor().map_err(ClError::at("query device vendor"))?,
            version_string: device.version().map_err(ClError::at("query device version"))?,
            opencl_c_version: device
                .opencl_c_version()
                .map_err(ClError::at("query OpenCL C version"))?,
            driver_version: device
                .driver_version()
                .map_err(ClError::at("query driver version"))?,
            max_work_group_size: device
                .max_work_group_size()
                .map_err(ClError::at("query max work-group size"))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vendor_version_strings() {
        assert_eq!(ClVersion::parse("OpenCL 2.1 AMD-APP (3513.0)"), Some(ClVersion::new(2, 1)));
        assert_eq!(ClVersion::parse("OpenCL 3.0 CUDA 12.2.148"), Some(ClVersion::new(3, 0)));
        assert_eq!(ClVersion::parse("OpenCL C 1.2 "), Some(ClVersion::new(1, 2)));
        assert_eq!(ClVersion::parse("OpenCL 1.2"), Some(ClVersion::new(1, 2)));
    }

    #[test]
    fn rejects_strings_without_version() {
        assert_eq!(ClVersion::parse(""), None);
        assert_eq!(ClVersion::parse("OpenCL"), None);
        assert_eq!(ClVersion::parse("OpenCL x.y"), None);
    }

    #[test]
    fn versions_order_by_major_then_minor() {
        assert!(ClVersion::new(1, 2) < ClVersion::V2_0);
        assert!(ClVersion::new(2, 0) >= ClVersion::V2_0);
        assert!(ClVersion::new(1, 10) < ClVersion::new(2, 0));
        assert!(ClVersion::new(3, 0) > ClVersion::new(2, 2));
        assert_eq!(ClVersion::new(2, 1).to_string(), "2.1");
    }

    #[test]
    fn select_platform_checks_bounds() {
        let empty: Vec<PlatformInfo> = Vec::new();
        let err = select_platform(&empty, PlatformChoice::First).unwrap_err();
        assert!(matches!(err, ClError::PlatformIndex { index: 0, count: 0 }));

        let err = select_platform(&empty, PlatformChoice::Index(3)).unwrap_err();
        assert!(matches!(err, ClError::PlatformIndex { index: 3, count: 0 }));
    }
}
