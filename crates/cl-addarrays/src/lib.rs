//! Host-Orchestrierung für die `addArrays`-Kernel: Plattform/Gerät wählen,
//! Queue anlegen, Puffer transferieren, Kernel bauen und starten, Ergebnis
//! zurücklesen. Alle Treiber-Handles sind RAII-Wrapper.

// ─── Feature‑Module ───────────────────────────────────────────────────
#[cfg(feature = "metrics")]
mod metrics;
#[cfg(feature = "metrics")]
pub use metrics::{record, record_bytes, summary};

// ─── Module ───────────────────────────────────────────────────────────
pub mod buffer;
pub mod cli;
pub mod config;
pub mod host;
pub mod kernel;
pub mod orchestrator;
pub mod platform;
pub mod queue;

pub use buffer::{AccessMode, DeviceBuffer};
pub use config::{DeviceKind, InputPattern, PlatformChoice, RunConfig};
pub use host::{AlignedHostBuffer, HostArray, PAGE_ALIGN};
pub use kernel::{AddArraysProgram, BoundKernel};
pub use orchestrator::{execute, run, RunReport};
pub use platform::{ClVersion, DeviceInfo, PlatformInfo};
pub use queue::{ClSession, QueueConfig, QueueCreation};

use std::path::PathBuf;

// ─── Fehler‑Typ ───────────────────────────────────────────────────────
#[derive(thiserror::Error, Debug)]
pub enum ClError {
    #[error("OpenCL API error: {0}")]
    Api(i32),
    #[error("OpenCL API error {code} during {step}")]
    Step { step: &'static str, code: i32 },
    #[error("no OpenCL platform found")]
    NoPlatforms,
    #[error("no matching OpenCL device on platform '{platform}'")]
    NoDevice { platform: String },
    #[error("platform index {index} out of range ({count} platforms available)")]
    PlatformIndex { index: usize, count: usize },
    #[error("cannot read kernel source '{}': {source}", path.display())]
    KernelSource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("kernel build failed:\n{log}")]
    Build { log: String },
    #[error("transfer of {requested} elements exceeds buffer capacity of {capacity}")]
    Capacity { requested: usize, capacity: usize },
    #[error("Invalid buffer size: {0}")]
    InvalidSize(usize),
    #[error("global work size {global} is not a multiple of work-group size {local}")]
    WorkSize { global: usize, local: usize },
    #[error("work-group size {requested} exceeds device maximum {max}")]
    WorkGroupTooLarge { requested: usize, max: usize },
    #[error("host allocation of {bytes} bytes (align {align}) failed")]
    Alloc { bytes: usize, align: usize },
    #[error("result mismatch at index {index}: expected {expected}, got {actual}")]
    Mismatch { index: usize, expected: i32, actual: i32 },
    #[error("invalid input: {0}")]
    Input(String),
    #[error("console I/O failed: {0}")]
    Console(#[from] std::io::Error),
}

impl From<opencl3::error_codes::ClError> for ClError {
    #[inline]
    fn from(err: opencl3::error_codes::ClError) -> Self {
        ClError::Api(err.0)
    }
}

impl From<i32> for ClError {
    #[inline]
    fn from(code: i32) -> Self {
        ClError::Api(code)
    }
}

impl ClError {
    /// Versieht einen Treiberfehler mit dem Orchestrierungs-Schritt.
    pub(crate) fn at(step: &'static str) -> impl FnOnce(opencl3::error_codes::ClError) -> ClError {
        move |err| ClError::Step { step, code: err.0 }
    }
}

pub type Result<T> = std::result::Result<T, ClError>;

// ─── Typ‑State‑Marker ────────────────────────────────────────────────
mod sealed {
    pub trait Sealed {}
}

/// Zero-size trait für compile-time state eines Device-Puffers
pub trait State: sealed::Sealed {}

/// allokiert, noch keine Host-Daten übertragen
pub struct Empty;
impl sealed::Sealed for Empty {}
impl State for Empty {}

/// Host-Daten sind (blockierend) auf dem Gerät angekommen
pub struct Ready;
impl sealed::Sealed for Ready {}
impl State for Ready {}
