//! Laufkonfiguration – unabhängig von der CLI.

use crate::{ClError, Result};
use opencl3::device::{CL_DEVICE_TYPE_ALL, CL_DEVICE_TYPE_GPU};
use opencl3::types::{cl_device_type, cl_int};
use std::path::PathBuf;

pub const DEFAULT_LEN: usize = 1024;
pub const DEFAULT_WORK_GROUP: usize = 64;
pub const DEFAULT_KERNEL_FILE: &str = "AddArraysKernel.cl";
pub const DEFAULT_ENTRY: &str = "addArrays";
pub const DEFAULT_DISPLAY_LIMIT: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlatformChoice {
    #[default]
    First,
    Index(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeviceKind {
    #[default]
    Gpu,
    All,
}

impl DeviceKind {
    pub fn cl_type(self) -> cl_device_type {
        match self {
            DeviceKind::Gpu => CL_DEVICE_TYPE_GPU,
            DeviceKind::All => CL_DEVICE_TYPE_ALL,
        }
    }
}

/// Belegung der beiden Eingabe-Arrays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputPattern {
    /// `a[i] = i`, `b[i] = len - i` → jede Summe ist `len`
    #[default]
    Ascending,
    /// `a[i] = i`, `b[i] = len - 1 - i` → jede Summe ist `len - 1`
    Mirrored,
}

impl InputPattern {
    /// Füllt `a` und `b`; beide Slices müssen gleich lang sein.
    pub fn fill(self, a: &mut [cl_int], b: &mut [cl_int]) {
        debug_assert_eq!(a.len(), b.len());
        let len = a.len() as cl_int;
        let offset = match self {
            InputPattern::Ascending => 0,
            InputPattern::Mirrored => 1,
        };
        for (i, (x, y)) in a.iter_mut().zip(b.iter_mut()).enumerate() {
            let i = i as cl_int;
            *x = i;
            *y = len - offset - i;
        }
    }

    /// Summe, die jedes Ergebnis-Element haben muss.
    pub fn expected_sum(self, len: usize) -> cl_int {
        let len = len as cl_int;
        match self {
            InputPattern::Ascending => len,
            InputPattern::Mirrored => len - 1,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Anzahl Elemente (= globale Work-Items)
    pub len: usize,
    pub work_group_size: usize,
    pub kernel_path: PathBuf,
    pub entry: String,
    pub display_limit: usize,
    pub platform: PlatformChoice,
    pub device_kind: DeviceKind,
    pub profiling: bool,
    /// Host-Arrays seitenausgerichtet (4096 B) anlegen
    pub page_aligned: bool,
    pub pattern: InputPattern,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            len: DEFAULT_LEN,
            work_group_size: DEFAULT_WORK_GROUP,
            kernel_path: PathBuf::from(DEFAULT_KERNEL_FILE),
            entry: DEFAULT_ENTRY.to_owned(),
            display_limit: DEFAULT_DISPLAY_LIMIT,
            platform: PlatformChoice::First,
            device_kind: DeviceKind::Gpu,
            profiling: false,
            page_aligned: false,
            pattern: InputPattern::Ascending,
        }
    }
}

impl RunConfig {
    /// Prüft Größe und Work-Group-Teilbarkeit, bevor Treiber-Ressourcen entstehen.
    /// Nicht teilbare Größen werden abgelehnt, nicht aufgefüllt.
    pub fn validate(&self) -> Result<()> {
        if self.len == 0 || cl_int::try_from(self.len).is_err() {
            return Err(ClError::InvalidSize(self.len));
        }
        check_work_size(self.len, self.work_group_size)
    }
}

pub fn check_work_size(global: usize, local: usize) -> Result<()> {
    if local == 0 || global % local != 0 {
        return Err(ClError::WorkSize { global, local });
    }
    Ok(())
}

/// Die lokale Größe darf das Gerätemaximum nicht überschreiten.
pub fn check_work_group_limit(requested: usize, max: usize) -> Result<()> {
    if requested > max {
        return Err(ClError::WorkGroupTooLarge { requested, max });
    }
    Ok(())
}
