//! Kontext + Command-Queue.
//!
//! Welcher Queue-Aufruf verwendet wird, entscheidet [`QueueConfig::detect`]
//! einmalig anhand der Plattform-Version; [`ClSession`] konsumiert das
//! Ergebnis einheitlich.

use crate::platform::{enumerate_platforms, select_platform};
use crate::{ClError, ClVersion, DeviceInfo, DeviceKind, PlatformChoice, PlatformInfo, Result};
use log::{debug, info, warn};
use opencl3::command_queue::{CommandQueue, CL_QUEUE_PROFILING_ENABLE};
use opencl3::context::Context;
use opencl3::device::Device;
use opencl3::types::cl_command_queue_properties;

/// Welcher Erzeugungs-Aufruf für die Queue
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueCreation {
    /// `clCreateCommandQueueWithProperties` (OpenCL ≥ 2.0)
    WithProperties,
    /// `clCreateCommandQueue` mit expliziten Property-Flags
    Legacy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueueConfig {
    pub creation: QueueCreation,
    pub properties: cl_command_queue_properties,
}

impl QueueConfig {
    pub fn detect(platform_version: Option<ClVersion>, profiling: bool) -> Self {
        let creation = match platform_version {
            Some(v) if v >= ClVersion::V2_0 => QueueCreation::WithProperties,
            Some(_) => QueueCreation::Legacy,
            None => {
                warn!("unknown platform version, falling back to legacy queue creation");
                QueueCreation::Legacy
            }
        };
        let properties = if profiling { CL_QUEUE_PROFILING_ENABLE } else { 0 };
        Self { creation, properties }
    }

    pub fn profiling(&self) -> bool {
        self.properties & CL_QUEUE_PROFILING_ENABLE != 0
    }
}

// ─── Session ─────────────────────────────────────────────────────────

/// Besitzt Kontext und Queue eines Geräts. Felder droppen in
/// Deklarations-Reihenfolge: Queue vor Kontext.
pub struct ClSession {
    queue: CommandQueue,
    context: Context,
    device_info: DeviceInfo,
    config: QueueConfig,
}

impl std::fmt::Debug for ClSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClSession")
            .field("device", &self.device_info.name)
            .field("config", &self.config)
            .finish()
    }
}

impl ClSession {
    /// Erstes Gerät der Plattform, Queue passend zur Plattform-Version.
    pub fn open(platform: &PlatformInfo, kind: DeviceKind, profiling: bool) -> Result<Self> {
        let (device, device_info) = platform.first_device(kind)?;
        let config = QueueConfig::detect(platform.version, profiling);
        Self::from_device(device, device_info, config)
    }

    /// Erste Plattform, erste GPU – für Tests und Benchmarks.
    pub fn open_default() -> Result<Self> {
        let platforms = enumerate_platforms()?;
        let platform = select_platform(&platforms, PlatformChoice::First)?;
        Self::open(platform, DeviceKind::Gpu, false)
    }

    pub fn from_device(device: Device, device_info: DeviceInfo, config: QueueConfig) -> Result<Self> {
        let context = Context::from_device(&device).map_err(ClError::at("create context"))?;
        let queue = create_queue(&context, &device, &config)?;
        info!(
            "queue created via {:?} (profiling: {})",
            config.creation,
            config.profiling()
        );
        Ok(Self { queue, context, device_info, config })
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn queue(&self) -> &CommandQueue {
        &self.queue
    }

    pub fn device_info(&self) -> &DeviceInfo {
        &self.device_info
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Blockiert, bis die Queue leer ist.
    pub fn finish(&self) -> Result<()> {
        debug!("draining command queue");
        self.queue.finish().map_err(ClError::at("finish queue"))
    }
}

fn create_queue(context: &Context, device: &Device, config: &QueueConfig) -> Result<CommandQueue> {
    let queue = match config.creation {
        QueueCreation::WithProperties => {
            CommandQueue::create_with_properties(context, device.id(), config.properties, 0)
        }
        QueueCreation::Legacy => CommandQueue::create(context, device.id(), config.properties),
    };
    queue.map_err(ClError::at("create command queue"))
}
