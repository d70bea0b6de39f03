//! Kernel-Quelle laden, Programm bauen, Argumente binden, starten.
//!
//! Ein [`BoundKernel`] entsteht nur über [`AddArraysProgram::bind`], also erst
//! wenn alle drei Positions-Argumente gesetzt sind.

use crate::buffer::{check_capacity, DeviceBuffer};
use crate::config::check_work_size;
use crate::{ClError, Ready, Result, State};
use bytemuck::Pod;
use log::{debug, info};
use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::event::Event;
use opencl3::kernel::Kernel;
use opencl3::program::Program;
use std::path::Path;
use std::{fs, ptr};

/// Liest die komplette Kernel-Quelle.
pub fn load_source(path: impl AsRef<Path>) -> Result<String> {
    let path = path.as_ref();
    let src = fs::read_to_string(path).map_err(|source| ClError::KernelSource {
        path: path.to_path_buf(),
        source,
    })?;
    debug!("loaded kernel source {} ({} bytes)", path.display(), src.len());
    Ok(src)
}

/// Gebautes Programm samt Einstiegspunkt. `kernel` droppt vor `program`.
pub struct AddArraysProgram {
    kernel: Kernel,
    _program: Program,
    entry: String,
}

impl std::fmt::Debug for AddArraysProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddArraysProgram").field("entry", &self.entry).finish()
    }
}

impl AddArraysProgram {
    /// Baut ohne Compiler-Optionen; ein Build-Fehler liefert das Build-Log.
    pub fn build(ctx: &Context, source: &str, entry: &str) -> Result<Self> {
        let program = Program::create_and_build_from_source(ctx, source, "")
            .map_err(|log| ClError::Build { log })?;
        let kernel = Kernel::create(&program, entry).map_err(ClError::at("create kernel"))?;
        info!("kernel '{entry}' built");

        Ok(Self { kernel, _program: program, entry: entry.to_owned() })
    }

    /// Bindet 0 → A, 1 → B, 2 → C. Die globale Größe ist die Kapazität von C;
    /// A und B müssen mindestens so groß sein.
    pub fn bind<'a, T: Pod, S: State>(
        &'a self,
        a: &'a DeviceBuffer<T, Ready>,
        b: &'a DeviceBuffer<T, Ready>,
        c: &'a DeviceBuffer<T, S>,
    ) -> Result<BoundKernel<'a>> {
        let global = c.len();
        check_capacity(global, a.len())?;
        check_capacity(global, b.len())?;

        self.kernel.set_arg(0, a.raw()).map_err(ClError::at("bind argument 0"))?;
        self.kernel.set_arg(1, b.raw()).map_err(ClError::at("bind argument 1"))?;
        self.kernel.set_arg(2, c.raw()).map_err(ClError::at("bind argument 2"))?;

        Ok(BoundKernel { kernel: &self.kernel, global })
    }
}

/// Kernel mit vollständig gebundenen Argumenten.
#[derive(Debug)]
pub struct BoundKernel<'a> {
    kernel: &'a Kernel,
    global: usize,
}

impl BoundKernel<'_> {
    pub fn global_size(&self) -> usize {
        self.global
    }

    /// 1-D-Launch; `global` muss ein Vielfaches von `local` sein.
    pub fn dispatch(&self, queue: &CommandQueue, local: usize) -> Result<Event> {
        check_work_size(self.global, local)?;

        let global = [self.global, 1, 1];
        let local = [local, 1, 1];
        debug!("dispatch: global={} local={}", global[0], local[0]);

        queue
            .enqueue_nd_range_kernel(
                self.kernel.get(),
                1,
                ptr::null(),
                global.as_ptr(),
                local.as_ptr(),
                &[],
            )
            .map_err(ClError::at("enqueue kernel"))
    }
}
