use crate::{ClError, Empty, Ready, Result, State};
use bytemuck::Pod;
use log::debug;
use opencl3::command_queue::CommandQueue;
use opencl3::context::Context;
use opencl3::memory::{Buffer, CL_MEM_READ_ONLY, CL_MEM_READ_WRITE, CL_MEM_WRITE_ONLY};
use opencl3::types::{cl_mem_flags, CL_BLOCKING};
use std::{marker::PhantomData, ptr};

#[cfg(feature = "metrics")]
use crate::metrics::{record, record_bytes, ENQUEUE_READ, ENQUEUE_WRITE};
#[cfg(feature = "metrics")]
use std::time::Instant;

/// Zugriffsmodus aus Sicht der Kernel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    WriteOnly,
    ReadWrite,
}

impl AccessMode {
    pub fn flags(self) -> cl_mem_flags {
        match self {
            AccessMode::ReadOnly => CL_MEM_READ_ONLY,
            AccessMode::WriteOnly => CL_MEM_WRITE_ONLY,
            AccessMode::ReadWrite => CL_MEM_READ_WRITE,
        }
    }
}

// ─── Device‑Buffer Wrapper ───────────────────────────────────────────

/// Gerätespeicher fester Kapazität. Der Treiber-Buffer wird im `Drop` des
/// inneren `Buffer` genau einmal freigegeben.
pub struct DeviceBuffer<T: Pod, S: State = Empty> {
    buf: Buffer<T>,
    len: usize,
    mode: AccessMode,
    _state: PhantomData<S>,
}

impl<T: Pod, S: State> std::fmt::Debug for DeviceBuffer<T, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeviceBuffer")
            .field("len", &self.len)
            .field("mode", &self.mode)
            .field("state", &std::any::type_name::<S>())
            .finish()
    }
}

// ── Empty ────────────────────────────────────────────────────────────
impl<T: Pod> DeviceBuffer<T, Empty> {
    /// legt `len` Elemente Gerätespeicher an, noch ohne Daten
    pub fn new(ctx: &Context, len: usize, mode: AccessMode) -> Result<Self> {
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(ClError::InvalidSize(len))?;
        if bytes == 0 {
            return Err(ClError::InvalidSize(len));
        }

        let buf = Buffer::<T>::create(ctx, mode.flags(), len, ptr::null_mut())
            .map_err(ClError::at("create buffer"))?;
        debug!("device buffer allocated: {len} elems, {bytes} bytes, {mode:?}");

        Ok(Self { buf, len, mode, _state: PhantomData })
    }
}

// ── alle States ──────────────────────────────────────────────────────
impl<T: Pod, S: State> DeviceBuffer<T, S> {
    /// Blockierender Host→Device-Transfer ab Offset 0; der Puffer ist danach `Ready`.
    pub fn write_blocking(mut self, queue: &CommandQueue, host: &[T]) -> Result<DeviceBuffer<T, Ready>> {
        self.check_capacity(host.len())?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();

        queue
            .enqueue_write_buffer(&mut self.buf, CL_BLOCKING, 0, host, &[])
            .map_err(ClError::at("write buffer"))?;

        #[cfg(feature = "metrics")]
        {
            record(ENQUEUE_WRITE, t);
            record_bytes(std::mem::size_of_val(host));
        }

        Ok(DeviceBuffer {
            buf: self.buf,
            len: self.len,
            mode: self.mode,
            _state: PhantomData,
        })
    }

    /// Blockierender Device→Host-Transfer ab Offset 0.
    pub fn read_blocking(&self, queue: &CommandQueue, host_out: &mut [T]) -> Result<()> {
        self.check_capacity(host_out.len())?;

        #[cfg(feature = "metrics")]
        let t = Instant::now();

        queue
            .enqueue_read_buffer(&self.buf, CL_BLOCKING, 0, host_out, &[])
            .map_err(ClError::at("read buffer"))?;

        #[cfg(feature = "metrics")]
        {
            record(ENQUEUE_READ, t);
            record_bytes(std::mem::size_of_val(host_out));
        }
        Ok(())
    }

    fn check_capacity(&self, requested: usize) -> Result<()> {
        check_capacity(requested, self.len)
    }

    #[inline(always)]
    pub fn raw(&self) -> &Buffer<T> {
        &self.buf
    }

    /// Kapazität in Elementen
    #[inline(always)]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn byte_len(&self) -> usize {
        self.len * std::mem::size_of::<T>()
    }
}

pub(crate) fn check_capacity(requested: usize, capacity: usize) -> Result<()> {
    if requested > capacity {
        return Err(ClError::Capacity { requested, capacity });
    }
    Ok(())
}
