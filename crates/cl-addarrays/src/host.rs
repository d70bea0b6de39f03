//! Host-seitige Arrays.
//!
//! Manche Treiber verlangen seitenausgerichteten Host-Speicher für
//! Zero-Copy-Transfers; [`AlignedHostBuffer`] liefert genau das und gibt den
//! Speicher im `Drop` wieder frei.

use crate::{ClError, Result};
use bytemuck::Pod;
use std::alloc::{alloc_zeroed, dealloc, Layout};
use std::ops::{Deref, DerefMut};
use std::ptr::NonNull;

/// Seitengröße, auf die ausgerichtet wird
pub const PAGE_ALIGN: usize = 4096;

pub struct AlignedHostBuffer<T: Pod> {
    ptr: NonNull<T>,
    len: usize,
    layout: Layout,
}

impl<T: Pod> AlignedHostBuffer<T> {
    /// Nullinitialisiert; für `Pod` ist das ein gültiger Wert.
    pub fn zeroed(len: usize) -> Result<Self> {
        let bytes = len
            .checked_mul(std::mem::size_of::<T>())
            .ok_or(ClError::InvalidSize(len))?;
        if bytes == 0 {
            return Err(ClError::InvalidSize(len));
        }
        let align = PAGE_ALIGN.max(std::mem::align_of::<T>());
        let layout = Layout::from_size_align(bytes, align).map_err(|_| ClError::Alloc { bytes, align })?;

        // Safety: layout hat Größe > 0
        let raw = unsafe { alloc_zeroed(layout) };
        let ptr = NonNull::new(raw.cast::<T>()).ok_or(ClError::Alloc { bytes, align })?;
        Ok(Self { ptr, len, layout })
    }

    pub fn as_ptr(&self) -> *const T {
        self.ptr.as_ptr()
    }

    pub fn align(&self) -> usize {
        self.layout.align()
    }
}

impl<T: Pod> Deref for AlignedHostBuffer<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        // Safety: ptr zeigt auf `len` initialisierte Elemente, die wir besitzen
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Pod> DerefMut for AlignedHostBuffer<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl<T: Pod> Drop for AlignedHostBuffer<T> {
    fn drop(&mut self) {
        // Safety: mit exakt diesem Layout allokiert
        unsafe { dealloc(self.ptr.as_ptr().cast::<u8>(), self.layout) }
    }
}

impl<T: Pod> std::fmt::Debug for AlignedHostBuffer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedHostBuffer")
            .field("len", &self.len)
            .field("align", &self.layout.align())
            .finish()
    }
}

// ─── HostArray ───────────────────────────────────────────────────────

/// Host-Array, wahlweise normal oder seitenausgerichtet alloziert.
#[derive(Debug)]
pub enum HostArray<T: Pod> {
    Plain(Vec<T>),
    Aligned(AlignedHostBuffer<T>),
}

impl<T: Pod> HostArray<T> {
    pub fn zeroed(len: usize, page_aligned: bool) -> Result<Self> {
        if page_aligned {
            AlignedHostBuffer::zeroed(len).map(HostArray::Aligned)
        } else {
            plain_zeroed(len).map(HostArray::Plain)
        }
    }

    pub fn is_page_aligned(&self) -> bool {
        (self.as_ptr() as usize) % PAGE_ALIGN == 0
    }
}

/// `Vec`-Variante; ein fehlgeschlagener Reserve-Aufruf wird zu [`ClError::Alloc`].
fn plain_zeroed<T: Pod>(len: usize) -> Result<Vec<T>> {
    if len == 0 {
        return Err(ClError::InvalidSize(len));
    }
    let mut v = Vec::new();
    v.try_reserve_exact(len).map_err(|_| ClError::Alloc {
        bytes: len.saturating_mul(std::mem::size_of::<T>()),
        align: std::mem::align_of::<T>(),
    })?;
    v.resize(len, T::zeroed());
    Ok(v)
}

impl<T: Pod> Deref for HostArray<T> {
    type Target = [T];

    fn deref(&self) -> &[T] {
        match self {
            HostArray::Plain(v) => v,
            HostArray::Aligned(a) => a,
        }
    }
}

impl<T: Pod> DerefMut for HostArray<T> {
    fn deref_mut(&mut self) -> &mut [T] {
        match self {
            HostArray::Plain(v) => v,
            HostArray::Aligned(a) => a,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligned_buffer_is_page_aligned_and_zeroed() {
        let buf = AlignedHostBuffer::<i32>::zeroed(1024).unwrap();
        assert_eq!(buf.len(), 1024);
        assert_eq!(buf.as_ptr() as usize % PAGE_ALIGN, 0);
        assert_eq!(buf.align(), PAGE_ALIGN);
        assert!(buf.iter().all(|&x| x == 0));
    }

    #[test]
    fn aligned_buffer_is_writable() {
        let mut buf = AlignedHostBuffer::<i32>::zeroed(3).unwrap();
        buf.copy_from_slice(&[7, 8, 9]);
        assert_eq!(&buf[..], &[7, 8, 9]);
    }

    #[test]
    fn zero_length_is_rejected() {
        assert!(matches!(
            AlignedHostBuffer::<i32>::zeroed(0),
            Err(ClError::InvalidSize(0))
        ));
    }

    #[test]
    fn overflowing_length_is_rejected() {
        assert!(matches!(
            AlignedHostBuffer::<u64>::zeroed(usize::MAX),
            Err(ClError::InvalidSize(_))
        ));
    }

    #[test]
    fn host_array_variants() {
        let aligned = HostArray::<i32>::zeroed(64, true).unwrap();
        assert!(matches!(aligned, HostArray::Aligned(_)));
        assert!(aligned.is_page_aligned());

        let plain = HostArray::<i32>::zeroed(64, false).unwrap();
        assert!(matches!(plain, HostArray::Plain(_)));
        assert_eq!(plain.len(), 64);
        assert!(plain.iter().all(|&x| x == 0));
    }

    #[test]
    fn plain_allocation_failure_is_an_error() {
        let err = HostArray::<u32>::zeroed(usize::MAX / 2, false).unwrap_err();
        match err {
            ClError::Alloc { bytes, align } => {
                assert_eq!(bytes, usize::MAX);
                assert_eq!(align, 4);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            HostArray::<u32>::zeroed(0, false),
            Err(ClError::InvalidSize(0))
        ));
    }
}
