#![cfg(feature = "metrics")]

use once_cell::sync::Lazy;
use std::{
    collections::BTreeMap,
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Instant,
};

/* ───────────── Schritt-Namen ──────────────── */

pub(crate) const ENQUEUE_WRITE: &str = "enqueue_write";
pub(crate) const ENQUEUE_READ: &str = "enqueue_read";
pub(crate) const BUILD: &str = "build";
pub(crate) const KERNEL: &str = "kernel";

/* ───────────── Roh‑Latenzen pro Schritt ──────────────── */

static TIMES: Lazy<Mutex<Vec<(&'static str, u128)>>> = Lazy::new(|| Mutex::new(Vec::new()));

/// Übertragene Bytes (H2D + D2H)
static TRANSFER_BYTES: AtomicUsize = AtomicUsize::new(0);

/// Im Wrapper aufrufen: `record(ENQUEUE_WRITE, Instant::now());`
pub fn record(name: &'static str, start: Instant) {
    let dur = start.elapsed().as_micros();
    if let Ok(mut times) = TIMES.lock() {
        times.push((name, dur));
    }
}

pub fn record_bytes(bytes: usize) {
    TRANSFER_BYTES.fetch_add(bytes, Ordering::Relaxed);
}

/// mean / p95 je Schritt, einmal am Programmende
pub(crate) fn render() -> String {
    let mut map: BTreeMap<&str, Vec<u128>> = BTreeMap::new();
    if let Ok(mut times) = TIMES.lock() {
        for (name, us) in times.drain(..) {
            map.entry(name).or_default().push(us);
        }
    }

    let mut out = String::from("── metrics summary ──\n");
    for (name, mut v) in map {
        v.sort_unstable();
        let mean = v.iter().sum::<u128>() / v.len() as u128;
        let p95 = v[((v.len() * 95) / 100).saturating_sub(1)];
        out.push_str(&format!("{:<18} mean={:>5} µs   p95={:>5} µs\n", name, mean, p95));
    }
    let bytes = TRANSFER_BYTES.load(Ordering::Relaxed);
    out.push_str(&format!("transferred: {} bytes", bytes));
    out
}

pub fn summary() {
    println!("{}", render());
}
