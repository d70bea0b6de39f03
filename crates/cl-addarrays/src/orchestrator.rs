//! Der komplette Ablauf: Discovery → Queue → Transfers → Build → Launch → Read-back.

use crate::config::check_work_group_limit;
use crate::kernel::{load_source, AddArraysProgram};
use crate::platform::{enumerate_platforms, select_platform};
use crate::{
    AccessMode, ClError, ClSession, DeviceBuffer, HostArray, InputPattern, Result, RunConfig,
};
use log::{debug, info};
use opencl3::event::Event;
use opencl3::types::cl_int;

#[cfg(feature = "metrics")]
use crate::metrics::{record, BUILD, KERNEL};
#[cfg(feature = "metrics")]
use std::time::Instant;

/// Ergebnis eines Laufs; Host-Arrays bleiben für Anzeige und Prüfung erhalten.
#[derive(Debug)]
pub struct RunReport {
    pub input_a: HostArray<cl_int>,
    pub input_b: HostArray<cl_int>,
    pub output: HostArray<cl_int>,
    pub pattern: InputPattern,
    /// Kernel-Laufzeit laut Event-Profiling (nur mit Profiling-Queue)
    pub kernel_time_ns: Option<u64>,
}

impl RunReport {
    pub fn len(&self) -> usize {
        self.output.len()
    }

    pub fn is_empty(&self) -> bool {
        self.output.is_empty()
    }

    /// `(i, a, b, c)` je Element
    pub fn triples(&self) -> impl Iterator<Item = (usize, cl_int, cl_int, cl_int)> + '_ {
        self.input_a
            .iter()
            .zip(self.input_b.iter())
            .zip(self.output.iter())
            .enumerate()
            .map(|(i, ((&a, &b), &c))| (i, a, b, c))
    }

    /// Erste Abweichung von `c[i] == a[i] + b[i]`; danach muss jedes `c[i]`
    /// der konstanten Summe des Eingabemusters entsprechen.
    pub fn verify(&self) -> Result<()> {
        let constant = self.pattern.expected_sum(self.len());
        for (index, a, b, actual) in self.triples() {
            let sum = a.wrapping_add(b);
            if actual != sum {
                return Err(ClError::Mismatch { index, expected: sum, actual });
            }
            if actual != constant {
                return Err(ClError::Mismatch { index, expected: constant, actual });
            }
        }
        Ok(())
    }
}

/// Plattform wählen, Session öffnen, ausführen.
pub fn run(config: &RunConfig) -> Result<RunReport> {
    config.validate()?;
    let platforms = enumerate_platforms()?;
    let platform = select_platform(&platforms, config.platform)?;
    info!("using platform {}: {}", platform.index, platform.name);

    let session = ClSession::open(platform, config.device_kind, config.profiling)?;
    execute(&session, config)
}

/// Ein Batch, ein Kernel-Aufruf auf einer bestehenden Session.
pub fn execute(session: &ClSession, config: &RunConfig) -> Result<RunReport> {
    config.validate()?;
    check_work_group_limit(config.work_group_size, session.device_info().max_work_group_size)?;

    let len = config.len;
    let ctx = session.context();
    let queue = session.queue();

    /* ---------- Hostdaten ---------------------------------------- */
    let mut input_a = HostArray::<cl_int>::zeroed(len, config.page_aligned)?;
    let mut input_b = HostArray::<cl_int>::zeroed(len, config.page_aligned)?;
    config.pattern.fill(&mut input_a, &mut input_b);

    /* ---------- Device-Buffer ------------------------------------ */
    let a_dev = DeviceBuffer::<cl_int>::new(ctx, len, AccessMode::ReadOnly)?;
    let b_dev = DeviceBuffer::<cl_int>::new(ctx, len, AccessMode::ReadOnly)?;
    let c_dev = DeviceBuffer::<cl_int>::new(ctx, len, AccessMode::WriteOnly)?;

    /* ---------- Host → Device (blockierend) ---------------------- */
    let a_dev = a_dev.write_blocking(queue, &input_a)?;
    let b_dev = b_dev.write_blocking(queue, &input_b)?;
    debug!("inputs transferred ({} bytes each)", a_dev.byte_len());

    /* ---------- Kernel ------------------------------------------- */
    #[cfg(feature = "metrics")]
    let t = Instant::now();

    let source = load_source(&config.kernel_path)?;
    let program = AddArraysProgram::build(ctx, &source, &config.entry)?;

    #[cfg(feature = "metrics")]
    record(BUILD, t);
    #[cfg(feature = "metrics")]
    let t = Instant::now();

    let bound = program.bind(&a_dev, &b_dev, &c_dev)?;
    let evt = bound.dispatch(queue, config.work_group_size)?;
    session.finish()?;

    #[cfg(feature = "metrics")]
    record(KERNEL, t);

    let kernel_time_ns = if session.config().profiling() {
        Some(kernel_time(&evt)?)
    } else {
        None
    };

    /* ---------- Device → Host ------------------------------------ */
    let mut output = HostArray::<cl_int>::zeroed(len, config.page_aligned)?;
    c_dev.read_blocking(queue, &mut output)?;
    info!("read back {len} results");

    Ok(RunReport {
        input_a,
        input_b,
        output,
        pattern: config.pattern,
        kernel_time_ns,
    })
}

fn kernel_time(evt: &Event) -> Result<u64> {
    let start = evt
        .profiling_command_start()
        .map_err(ClError::at("query profiling start"))?;
    let end = evt
        .profiling_command_end()
        .map_err(ClError::at("query profiling end"))?;
    Ok(end.saturating_sub(start))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(a: Vec<cl_int>, b: Vec<cl_int>, c: Vec<cl_int>) -> RunReport {
        RunReport {
            input_a: HostArray::Plain(a),
            input_b: HostArray::Plain(b),
            output: HostArray::Plain(c),
            pattern: InputPattern::Ascending,
            kernel_time_ns: None,
        }
    }

    fn filled(len: usize, pattern: InputPattern) -> RunReport {
        let mut a = vec![0; len];
        let mut b = vec![0; len];
        pattern.fill(&mut a, &mut b);
        let c = a.iter().zip(&b).map(|(x, y)| x + y).collect();
        RunReport { pattern, ..report(a, b, c) }
    }

    #[test]
    fn verify_accepts_correct_sums() {
        let r = report(vec![0, 1, 2], vec![3, 2, 1], vec![3, 3, 3]);
        assert!(r.verify().is_ok());
        assert_eq!(r.len(), 3);
    }

    #[test]
    fn verify_reports_first_mismatch() {
        let r = report(vec![0, 1, 2], vec![3, 2, 1], vec![3, 4, 0]);
        assert!(matches!(
            r.verify(),
            Err(ClError::Mismatch { index: 1, expected: 3, actual: 4 })
        ));
    }

    #[test]
    fn verify_accepts_both_patterns_at_1024() {
        assert!(filled(1024, InputPattern::Ascending).verify().is_ok());
        assert!(filled(1024, InputPattern::Mirrored).verify().is_ok());
    }

    #[test]
    fn verify_rejects_sums_that_miss_the_pattern_constant() {
        // a + b == c überall, aber die Eingaben gehören nicht zum Muster
        let r = report(vec![1, 1, 1], vec![1, 1, 1], vec![2, 2, 2]);
        assert!(matches!(
            r.verify(),
            Err(ClError::Mismatch { index: 0, expected: 3, actual: 2 })
        ));
    }

    #[test]
    fn triples_enumerate_inputs_and_output() {
        let r = report(vec![5, 6], vec![1, 2], vec![6, 8]);
        let t: Vec<_> = r.triples().collect();
        assert_eq!(t, vec![(0, 5, 1, 6), (1, 6, 2, 8)]);
    }

    #[test]
    fn run_rejects_bad_work_size_before_touching_the_driver() {
        let cfg = RunConfig { len: 100, ..RunConfig::default() };
        assert!(matches!(run(&cfg), Err(ClError::WorkSize { global: 100, local: 64 })));
    }
}
