//! Stage timings (load, compute, write) for procedure-style reporting.

use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde_json::json;

/// Durations per stage, in first-recorded order.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TimingReport {
    pub stages: Vec<StageTiming>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageTiming {
    pub name: String,
    pub count: usize,
    pub total: Duration,
    pub max: Duration,
}

thread_local! {
    static SAMPLES: RefCell<Vec<(String, Duration)>> = const { RefCell::new(Vec::new()) };
}

static TIMING_ENABLED: AtomicBool = AtomicBool::new(false);

/// True when `GALGO_TIMING` is `1`, `true`, `yes`, or `on` (any case).
#[must_use]
pub fn timing_enabled_from_env() -> bool {
    std::env::var("GALGO_TIMING")
        .ok()
        .is_some_and(|value| is_truthy(&value))
}

pub fn set_timing_enabled(enabled: bool) {
    TIMING_ENABLED.store(enabled, Ordering::Relaxed);
    if !enabled {
        clear_timings();
    }
}

#[must_use]
pub fn is_timing_enabled() -> bool {
    TIMING_ENABLED.load(Ordering::Relaxed)
}

/// Drop the current thread's samples.
pub fn clear_timings() {
    SAMPLES.with(|samples| samples.borrow_mut().clear());
}

/// Run `f`, recording its duration under `stage` when timing is enabled.
pub fn timed<R>(stage: &str, f: impl FnOnce() -> R) -> R {
    if !is_timing_enabled() {
        return f();
    }
    let started = Instant::now();
    let result = f();
    record(stage, started.elapsed());
    result
}

/// Drain this thread's samples into a report.
#[must_use]
pub fn collect_report() -> TimingReport {
    let samples = SAMPLES.with(|samples| std::mem::take(&mut *samples.borrow_mut()));
    let mut stages: Vec<StageTiming> = Vec::new();
    for (name, elapsed) in samples {
        if let Some(stage) = stages.iter_mut().find(|s| s.name == name) {
            stage.count += 1;
            stage.total += elapsed;
            stage.max = stage.max.max(elapsed);
        } else {
            stages.push(StageTiming {
                name,
                count: 1,
                total: elapsed,
                max: elapsed,
            });
        }
    }
    TimingReport { stages }
}

impl TimingReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Total milliseconds spent in `stage`, zero if never recorded.
    #[must_use]
    pub fn millis(&self, stage: &str) -> u128 {
        self.stages
            .iter()
            .find(|s| s.name == stage)
            .map_or(0, |s| s.total.as_millis())
    }

    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        let stages = self
            .stages
            .iter()
            .map(|s| {
                json!({
                    "name": s.name,
                    "count": s.count,
                    "total_ms": s.total.as_millis(),
                    "max_us": s.max.as_micros(),
                })
            })
            .collect::<Vec<_>>();
        json!({ "stages": stages })
    }

    #[must_use]
    pub fn display_table(&self) -> String {
        if self.stages.is_empty() {
            return "No timing samples recorded.".to_string();
        }
        let mut out = String::new();
        out.push_str("stage                        count      total        max\n");
        out.push_str("--------------------------------------------------------\n");
        for s in &self.stages {
            out.push_str(&format!(
                "{:<28} {:>6} {:>10} {:>10}\n",
                s.name,
                s.count,
                format_duration(s.total),
                format_duration(s.max)
            ));
        }
        out
    }
}

fn record(stage: &str, elapsed: Duration) {
    SAMPLES.with(|samples| samples.borrow_mut().push((stage.to_string(), elapsed)));
}

fn format_duration(duration: Duration) -> String {
    let micros = duration.as_micros();
    if micros >= 1_000_000 {
        format!("{}.{:03}s", micros / 1_000_000, (micros % 1_000_000) / 1_000)
    } else if micros >= 1_000 {
        format!("{}.{:03}ms", micros / 1_000, micros % 1_000)
    } else {
        format!("{micros}µs")
    }
}

fn is_truthy(value: &str) -> bool {
    ["1", "true", "yes", "on"]
        .iter()
        .any(|t| value.eq_ignore_ascii_case(t))
}
