//! Lightweight runtime metrics aggregation for render pipelines

use crate::config::MetricsFormat;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::Write as _;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};
use tokio::time::{self, MissedTickBehavior};
use tracing::info;

static METRICS: OnceLock<Arc<MetricsInner>> = OnceLock::new();

/// Enable metrics collection with periodic summaries every `interval_secs`.
///
/// Must be called from within a Tokio runtime; the summary task is spawned
/// on first use.
pub fn enable(interval_secs: u64) {
    let interval = interval_secs.max(5);
    let inner = Arc::clone(METRICS.get_or_init(|| Arc::new(MetricsInner::new(interval))));
    inner.update_interval(interval);
    inner.ensure_task();
}

/// Whether [`enable`] has been called
pub fn is_enabled() -> bool {
    METRICS.get().is_some()
}

/// Record the outcome of one pipeline run that had a payload.
pub fn record(duration: Duration, success: bool, kind: Option<&str>) {
    if let Some(inner) = METRICS.get() {
        inner.record(duration, success, kind);
    }
}

/// Record a run skipped because the payload was empty.
pub fn record_empty() {
    if let Some(inner) = METRICS.get() {
        inner.with_state(|state| state.empty_inputs += 1);
    }
}

/// Record a finished run whose result was discarded as superseded.
pub fn record_stale() {
    if let Some(inner) = METRICS.get() {
        inner.with_state(|state| state.stale_discards += 1);
    }
}

/// Render the totals since [`enable`] in the requested format, if metrics are on.
///
/// Periodic summaries reset their own window; these totals are never reset.
pub fn render(format: MetricsFormat) -> Option<String> {
    let snapshot = METRICS.get()?.snapshot_totals();
    Some(match format {
        MetricsFormat::Json => serde_json::to_string_pretty(&snapshot_to_report(&snapshot))
            .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}")),
        MetricsFormat::Prometheus => render_prometheus(&snapshot),
    })
}

struct MetricsInner {
    state: Mutex<Ledger>,
    interval_secs: AtomicU64,
    task_spawned: AtomicBool,
}

impl MetricsInner {
    fn new(interval_secs: u64) -> Self {
        Self {
            state: Mutex::new(Ledger::new()),
            interval_secs: AtomicU64::new(interval_secs.max(5)),
            task_spawned: AtomicBool::new(false),
        }
    }

    fn update_interval(&self, interval_secs: u64) {
        self.interval_secs
            .store(interval_secs.max(5), Ordering::Relaxed);
    }

    fn ensure_task(self: &Arc<Self>) {
        if tokio::runtime::Handle::try_current().is_err() {
            return;
        }
        if self
            .task_spawned
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
        {
            let runner = Arc::clone(self);
            tokio::spawn(async move {
                runner.run().await;
            });
        }
    }

    fn with_state(&self, update: impl Fn(&mut MetricsState)) {
        if let Ok(mut ledger) = self.state.lock() {
            update(&mut ledger.window);
            update(&mut ledger.totals);
        }
    }

    fn record(&self, duration: Duration, success: bool, kind: Option<&str>) {
        self.with_state(|state| {
            state.total_renders += 1;
            if success {
                state.successes += 1;
                state.success_duration += duration;
            } else {
                state.failures += 1;
            }

            if let Some(kind) = kind {
                let entry = state.per_kind.entry(kind.to_string()).or_default();
                if success {
                    entry.successes += 1;
                    entry.success_duration += duration;
                } else {
                    entry.failures += 1;
                }
            }
        });
    }

    fn snapshot_totals(&self) -> Snapshot {
        match self.state.lock() {
            Ok(ledger) => ledger.totals.snapshot(),
            Err(poisoned) => poisoned.into_inner().totals.snapshot(),
        }
    }

    fn snapshot_and_reset(&self) -> Snapshot {
        match self.state.lock() {
            Ok(mut ledger) => ledger.window.snapshot_and_reset(),
            Err(poisoned) => poisoned.into_inner().window.snapshot_and_reset(),
        }
    }

    async fn run(self: Arc<Self>) {
        let mut current_secs = self.interval_secs.load(Ordering::Relaxed).max(5);
        loop {
            let mut ticker = time::interval(Duration::from_secs(current_secs));
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick completes immediately; report after a full interval.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let snapshot = self.snapshot_and_reset();
                log_snapshot(&snapshot);

                let next_secs = self.interval_secs.load(Ordering::Relaxed).max(5);
                if next_secs != current_secs {
                    current_secs = next_secs;
                    break;
                }
            }
        }
    }
}

/// Counters for the current summary window plus running totals
struct Ledger {
    window: MetricsState,
    totals: MetricsState,
}

impl Ledger {
    fn new() -> Self {
        Self {
            window: MetricsState::new(),
            totals: MetricsState::new(),
        }
    }
}

struct MetricsState {
    total_renders: u64,
    successes: u64,
    failures: u64,
    empty_inputs: u64,
    stale_discards: u64,
    success_duration: Duration,
    per_kind: HashMap<String, KindCounters>,
    last_reset: Instant,
}

impl MetricsState {
    fn new() -> Self {
        Self {
            total_renders: 0,
            successes: 0,
            failures: 0,
            empty_inputs: 0,
            stale_discards: 0,
            success_duration: Duration::ZERO,
            per_kind: HashMap::new(),
            last_reset: Instant::now(),
        }
    }

    fn snapshot(&self) -> Snapshot {
        let mut per_kind: Vec<KindSnapshot> = self
            .per_kind
            .iter()
            .map(|(kind, counters)| KindSnapshot {
                kind: kind.clone(),
                successes: counters.successes,
                failures: counters.failures,
                success_duration: counters.success_duration,
            })
            .collect();
        per_kind.sort_by(|a, b| a.kind.cmp(&b.kind));

        Snapshot {
            total_renders: self.total_renders,
            successes: self.successes,
            failures: self.failures,
            empty_inputs: self.empty_inputs,
            stale_discards: self.stale_discards,
            success_duration: self.success_duration,
            elapsed: self.last_reset.elapsed(),
            per_kind,
        }
    }

    fn snapshot_and_reset(&mut self) -> Snapshot {
        let snapshot = self.snapshot();
        *self = Self::new();
        snapshot
    }
}

#[derive(Default)]
struct KindCounters {
    successes: u64,
    failures: u64,
    success_duration: Duration,
}

#[derive(Clone)]
struct Snapshot {
    total_renders: u64,
    successes: u64,
    failures: u64,
    empty_inputs: u64,
    stale_discards: u64,
    success_duration: Duration,
    elapsed: Duration,
    per_kind: Vec<KindSnapshot>,
}

impl Snapshot {
    fn avg_latency_ms(&self) -> f64 {
        if self.successes == 0 {
            0.0
        } else {
            self.success_duration.as_secs_f64() * 1_000.0 / self.successes as f64
        }
    }

    fn success_rate(&self) -> f64 {
        if self.total_renders == 0 {
            0.0
        } else {
            self.successes as f64 / self.total_renders as f64
        }
    }
}

#[derive(Clone)]
struct KindSnapshot {
    kind: String,
    successes: u64,
    failures: u64,
    success_duration: Duration,
}

impl KindSnapshot {
    fn avg_latency_ms(&self) -> f64 {
        if self.successes == 0 {
            0.0
        } else {
            self.success_duration.as_secs_f64() * 1_000.0 / self.successes as f64
        }
    }
}

fn log_snapshot(snapshot: &Snapshot) {
    info!(
        target: "qrstudio::metrics",
        interval_secs = snapshot.elapsed.as_secs(),
        total_renders = snapshot.total_renders,
        success_count = snapshot.successes,
        failure_count = snapshot.failures,
        empty_inputs = snapshot.empty_inputs,
        stale_discards = snapshot.stale_discards,
        avg_latency_ms = snapshot.avg_latency_ms(),
        success_rate = format_args!("{:.1}%", snapshot.success_rate() * 100.0),
        "Render metrics window"
    );

    if !snapshot.per_kind.is_empty() {
        let breakdown = format_breakdown(&snapshot.per_kind);
        info!(target: "qrstudio::metrics", breakdown, "Per-type metrics");
    }
}

fn format_breakdown(entries: &[KindSnapshot]) -> String {
    entries
        .iter()
        .map(|entry| {
            let avg_ms = entry.avg_latency_ms();
            if entry.failures > 0 {
                format!(
                    "{}: {} ok / {} err (avg {:.1} ms)",
                    entry.kind, entry.successes, entry.failures, avg_ms
                )
            } else {
                format!("{}: {} ok (avg {:.1} ms)", entry.kind, entry.successes, avg_ms)
            }
        })
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Serialize)]
struct MetricsReport {
    window_secs: u64,
    total_renders: u64,
    successes: u64,
    failures: u64,
    empty_inputs: u64,
    stale_discards: u64,
    success_rate: f64,
    avg_latency_ms: f64,
    per_type: Vec<KindReport>,
}

#[derive(Serialize)]
struct KindReport {
    content_type: String,
    successes: u64,
    failures: u64,
    avg_latency_ms: f64,
}

fn snapshot_to_report(snapshot: &Snapshot) -> MetricsReport {
    MetricsReport {
        window_secs: snapshot.elapsed.as_secs(),
        total_renders: snapshot.total_renders,
        successes: snapshot.successes,
        failures: snapshot.failures,
        empty_inputs: snapshot.empty_inputs,
        stale_discards: snapshot.stale_discards,
        success_rate: snapshot.success_rate() * 100.0,
        avg_latency_ms: snapshot.avg_latency_ms(),
        per_type: snapshot
            .per_kind
            .iter()
            .map(|entry| KindReport {
                content_type: entry.kind.clone(),
                successes: entry.successes,
                failures: entry.failures,
                avg_latency_ms: entry.avg_latency_ms(),
            })
            .collect(),
    }
}

fn render_prometheus(snapshot: &Snapshot) -> String {
    let mut output = String::new();

    let mut metric = |name: &str, kind: &str, help: &str, value: String| {
        let _ = writeln!(&mut output, "# HELP {name} {help}");
        let _ = writeln!(&mut output, "# TYPE {name} {kind}");
        let _ = writeln!(&mut output, "{name} {value}");
    };

    metric(
        "qrstudio_window_seconds",
        "gauge",
        "Duration of the aggregation window in seconds",
        snapshot.elapsed.as_secs().to_string(),
    );
    metric(
        "qrstudio_renders_total",
        "counter",
        "Pipeline runs with a non-empty payload",
        snapshot.total_renders.to_string(),
    );
    metric(
        "qrstudio_render_successes",
        "counter",
        "Runs that produced an image",
        snapshot.successes.to_string(),
    );
    metric(
        "qrstudio_render_failures",
        "counter",
        "Runs that failed to encode or composite",
        snapshot.failures.to_string(),
    );
    metric(
        "qrstudio_empty_inputs",
        "counter",
        "Runs skipped because the payload was empty",
        snapshot.empty_inputs.to_string(),
    );
    metric(
        "qrstudio_stale_discards",
        "counter",
        "Finished runs discarded because newer input arrived",
        snapshot.stale_discards.to_string(),
    );
    metric(
        "qrstudio_render_latency_avg_seconds",
        "gauge",
        "Average latency of successful runs",
        format!("{:.6}", snapshot.avg_latency_ms() / 1_000.0),
    );

    if !snapshot.per_kind.is_empty() {
        let _ = writeln!(
            &mut output,
            "# HELP qrstudio_renders_by_type_total Runs by content type"
        );
        let _ = writeln!(&mut output, "# TYPE qrstudio_renders_by_type_total counter");
        for entry in &snapshot.per_kind {
            let label = escape_label(&entry.kind);
            let _ = writeln!(
                &mut output,
                "qrstudio_renders_by_type_total{{content_type=\"{}\",result=\"success\"}} {}",
                label, entry.successes
            );
            let _ = writeln!(
                &mut output,
                "qrstudio_renders_by_type_total{{content_type=\"{}\",result=\"failure\"}} {}",
                label, entry.failures
            );
        }
    }

    output
}

fn escape_label(value: &str) -> String {
    value
        .replace('\\', "\\\\")
        .replace('\n', "\\n")
        .replace('"', "\\\"")
}
