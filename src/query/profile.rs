use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

/// A snapshot of query execution profiling metrics.
///
/// Profiling is enabled via the `RELJOIN_PROFILE` environment variable and
/// tracks time spent in each phase of the join pipeline.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryProfileSnapshot {
    /// Total nanoseconds spent building join lookups.
    pub build_ns: u64,
    /// Number of lookup builds.
    pub build_count: u64,
    /// Total nanoseconds spent probing lookups.
    pub probe_ns: u64,
    /// Number of probes.
    pub probe_count: u64,
    /// Total nanoseconds spent grouping and reducing.
    pub aggregate_ns: u64,
    /// Number of aggregations.
    pub aggregate_count: u64,
    /// Total nanoseconds spent sorting results.
    pub sort_ns: u64,
    /// Number of sorts.
    pub sort_count: u64,
}

#[derive(Default)]
struct QueryProfileCounters {
    build_ns: AtomicU64,
    build_count: AtomicU64,
    probe_ns: AtomicU64,
    probe_count: AtomicU64,
    aggregate_ns: AtomicU64,
    aggregate_count: AtomicU64,
    sort_ns: AtomicU64,
    sort_count: AtomicU64,
}

static PROFILE_ENABLED: OnceLock<bool> = OnceLock::new();
static PROFILE_COUNTERS: OnceLock<QueryProfileCounters> = OnceLock::new();

fn profiling_enabled() -> bool {
    *PROFILE_ENABLED.get_or_init(|| std::env::var_os("RELJOIN_PROFILE").is_some())
}

fn counters() -> Option<&'static QueryProfileCounters> {
    profiling_enabled().then(|| PROFILE_COUNTERS.get_or_init(QueryProfileCounters::default))
}

pub(crate) fn profile_timer() -> Option<Instant> {
    profiling_enabled().then(Instant::now)
}

pub(crate) enum QueryProfileKind {
    /// Lookup construction over the inner side.
    Build,
    /// Outer scan against a lookup.
    Probe,
    /// Group-by plus reduction.
    Aggregate,
    /// Final ordering.
    Sort,
}

pub(crate) fn record_profile_timer(kind: QueryProfileKind, start: Option<Instant>) {
    let Some(start) = start else {
        return;
    };
    let Some(counters) = counters() else {
        return;
    };
    let nanos = start.elapsed().as_nanos().min(u64::MAX as u128) as u64;
    let (ns, count) = match kind {
        QueryProfileKind::Build => (&counters.build_ns, &counters.build_count),
        QueryProfileKind::Probe => (&counters.probe_ns, &counters.probe_count),
        QueryProfileKind::Aggregate => (&counters.aggregate_ns, &counters.aggregate_count),
        QueryProfileKind::Sort => (&counters.sort_ns, &counters.sort_count),
    };
    ns.fetch_add(nanos, Ordering::Relaxed);
    count.fetch_add(1, Ordering::Relaxed);
}

/// Retrieves a snapshot of current query profiling metrics.
///
/// Returns `None` when `RELJOIN_PROFILE` was not set at first use. With
/// `reset`, counters are zeroed as they are read.
///
/// ```no_run
/// use reljoin::query::profile::profile_snapshot;
///
/// if let Some(snapshot) = profile_snapshot(false) {
///     println!("probe time: {}ns", snapshot.probe_ns);
/// }
/// ```
pub fn profile_snapshot(reset: bool) -> Option<QueryProfileSnapshot> {
    let counters = counters()?;
    let load = |counter: &AtomicU64| {
        if reset {
            counter.swap(0, Ordering::Relaxed)
        } else {
            counter.load(Ordering::Relaxed)
        }
    };
    Some(QueryProfileSnapshot {
        build_ns: load(&counters.build_ns),
        build_count: load(&counters.build_count),
        probe_ns: load(&counters.probe_ns),
        probe_count: load(&counters.probe_count),
        aggregate_ns: load(&counters.aggregate_ns),
        aggregate_count: load(&counters.aggregate_count),
        sort_ns: load(&counters.sort_ns),
        sort_count: load(&counters.sort_count),
    })
}
