/// Process-local bootstrap counters, logged as one snapshot per bootstrap.
pub mod bootstrap_counters {
    use std::sync::atomic::{AtomicUsize, Ordering};

    static BASELINES_INSERTED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static MIGRATIONS_APPLIED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static MIGRATIONS_FAILED_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static GATE_REJECTIONS_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static PROBE_ATTEMPTS_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static PROBE_TIMEOUTS_TOTAL: AtomicUsize = AtomicUsize::new(0);
    static PIPELINES_READY_TOTAL: AtomicUsize = AtomicUsize::new(0);

    pub fn baseline_inserted() {
        BASELINES_INSERTED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn migration_applied() {
        MIGRATIONS_APPLIED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn migration_failed() {
        MIGRATIONS_FAILED_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn gate_rejected() {
        GATE_REJECTIONS_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn probe_attempt() {
        PROBE_ATTEMPTS_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn probe_timeout() {
        PROBE_TIMEOUTS_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pipeline_ready() {
        PIPELINES_READY_TOTAL.fetch_add(1, Ordering::Relaxed);
    }

    #[derive(Debug, Clone, Copy)]
    pub struct Snapshot {
        pub baselines_inserted_total: usize,
        pub migrations_applied_total: usize,
        pub migrations_failed_total: usize,
        pub gate_rejections_total: usize,
        pub probe_attempts_total: usize,
        pub probe_timeouts_total: usize,
        pub pipelines_ready_total: usize,
    }

    pub fn snapshot() -> Snapshot {
        Snapshot {
            baselines_inserted_total: BASELINES_INSERTED_TOTAL.load(Ordering::Relaxed),
            migrations_applied_total: MIGRATIONS_APPLIED_TOTAL.load(Ordering::Relaxed),
            migrations_failed_total: MIGRATIONS_FAILED_TOTAL.load(Ordering::Relaxed),
            gate_rejections_total: GATE_REJECTIONS_TOTAL.load(Ordering::Relaxed),
            probe_attempts_total: PROBE_ATTEMPTS_TOTAL.load(Ordering::Relaxed),
            probe_timeouts_total: PROBE_TIMEOUTS_TOTAL.load(Ordering::Relaxed),
            pipelines_ready_total: PIPELINES_READY_TOTAL.load(Ordering::Relaxed),
        }
    }

    pub fn log_snapshot(context: &str) {
        let s = snapshot();
        tracing::info!(
            context = context,
            baselines_inserted_total = s.baselines_inserted_total,
            migrations_applied_total = s.migrations_applied_total,
            migrations_failed_total = s.migrations_failed_total,
            gate_rejections_total = s.gate_rejections_total,
            probe_attempts_total = s.probe_attempts_total,
            probe_timeouts_total = s.probe_timeouts_total,
            pipelines_ready_total = s.pipelines_ready_total,
            "db_bootstrap_counters_snapshot"
        );
    }

}
