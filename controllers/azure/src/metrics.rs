//! # Metrics
//!
//! Prometheus metrics for monitoring the provider.
//!
//! ## Metrics Exposed
//!
//! - `provider_azure_reconciliations_total{kind,result}` - Reconciliations by outcome
//! - `provider_azure_reconciliation_duration_seconds{kind}` - Duration of reconciliations
//! - `provider_azure_external_operations_total{kind,operation}` - Observe/Create/Update/Delete calls against Azure
//! - `provider_azure_external_operation_errors_total{kind,operation}` - Failed calls against Azure

use anyhow::Result;
use prometheus::{HistogramOpts, HistogramVec, IntCounterVec, Opts, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new("provider_azure_reconciliations_total", "Total number of reconciliations"),
        &["kind", "result"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "provider_azure_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["kind"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static EXTERNAL_OPERATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "provider_azure_external_operations_total",
            "Total number of operations against Azure Resource Manager",
        ),
        &["kind", "operation"],
    )
    .expect("Failed to create EXTERNAL_OPERATIONS_TOTAL metric - this should never happen")
});

static EXTERNAL_OPERATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "provider_azure_external_operation_errors_total",
            "Total number of failed operations against Azure Resource Manager",
        ),
        &["kind", "operation"],
    )
    .expect("Failed to create EXTERNAL_OPERATION_ERRORS_TOTAL metric - this should never happen")
});

/// Register all metrics with the registry served on `/metrics`
pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(EXTERNAL_OPERATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(EXTERNAL_OPERATION_ERRORS_TOTAL.clone()))?;
    Ok(())
}

pub fn record_reconciliation(kind: &str, success: bool, duration_seconds: f64) {
    let result = if success { "success" } else { "error" };
    RECONCILIATIONS_TOTAL.with_label_values(&[kind, result]).inc();
    RECONCILIATION_DURATION
        .with_label_values(&[kind])
        .observe(duration_seconds);
}

pub fn record_external_operation(kind: &str, operation: &str, success: bool) {
    EXTERNAL_OPERATIONS_TOTAL
        .with_label_values(&[kind, operation])
        .inc();
    if !success {
        EXTERNAL_OPERATION_ERRORS_TOTAL
            .with_label_values(&[kind, operation])
            .inc();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_external_operation_counts_errors() {
        let before = EXTERNAL_OPERATION_ERRORS_TOTAL
            .with_label_values(&["TestKind", "Create"])
            .get();
        record_external_operation("TestKind", "Create", true);
        record_external_operation("TestKind", "Create", false);

        assert_eq!(
            EXTERNAL_OPERATION_ERRORS_TOTAL
                .with_label_values(&["TestKind", "Create"])
                .get(),
            before + 1
        );
        assert!(
            EXTERNAL_OPERATIONS_TOTAL
                .with_label_values(&["TestKind", "Create"])
                .get()
                >= 2
        );
    }
}
