//! Prometheus counters for the reconciler.

use ephemeral_error::MetricsError;
use prometheus::{IntCounterVec, Registry, register_int_counter_vec_with_registry};

/// Counters for dispatched events, role operations and reconcile failures.
///
/// All counters are monotonic and lock-free; clones share the same series.
#[derive(Debug, Clone)]
pub struct ReconcileMetrics {
    events: IntCounterVec,
    role_operations: IntCounterVec,
    errors: IntCounterVec,
}

impl ReconcileMetrics {
    /// Creates the counters and registers them with the given registry.
    pub fn new(registry: &Registry) -> Result<Self, MetricsError> {
        let events = register_int_counter_vec_with_registry!(
            "ephemeral_roles_events_total",
            "Gateway events dispatched to handlers",
            &["event"],
            registry
        )
        .map_err(|e| MetricsError::new(e.to_string()))?;

        let role_operations = register_int_counter_vec_with_registry!(
            "ephemeral_roles_role_operations_total",
            "Role mutations issued to the platform",
            &["operation", "outcome"],
            registry
        )
        .map_err(|e| MetricsError::new(e.to_string()))?;

        let errors = register_int_counter_vec_with_registry!(
            "ephemeral_roles_reconcile_errors_total",
            "Reconciliation failures by kind",
            &["kind"],
            registry
        )
        .map_err(|e| MetricsError::new(e.to_string()))?;

        Ok(Self {
            events,
            role_operations,
            errors,
        })
    }

    /// Counters on a private registry, for tests and tools that do not export metrics.
    pub fn detached() -> Self {
        let registry = Registry::new();
        // A fresh registry cannot hold conflicting series.
        match Self::new(&registry) {
            Ok(metrics) => metrics,
            Err(err) => unreachable!("fresh registry rejected metrics: {err}"),
        }
    }

    /// Records a dispatched gateway event.
    pub fn record_event(&self, event: &str) {
        self.events.with_label_values(&[event]).inc();
    }

    /// Records a role mutation and whether it succeeded.
    pub fn record_role_operation(&self, operation: &str, success: bool) {
        let outcome = if success { "success" } else { "failure" };
        self.role_operations
            .with_label_values(&[operation, outcome])
            .inc();
    }

    /// Records a reconcile failure by kind label.
    pub fn record_error(&self, kind: &str) {
        self.errors.with_label_values(&[kind]).inc();
    }

    /// Count of role mutations recorded for an operation and outcome.
    pub fn role_operations(&self, operation: &str, success: bool) -> u64 {
        let outcome = if success { "success" } else { "failure" };
        self.role_operations
            .with_label_values(&[operation, outcome])
            .get()
    }

    /// Count of failures recorded for a kind label.
    pub fn errors(&self, kind: &str) -> u64 {
        self.errors.with_label_values(&[kind]).get()
    }

    /// Count of events recorded for an event name.
    pub fn events(&self, event: &str) -> u64 {
        self.events.with_label_values(&[event]).get()
    }
}
