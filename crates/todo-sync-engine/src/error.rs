use thiserror::Error;

#[derive(Debug, Error)]
/// Failures that abort a reconciliation run.
///
/// Per-item failures never surface here; they are recorded in the run summary.
pub enum ReconcileError {
    #[error("failed to list issues labeled '{label}' (page {page})")]
    IssueListing {
        label: String,
        page: u32,
        #[source]
        source: anyhow::Error,
    },
    #[error("{task} task did not complete")]
    Task {
        task: &'static str,
        #[source]
        source: tokio::task::JoinError,
    },
}
