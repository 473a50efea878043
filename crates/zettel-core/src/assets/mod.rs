//! Content-hash asset deduplication

mod reconciler;
mod report;

pub use reconciler::{
    canonical_file_name, destination_folder, AssetReconciler, ReconcileBatch, ReconcileOptions,
};
pub use report::{AssetOutcome, AssetStatus, ReconcileReport};
