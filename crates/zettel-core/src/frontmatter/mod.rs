//! Frontmatter parsing and ID synchronization

mod block;
mod sync;

pub use block::{is_fence, MetadataBlock, MetadataEntry, FENCE};
pub use sync::{plan_sync, FrontMatterSynchronizer, SyncOutcome, SyncPlan};
