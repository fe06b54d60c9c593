pub mod aggregator;
pub mod error;
pub mod gateway;
pub mod index;
pub mod state;
pub mod stats;
pub mod store;
pub mod validation;
pub mod worker;

pub use crate::aggregator::{Aggregator, PipelineConfig};
pub use crate::error::{AggregatorError, IntakeError, StoreError};
pub use crate::stats::StatsSnapshot;
pub use crate::store::{DedupStore, MemoryDedupStore};
pub use crate::worker::{DrainPolicy, WorkerHandle, WorkerReport, WorkerState};
