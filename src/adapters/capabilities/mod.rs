//! Built-in capability adapters.
//!
//! The data-science collaborators behind the capability port: CSV access,
//! tabular operations, chart rendering, file writing, report composition.

pub mod chart;
pub mod csv_access;
pub mod file_write;
pub mod frame;
pub mod paths;
pub mod report;
pub mod stats;
pub mod tabular;

use std::path::Path;
use std::sync::Arc;

pub use chart::ChartRenderCapability;
pub use csv_access::{CsvListCapability, CsvLoadCapability};
pub use file_write::FileWriteCapability;
pub use frame::{Column, ColumnData, Frame, TabularStore};
pub use report::ReportComposeCapability;
pub use tabular::{CorrelateCapability, DescribeCapability, ValueCountsCapability};

use crate::services::CapabilityRegistry;

/// The full built-in capability set, sharing one tabular store, with
/// file-writing capabilities confined under `base_dir`.
pub fn standard_capabilities(base_dir: &Path) -> (CapabilityRegistry, Arc<TabularStore>) {
    let store = Arc::new(TabularStore::new());
    let registry = CapabilityRegistry::new()
        .with(Arc::new(CsvListCapability::new()))
        .with(Arc::new(CsvLoadCapability::new(store.clone())))
        .with(Arc::new(DescribeCapability::new(store.clone())))
        .with(Arc::new(CorrelateCapability::new(store.clone())))
        .with(Arc::new(ValueCountsCapability::new(store.clone())))
        .with(Arc::new(ChartRenderCapability::new(store.clone(), base_dir)))
        .with(Arc::new(ReportComposeCapability::new(base_dir)))
        .with(Arc::new(FileWriteCapability::new(base_dir)));
    (registry, store)
}
