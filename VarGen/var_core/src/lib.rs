//! PLC variable table → Modbus register layout crate.
//! Responsibilities: normalize variable rows, allocate register handlers, project output artifacts.
//! Non-goals: interactive UI / batch directory traversal / backup (handled by upper layers).

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod application;

pub mod config;

pub use domain::error::{LayoutError, RowRef};
pub use domain::model::{
    Allocation, Handler, Layout, ProcessedTable, RawRow, RawTable, SpecAssignment,
    VariableConfig, VariableSpec,
};
pub use domain::types::MbType;
pub use application::allocator::{allocate, AllocatorOptions};
pub use application::artifacts::{handler_summary, project, LayoutArtifacts};
pub use application::normalizer::{normalize_row, normalize_rows, normalize_table};
pub use application::service::{compute_layout, LayoutReport, LayoutService, RunSummary};
pub use application::validate::{validate_output_dir, ValidateOptions, ValidationIssue};
pub use ports::{ArtifactSink, TableSource};
pub use adapters::{CsvTableSource, FsArtifactSink};
pub use config::LayoutConfig;
