pub mod sink;
pub mod table;

pub use sink::ArtifactSink;
pub use table::TableSource;
