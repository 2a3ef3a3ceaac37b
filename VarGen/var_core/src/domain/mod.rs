pub mod columns;
pub mod error;
pub mod model;
pub mod types;
pub mod values;
