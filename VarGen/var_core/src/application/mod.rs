pub mod allocator;
pub mod artifacts;
pub mod normalizer;
pub mod service;
pub mod validate;
