// arc2zen shared type definitions
// Each submodule defines types used across the pipeline.

pub mod destination;
pub mod errors;
pub mod report;
pub mod settings;
pub mod tree;
