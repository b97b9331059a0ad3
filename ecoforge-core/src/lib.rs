//! Impact computation and export for a catalog of life-cycle inventory activities.

pub mod aggregate;
pub mod assembler;
pub mod catalog;
pub mod ecosystemic;
pub mod engine;
pub mod error;
pub mod export;
pub mod gateway;
pub mod lci;
pub mod normalization;
pub mod numeric;
pub mod pipeline;
pub mod report;

pub use catalog::Catalog;
pub use error::EcoforgeError;
pub use pipeline::{Pipeline, PipelineBuilder, PipelineOutput};
