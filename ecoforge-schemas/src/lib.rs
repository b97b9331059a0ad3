//! Data model shared by the ecoforge pipeline: catalog activities, LCI datasets and
//! methods, impact vectors and the published records.

pub mod activity;
pub mod file_formats;
pub mod impact_definition;
pub mod impacts;
pub mod ingredient;
pub mod lci;
pub mod material;
pub mod method;
pub mod process;
