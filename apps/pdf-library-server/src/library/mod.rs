//! PDF library
//!
//! The service that owns ingestion (upload, generation), persistence,
//! section pagination and download.

mod service;
mod types;

pub use service::PdfLibrary;
pub use types::*;
