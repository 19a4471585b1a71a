//! Spreadsheet import pipeline
//!
//! Reads the first sheet of an `.xlsx`/`.xls` upload with calamine, checks it
//! against the entity's import columns and posts the untouched file to the
//! bulk-upload endpoint. Also writes the matching blank template.

pub mod error;
pub mod pipeline;
pub mod reader;
pub mod template;
pub mod validate;

pub use error::ImportError;
pub use pipeline::{ImportSummary, check_file, validate_and_import};
pub use template::{template_bytes, write_template};
