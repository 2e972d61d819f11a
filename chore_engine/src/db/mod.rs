//! # Order store backends
//!
//! [`json_file`] keeps the whole order collection in memory and mirrors it to a single JSON document on disk. This
//! suits the scale of a single-vendor service and keeps the document human-readable and hand-editable.
pub mod json_file;
