//! Caller-facing formats: JSON for checkout requests and responses, CSV for order reports.

pub mod csv;
pub mod json;
