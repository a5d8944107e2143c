// src/document/mod.rs
pub mod loader;
pub mod models;

pub use models::{row_label, DocumentInput, Table};
