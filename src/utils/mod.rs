// src/utils/mod.rs
pub mod amount;
pub mod error;
pub mod logging;
pub mod patterns;

pub use error::{AppError, ExtractError}; // Re-export main error types for convenience
