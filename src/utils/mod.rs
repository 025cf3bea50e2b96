// src/utils/mod.rs
pub mod config;
pub mod error;
pub mod logging;

pub use config::EdgarConfig;
pub use error::AppError; // Re-export main error type for convenience
