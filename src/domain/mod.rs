//! Domain layer for lintcs
//!
//! CDD Principle: Domain Model - Pure logic for style-convention enforcement
//! - Contains the violation, diagnostic and report types shared by every layer
//! - Independent of file systems, terminals and configuration formats

pub mod violations;

// Re-export main domain types for convenience
pub use violations::*;
