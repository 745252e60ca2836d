/*!
 * Core Module
 * Error types and sizing limits shared across the crate
 */

pub mod errors;
pub mod limits;

// Re-export for convenience
pub use errors::*;
