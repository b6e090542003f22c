//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod autotag;
pub mod classification;
pub mod rules;
pub mod transactions;

// Re-export all handlers for use in router
pub use autotag::*;
pub use classification::*;
pub use rules::*;
pub use transactions::*;
