//! Request handler module
//!
//! The single endpoint of this server: reads form fields `a` and `b` and
//! answers with their sum rendered as HTML.

pub mod sum;

// Re-export main entry point
pub use sum::handle_request;
