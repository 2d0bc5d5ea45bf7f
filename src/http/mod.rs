//! HTTP protocol layer module
//!
//! Response builders and form decoding, decoupled from the handler logic.

pub mod form;
pub mod response;

// Re-export commonly used builders
pub use response::{
    build_405_response, build_413_response, build_html_response, build_options_response,
};
