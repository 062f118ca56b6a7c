//! Source resolution and archive packaging

pub mod archive;
pub mod source;
