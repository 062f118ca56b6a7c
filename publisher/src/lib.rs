//! Drydock Publisher Library
//!
//! Core modules for the Drydock post-build publisher.

pub mod bundle;
pub mod config;
pub mod creds;
pub mod errors;
pub mod logs;
pub mod models;
pub mod pipeline;
pub mod remote;
pub mod utils;
pub mod vars;
