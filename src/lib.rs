// ABOUTME: Library root for shopstack - exposes public types for the binary and tests.
// ABOUTME: The main binary is in main.rs.

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod output;
pub mod probe;
pub mod progress;
pub mod provision;
pub mod runtime;
pub mod stack;
pub mod tenant;
pub mod types;
