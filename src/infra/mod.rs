//! Infrastructure adapters and runtime bootstrap.

pub mod db;
pub mod error;
pub mod gemini;
pub mod http;
pub mod memory;
pub mod settings_file;
pub mod telemetry;
pub mod wordpress;
