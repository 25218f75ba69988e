//! Workflow state, research results, generated posts, and the records they persist to.

pub mod entities;
pub mod error;
pub mod posts;
pub mod research;
pub mod types;
pub mod wordpress;
pub mod workflow;
