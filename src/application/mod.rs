//! Application services: research, writing, imaging, publishing, settings, and the
//! workflow controller that ties them together.

pub mod access;
pub mod error;
pub mod imaging;
pub mod library;
pub mod ports;
pub mod publishing;
pub mod repos;
pub mod research;
pub mod sessions;
pub mod settings;
mod upstream;
pub mod workflow;
pub mod writing;
