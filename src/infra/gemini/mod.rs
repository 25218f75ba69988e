//! Gemini adapter for [`GenerativeModel`](crate::application::ports::GenerativeModel).

mod client;
mod dto;

pub use client::GeminiClient;
