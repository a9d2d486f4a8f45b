//! OpenAI-compatible Chat Completions provider.

pub mod client;

pub use client::OpenAiCompatibleClient;
