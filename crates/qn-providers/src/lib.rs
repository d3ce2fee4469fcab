//! qn-providers: LLM provider implementations for quick-news
//!
//! This crate provides implementations of the Provider trait for
//! OpenAI-compatible chat APIs (OpenAI itself, Ollama, vLLM, llama.cpp).

pub mod openai;

pub use openai::{OpenAIProvider, DEFAULT_BASE_URL, OLLAMA_BASE_URL};
