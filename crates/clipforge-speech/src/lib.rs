//! Speech-to-text for clip captions.
//!
//! This crate provides:
//! - The `Transcriber` trait the clip assembler depends on
//! - `WhisperClient`, a multipart client for OpenAI-compatible
//!   `/audio/transcriptions` endpoints (Groq by default)

pub mod client;
pub mod error;
pub mod transcriber;

pub use client::{WhisperClient, WhisperConfig};
pub use error::{SpeechError, SpeechResult};
pub use transcriber::Transcriber;
