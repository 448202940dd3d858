//! Object storage for source videos and generated clips.
//!
//! This crate provides:
//! - The `ObjectStore` trait the pipeline depends on
//! - A Cloudflare R2 implementation (S3 API)
//! - An in-process implementation for tests and local runs
//! - Object key builders

pub mod client;
pub mod error;
pub mod keys;
pub mod memory;
pub mod object_store;

pub use client::{R2Client, R2Config};
pub use error::{Operation, StorageError, StorageResult};
pub use keys::{clip_key, sanitize_filename, video_source_key};
pub use memory::MemoryObjectStore;
pub use object_store::{ObjectStore, CLIP_CONTENT_TYPE};
