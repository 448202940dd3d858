//! SQLite persistence for the highlight pipeline.
//!
//! This crate provides:
//! - Pool setup and idempotent schema creation
//! - `VideoRepository` with the guarded status transitions and the atomic
//!   completion write
//! - `ClipRepository` including expiry queries for the sweeper
//! - `CreditRepository` with guarded debits

pub mod client;
pub mod clips;
mod convert;
pub mod credits;
pub mod error;
pub mod schema;
pub mod videos;

pub use client::{Database, DbConfig};
pub use clips::ClipRepository;
pub use credits::CreditRepository;
pub use error::{DbError, DbResult};
pub use videos::{JobCompletion, VideoRepository};
