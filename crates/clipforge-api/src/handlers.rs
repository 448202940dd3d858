//! Request handlers.

pub mod admin;
pub mod clips;
pub mod credits;
pub mod health;
pub mod videos;

pub use admin::*;
pub use clips::*;
pub use credits::*;
pub use health::*;
pub use videos::*;
