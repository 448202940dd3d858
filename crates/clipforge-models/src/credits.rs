//! Credit accounts.
//!
//! One credit funds one started minute of source video.

use serde::{Deserialize, Serialize};

/// Prepaid balance owned by a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditAccount {
    pub user_id: String,
    pub balance: u32,
}

impl CreditAccount {
    pub fn can_afford(&self, required: u32) -> bool {
        self.balance >= required
    }
}

/// Credits required for a source of `duration_secs` seconds: `ceil(duration / 60)`.
pub fn credits_for_duration(duration_secs: f64) -> u32 {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return 0;
    }
    (duration_secs / 60.0).ceil() as u32
}
