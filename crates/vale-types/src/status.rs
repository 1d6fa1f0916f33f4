//! Voucher lifecycle states.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;

/// Lifecycle state of a voucher.
///
/// Every voucher starts as `Pending`. `Deducted` means the withdrawn items
/// were discounted from inventory; `Voided` means the voucher was cancelled.
/// Which moves between states are legal is decided by the registry, not here.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Status {
    #[serde(alias = "pending", alias = "PENDING")]
    Pending,
    #[serde(alias = "deducted", alias = "DEDUCTED")]
    Deducted,
    #[serde(alias = "voided", alias = "VOIDED")]
    Voided,
}

impl Status {
    /// All statuses, in lifecycle order.
    pub const ALL: [Status; 3] = [Status::Pending, Status::Deducted, Status::Voided];

    /// The stable on-disk spelling of this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Pending => "Pending",
            Status::Deducted => "Deducted",
            Status::Voided => "Voided",
        }
    }
}

impl Default for Status {
    fn default() -> Self {
        Status::Pending
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = TypeError;

    /// Case-insensitive parse of a status name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Status::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| TypeError::InvalidStatus(s.to_string()))
    }
}
