use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Moderation state shared by professionals and reviews.
/// Stored as lowercase text in both tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModerationStatus {
    Pending,
    Approved,
    Rejected,
}

#[derive(Debug, Error)]
#[error("unknown moderation status '{0}'")]
pub struct UnknownStatus(pub String);

impl ModerationStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ModerationStatus::Pending => "pending",
            ModerationStatus::Approved => "approved",
            ModerationStatus::Rejected => "rejected",
        }
    }

    pub fn is_approved(self) -> bool {
        self == ModerationStatus::Approved
    }
}

impl fmt::Display for ModerationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModerationStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ModerationStatus::Pending),
            "approved" => Ok(ModerationStatus::Approved),
            "rejected" => Ok(ModerationStatus::Rejected),
            other => Err(UnknownStatus(other.to_string())),
        }
    }
}

// Row decoding goes through `#[sqlx(try_from = "String")]`. Stored values
// outside the known set read as `Rejected` so a single legacy row cannot
// fail a whole listing; the approved-only gate hides them either way.
impl TryFrom<String> for ModerationStatus {
    type Error = Infallible;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Ok(value.parse().unwrap_or_else(|e: UnknownStatus| {
            tracing::warn!("Reading {e} as rejected");
            ModerationStatus::Rejected
        }))
    }
}
