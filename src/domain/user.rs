use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ============================================================================
// User Domain - Identity Snapshot
// ============================================================================
//
// Account management proper lives in a separate identity service; the order
// and point paths only need to resolve a login to an id and a grade.
//
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Grade {
    Normal,
    Royal,
    Gold,
    Platinum,
}

impl Grade {
    /// Point benefit rate applied on top of the point policy rate.
    pub fn benefit(&self) -> f64 {
        match self {
            Grade::Normal => 0.0,
            Grade::Royal => 0.01,
            Grade::Gold => 0.02,
            Grade::Platinum => 0.03,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::Normal => "NORMAL",
            Grade::Royal => "ROYAL",
            Grade::Gold => "GOLD",
            Grade::Platinum => "PLATINUM",
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown user grade: {0}")]
pub struct UnknownGrade(pub String);

impl FromStr for Grade {
    type Err = UnknownGrade;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NORMAL" => Ok(Grade::Normal),
            "ROYAL" => Ok(Grade::Royal),
            "GOLD" => Ok(Grade::Gold),
            "PLATINUM" => Ok(Grade::Platinum),
            other => Err(UnknownGrade(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: i64,
    pub login_id: String,
    pub email: String,
    pub grade: Grade,
}
