//! User profiles, subscription tiers and quota kinds.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{TimestampMs, UserId};

/// Error parsing a tier or quota kind from its string form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {what}: {value:?}")]
pub struct ParseError {
    pub what: &'static str,
    pub value: String,
}

/// Subscription tier. Owns the per-cycle action limit; the quota tracker
/// only consumes it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    #[default]
    Free,
    Plus,
    Premium,
}

impl Tier {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Free => "free",
            Tier::Plus => "plus",
            Tier::Premium => "premium",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tier {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "plus" => Ok(Tier::Plus),
            "premium" => Ok(Tier::Premium),
            other => Err(ParseError {
                what: "tier",
                value: other.to_string(),
            }),
        }
    }
}

/// Which metered action a quota document covers.
///
/// Sending an approach and accepting a match are counted separately, each
/// against the same tier limit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuotaKind {
    Approach,
    Match,
}

impl QuotaKind {
    pub const ALL: [QuotaKind; 2] = [QuotaKind::Approach, QuotaKind::Match];

    pub fn as_str(&self) -> &'static str {
        match self {
            QuotaKind::Approach => "approach",
            QuotaKind::Match => "match",
        }
    }
}

impl fmt::Display for QuotaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuotaKind {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "approach" => Ok(QuotaKind::Approach),
            "match" => Ok(QuotaKind::Match),
            other => Err(ParseError {
                what: "quota kind",
                value: other.to_string(),
            }),
        }
    }
}

/// A user profile as seen by the engine.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: UserId,
    pub tier: Tier,
    pub created_at: TimestampMs,
}
