//! Mastery tiers, rewards and cooldowns

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::ProgressRecord;

/// Mastery classification of a card
///
/// The API speaks in colours (`red`, `yellow`, `green`); the learning names
/// are accepted on input as aliases. Ordering is the study order: cards the
/// learner knows least come first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub enum Tier {
    #[default]
    #[serde(rename = "red", alias = "new")]
    New,
    #[serde(rename = "yellow", alias = "learning")]
    Learning,
    #[serde(rename = "green", alias = "mastered")]
    Mastered,
}

impl Tier {
    /// Sort rank used by the queue builder
    pub fn rank(self) -> u8 {
        match self {
            Self::New => 0,
            Self::Learning => 1,
            Self::Mastered => 2,
        }
    }

    /// Experience granted for answering with this tier
    pub fn reward(self) -> u32 {
        match self {
            Self::New => 0,
            Self::Learning => 5,
            Self::Mastered => 15,
        }
    }

    /// Wire spelling used by the API
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::New => "red",
            Self::Learning => "yellow",
            Self::Mastered => "green",
        }
    }

    /// Label shown on the card badge
    pub fn label(self) -> &'static str {
        match self {
            Self::New => "RED - NEW",
            Self::Learning => "YELLOW - LEARNING",
            Self::Mastered => "GREEN - MASTERED",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::New => write!(f, "new"),
            Self::Learning => write!(f, "learning"),
            Self::Mastered => write!(f, "mastered"),
        }
    }
}

impl std::str::FromStr for Tier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "new" | "red" => Ok(Self::New),
            "learning" | "yellow" => Ok(Self::Learning),
            "mastered" | "green" => Ok(Self::Mastered),
            _ => Err(format!("Unknown tier: {}", s)),
        }
    }
}

/// Minimum time before an answered card may be shown again
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldowns {
    pub new: Duration,
    pub learning: Duration,
    pub mastered: Duration,
}

impl Default for Cooldowns {
    fn default() -> Self {
        Self {
            new: Duration::from_secs(30),
            learning: Duration::from_secs(60),
            mastered: Duration::from_secs(120),
        }
    }
}

impl Cooldowns {
    /// Cooldown for a tier
    pub fn for_tier(&self, tier: Tier) -> Duration {
        match tier {
            Tier::New => self.new,
            Tier::Learning => self.learning,
            Tier::Mastered => self.mastered,
        }
    }
}

/// Tier and streak derived from a progress record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Classification {
    pub tier: Tier,
    pub streak: u32,
}

/// Classify a card from its most recent progress record
///
/// Cards with no record are new with no streak.
pub fn classify(record: Option<&ProgressRecord>) -> Classification {
    match record {
        Some(record) => Classification {
            tier: record.status,
            streak: record.correct_streak,
        },
        None => Classification::default(),
    }
}
