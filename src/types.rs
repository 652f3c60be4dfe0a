//! Core vocabulary types: review ratings and card states.

use serde::{Deserialize, Serialize};

/// Reviewer's self-assessed recall quality.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Rating {
    Again,
    Hard,
    Good,
    Easy,
}

impl Rating {
    /// Convert to the numeric value (1-4) used by the memory formulas.
    pub fn to_value(self) -> u8 {
        match self {
            Self::Again => 1,
            Self::Hard => 2,
            Self::Good => 3,
            Self::Easy => 4,
        }
    }

    /// Create from the numeric value (1-4).
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Again),
            2 => Some(Self::Hard),
            3 => Some(Self::Good),
            4 => Some(Self::Easy),
            _ => None,
        }
    }

    /// Canonical lowercase name, as used in the JSON encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Again => "again",
            Self::Hard => "hard",
            Self::Good => "good",
            Self::Easy => "easy",
        }
    }

    /// Parse the canonical lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "again" => Some(Self::Again),
            "hard" => Some(Self::Hard),
            "good" => Some(Self::Good),
            "easy" => Some(Self::Easy),
            _ => None,
        }
    }
}

/// Scheduling phase of a card.
///
/// Cards start in `Learning`, graduate to `Review`, and drop into
/// `Relearning` after a lapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum State {
    Learning,
    Review,
    Relearning,
}

impl Default for State {
    fn default() -> Self {
        Self::Learning
    }
}

impl State {
    /// Convert to the numeric value (1-3).
    pub fn to_value(self) -> u8 {
        match self {
            Self::Learning => 1,
            Self::Review => 2,
            Self::Relearning => 3,
        }
    }

    /// Create from the numeric value (1-3).
    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Learning),
            2 => Some(Self::Review),
            3 => Some(Self::Relearning),
            _ => None,
        }
    }

    /// Canonical lowercase name, as used in the JSON encoding.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Learning => "learning",
            Self::Review => "review",
            Self::Relearning => "relearning",
        }
    }

    /// Parse the canonical lowercase name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "learning" => Some(Self::Learning),
            "review" => Some(Self::Review),
            "relearning" => Some(Self::Relearning),
            _ => None,
        }
    }
}
