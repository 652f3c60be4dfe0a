//! FSRS memory model.
//!
//! Pure formulas over the scheduler's weight vector, following the DSR
//! model:
//! - Stability (S): days until retrievability decays to the 90% anchor
//! - Difficulty (D): intrinsic hardness, 1-10
//! - Retrievability (R): probability of recall after `t` elapsed days,
//!   `R = (1 + FACTOR * t / S)^DECAY`

use chrono::{DateTime, Utc};

use crate::card::Card;
use crate::types::Rating;

use super::Scheduler;

pub(crate) const DECAY: f64 = -0.5;

/// Forgetting-curve factor, derived from DECAY so that R(S, S) = 0.9.
pub(crate) fn factor() -> f64 {
    0.9_f64.powf(1.0 / DECAY) - 1.0
}

/// Stability after the very first rating, indexed by rating. These are
/// fixed literals independent of the configured weight vector.
const INITIAL_STABILITY: [f64; 4] = [0.40255, 1.18385, 3.173, 15.69105];

/// Difficulty after the very first rating, indexed by rating. Fixed
/// literals, like the initial stability table.
const INITIAL_DIFFICULTY: [f64; 4] = [
    7.1949,
    6.488305268471453,
    5.282434422319005,
    3.2245015893713678,
];

impl Scheduler {
    pub(crate) fn initial_stability(rating: Rating) -> f64 {
        INITIAL_STABILITY[rating.to_value() as usize - 1]
    }

    pub(crate) fn initial_difficulty(rating: Rating) -> f64 {
        INITIAL_DIFFICULTY[rating.to_value() as usize - 1]
    }

    /// Probability of recall `elapsed_days` after a review, given
    /// stability.
    pub(crate) fn retrievability(&self, elapsed_days: f64, stability: f64) -> f64 {
        (1.0 + factor() * elapsed_days.max(0.0) / stability).powf(DECAY)
    }

    /// Current probability that `card` is recallable. Zero before the
    /// first review.
    pub fn card_retrievability(&self, card: &Card, now: DateTime<Utc>) -> f64 {
        match (card.last_review, card.stability) {
            (Some(last_review), Some(stability)) => {
                let elapsed_days = (now - last_review).num_days().max(0) as f64;
                self.retrievability(elapsed_days, stability)
            }
            _ => 0.0,
        }
    }

    /// Difficulty update: linear damping toward the rating's pull, then
    /// mean reversion toward the easy-rating initial difficulty.
    pub(crate) fn next_difficulty(&self, difficulty: Option<f64>, rating: Rating) -> f64 {
        let w = &self.parameters;
        let d = difficulty.unwrap_or(1.0);
        let delta = -w[6] * (f64::from(rating.to_value()) - 3.0);
        let damped = d + (10.0 - d) * delta / 9.0;
        let reverted = w[7] * INITIAL_DIFFICULTY[3] + (1.0 - w[7]) * damped;
        reverted.clamp(1.0, 10.0)
    }

    /// Stability update for a second review within the same day.
    pub(crate) fn short_term_stability(&self, stability: f64, rating: Rating) -> f64 {
        let w = &self.parameters;
        let exponent = w[17] * ((f64::from(rating.to_value()) - 3.0) + w[18]);
        stability * exponent.exp()
    }

    pub(crate) fn next_stability(
        &self,
        difficulty: f64,
        stability: f64,
        retrievability: f64,
        rating: Rating,
    ) -> f64 {
        if rating == Rating::Again {
            self.next_forget_stability(difficulty, stability, retrievability)
        } else {
            self.next_recall_stability(difficulty, stability, retrievability, rating)
        }
    }

    fn next_recall_stability(
        &self,
        difficulty: f64,
        stability: f64,
        retrievability: f64,
        rating: Rating,
    ) -> f64 {
        let w = &self.parameters;
        let hard_penalty = if rating == Rating::Hard { w[15] } else { 1.0 };
        let easy_bonus = if rating == Rating::Easy { w[16] } else { 1.0 };
        let growth = w[8].exp()
            * (11.0 - difficulty)
            * stability.powf(-w[9])
            * ((w[10] * (1.0 - retrievability)).exp() - 1.0)
            * hard_penalty
            * easy_bonus;
        stability * (1.0 + growth)
    }

    fn next_forget_stability(&self, difficulty: f64, stability: f64, retrievability: f64) -> f64 {
        let w = &self.parameters;
        let long_term = w[11]
            * difficulty.powf(-w[12])
            * ((stability + 1.0).powf(w[13]) - 1.0)
            * (w[14] * (1.0 - retrievability)).exp();
        let short_term = stability / (w[17] * w[18]).exp();
        long_term.min(short_term)
    }

    /// Next interval in whole days for a graduated card, inverting the
    /// forgetting curve at the desired retention. At least 1 day, at
    /// most the configured maximum.
    pub(crate) fn interval_for_stability(&self, stability: f64) -> i64 {
        let days = (stability / factor()) * (self.desired_retention.powf(1.0 / DECAY) - 1.0);
        (days.round() as i64).clamp(1, i64::from(self.maximum_interval))
    }
}
