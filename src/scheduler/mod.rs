//! Scheduler configuration and the review engine.
//!
//! A [`Scheduler`] is an immutable bundle of model weights and policy
//! knobs, validated at construction. Reviews are pure given a clock and
//! a random source, both supplied by the caller; many reviews may run
//! concurrently against the same scheduler.

mod fuzz;
mod memory;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::card::{Card, ReviewLog};
use crate::error::{FsrsError, Result};
use crate::types::{Rating, State};

const MINUTES_PER_DAY: f64 = 1440.0;

/// Published default FSRS weight vector.
pub const DEFAULT_PARAMETERS: [f64; 19] = [
    0.40255, 1.18385, 3.173, 15.69105, 7.1949, 0.5345, 1.4604, 0.0046, 1.54575, 0.1192, 1.01925,
    1.9395, 0.11, 0.29605, 2.2698, 0.2315, 2.9898, 0.51655, 0.6621,
];

/// Scheduler options. All fields have working defaults; invalid
/// combinations are rejected by [`Scheduler::new`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// The 19 model weights.
    pub parameters: Vec<f64>,
    /// Target recall probability at the next review, in (0, 1).
    pub desired_retention: f64,
    /// Learning step intervals in minutes.
    pub learning_steps: Vec<f64>,
    /// Relearning step intervals in minutes.
    pub relearning_steps: Vec<f64>,
    /// Ceiling on review intervals, in days.
    pub maximum_interval: u32,
    pub enable_fuzzing: bool,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            parameters: DEFAULT_PARAMETERS.to_vec(),
            desired_retention: 0.9,
            learning_steps: vec![1.0, 10.0],
            relearning_steps: vec![10.0],
            maximum_interval: 36500,
            enable_fuzzing: true,
        }
    }
}

/// Validated, immutable scheduler.
#[derive(Debug, Clone)]
pub struct Scheduler {
    parameters: [f64; 19],
    desired_retention: f64,
    learning_steps: Vec<f64>,
    relearning_steps: Vec<f64>,
    maximum_interval: u32,
    enable_fuzzing: bool,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default()).expect("default configuration is valid")
    }
}

impl Scheduler {
    /// Validate a configuration into a scheduler.
    pub fn new(config: SchedulerConfig) -> Result<Self> {
        let parameters: [f64; 19] = config
            .parameters
            .try_into()
            .map_err(|v: Vec<f64>| FsrsError::InvalidParameterCount(v.len()))?;

        if !(config.desired_retention > 0.0 && config.desired_retention < 1.0) {
            return Err(FsrsError::InvalidRetention(config.desired_retention));
        }
        for &step in config
            .learning_steps
            .iter()
            .chain(config.relearning_steps.iter())
        {
            if !step.is_finite() || step <= 0.0 {
                return Err(FsrsError::InvalidStep(step));
            }
        }
        if config.maximum_interval == 0 {
            return Err(FsrsError::InvalidMaximumInterval);
        }

        Ok(Self {
            parameters,
            desired_retention: config.desired_retention,
            learning_steps: config.learning_steps,
            relearning_steps: config.relearning_steps,
            maximum_interval: config.maximum_interval,
            enable_fuzzing: config.enable_fuzzing,
        })
    }

    pub fn parameters(&self) -> &[f64; 19] {
        &self.parameters
    }

    pub fn desired_retention(&self) -> f64 {
        self.desired_retention
    }

    pub fn learning_steps(&self) -> &[f64] {
        &self.learning_steps
    }

    pub fn relearning_steps(&self) -> &[f64] {
        &self.relearning_steps
    }

    pub fn maximum_interval(&self) -> u32 {
        self.maximum_interval
    }

    pub fn fuzzing_enabled(&self) -> bool {
        self.enable_fuzzing
    }

    /// Review a card, using the ambient thread RNG for fuzzing.
    ///
    /// Returns the updated card and the log record of this review.
    /// Reviews must be applied in ascending `now` order per card.
    pub fn review_card(
        &self,
        card: &Card,
        rating: Rating,
        now: DateTime<Utc>,
        review_duration: Option<u64>,
    ) -> (Card, ReviewLog) {
        let mut rng = rand::thread_rng();
        self.review_card_with_rng(card, rating, now, review_duration, &mut rng)
    }

    /// Review a card with a provided RNG, for reproducible scheduling.
    pub fn review_card_with_rng<R: Rng>(
        &self,
        card: &Card,
        rating: Rating,
        now: DateTime<Utc>,
        review_duration: Option<u64>,
        rng: &mut R,
    ) -> (Card, ReviewLog) {
        let (stability, difficulty) = self.next_memory_state(card, rating, now);

        let (state, step, interval_minutes) = match card.state {
            State::Learning => self.step_transition(
                State::Learning,
                &self.learning_steps,
                card.step.unwrap_or(0),
                rating,
                stability,
            ),
            State::Review => self.review_transition(rating, stability),
            State::Relearning => self.step_transition(
                State::Relearning,
                &self.relearning_steps,
                card.step.unwrap_or(0),
                rating,
                stability,
            ),
        };

        // Only day-scale intervals into the review state are fuzzed;
        // learning-step intervals stay exact.
        let interval_minutes = if state == State::Review && self.enable_fuzzing {
            let days = interval_minutes / MINUTES_PER_DAY;
            fuzz::fuzzed_interval_with_rng(rng, days, self.maximum_interval) * MINUTES_PER_DAY
        } else {
            interval_minutes
        };

        let updated = Card {
            card_id: card.card_id,
            state,
            step,
            stability: Some(stability),
            difficulty: Some(difficulty),
            due: now + Duration::minutes(interval_minutes.round() as i64),
            last_review: Some(now),
        };

        tracing::debug!(
            card_id = updated.card_id,
            rating = rating.as_str(),
            from = card.state.as_str(),
            to = state.as_str(),
            interval_minutes = interval_minutes.round(),
            "scheduled next review"
        );

        let log = ReviewLog {
            card: updated.clone(),
            rating,
            review_datetime: now,
            review_duration,
        };
        (updated, log)
    }

    /// The shared memory-state update: initial tables on the first
    /// review, the short-term formula within a day of the last review,
    /// the full model otherwise.
    fn next_memory_state(&self, card: &Card, rating: Rating, now: DateTime<Utc>) -> (f64, f64) {
        match (card.stability, card.difficulty) {
            (Some(stability), Some(difficulty)) => {
                let same_day = days_since_last_review(card, now).is_some_and(|days| days < 1);
                let next_stability = if same_day {
                    self.short_term_stability(stability, rating)
                } else {
                    let retrievability = self.card_retrievability(card, now);
                    self.next_stability(difficulty, stability, retrievability, rating)
                };
                (next_stability, self.next_difficulty(Some(difficulty), rating))
            }
            _ => (
                Self::initial_stability(rating),
                Self::initial_difficulty(rating),
            ),
        }
    }

    /// Transition for the two step-table states. `steps` is the table
    /// matching `state`. Returns the next state, step, and interval in
    /// minutes.
    fn step_transition(
        &self,
        state: State,
        steps: &[f64],
        step: usize,
        rating: Rating,
        stability: f64,
    ) -> (State, Option<usize>, f64) {
        // An empty table skips the state entirely. A step past the end
        // of the table (the table shrank between reviews) graduates on
        // any successful rating.
        if steps.is_empty() || (step >= steps.len() && rating != Rating::Again) {
            return self.graduate(stability);
        }

        match rating {
            Rating::Again => {
                if step + 1 == steps.len() {
                    self.graduate(stability)
                } else {
                    (state, Some(0), steps[0])
                }
            }
            Rating::Hard => {
                let interval = if step == 0 && steps.len() == 1 {
                    steps[0] * 1.5
                } else if step == 0 {
                    (steps[0] + steps[1]) / 2.0
                } else {
                    steps[step]
                };
                (state, Some(step), interval)
            }
            Rating::Good => {
                if step + 1 >= steps.len() {
                    self.graduate(stability)
                } else {
                    (state, Some(step + 1), steps[step + 1])
                }
            }
            Rating::Easy => self.graduate(stability),
        }
    }

    fn review_transition(&self, rating: Rating, stability: f64) -> (State, Option<usize>, f64) {
        match rating {
            Rating::Again => {
                if self.relearning_steps.is_empty() {
                    self.graduate(stability)
                } else {
                    (State::Relearning, Some(0), self.relearning_steps[0])
                }
            }
            Rating::Hard | Rating::Good | Rating::Easy => self.graduate(stability),
        }
    }

    fn graduate(&self, stability: f64) -> (State, Option<usize>, f64) {
        let days = self.interval_for_stability(stability);
        (State::Review, None, days as f64 * MINUTES_PER_DAY)
    }
}

/// Whole calendar days between the last review and `now`; `None` before
/// the first review.
fn days_since_last_review(card: &Card, now: DateTime<Utc>) -> Option<i64> {
    card.last_review.map(|last_review| (now - last_review).num_days())
}
