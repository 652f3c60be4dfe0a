//! Core FSRS (Free Spaced Repetition Scheduler) library.
//!
//! Provides:
//! - Per-card memory state (`Card`) and append-only review records (`ReviewLog`)
//! - The FSRS memory model: stability, difficulty, retrievability
//! - The three-state review engine (learning / review / relearning)
//! - Banded interval fuzzing with an injectable random source
//!
//! The scheduler operates on one card per call and performs no I/O; clock
//! and randomness are supplied by the caller. Persistence of cards and
//! logs is left to the embedding application, which can use the canonical
//! JSON encoding on [`Card`] and [`ReviewLog`].
//!
//! ```
//! use chrono::Utc;
//! use fsrs_core::{Card, Rating, Scheduler};
//!
//! let scheduler = Scheduler::default();
//! let card = Card::new();
//! let (card, _log) = scheduler.review_card(&card, Rating::Good, Utc::now(), None);
//! assert!(card.due > Utc::now());
//! ```

pub mod card;
pub mod error;
pub mod scheduler;
pub mod types;

pub use card::{Card, ReviewLog};
pub use error::{ErrorKind, FsrsError, Result};
pub use scheduler::{Scheduler, SchedulerConfig};
pub use types::{Rating, State};
