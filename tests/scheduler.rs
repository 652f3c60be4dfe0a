//! End-to-end tests driving the public scheduler API.

use chrono::{DateTime, Duration, TimeZone, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;

use fsrs_core::{Card, Rating, ReviewLog, Scheduler, SchedulerConfig, State};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
}

fn deterministic_scheduler() -> Scheduler {
    Scheduler::new(SchedulerConfig {
        enable_fuzzing: false,
        ..SchedulerConfig::default()
    })
    .unwrap()
}

fn review_card_in(
    state: State,
    step: Option<usize>,
    stability: f64,
    difficulty: f64,
    last_review: DateTime<Utc>,
) -> Card {
    Card {
        card_id: 42,
        state,
        step,
        stability: Some(stability),
        difficulty: Some(difficulty),
        due: t0(),
        last_review: Some(last_review),
    }
}

#[test]
fn first_review_good_advances_to_second_learning_step() {
    let scheduler = deterministic_scheduler();
    let card = Card::new_at(t0());

    let (card, _) = scheduler.review_card(&card, Rating::Good, t0(), None);

    assert_eq!(card.state, State::Learning);
    assert_eq!(card.step, Some(1));
    assert_eq!(card.stability, Some(3.173));
    assert_eq!(card.difficulty, Some(5.282434422319005));
    assert_eq!(card.due, t0() + Duration::minutes(10));
    assert_eq!(card.last_review, Some(t0()));
}

#[test]
fn first_review_easy_graduates_with_day_scale_interval() {
    let scheduler = deterministic_scheduler();
    let card = Card::new_at(t0());

    let (card, _) = scheduler.review_card(&card, Rating::Easy, t0(), None);

    assert_eq!(card.state, State::Review);
    assert_eq!(card.step, None);
    assert_eq!(card.stability, Some(15.69105));
    assert!(card.due - t0() >= Duration::days(1));
}

#[test]
fn first_review_uses_the_fixed_initial_tables() {
    let scheduler = deterministic_scheduler();
    let expected = [
        (Rating::Again, 0.40255, 7.1949),
        (Rating::Hard, 1.18385, 6.488305268471453),
        (Rating::Good, 3.173, 5.282434422319005),
        (Rating::Easy, 15.69105, 3.2245015893713678),
    ];
    for (rating, stability, difficulty) in expected {
        let (card, _) = scheduler.review_card(&Card::new_at(t0()), rating, t0(), None);
        assert_eq!(card.stability, Some(stability));
        assert_eq!(card.difficulty, Some(difficulty));
    }
}

#[test]
fn good_on_last_learning_step_graduates() {
    let scheduler = deterministic_scheduler();
    let card = review_card_in(
        State::Learning,
        Some(1),
        3.173,
        5.282434422319005,
        t0() - Duration::minutes(10),
    );

    let (card, _) = scheduler.review_card(&card, Rating::Good, t0(), None);

    assert_eq!(card.state, State::Review);
    assert_eq!(card.step, None);
}

#[test]
fn lapsed_review_card_enters_relearning() {
    let scheduler = deterministic_scheduler();
    let card = review_card_in(State::Review, None, 10.0, 5.0, t0() - Duration::days(10));

    let (card, _) = scheduler.review_card(&card, Rating::Again, t0(), None);

    assert_eq!(card.state, State::Relearning);
    assert_eq!(card.step, Some(0));
    assert_eq!(card.due, t0() + Duration::minutes(10));
    assert!(card.difficulty.unwrap() > 5.0);
    assert!(card.stability.unwrap() < 10.0);
}

#[test]
fn hard_in_relearning_stretches_the_single_step() {
    let scheduler = deterministic_scheduler();
    let card = review_card_in(State::Relearning, Some(0), 5.0, 7.0, t0() - Duration::days(1));

    let (card, _) = scheduler.review_card(&card, Rating::Hard, t0(), None);

    assert_eq!(card.state, State::Relearning);
    assert_eq!(card.step, Some(0));
    assert_eq!(card.due, t0() + Duration::minutes(15));
}

#[test]
fn interval_never_exceeds_the_maximum() {
    let scheduler = deterministic_scheduler();
    let card = review_card_in(State::Review, None, 1_000_000.0, 5.0, t0() - Duration::days(10));

    let (card, _) = scheduler.review_card(&card, Rating::Good, t0(), None);

    assert_eq!((card.due - t0()).num_days(), 36500);
}

#[test]
fn interval_ceiling_holds_with_fuzzing_enabled() {
    let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
    let card = review_card_in(State::Review, None, 1_000_000.0, 5.0, t0() - Duration::days(10));
    let mut rng = StdRng::seed_from_u64(99);

    for _ in 0..50 {
        let (updated, _) = scheduler.review_card_with_rng(&card, Rating::Good, t0(), None, &mut rng);
        assert!((updated.due - t0()).num_days() <= 36500);
    }
}

#[test]
fn reviews_are_deterministic_without_fuzzing() {
    let scheduler = deterministic_scheduler();
    let card = review_card_in(State::Review, None, 25.0, 6.0, t0() - Duration::days(20));

    let (a, log_a) = scheduler.review_card(&card, Rating::Good, t0(), Some(1500));
    let (b, log_b) = scheduler.review_card(&card, Rating::Good, t0(), Some(1500));

    assert_eq!(a, b);
    assert_eq!(log_a, log_b);
}

#[test]
fn sub_three_day_intervals_are_never_fuzzed() {
    // Hard on a weak review card lands on a 1-day interval, below the
    // fuzzing threshold, so even with fuzzing on the due date is exact.
    let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
    let card = review_card_in(State::Review, None, 0.5, 5.0, t0() - Duration::days(1));

    for _ in 0..20 {
        let (updated, _) = scheduler.review_card(&card, Rating::Hard, t0(), None);
        assert_eq!(updated.due, t0() + Duration::days(1));
    }
}

#[test]
fn learning_steps_are_never_fuzzed() {
    let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
    let card = Card::new_at(t0());

    for _ in 0..20 {
        let (updated, _) = scheduler.review_card(&card, Rating::Good, t0(), None);
        assert_eq!(updated.due, t0() + Duration::minutes(10));
    }
}

#[test]
fn review_walk_preserves_card_invariants() {
    let scheduler = Scheduler::new(SchedulerConfig::default()).unwrap();
    let mut rng = StdRng::seed_from_u64(1234);
    let mut card = Card::new_at(t0());
    let mut now = t0();

    let ratings = [
        Rating::Again,
        Rating::Good,
        Rating::Good,
        Rating::Hard,
        Rating::Good,
        Rating::Easy,
        Rating::Again,
        Rating::Good,
        Rating::Good,
        Rating::Good,
        Rating::Again,
        Rating::Easy,
    ];

    for rating in ratings {
        let (updated, log) = scheduler.review_card_with_rng(&card, rating, now, None, &mut rng);

        assert_eq!(updated.last_review, Some(now));
        assert!(updated.due >= now);
        let difficulty = updated.difficulty.unwrap();
        assert!((1.0..=10.0).contains(&difficulty));
        assert!(updated.stability.unwrap() > 0.0);
        assert_eq!(updated.state == State::Review, updated.step.is_none());
        if updated.state == State::Review {
            assert!((updated.due - now).num_days() <= 36500);
        }
        assert_eq!(log.card, updated);

        card = updated;
        now = card.due.max(now + Duration::minutes(1));
    }
}

#[test]
fn card_survives_encode_decode_across_reviews() {
    let scheduler = deterministic_scheduler();
    let mut card = Card::new_at(t0());
    let mut now = t0();

    for rating in [Rating::Good, Rating::Good, Rating::Again, Rating::Good] {
        let (updated, log) = scheduler.review_card(&card, rating, now, Some(1800));

        let decoded = Card::from_json(&updated.to_json()).unwrap();
        assert_eq!(decoded, updated);

        let decoded_log = ReviewLog::from_json(&log.to_json()).unwrap();
        assert_eq!(decoded_log, log);

        card = updated;
        now = card.due.max(now + Duration::minutes(1));
    }
}

#[test]
fn schedulers_are_shareable_across_threads() {
    let scheduler = std::sync::Arc::new(deterministic_scheduler());
    let card = Card::new_at(t0());

    let handles: Vec<_> = (0..4)
        .map(|_| {
            let scheduler = std::sync::Arc::clone(&scheduler);
            let card = card.clone();
            std::thread::spawn(move || scheduler.review_card(&card, Rating::Good, t0(), None).0)
        })
        .collect();

    let results: Vec<Card> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    for result in &results[1..] {
        assert_eq!(result, &results[0]);
    }
}
