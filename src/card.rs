//! Card and review log entities with their JSON encoding.
//!
//! The canonical encoding uses string keys, snake_case enum names, and
//! ISO-8601 UTC timestamps. Decoding is tolerant: `state` and `rating`
//! are accepted either as their canonical names or as their integer
//! codes. Malformed input surfaces as [`FsrsError`] rather than a bare
//! serde message, so callers can branch on [`ErrorKind`].
//!
//! [`ErrorKind`]: crate::error::ErrorKind

use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{json, Map, Value};

use crate::error::{FsrsError, Result};
use crate::types::{Rating, State};

/// Per-card memory state and schedule position.
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    /// Stable identity; defaults to the creation timestamp in ms.
    pub card_id: i64,
    pub state: State,
    /// Index into the active step table; `None` iff `state` is `Review`.
    pub step: Option<usize>,
    /// Memory time-constant in days; `None` before the first review.
    pub stability: Option<f64>,
    /// Intrinsic hardness in [1.0, 10.0]; `None` before the first review.
    pub difficulty: Option<f64>,
    /// Earliest next review time.
    pub due: DateTime<Utc>,
    /// Time of the most recent review; `None` before the first review.
    pub last_review: Option<DateTime<Utc>>,
}

impl Card {
    /// Create a new card due immediately, using the ambient clock.
    pub fn new() -> Self {
        Self::new_at(Utc::now())
    }

    /// Create a new card with an injected creation time.
    pub fn new_at(now: DateTime<Utc>) -> Self {
        Self {
            card_id: now.timestamp_millis(),
            state: State::Learning,
            step: Some(0),
            stability: None,
            difficulty: None,
            due: now,
            last_review: None,
        }
    }

    /// Canonical JSON-map encoding.
    pub fn to_json(&self) -> Value {
        json!({
            "card_id": self.card_id,
            "state": self.state.as_str(),
            "step": self.step,
            "stability": self.stability,
            "difficulty": self.difficulty,
            "due": encode_datetime(self.due),
            "last_review": self.last_review.map(encode_datetime),
        })
    }

    /// Decode from a JSON map. Accepts integer codes for `state` and
    /// missing keys for the optional fields.
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = as_object(value)?;
        Ok(Self {
            card_id: require_i64(map, "card_id")?,
            state: parse_state(require(map, "state")?)?,
            step: optional_index(map, "step")?,
            stability: optional_f64(map, "stability")?,
            difficulty: optional_f64(map, "difficulty")?,
            due: parse_datetime("due", require(map, "due")?)?,
            last_review: optional_datetime(map, "last_review")?,
        })
    }
}

impl Default for Card {
    fn default() -> Self {
        Self::new()
    }
}

impl Serialize for Card {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Card {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(D::Error::custom)
    }
}

/// Record of one review: the updated card snapshot, the rating given,
/// the review time, and how long the answer took. Produced once per
/// review, never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct ReviewLog {
    pub card: Card,
    pub rating: Rating,
    pub review_datetime: DateTime<Utc>,
    /// Answer duration in milliseconds, when the caller measured one.
    pub review_duration: Option<u64>,
}

impl ReviewLog {
    /// Canonical JSON-map encoding.
    pub fn to_json(&self) -> Value {
        json!({
            "card": self.card.to_json(),
            "rating": self.rating.as_str(),
            "review_datetime": encode_datetime(self.review_datetime),
            "review_duration": self.review_duration,
        })
    }

    /// Decode from a JSON map. Accepts integer codes for `rating`.
    pub fn from_json(value: &Value) -> Result<Self> {
        let map = as_object(value)?;
        Ok(Self {
            card: Card::from_json(require(map, "card")?)?,
            rating: parse_rating(require(map, "rating")?)?,
            review_datetime: parse_datetime("review_datetime", require(map, "review_datetime")?)?,
            review_duration: optional_u64(map, "review_duration")?,
        })
    }
}

impl Serialize for ReviewLog {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ReviewLog {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_json(&value).map_err(D::Error::custom)
    }
}

fn encode_datetime(datetime: DateTime<Utc>) -> String {
    datetime.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn as_object(value: &Value) -> Result<&Map<String, Value>> {
    value.as_object().ok_or(FsrsError::InvalidField {
        field: "card",
        value: "expected a JSON object".to_string(),
    })
}

fn require<'a>(map: &'a Map<String, Value>, field: &'static str) -> Result<&'a Value> {
    match map.get(field) {
        Some(Value::Null) | None => Err(FsrsError::MissingField(field)),
        Some(value) => Ok(value),
    }
}

fn require_i64(map: &Map<String, Value>, field: &'static str) -> Result<i64> {
    let value = require(map, field)?;
    value.as_i64().ok_or_else(|| FsrsError::InvalidField {
        field,
        value: value.to_string(),
    })
}

fn optional_index(map: &Map<String, Value>, field: &'static str) -> Result<Option<usize>> {
    match map.get(field) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| FsrsError::InvalidField {
                field,
                value: value.to_string(),
            }),
    }
}

fn optional_f64(map: &Map<String, Value>, field: &'static str) -> Result<Option<f64>> {
    match map.get(field) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => value
            .as_f64()
            .map(Some)
            .ok_or_else(|| FsrsError::InvalidField {
                field,
                value: value.to_string(),
            }),
    }
}

fn optional_u64(map: &Map<String, Value>, field: &'static str) -> Result<Option<u64>> {
    match map.get(field) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => value
            .as_u64()
            .map(Some)
            .ok_or_else(|| FsrsError::InvalidField {
                field,
                value: value.to_string(),
            }),
    }
}

fn parse_datetime(field: &'static str, value: &Value) -> Result<DateTime<Utc>> {
    let text = value.as_str().ok_or_else(|| FsrsError::InvalidField {
        field,
        value: value.to_string(),
    })?;
    DateTime::parse_from_rfc3339(text)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| FsrsError::MalformedTimestamp {
            field,
            value: text.to_string(),
        })
}

fn optional_datetime(
    map: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<DateTime<Utc>>> {
    match map.get(field) {
        Some(Value::Null) | None => Ok(None),
        Some(value) => parse_datetime(field, value).map(Some),
    }
}

fn parse_state(value: &Value) -> Result<State> {
    match value {
        Value::String(name) => {
            State::from_name(name).ok_or_else(|| FsrsError::UnknownState(name.clone()))
        }
        Value::Number(code) => code
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .and_then(State::from_value)
            .ok_or_else(|| FsrsError::UnknownState(code.to_string())),
        other => Err(FsrsError::InvalidField {
            field: "state",
            value: other.to_string(),
        }),
    }
}

fn parse_rating(value: &Value) -> Result<Rating> {
    match value {
        Value::String(name) => {
            Rating::from_name(name).ok_or_else(|| FsrsError::UnknownRating(name.clone()))
        }
        Value::Number(code) => code
            .as_u64()
            .and_then(|v| u8::try_from(v).ok())
            .and_then(Rating::from_value)
            .ok_or_else(|| FsrsError::UnknownRating(code.to_string())),
        other => Err(FsrsError::InvalidField {
            field: "rating",
            value: other.to_string(),
        }),
    }
}
