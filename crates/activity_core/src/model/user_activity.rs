use super::activity::ActivityId;
use super::attributes::{AttributeBag, AttributeError};
use super::user::UserId;
use serde::{Deserialize, Serialize};

/// Store-assigned user activity identifier.
pub type UserActivityId = i64;

/// One user performing one activity over an interval.
///
/// `duration_ms` is stored independently of `start_time`/`end_time`; the
/// two are not reconciled and may disagree.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct UserActivity {
    #[serde(default)]
    pub id: UserActivityId,
    /// Immutable after creation.
    pub user_id: UserId,
    /// Immutable after creation.
    pub activity_id: ActivityId,
    /// Epoch milliseconds.
    pub start_time: i64,
    /// Epoch milliseconds.
    pub end_time: i64,
    pub duration_ms: i64,
    /// Self-reported mood score. No range is enforced.
    pub mood: i64,
    #[serde(default)]
    pub attributes: AttributeBag,
    /// Epoch milliseconds, set by the repository at creation.
    #[serde(default)]
    pub recorded_at: i64,
}

impl UserActivity {
    /// Builds a not-yet-persisted record with an empty attribute bag.
    pub fn new(user_id: UserId, activity_id: ActivityId) -> Self {
        Self {
            user_id,
            activity_id,
            ..Self::default()
        }
    }

    /// Sets start, end and duration from one interval.
    pub fn with_interval(mut self, start_time: i64, end_time: i64) -> Self {
        self.start_time = start_time;
        self.end_time = end_time;
        self.duration_ms = end_time - start_time;
        self
    }

    pub fn with_mood(mut self, mood: i64) -> Self {
        self.mood = mood;
        self
    }

    pub fn with_attributes(mut self, attributes: AttributeBag) -> Self {
        self.attributes = attributes;
        self
    }

    /// Encodes the attribute bag to its stored document form.
    pub fn encode_attributes(&self) -> Result<String, AttributeError> {
        self.attributes.encode()
    }

    /// Replaces the attribute bag with one decoded from a stored document.
    ///
    /// On failure the current bag is left untouched.
    pub fn decode_attributes(&mut self, bytes: &[u8]) -> Result<(), AttributeError> {
        self.attributes = AttributeBag::decode(bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::UserActivity;
    use crate::model::attributes::{AttributeBag, KNEE_FEELING};

    #[test]
    fn with_interval_derives_duration_once() {
        let record = UserActivity::new(1, 2).with_interval(1_000, 61_000);
        assert_eq!(record.duration_ms, 60_000);

        let mut edited = record.clone();
        edited.end_time = 121_000;
        assert_eq!(edited.duration_ms, 60_000);
    }

    #[test]
    fn failed_decode_keeps_previous_bag() {
        let bag = AttributeBag::new().with(KNEE_FEELING, "fine");
        let mut record = UserActivity::new(1, 2).with_attributes(bag.clone());

        assert!(record.decode_attributes(b"[]").is_err());
        assert_eq!(record.attributes, bag);

        record.decode_attributes(br#"{"knee_feeling":"sore"}"#).unwrap();
        assert_eq!(record.attributes.text(KNEE_FEELING), Some("sore"));
    }

    #[test]
    fn json_shape_nests_attributes_as_object() {
        let record = UserActivity::new(3, 4)
            .with_mood(7)
            .with_attributes(AttributeBag::new().with(KNEE_FEELING, "sore"));

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["attributes"]["knee_feeling"], "sore");
        assert_eq!(value["mood"], 7);

        let parsed: UserActivity = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn mood_accepts_values_beyond_32_bits() {
        let parsed: UserActivity = serde_json::from_str(
            r#"{"user_id":1,"activity_id":2,"start_time":0,"end_time":0,"duration_ms":0,"mood":5000000000}"#,
        )
        .unwrap();
        assert_eq!(parsed.mood, 5_000_000_000);
    }
}
