use std::fmt;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::config::SessionConfig;

// =============================================================================
// Messages
// =============================================================================

/// Author of a stored chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One stored conversation turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

// =============================================================================
// Diagnosis
// =============================================================================

/// The current clinical assessment of a session.
///
/// The three assessment fields are always written together; there is no
/// partially filled diagnosis.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnosis {
    /// Severity score as reported by the model, e.g. `"6/10"`.
    pub score: String,
    /// Summary of the user's mental health state.
    pub content: String,
    /// Overall assessment.
    pub total_guess: String,
    /// ISO-8601 time the assessment was recorded.
    pub timestamp: String,
}

impl Diagnosis {
    /// Build a diagnosis stamped with the current time.
    pub fn new(
        score: impl Into<String>,
        content: impl Into<String>,
        total_guess: impl Into<String>,
    ) -> Self {
        Self {
            score: score.into(),
            content: content.into(),
            total_guess: total_guess.into(),
            timestamp: now_iso8601(),
        }
    }
}

/// Current UTC time as an RFC 3339 string with microsecond precision.
pub fn now_iso8601() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

// =============================================================================
// Session identity
// =============================================================================

/// Persistence key of a session: the derived user id plus the thread id.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey {
    pub user_id: String,
    pub thread_id: String,
}

impl SessionKey {
    pub fn new(user_id: impl Into<String>, thread_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            thread_id: thread_id.into(),
        }
    }

    /// Derive the key for a thread: `user_id` is the configured prefix
    /// followed by the first `user_id_len` characters of the thread id.
    pub fn derive(thread_id: impl Into<String>, config: &SessionConfig) -> Self {
        let thread_id = thread_id.into();
        let head: String = thread_id.chars().take(config.user_id_len).collect();
        Self {
            user_id: format!("{}{}", config.user_id_prefix, head),
            thread_id,
        }
    }

    /// File stem used by the JSON store: `{user_id}_{thread_id}`.
    pub fn file_stem(&self) -> String {
        format!("{}_{}", self.user_id, self.thread_id)
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.user_id, self.thread_id)
    }
}

// =============================================================================
// Persisted record
// =============================================================================

/// Full snapshot of a session as written to local storage.
///
/// `message_count` mirrors `messages.len()` at write time so external
/// readers can summarise a record without walking the history.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: String,
    pub thread_id: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub message_count: usize,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, with = "diagnosis_object")]
    pub diagnosis: Option<Diagnosis>,
}

impl SessionRecord {
    /// Build a snapshot stamped with the current time.
    pub fn snapshot(
        key: &SessionKey,
        messages: &[ChatMessage],
        diagnosis: Option<&Diagnosis>,
    ) -> Self {
        Self {
            user_id: key.user_id.clone(),
            thread_id: key.thread_id.clone(),
            timestamp: now_iso8601(),
            message_count: messages.len(),
            messages: messages.to_vec(),
            diagnosis: diagnosis.cloned(),
        }
    }

    pub fn key(&self) -> SessionKey {
        SessionKey::new(self.user_id.clone(), self.thread_id.clone())
    }

    /// Whether the stored count agrees with the stored history.
    pub fn is_consistent(&self) -> bool {
        self.message_count == self.messages.len()
    }
}

/// Serde adapter storing `None` as `{}` and accepting `{}`, `null`, or a
/// complete diagnosis object on read.
pub mod diagnosis_object {
    use serde::de::Error as _;
    use serde::ser::SerializeMap;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::Diagnosis;

    pub fn serialize<S>(value: &Option<Diagnosis>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(diagnosis) => diagnosis.serialize(serializer),
            None => serializer.serialize_map(Some(0))?.end(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Diagnosis>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Option::<serde_json::Value>::deserialize(deserializer)?;
        match value {
            None | Some(serde_json::Value::Null) => Ok(None),
            Some(serde_json::Value::Object(map)) if map.is_empty() => Ok(None),
            Some(other) => serde_json::from_value(other)
                .map(Some)
                .map_err(|e| D::Error::custom(format!("incomplete diagnosis: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_key() -> SessionKey {
        SessionKey::new("user_3f2a9c1e", "3f2a9c1e-8d7b-4e6f-a5c4-b3a2918d7e6f")
    }

    #[test]
    fn test_role_serializes_lowercase() {
        let json = serde_json::to_string(&ChatMessage::user("hi")).unwrap();
        assert_eq!(json, r#"{"role":"user","content":"hi"}"#);
        let json = serde_json::to_string(&ChatMessage::assistant("hello")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"hello"}"#);
    }

    #[test]
    fn test_unknown_role_rejected() {
        let result: std::result::Result<ChatMessage, _> =
            serde_json::from_str(r#"{"role":"tool","content":"x"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_derive_key_uses_prefix_and_head() {
        let config = SessionConfig::default();
        let key = SessionKey::derive("3f2a9c1e-8d7b-4e6f-a5c4-b3a2918d7e6f", &config);
        assert_eq!(key.user_id, "user_3f2a9c1e");
        assert_eq!(key.thread_id, "3f2a9c1e-8d7b-4e6f-a5c4-b3a2918d7e6f");
        assert_eq!(
            key.file_stem(),
            "user_3f2a9c1e_3f2a9c1e-8d7b-4e6f-a5c4-b3a2918d7e6f"
        );
    }

    #[test]
    fn test_derive_key_short_thread_id() {
        let config = SessionConfig::default();
        let key = SessionKey::derive("abc", &config);
        assert_eq!(key.user_id, "user_abc");
    }

    #[test]
    fn test_empty_diagnosis_serializes_as_empty_object() {
        let record = SessionRecord::snapshot(&sample_key(), &[], None);
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["diagnosis"], serde_json::json!({}));
        assert_eq!(value["message_count"], 0);
    }

    #[test]
    fn test_empty_and_null_diagnosis_read_as_none() {
        for diagnosis in [serde_json::json!({}), serde_json::Value::Null] {
            let json = serde_json::json!({
                "user_id": "u",
                "thread_id": "t",
                "timestamp": "",
                "message_count": 0,
                "messages": [],
                "diagnosis": diagnosis,
            });
            let record: SessionRecord = serde_json::from_value(json).unwrap();
            assert!(record.diagnosis.is_none());
        }
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let record: SessionRecord =
            serde_json::from_str(r#"{"user_id":"u","thread_id":"t"}"#).unwrap();
        assert!(record.messages.is_empty());
        assert!(record.diagnosis.is_none());
        assert!(record.is_consistent());
    }

    #[test]
    fn test_partial_diagnosis_is_rejected() {
        let json = r#"{"user_id":"u","thread_id":"t","messages":[],"diagnosis":{"score":"5/10"}}"#;
        let err = serde_json::from_str::<SessionRecord>(json).unwrap_err();
        assert!(err.to_string().contains("incomplete diagnosis"));
    }

    #[test]
    fn test_snapshot_counts_messages() {
        let messages = vec![
            ChatMessage::user("I feel anxious"),
            ChatMessage::assistant("I hear you"),
        ];
        let diagnosis =
            Diagnosis::new("6/10", "mild anxiety symptoms", "Generalized Anxiety, mild");
        let record = SessionRecord::snapshot(&sample_key(), &messages, Some(&diagnosis));
        assert_eq!(record.message_count, 2);
        assert_eq!(record.messages, messages);
        assert_eq!(record.diagnosis.as_ref().unwrap().score, "6/10");
        assert_eq!(record.key(), sample_key());
    }

    #[test]
    fn test_non_ascii_content_survives_json() {
        let messages = vec![ChatMessage::user("Tôi cảm thấy lo lắng")];
        let record = SessionRecord::snapshot(&sample_key(), &messages, None);
        let json = serde_json::to_string_pretty(&record).unwrap();
        assert!(json.contains("Tôi cảm thấy lo lắng"));
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
