use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::directory::ServiceId;
use crate::util::dates::deserialize_timestamp;

/// Identifier wrapper for testimonials.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TestimonialId(pub String);

impl fmt::Display for TestimonialId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TestimonialId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Tone of a testimonial. `Mixed` is accepted as a first-class value because
/// reviewers do submit balanced feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
    Mixed,
}

impl Sentiment {
    pub const fn ordered() -> [Self; 4] {
        [Self::Positive, Self::Neutral, Self::Negative, Self::Mixed]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
            Self::Mixed => "mixed",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "neutral" => Some(Self::Neutral),
            "negative" => Some(Self::Negative),
            "mixed" => Some(Self::Mixed),
            _ => None,
        }
    }
}

/// Audience segment of the reviewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    Student,
    Lecturer,
    Staff,
    Prospective,
    Alumni,
    Public,
    Partner,
}

impl UserType {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Lecturer => "lecturer",
            Self::Staff => "staff",
            Self::Prospective => "prospective",
            Self::Alumni => "alumni",
            Self::Public => "public",
            Self::Partner => "partner",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "student" => Some(Self::Student),
            "lecturer" => Some(Self::Lecturer),
            "staff" => Some(Self::Staff),
            "prospective" => Some(Self::Prospective),
            "alumni" => Some(Self::Alumni),
            "public" => Some(Self::Public),
            "partner" => Some(Self::Partner),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reply {
    pub id: String,
    pub author: String,
    pub content: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_admin: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: TestimonialId,
    pub name: String,
    pub role: String,
    pub content: String,
    pub rating: u8,
    pub sentiment: Sentiment,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub date: DateTime<Utc>,
    pub service_id: ServiceId,
    pub service_name: String,
    #[serde(default)]
    pub helpful_count: u32,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub replies: Vec<Reply>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
}

impl Testimonial {
    /// Record rendered when a requested testimonial cannot be loaded.
    pub fn placeholder(id: TestimonialId) -> Self {
        Self {
            id,
            name: "Pengguna Anonim".to_string(),
            role: "Pengunjung".to_string(),
            content: "Testimoni tidak tersedia.".to_string(),
            rating: 3,
            sentiment: Sentiment::Neutral,
            date: DateTime::<Utc>::UNIX_EPOCH,
            service_id: ServiceId::from("unknown"),
            service_name: "Layanan tidak diketahui".to_string(),
            helpful_count: 0,
            is_verified: false,
            is_featured: false,
            replies: Vec::new(),
            user_type: Some(UserType::Public),
            region: None,
            category: None,
        }
    }
}

/// Payload accepted when creating a testimonial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTestimonial {
    pub name: String,
    pub role: String,
    pub content: String,
    pub rating: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<ServiceId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_type: Option<UserType>,
}

/// Partial update; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Sentiment>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_featured: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_verified: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReply {
    pub author: String,
    pub content: String,
    #[serde(default)]
    pub is_admin: bool,
    /// Client-side correlation token echoed back so optimistic entries can be reconciled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_token: Option<String>,
}

/// Response to a "helpful" mark.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelpfulReceipt {
    pub helpful_count: u32,
}

/// Acknowledgement of an inappropriate-content flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlagReceipt {
    pub testimonial_id: TestimonialId,
    pub reason: String,
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub flagged_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_backend_payload_with_numeric_service_id_and_plain_date() {
        let payload = json!({
            "id": "t-1",
            "name": "Rina",
            "role": "Mahasiswa Teknik",
            "content": "Pelayanan cepat",
            "rating": 5,
            "sentiment": "mixed",
            "date": "2024-03-15",
            "serviceId": 3,
            "serviceName": "Bagian Keuangan"
        });

        let testimonial: Testimonial = serde_json::from_value(payload).expect("valid payload");
        assert_eq!(testimonial.service_id.as_str(), "3");
        assert_eq!(testimonial.sentiment, Sentiment::Mixed);
        assert_eq!(testimonial.date.to_rfc3339(), "2024-03-15T00:00:00+00:00");
        assert!(testimonial.replies.is_empty());
        assert_eq!(testimonial.helpful_count, 0);
    }

    #[test]
    fn placeholder_is_neutral_and_unverified() {
        let placeholder = Testimonial::placeholder(TestimonialId::from("missing"));
        assert_eq!(placeholder.id.0, "missing");
        assert_eq!(placeholder.sentiment, Sentiment::Neutral);
        assert!(!placeholder.is_verified);
    }
}
