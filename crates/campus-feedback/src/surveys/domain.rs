use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::directory::ServiceId;
use crate::testimonials::domain::NewTestimonial;
use crate::util::dates::deserialize_optional_timestamp;
use crate::util::scores::sentiment_for_rating;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResponseId(pub String);

impl fmt::Display for ResponseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One answered question. Likert answers are string-encoded integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    #[serde(deserialize_with = "deserialize_answer_value")]
    pub answer: String,
}

impl Answer {
    pub fn new(question_id: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            question_id: question_id.into(),
            answer: answer.into(),
        }
    }
}

fn deserialize_answer_value<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawAnswer {
        Number(i64),
        Text(String),
    }

    Ok(match RawAnswer::deserialize(deserializer)? {
        RawAnswer::Number(number) => number.to_string(),
        RawAnswer::Text(text) => text,
    })
}

/// A submitted survey. Only `feedback` changes after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyResponse {
    pub id: ResponseId,
    pub service_id: ServiceId,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default = "Utc::now")]
    pub completed_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<SurveyFeedback>,
}

/// Inbound survey submission; `completedAt` defaults to the time of receipt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveySubmission {
    pub service_id: ServiceId,
    #[serde(default)]
    pub answers: Vec<Answer>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub completed_at: Option<DateTime<Utc>>,
}

/// Emoji scale shown after a survey is completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackMood {
    VeryDissatisfied,
    Dissatisfied,
    Neutral,
    Satisfied,
    VerySatisfied,
}

impl FeedbackMood {
    pub const fn emoji(self) -> &'static str {
        match self {
            Self::VeryDissatisfied => "😡",
            Self::Dissatisfied => "😞",
            Self::Neutral => "😐",
            Self::Satisfied => "🙂",
            Self::VerySatisfied => "😍",
        }
    }

    pub const fn rating(self) -> u8 {
        match self {
            Self::VeryDissatisfied => 1,
            Self::Dissatisfied => 2,
            Self::Neutral => 3,
            Self::Satisfied => 4,
            Self::VerySatisfied => 5,
        }
    }

    pub fn from_emoji(emoji: &str) -> Option<Self> {
        [
            Self::VeryDissatisfied,
            Self::Dissatisfied,
            Self::Neutral,
            Self::Satisfied,
            Self::VerySatisfied,
        ]
        .into_iter()
        .find(|mood| mood.emoji() == emoji.trim())
    }

    fn default_comment(self) -> &'static str {
        match self {
            Self::VeryDissatisfied => "Saya sangat tidak puas dengan layanan ini.",
            Self::Dissatisfied => "Layanan ini masih perlu banyak perbaikan.",
            Self::Neutral => "Layanan ini cukup, tidak ada yang istimewa.",
            Self::Satisfied => "Saya puas dengan layanan ini.",
            Self::VerySatisfied => "Saya sangat puas dengan layanan ini!",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyFeedback {
    pub mood: FeedbackMood,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    pub submitted_at: DateTime<Utc>,
}

impl SurveyFeedback {
    /// Builds the testimonial submission published from post-survey feedback.
    pub fn to_testimonial(
        &self,
        service_id: ServiceId,
        name: impl Into<String>,
        role: impl Into<String>,
    ) -> NewTestimonial {
        let content = self
            .comment
            .as_deref()
            .map(str::trim)
            .filter(|comment| !comment.is_empty())
            .unwrap_or_else(|| self.mood.default_comment())
            .to_string();
        let rating = self.mood.rating();
        let sentiment = sentiment_for_rating(rating);

        NewTestimonial {
            name: name.into(),
            role: role.into(),
            content,
            rating,
            sentiment: Some(sentiment),
            service_id: Some(service_id),
            user_type: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testimonials::domain::Sentiment;
    use serde_json::json;

    #[test]
    fn answers_accept_numeric_values() {
        let answer: Answer =
            serde_json::from_value(json!({ "questionId": "cp_1", "answer": 5 })).expect("parses");
        assert_eq!(answer.answer, "5");
    }

    #[test]
    fn missing_answers_default_to_empty() {
        let response: SurveyResponse = serde_json::from_value(json!({
            "id": "r-1",
            "serviceId": "2",
            "completedAt": "2024-06-01T09:00:00Z"
        }))
        .expect("parses");
        assert!(response.answers.is_empty());
    }

    #[test]
    fn feedback_becomes_testimonial_with_default_comment() {
        let feedback = SurveyFeedback {
            mood: FeedbackMood::from_emoji("😍").expect("known emoji"),
            comment: Some("   ".to_string()),
            submitted_at: Utc::now(),
        };
        let draft = feedback.to_testimonial(ServiceId::from("2"), "Dewi", "Mahasiswa");
        assert_eq!(draft.rating, 5);
        assert_eq!(draft.sentiment, Some(Sentiment::Positive));
        assert_eq!(draft.content, "Saya sangat puas dengan layanan ini!");
        assert_eq!(draft.service_id, Some(ServiceId::from("2")));
    }
}
