//! Survey questionnaire, response scoring, and per-service response tracking.

pub mod domain;
pub mod questionnaire;
pub mod router;
pub mod scoring;
pub mod store;

pub use domain::{
    Answer, FeedbackMood, ResponseId, SurveyFeedback, SurveyResponse, SurveySubmission,
};
pub use questionnaire::{Question, QuestionCategory, QuestionKind, QuestionOption, Questionnaire};
pub use router::{survey_router, SurveyCatalog};
pub use scoring::{
    average_rating, category_score, detailed_scores, response_percentage, AverageRating,
    CategoryScore, DetailedScores, MAX_ANSWER_SCORE,
};
pub use store::{SurveyResponseStore, SurveyStoreError, SURVEY_NAMESPACE};
