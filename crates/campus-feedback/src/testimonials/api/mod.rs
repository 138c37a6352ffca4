//! Testimonial backend contract plus its mock, HTTP, and fallback implementations.

pub mod fallback;
pub mod http;
pub mod mock;

pub use fallback::{DataSource, DegradedReason, FallbackTestimonialApi, Sourced, TestimonialGateway};
pub use http::HttpTestimonialApi;
pub use mock::MockTestimonialApi;

use super::domain::{
    FlagReceipt, HelpfulReceipt, NewReply, NewTestimonial, Reply, Testimonial, TestimonialId,
    TestimonialPatch,
};
use super::insights::{StatsQuery, TestimonialStats, TrendPoint, TrendsQuery};
use super::query::{TestimonialFilters, TestimonialPage};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    #[error("testimonial backend unreachable: {0}")]
    Transport(String),
    #[error("testimonial backend returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("unexpected testimonial payload: {0}")]
    Parse(String),
    #[error("testimonial {0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
}

impl ApiError {
    /// Text shown to the user in an error notification.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) | Self::Parse(_) => {
                "Tidak dapat terhubung ke server. Silakan coba lagi.".to_string()
            }
            Self::Status { status, .. } => format!("Server mengembalikan kesalahan ({status})."),
            Self::NotFound(_) => "Testimoni tidak ditemukan.".to_string(),
            Self::Validation(message) => message.clone(),
        }
    }
}

/// Operations every testimonial backend exposes.
pub trait TestimonialApi: Send + Sync {
    fn get_testimonials(&self, filters: &TestimonialFilters) -> Result<TestimonialPage, ApiError>;
    fn get_testimonial_by_id(&self, id: &TestimonialId) -> Result<Testimonial, ApiError>;
    fn create_testimonial(&self, input: NewTestimonial) -> Result<Testimonial, ApiError>;
    fn update_testimonial(
        &self,
        id: &TestimonialId,
        patch: TestimonialPatch,
    ) -> Result<Testimonial, ApiError>;
    fn delete_testimonial(&self, id: &TestimonialId) -> Result<(), ApiError>;
    fn add_reply(&self, id: &TestimonialId, reply: NewReply) -> Result<Reply, ApiError>;
    fn mark_as_helpful(&self, id: &TestimonialId) -> Result<HelpfulReceipt, ApiError>;
    fn flag_testimonial(&self, id: &TestimonialId, reason: &str) -> Result<FlagReceipt, ApiError>;
    fn get_testimonial_stats(&self, query: &StatsQuery) -> Result<TestimonialStats, ApiError>;
    fn get_testimonial_trends(&self, query: &TrendsQuery) -> Result<Vec<TrendPoint>, ApiError>;
}
