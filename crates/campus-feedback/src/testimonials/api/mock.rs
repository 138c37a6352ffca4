use std::sync::{Arc, Mutex};

use chrono::Utc;
use tracing::debug;
use uuid::Uuid;

use super::{ApiError, TestimonialApi};
use crate::directory::ServiceDirectory;
use crate::testimonials::domain::{
    FlagReceipt, HelpfulReceipt, NewReply, NewTestimonial, Reply, Testimonial, TestimonialId,
    TestimonialPatch,
};
use crate::testimonials::insights::{
    testimonial_stats, testimonial_trends, StatsQuery, TestimonialStats, TrendPoint, TrendsQuery,
};
use crate::testimonials::query::{run_query, TestimonialFilters, TestimonialPage};
use crate::util::scores::sentiment_for_rating;

const ANONYMOUS_NAME: &str = "Anonim";

/// Rejects submissions the backend would refuse before any call is made.
pub fn validate_submission(input: &NewTestimonial) -> Result<(), ApiError> {
    if input.service_id.is_none() {
        return Err(ApiError::Validation(
            "Silakan pilih layanan terlebih dahulu.".to_string(),
        ));
    }
    validate_rating(input.rating)?;
    if input.content.trim().is_empty() {
        return Err(ApiError::Validation("Isi testimoni tidak boleh kosong.".to_string()));
    }
    Ok(())
}

fn validate_rating(rating: u8) -> Result<(), ApiError> {
    if (1..=5).contains(&rating) {
        Ok(())
    } else {
        Err(ApiError::Validation(format!(
            "Rating harus antara 1 dan 5, diterima {rating}."
        )))
    }
}

#[derive(Debug, Default)]
struct MockState {
    testimonials: Vec<Testimonial>,
    flags: Vec<FlagReceipt>,
}

/// In-memory backend seeded with demonstration data.
#[derive(Debug, Clone)]
pub struct MockTestimonialApi {
    state: Arc<Mutex<MockState>>,
    directory: Arc<ServiceDirectory>,
}

impl MockTestimonialApi {
    pub fn new(testimonials: Vec<Testimonial>, directory: ServiceDirectory) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                testimonials,
                flags: Vec::new(),
            })),
            directory: Arc::new(directory),
        }
    }

    pub fn seeded() -> Self {
        Self::new(
            crate::testimonials::seed::sample_testimonials(),
            ServiceDirectory::standard(),
        )
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), ServiceDirectory::standard())
    }

    /// Adds records after construction, e.g. from a CSV import.
    pub fn extend(&self, testimonials: impl IntoIterator<Item = Testimonial>) {
        let mut state = self.state.lock().expect("mock testimonial mutex poisoned");
        state.testimonials.extend(testimonials);
    }

    pub fn snapshot(&self) -> Vec<Testimonial> {
        self.state
            .lock()
            .expect("mock testimonial mutex poisoned")
            .testimonials
            .clone()
    }

    pub fn flags(&self) -> Vec<FlagReceipt> {
        self.state
            .lock()
            .expect("mock testimonial mutex poisoned")
            .flags
            .clone()
    }

    fn with_testimonial<T>(
        &self,
        id: &TestimonialId,
        apply: impl FnOnce(&mut Testimonial) -> Result<T, ApiError>,
    ) -> Result<T, ApiError> {
        let mut state = self.state.lock().expect("mock testimonial mutex poisoned");
        let testimonial = state
            .testimonials
            .iter_mut()
            .find(|testimonial| &testimonial.id == id)
            .ok_or_else(|| ApiError::NotFound(id.to_string()))?;
        apply(testimonial)
    }
}

impl Default for MockTestimonialApi {
    fn default() -> Self {
        Self::seeded()
    }
}

impl TestimonialApi for MockTestimonialApi {
    fn get_testimonials(&self, filters: &TestimonialFilters) -> Result<TestimonialPage, ApiError> {
        let state = self.state.lock().expect("mock testimonial mutex poisoned");
        Ok(run_query(&state.testimonials, filters))
    }

    fn get_testimonial_by_id(&self, id: &TestimonialId) -> Result<Testimonial, ApiError> {
        self.with_testimonial(id, |testimonial| Ok(testimonial.clone()))
    }

    fn create_testimonial(&self, input: NewTestimonial) -> Result<Testimonial, ApiError> {
        validate_submission(&input)?;
        let service_id = input.service_id.ok_or_else(|| {
            ApiError::Validation("Silakan pilih layanan terlebih dahulu.".to_string())
        })?;
        let unit = self.directory.find(&service_id).ok_or_else(|| {
            ApiError::Validation(format!("Layanan {service_id} tidak dikenal."))
        })?;

        let name = input.name.trim();
        let testimonial = Testimonial {
            id: TestimonialId(format!("t-{}", Uuid::new_v4().simple())),
            name: if name.is_empty() {
                ANONYMOUS_NAME.to_string()
            } else {
                name.to_string()
            },
            role: input.role.trim().to_string(),
            content: input.content.trim().to_string(),
            rating: input.rating,
            sentiment: input
                .sentiment
                .unwrap_or_else(|| sentiment_for_rating(input.rating)),
            date: Utc::now(),
            service_name: unit.name.to_string(),
            region: Some(unit.region.to_string()),
            category: Some(unit.category.slug().to_string()),
            service_id,
            helpful_count: 0,
            is_verified: false,
            is_featured: false,
            replies: Vec::new(),
            user_type: input.user_type,
        };

        let mut state = self.state.lock().expect("mock testimonial mutex poisoned");
        state.testimonials.insert(0, testimonial.clone());
        debug!(testimonial_id = %testimonial.id, service_id = %testimonial.service_id, "mock testimonial created");
        Ok(testimonial)
    }

    fn update_testimonial(
        &self,
        id: &TestimonialId,
        patch: TestimonialPatch,
    ) -> Result<Testimonial, ApiError> {
        if let Some(rating) = patch.rating {
            validate_rating(rating)?;
        }
        self.with_testimonial(id, |testimonial| {
            if let Some(content) = patch.content {
                testimonial.content = content;
            }
            if let Some(rating) = patch.rating {
                testimonial.rating = rating;
            }
            if let Some(sentiment) = patch.sentiment {
                testimonial.sentiment = sentiment;
            }
            if let Some(featured) = patch.is_featured {
                testimonial.is_featured = featured;
            }
            if let Some(verified) = patch.is_verified {
                testimonial.is_verified = verified;
            }
            Ok(testimonial.clone())
        })
    }

    /// Acknowledged without removing anything.
    fn delete_testimonial(&self, id: &TestimonialId) -> Result<(), ApiError> {
        debug!(testimonial_id = %id, "mock delete acknowledged without effect");
        Ok(())
    }

    fn add_reply(&self, id: &TestimonialId, reply: NewReply) -> Result<Reply, ApiError> {
        if reply.content.trim().is_empty() {
            return Err(ApiError::Validation("Balasan tidak boleh kosong.".to_string()));
        }
        self.with_testimonial(id, |testimonial| {
            let stored = Reply {
                id: format!("reply-{}", Uuid::new_v4().simple()),
                author: reply.author.trim().to_string(),
                content: reply.content.trim().to_string(),
                timestamp: Utc::now(),
                is_admin: reply.is_admin,
            };
            testimonial.replies.push(stored.clone());
            debug!(
                testimonial_id = %testimonial.id,
                client_token = reply.client_token.as_deref().unwrap_or("-"),
                "mock reply stored"
            );
            Ok(stored)
        })
    }

    fn mark_as_helpful(&self, id: &TestimonialId) -> Result<HelpfulReceipt, ApiError> {
        self.with_testimonial(id, |testimonial| {
            testimonial.helpful_count += 1;
            Ok(HelpfulReceipt {
                helpful_count: testimonial.helpful_count,
            })
        })
    }

    fn flag_testimonial(&self, id: &TestimonialId, reason: &str) -> Result<FlagReceipt, ApiError> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(ApiError::Validation("Alasan pelaporan wajib diisi.".to_string()));
        }
        self.with_testimonial(id, |_| Ok(()))?;

        let receipt = FlagReceipt {
            testimonial_id: id.clone(),
            reason: reason.to_string(),
            flagged_at: Utc::now(),
        };
        let mut state = self.state.lock().expect("mock testimonial mutex poisoned");
        state.flags.push(receipt.clone());
        Ok(receipt)
    }

    fn get_testimonial_stats(&self, query: &StatsQuery) -> Result<TestimonialStats, ApiError> {
        let state = self.state.lock().expect("mock testimonial mutex poisoned");
        Ok(testimonial_stats(&state.testimonials, query, Utc::now()))
    }

    fn get_testimonial_trends(&self, query: &TrendsQuery) -> Result<Vec<TrendPoint>, ApiError> {
        let state = self.state.lock().expect("mock testimonial mutex poisoned");
        Ok(testimonial_trends(&state.testimonials, query, Utc::now()))
    }
}
