use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::state::MemoryStateStorage;
use crate::testimonials::api::{
    ApiError, FallbackTestimonialApi, MockTestimonialApi, Sourced, TestimonialGateway,
};
use crate::testimonials::domain::{
    FlagReceipt, HelpfulReceipt, NewReply, NewTestimonial, Reply, Testimonial, TestimonialId,
    TestimonialPatch,
};
use crate::testimonials::insights::{StatsQuery, TestimonialStats, TrendPoint, TrendsQuery};
use crate::testimonials::query::{TestimonialFilters, TestimonialPage};
use crate::testimonials::store::TestimonialStore;

/// Mock-backed gateway whose individual operations can be switched to fail.
pub(super) struct FlakyGateway {
    inner: FallbackTestimonialApi,
    pub(super) fail_list: AtomicBool,
    pub(super) fail_helpful: AtomicBool,
    pub(super) fail_replies: AtomicBool,
    pub(super) list_calls: AtomicUsize,
    pub(super) create_calls: AtomicUsize,
}

impl Default for FlakyGateway {
    fn default() -> Self {
        Self {
            inner: FallbackTestimonialApi::mock_only(MockTestimonialApi::seeded()),
            fail_list: AtomicBool::new(false),
            fail_helpful: AtomicBool::new(false),
            fail_replies: AtomicBool::new(false),
            list_calls: AtomicUsize::new(0),
            create_calls: AtomicUsize::new(0),
        }
    }
}

fn outage() -> ApiError {
    ApiError::Status {
        status: 503,
        message: "maintenance".to_string(),
    }
}

impl FlakyGateway {
    pub(super) fn set(flag: &AtomicBool, value: bool) {
        flag.store(value, Ordering::SeqCst);
    }

    fn failing(flag: &AtomicBool) -> bool {
        flag.load(Ordering::SeqCst)
    }
}

impl TestimonialGateway for FlakyGateway {
    fn get_testimonials(
        &self,
        filters: &TestimonialFilters,
    ) -> Result<Sourced<TestimonialPage>, ApiError> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if Self::failing(&self.fail_list) {
            return Err(outage());
        }
        self.inner.get_testimonials(filters)
    }

    fn get_testimonial_by_id(&self, id: &TestimonialId) -> Result<Sourced<Testimonial>, ApiError> {
        self.inner.get_testimonial_by_id(id)
    }

    fn create_testimonial(&self, input: NewTestimonial) -> Result<Sourced<Testimonial>, ApiError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.inner.create_testimonial(input)
    }

    fn update_testimonial(
        &self,
        id: &TestimonialId,
        patch: TestimonialPatch,
    ) -> Result<Sourced<Testimonial>, ApiError> {
        self.inner.update_testimonial(id, patch)
    }

    fn delete_testimonial(&self, id: &TestimonialId) -> Result<Sourced<()>, ApiError> {
        self.inner.delete_testimonial(id)
    }

    fn add_reply(&self, id: &TestimonialId, reply: NewReply) -> Result<Sourced<Reply>, ApiError> {
        if Self::failing(&self.fail_replies) {
            return Err(outage());
        }
        self.inner.add_reply(id, reply)
    }

    fn mark_as_helpful(&self, id: &TestimonialId) -> Result<Sourced<HelpfulReceipt>, ApiError> {
        if Self::failing(&self.fail_helpful) {
            return Err(outage());
        }
        self.inner.mark_as_helpful(id)
    }

    fn flag_testimonial(
        &self,
        id: &TestimonialId,
        reason: &str,
    ) -> Result<Sourced<FlagReceipt>, ApiError> {
        self.inner.flag_testimonial(id, reason)
    }

    fn get_testimonial_stats(
        &self,
        query: &StatsQuery,
    ) -> Result<Sourced<TestimonialStats>, ApiError> {
        self.inner.get_testimonial_stats(query)
    }

    fn get_testimonial_trends(
        &self,
        query: &TrendsQuery,
    ) -> Result<Sourced<Vec<TrendPoint>>, ApiError> {
        self.inner.get_testimonial_trends(query)
    }
}

pub(super) type TestStore = TestimonialStore<FlakyGateway, MemoryStateStorage>;

pub(super) fn open_store() -> (TestStore, Arc<FlakyGateway>, Arc<MemoryStateStorage>) {
    let gateway = Arc::new(FlakyGateway::default());
    let storage = Arc::new(MemoryStateStorage::default());
    let store = TestimonialStore::open(gateway.clone(), storage.clone()).expect("store opens");
    (store, gateway, storage)
}

pub(super) fn page_of(limit: u32) -> TestimonialFilters {
    TestimonialFilters {
        limit,
        ..TestimonialFilters::default()
    }
}

pub(super) fn ids(testimonials: &[Testimonial]) -> Vec<String> {
    testimonials
        .iter()
        .map(|testimonial| testimonial.id.0.clone())
        .collect()
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
