use serde::Serialize;
use tracing::warn;

use super::{ApiError, HttpTestimonialApi, MockTestimonialApi, TestimonialApi};
use crate::config::{BackendConfig, BackendMode};
use crate::testimonials::domain::{
    FlagReceipt, HelpfulReceipt, NewReply, NewTestimonial, Reply, Testimonial, TestimonialId,
    TestimonialPatch,
};
use crate::testimonials::insights::{StatsQuery, TestimonialStats, TrendPoint, TrendsQuery};
use crate::testimonials::query::{TestimonialFilters, TestimonialPage};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DegradedReason {
    pub operation: &'static str,
    pub error: String,
}

/// Where a result came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DataSource {
    Live,
    Mock,
    /// The remote call failed and mock data was served instead.
    Degraded { reason: DegradedReason },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sourced<T> {
    pub value: T,
    pub source: DataSource,
}

impl<T> Sourced<T> {
    pub fn is_degraded(&self) -> bool {
        matches!(self.source, DataSource::Degraded { .. })
    }

    pub fn map<U>(self, apply: impl FnOnce(T) -> U) -> Sourced<U> {
        Sourced {
            value: apply(self.value),
            source: self.source,
        }
    }
}

/// Testimonial operations as seen by the store: every success carries its source.
pub trait TestimonialGateway: Send + Sync {
    fn get_testimonials(
        &self,
        filters: &TestimonialFilters,
    ) -> Result<Sourced<TestimonialPage>, ApiError>;
    fn get_testimonial_by_id(&self, id: &TestimonialId) -> Result<Sourced<Testimonial>, ApiError>;
    fn create_testimonial(&self, input: NewTestimonial) -> Result<Sourced<Testimonial>, ApiError>;
    fn update_testimonial(
        &self,
        id: &TestimonialId,
        patch: TestimonialPatch,
    ) -> Result<Sourced<Testimonial>, ApiError>;
    fn delete_testimonial(&self, id: &TestimonialId) -> Result<Sourced<()>, ApiError>;
    fn add_reply(&self, id: &TestimonialId, reply: NewReply) -> Result<Sourced<Reply>, ApiError>;
    fn mark_as_helpful(&self, id: &TestimonialId) -> Result<Sourced<HelpfulReceipt>, ApiError>;
    fn flag_testimonial(
        &self,
        id: &TestimonialId,
        reason: &str,
    ) -> Result<Sourced<FlagReceipt>, ApiError>;
    fn get_testimonial_stats(
        &self,
        query: &StatsQuery,
    ) -> Result<Sourced<TestimonialStats>, ApiError>;
    fn get_testimonial_trends(
        &self,
        query: &TrendsQuery,
    ) -> Result<Sourced<Vec<TrendPoint>>, ApiError>;
}

/// Remote backend with the in-memory mock behind it.
///
/// Without a remote every call goes to the mock. With one, any remote
/// failure is logged and the same call is answered by the mock, tagged
/// [`DataSource::Degraded`].
#[derive(Debug, Clone)]
pub struct FallbackTestimonialApi<R = HttpTestimonialApi> {
    remote: Option<R>,
    mock: MockTestimonialApi,
}

impl FallbackTestimonialApi<HttpTestimonialApi> {
    pub fn from_config(
        config: &BackendConfig,
        mock: MockTestimonialApi,
    ) -> Result<Self, ApiError> {
        match config.mode {
            BackendMode::Mock => Ok(Self::mock_only(mock)),
            BackendMode::Live => Ok(Self::with_remote(
                HttpTestimonialApi::from_config(config)?,
                mock,
            )),
        }
    }
}

impl<R: TestimonialApi> FallbackTestimonialApi<R> {
    pub fn mock_only(mock: MockTestimonialApi) -> Self {
        Self { remote: None, mock }
    }

    pub fn with_remote(remote: R, mock: MockTestimonialApi) -> Self {
        Self {
            remote: Some(remote),
            mock,
        }
    }

    pub fn mock(&self) -> &MockTestimonialApi {
        &self.mock
    }

    pub fn is_live(&self) -> bool {
        self.remote.is_some()
    }

    fn call<T>(
        &self,
        operation: &'static str,
        remote_call: impl FnOnce(&R) -> Result<T, ApiError>,
        mock_call: impl FnOnce(&MockTestimonialApi) -> Result<T, ApiError>,
    ) -> Result<Sourced<T>, ApiError> {
        let Some(remote) = &self.remote else {
            return mock_call(&self.mock).map(|value| Sourced {
                value,
                source: DataSource::Mock,
            });
        };

        match remote_call(remote) {
            Ok(value) => Ok(Sourced {
                value,
                source: DataSource::Live,
            }),
            Err(error) => {
                warn!(operation, error = %error, "remote testimonial api failed, serving mock data");
                mock_call(&self.mock).map(|value| Sourced {
                    value,
                    source: DataSource::Degraded {
                        reason: DegradedReason {
                            operation,
                            error: error.to_string(),
                        },
                    },
                })
            }
        }
    }
}

impl<R: TestimonialApi> TestimonialGateway for FallbackTestimonialApi<R> {
    fn get_testimonials(
        &self,
        filters: &TestimonialFilters,
    ) -> Result<Sourced<TestimonialPage>, ApiError> {
        self.call(
            "get_testimonials",
            |api| api.get_testimonials(filters),
            |mock| mock.get_testimonials(filters),
        )
    }

    fn get_testimonial_by_id(&self, id: &TestimonialId) -> Result<Sourced<Testimonial>, ApiError> {
        self.call(
            "get_testimonial_by_id",
            |api| api.get_testimonial_by_id(id),
            |mock| mock.get_testimonial_by_id(id),
        )
    }

    fn create_testimonial(&self, input: NewTestimonial) -> Result<Sourced<Testimonial>, ApiError> {
        let retry = input.clone();
        self.call(
            "create_testimonial",
            |api| api.create_testimonial(input),
            |mock| mock.create_testimonial(retry),
        )
    }

    fn update_testimonial(
        &self,
        id: &TestimonialId,
        patch: TestimonialPatch,
    ) -> Result<Sourced<Testimonial>, ApiError> {
        let retry = patch.clone();
        self.call(
            "update_testimonial",
            |api| api.update_testimonial(id, patch),
            |mock| mock.update_testimonial(id, retry),
        )
    }

    fn delete_testimonial(&self, id: &TestimonialId) -> Result<Sourced<()>, ApiError> {
        self.call(
            "delete_testimonial",
            |api| api.delete_testimonial(id),
            |mock| mock.delete_testimonial(id),
        )
    }

    fn add_reply(&self, id: &TestimonialId, reply: NewReply) -> Result<Sourced<Reply>, ApiError> {
        let retry = reply.clone();
        self.call(
            "add_reply",
            |api| api.add_reply(id, reply),
            |mock| mock.add_reply(id, retry),
        )
    }

    fn mark_as_helpful(&self, id: &TestimonialId) -> Result<Sourced<HelpfulReceipt>, ApiError> {
        self.call(
            "mark_as_helpful",
            |api| api.mark_as_helpful(id),
            |mock| mock.mark_as_helpful(id),
        )
    }

    fn flag_testimonial(
        &self,
        id: &TestimonialId,
        reason: &str,
    ) -> Result<Sourced<FlagReceipt>, ApiError> {
        self.call(
            "flag_testimonial",
            |api| api.flag_testimonial(id, reason),
            |mock| mock.flag_testimonial(id, reason),
        )
    }

    fn get_testimonial_stats(
        &self,
        query: &StatsQuery,
    ) -> Result<Sourced<TestimonialStats>, ApiError> {
        self.call(
            "get_testimonial_stats",
            |api| api.get_testimonial_stats(query),
            |mock| mock.get_testimonial_stats(query),
        )
    }

    fn get_testimonial_trends(
        &self,
        query: &TrendsQuery,
    ) -> Result<Sourced<Vec<TrendPoint>>, ApiError> {
        self.call(
            "get_testimonial_trends",
            |api| api.get_testimonial_trends(query),
            |mock| mock.get_testimonial_trends(query),
        )
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn mock_only_results_are_tagged_mock() {
        let gateway: FallbackTestimonialApi =
            FallbackTestimonialApi::mock_only(MockTestimonialApi::seeded());
        let page = gateway
            .get_testimonials(&TestimonialFilters::default())
            .expect("mock answers");
        assert_eq!(page.source, DataSource::Mock);
        assert!(!gateway.is_live());
    }

    #[test]
    fn unreachable_remote_degrades_to_mock() {
        let remote = HttpTestimonialApi::new("http://127.0.0.1:9", Duration::from_millis(200))
            .expect("client builds");
        let gateway = FallbackTestimonialApi::with_remote(remote, MockTestimonialApi::seeded());

        let page = gateway
            .get_testimonials(&TestimonialFilters::default())
            .expect("mock answers");
        assert!(page.is_degraded());
        assert_eq!(page.value.meta.total, 12);
        match page.source {
            DataSource::Degraded { reason } => assert_eq!(reason.operation, "get_testimonials"),
            other => panic!("expected degraded source, got {other:?}"),
        }
    }

    #[test]
    fn mock_validation_errors_still_surface() {
        let gateway: FallbackTestimonialApi =
            FallbackTestimonialApi::mock_only(MockTestimonialApi::empty());
        let result = gateway.flag_testimonial(&TestimonialId::from("t-404"), "spam");
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }
}
