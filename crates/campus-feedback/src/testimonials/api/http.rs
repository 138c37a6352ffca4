use std::time::Duration;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::{ApiError, TestimonialApi};
use crate::config::BackendConfig;
use crate::testimonials::domain::{
    FlagReceipt, HelpfulReceipt, NewReply, NewTestimonial, Reply, Testimonial, TestimonialId,
    TestimonialPatch,
};
use crate::testimonials::insights::{StatsQuery, TestimonialStats, TrendPoint, TrendsQuery};
use crate::testimonials::query::{TestimonialFilters, TestimonialPage};

const USER_AGENT: &str = concat!("campus-feedback/", env!("CARGO_PKG_VERSION"));

/// Blocking client for the remote testimonial REST API.
///
/// Calls block the current thread; async callers should run them on a
/// blocking task.
#[derive(Debug, Clone)]
pub struct HttpTestimonialApi {
    client: Client,
    base_url: String,
}

impl HttpTestimonialApi {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url.into().trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ApiError::Validation(
                "testimonial api base url must not be empty".to_string(),
            ));
        }

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()
            .map_err(|error| ApiError::Transport(error.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn from_config(config: &BackendConfig) -> Result<Self, ApiError> {
        Self::new(config.base_url.clone(), config.timeout)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/testimonials{}", self.base_url, path)
    }

    fn execute(&self, request: RequestBuilder, resource: &str) -> Result<Response, ApiError> {
        let response = request
            .send()
            .map_err(|error| ApiError::Transport(error.to_string()))?;
        let status = response.status();
        debug!(status = status.as_u16(), resource, "testimonial api responded");

        if status == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(resource.to_string()));
        }
        if !status.is_success() {
            let message = response
                .text()
                .ok()
                .filter(|body| !body.trim().is_empty())
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("error").to_string());
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response)
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        resource: &str,
    ) -> Result<T, ApiError> {
        self.execute(request, resource)?
            .json::<T>()
            .map_err(|error| ApiError::Parse(error.to_string()))
    }
}

impl TestimonialApi for HttpTestimonialApi {
    fn get_testimonials(&self, filters: &TestimonialFilters) -> Result<TestimonialPage, ApiError> {
        let request = self.client.get(self.url("")).query(&filters.to_query_pairs());
        self.send_json(request, "testimonials")
    }

    fn get_testimonial_by_id(&self, id: &TestimonialId) -> Result<Testimonial, ApiError> {
        let request = self.client.get(self.url(&format!("/{id}")));
        self.send_json(request, &id.0)
    }

    fn create_testimonial(&self, input: NewTestimonial) -> Result<Testimonial, ApiError> {
        let request = self.client.post(self.url("")).json(&input);
        self.send_json(request, "testimonials")
    }

    fn update_testimonial(
        &self,
        id: &TestimonialId,
        patch: TestimonialPatch,
    ) -> Result<Testimonial, ApiError> {
        let request = self.client.put(self.url(&format!("/{id}"))).json(&patch);
        self.send_json(request, &id.0)
    }

    fn delete_testimonial(&self, id: &TestimonialId) -> Result<(), ApiError> {
        let request = self.client.delete(self.url(&format!("/{id}")));
        self.execute(request, &id.0).map(|_| ())
    }

    fn add_reply(&self, id: &TestimonialId, reply: NewReply) -> Result<Reply, ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/{id}/replies")))
            .json(&reply);
        self.send_json(request, &id.0)
    }

    fn mark_as_helpful(&self, id: &TestimonialId) -> Result<HelpfulReceipt, ApiError> {
        let request = self.client.post(self.url(&format!("/{id}/helpful")));
        self.send_json(request, &id.0)
    }

    fn flag_testimonial(&self, id: &TestimonialId, reason: &str) -> Result<FlagReceipt, ApiError> {
        let request = self
            .client
            .post(self.url(&format!("/{id}/flag")))
            .json(&json!({ "reason": reason }));
        self.send_json(request, &id.0)
    }

    fn get_testimonial_stats(&self, query: &StatsQuery) -> Result<TestimonialStats, ApiError> {
        let mut params = vec![("period", query.period.key().to_string())];
        if let Some(service_id) = &query.service_id {
            params.push(("serviceId", service_id.to_string()));
        }
        let request = self.client.get(self.url("/stats")).query(&params);
        self.send_json(request, "stats")
    }

    fn get_testimonial_trends(&self, query: &TrendsQuery) -> Result<Vec<TrendPoint>, ApiError> {
        let mut params = vec![
            ("period", query.period.key().to_string()),
            ("interval", query.interval.key().to_string()),
        ];
        if let Some(service_id) = &query.service_id {
            params.push(("serviceId", service_id.to_string()));
        }
        let request = self.client.get(self.url("/trends")).query(&params);
        self.send_json(request, "trends")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_is_normalized() {
        let api = HttpTestimonialApi::new(" http://localhost:3000/api/v1/ ", Duration::from_secs(2))
            .expect("client builds");
        assert_eq!(api.base_url(), "http://localhost:3000/api/v1");
        assert_eq!(
            api.url("/t-1/helpful"),
            "http://localhost:3000/api/v1/testimonials/t-1/helpful"
        );
    }

    #[test]
    fn unreachable_backend_is_a_transport_error() {
        let api = HttpTestimonialApi::new("http://127.0.0.1:9", Duration::from_millis(200))
            .expect("client builds");
        match api.get_testimonials(&TestimonialFilters::default()) {
            Err(ApiError::Transport(_)) => {}
            other => panic!("expected transport error, got {other:?}"),
        }
    }
}
