//! Testimonial browsing, aggregation, and the optimistic client-side store.
//!
//! The store talks to a [`TestimonialGateway`], normally a
//! [`FallbackTestimonialApi`] that prefers the remote REST backend and falls
//! back to the seeded in-memory mock when it is unreachable.

pub mod api;
pub mod domain;
pub mod import;
pub mod insights;
pub mod query;
pub mod router;
pub mod seed;
pub mod store;

#[cfg(test)]
mod tests;

pub use api::{
    ApiError, DataSource, DegradedReason, FallbackTestimonialApi, HttpTestimonialApi,
    MockTestimonialApi, Sourced, TestimonialApi, TestimonialGateway,
};
pub use domain::{
    FlagReceipt, HelpfulReceipt, NewReply, NewTestimonial, Reply, Sentiment, Testimonial,
    TestimonialId, TestimonialPatch, UserType,
};
pub use import::{TestimonialCsvImporter, TestimonialImportError};
pub use insights::{
    testimonial_stats, testimonial_trends, StatsPeriod, StatsQuery, TestimonialStats,
    TrendInterval, TrendPoint, TrendsQuery,
};
pub use query::{
    derive_user_type, run_query, PageMeta, SortOrder, TestimonialFilters, TestimonialPage,
    TestimonialQueryParams,
};
pub use router::testimonial_router;
pub use seed::sample_testimonials;
pub use store::{
    FetchStatus, FetchTicket, HelpfulOutcome, Notification, NotificationLevel, TestimonialStore,
    TESTIMONIAL_NAMESPACE,
};
