use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::api::mock::validate_submission;
use super::api::{ApiError, DataSource, Sourced, TestimonialGateway};
use super::domain::{FlagReceipt, NewReply, NewTestimonial, Reply, Testimonial, TestimonialId};
use super::insights::{StatsQuery, TestimonialStats, TrendPoint, TrendsQuery};
use super::query::{matches, TestimonialFilters, TestimonialPage};
use crate::state::{load_versioned, save_versioned, StateError, StateStorage};

pub const TESTIMONIAL_NAMESPACE: &str = "testimonial-store";
const TESTIMONIAL_STATE_VERSION: u32 = 1;
const OPTIMISTIC_REPLY_PREFIX: &str = "tmp-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchStatus {
    Idle,
    Loading,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// Transient user-facing message, drained by the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Handle for one in-flight list fetch. Completing a ticket whose generation
/// is no longer current is a no-op.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    refresh: bool,
    filters: TestimonialFilters,
}

impl FetchTicket {
    pub fn filters(&self) -> &TestimonialFilters {
        &self.filters
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HelpfulOutcome {
    /// Already marked by this user; nothing was sent.
    AlreadyMarked,
    Confirmed { helpful_count: u32 },
    /// The server rejected the mark and the optimistic increment was undone.
    Reverted,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PersistedTestimonialState {
    #[serde(default)]
    filters: TestimonialFilters,
    #[serde(default)]
    liked: BTreeSet<TestimonialId>,
    #[serde(default)]
    expanded: BTreeSet<TestimonialId>,
}

/// Version 0 stored partial filter objects using `"all"` for disabled
/// filters and string-encoded ratings.
fn migrate_testimonial_state(from_version: u32, state: Value) -> Result<Value, String> {
    if from_version != 0 {
        return Err(format!("no migration path from version {from_version}"));
    }
    let Value::Object(mut root) = state else {
        return Err("expected an object".to_string());
    };

    let mut filters = match serde_json::to_value(TestimonialFilters::default()) {
        Ok(Value::Object(defaults)) => defaults,
        Ok(_) => Map::new(),
        Err(error) => return Err(error.to_string()),
    };
    if let Some(Value::Object(legacy)) = root.remove("filters") {
        for (key, value) in legacy {
            let value = match value {
                Value::String(text) if text.eq_ignore_ascii_case("all") => Value::Null,
                Value::String(text) if key == "rating" => text
                    .trim()
                    .parse::<u8>()
                    .map(Value::from)
                    .unwrap_or(Value::Null),
                other => other,
            };
            filters.insert(key, value);
        }
    }
    root.insert("filters".to_string(), Value::Object(filters));
    root.entry("liked").or_insert_with(|| Value::Array(Vec::new()));
    root.entry("expanded").or_insert_with(|| Value::Array(Vec::new()));
    Ok(Value::Object(root))
}

/// Paginated, filterable testimonial list with optimistic interactions.
///
/// `filters().page` is the next page to request. Only filters and the
/// liked/expanded sets are persisted; the list is always re-fetched.
pub struct TestimonialStore<G, S: ?Sized> {
    gateway: Arc<G>,
    storage: Arc<S>,
    testimonials: Vec<Testimonial>,
    filters: TestimonialFilters,
    status: FetchStatus,
    error: Option<String>,
    has_more: bool,
    total: usize,
    generation: u64,
    liked: BTreeSet<TestimonialId>,
    expanded: BTreeSet<TestimonialId>,
    last_source: Option<DataSource>,
    notifications: Vec<Notification>,
}

impl<G, S> TestimonialStore<G, S>
where
    G: TestimonialGateway,
    S: StateStorage + ?Sized,
{
    pub fn open(gateway: Arc<G>, storage: Arc<S>) -> Result<Self, StateError> {
        let persisted: PersistedTestimonialState = load_versioned(
            storage.as_ref(),
            TESTIMONIAL_NAMESPACE,
            TESTIMONIAL_STATE_VERSION,
            migrate_testimonial_state,
        )?
        .unwrap_or_default();

        Ok(Self {
            gateway,
            storage,
            testimonials: Vec::new(),
            filters: TestimonialFilters {
                page: 1,
                ..persisted.filters
            },
            status: FetchStatus::Idle,
            error: None,
            has_more: false,
            total: 0,
            generation: 0,
            liked: persisted.liked,
            expanded: persisted.expanded,
            last_source: None,
            notifications: Vec::new(),
        })
    }

    pub fn testimonials(&self) -> &[Testimonial] {
        &self.testimonials
    }

    pub fn filters(&self) -> &TestimonialFilters {
        &self.filters
    }

    pub fn status(&self) -> FetchStatus {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn has_more(&self) -> bool {
        self.has_more
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn last_source(&self) -> Option<&DataSource> {
        self.last_source.as_ref()
    }

    pub fn is_liked(&self, id: &TestimonialId) -> bool {
        self.liked.contains(id)
    }

    pub fn is_expanded(&self, id: &TestimonialId) -> bool {
        self.expanded.contains(id)
    }

    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Replaces the filters. A changed selection resets paging to the first
    /// page and invalidates any in-flight fetch.
    pub fn set_filters(&mut self, filters: TestimonialFilters) {
        if !self.filters.same_selection(&filters) {
            self.generation += 1;
        }
        self.filters = TestimonialFilters { page: 1, ..filters };
        self.persist();
    }

    /// Sets the filters and reloads the first page.
    pub fn apply_filters(&mut self, filters: TestimonialFilters) -> FetchStatus {
        self.set_filters(filters);
        self.fetch(true)
    }

    pub fn reset_filters(&mut self) -> FetchStatus {
        self.apply_filters(TestimonialFilters::default())
    }

    /// Starts a list fetch. `refresh` clears the list and restarts at page 1.
    pub fn begin_fetch(&mut self, refresh: bool) -> FetchTicket {
        self.generation += 1;
        if refresh {
            self.testimonials.clear();
            self.filters.page = 1;
            self.has_more = false;
        }
        self.status = FetchStatus::Loading;
        self.error = None;

        FetchTicket {
            generation: self.generation,
            refresh,
            filters: self.filters.clone(),
        }
    }

    /// Applies a fetch result. Returns `false` when the ticket is stale and
    /// the result was discarded.
    pub fn complete_fetch(
        &mut self,
        ticket: FetchTicket,
        result: Result<Sourced<TestimonialPage>, ApiError>,
    ) -> bool {
        if ticket.generation != self.generation {
            debug!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale testimonial fetch"
            );
            return false;
        }

        match result {
            Ok(Sourced { value: page, source }) => {
                if ticket.refresh {
                    self.testimonials.clear();
                }
                for testimonial in page.data {
                    if !self.testimonials.iter().any(|known| known.id == testimonial.id) {
                        self.testimonials.push(testimonial);
                    }
                }
                self.total = page.meta.total;
                self.has_more = page.meta.has_more_pages;
                self.filters.page = page.meta.current_page.saturating_add(1);
                self.status = FetchStatus::Success;
                self.last_source = Some(source);
            }
            Err(error) => {
                warn!(error = %error, page = ticket.filters.page, "testimonial fetch failed");
                self.filters.page = ticket.filters.page;
                self.status = FetchStatus::Error;
                self.error = Some(error.user_message());
                self.notify(NotificationLevel::Error, error.user_message());
            }
        }
        true
    }

    pub fn fetch(&mut self, refresh: bool) -> FetchStatus {
        let ticket = self.begin_fetch(refresh);
        let result = self.gateway.get_testimonials(ticket.filters());
        self.complete_fetch(ticket, result);
        self.status
    }

    /// Loads the next page unless a fetch is running or nothing is left.
    pub fn load_more(&mut self) -> FetchStatus {
        if self.status == FetchStatus::Loading || !self.has_more {
            return self.status;
        }
        self.fetch(false)
    }

    /// Increments the count locally, then confirms with the backend.
    pub fn mark_helpful(&mut self, id: &TestimonialId) -> HelpfulOutcome {
        if self.liked.contains(id) {
            return HelpfulOutcome::AlreadyMarked;
        }

        let incremented = match self.find_mut(id) {
            Some(testimonial) => {
                testimonial.helpful_count += 1;
                true
            }
            None => false,
        };
        self.liked.insert(id.clone());

        match self.gateway.mark_as_helpful(id) {
            Ok(receipt) => {
                let helpful_count = receipt.value.helpful_count;
                if let Some(testimonial) = self.find_mut(id) {
                    testimonial.helpful_count = helpful_count;
                }
                self.persist();
                HelpfulOutcome::Confirmed { helpful_count }
            }
            Err(error) => {
                warn!(testimonial_id = %id, error = %error, "helpful mark rejected, reverting");
                if incremented {
                    if let Some(testimonial) = self.find_mut(id) {
                        testimonial.helpful_count = testimonial.helpful_count.saturating_sub(1);
                    }
                }
                self.liked.remove(id);
                self.notify(
                    NotificationLevel::Error,
                    "Gagal menandai testimoni sebagai membantu.".to_string(),
                );
                HelpfulOutcome::Reverted
            }
        }
    }

    /// Shows the reply immediately under a temporary id, then swaps in the
    /// stored reply or removes it on failure.
    pub fn add_reply(
        &mut self,
        id: &TestimonialId,
        author: &str,
        content: &str,
        is_admin: bool,
    ) -> Result<Reply, ApiError> {
        if content.trim().is_empty() {
            return Err(ApiError::Validation("Balasan tidak boleh kosong.".to_string()));
        }

        let token = format!("{OPTIMISTIC_REPLY_PREFIX}{}", Uuid::new_v4().simple());
        if let Some(testimonial) = self.find_mut(id) {
            testimonial.replies.push(Reply {
                id: token.clone(),
                author: author.to_string(),
                content: content.to_string(),
                timestamp: Utc::now(),
                is_admin,
            });
        }

        let request = NewReply {
            author: author.to_string(),
            content: content.to_string(),
            is_admin,
            client_token: Some(token.clone()),
        };

        match self.gateway.add_reply(id, request) {
            Ok(Sourced { value: stored, .. }) => {
                if let Some(testimonial) = self.find_mut(id) {
                    match testimonial.replies.iter_mut().find(|reply| reply.id == token) {
                        Some(slot) => *slot = stored.clone(),
                        None => testimonial.replies.push(stored.clone()),
                    }
                }
                self.notify(NotificationLevel::Success, "Balasan terkirim.".to_string());
                Ok(stored)
            }
            Err(error) => {
                if let Some(testimonial) = self.find_mut(id) {
                    testimonial.replies.retain(|reply| reply.id != token);
                }
                self.notify(NotificationLevel::Error, error.user_message());
                Err(error)
            }
        }
    }

    /// Validates and submits a new testimonial; it is prepended to the list
    /// when it matches the active filters.
    pub fn submit_testimonial(&mut self, input: NewTestimonial) -> Result<Testimonial, ApiError> {
        if let Err(error) = validate_submission(&input) {
            self.notify(NotificationLevel::Error, error.user_message());
            return Err(error);
        }

        match self.gateway.create_testimonial(input) {
            Ok(Sourced { value: created, .. }) => {
                if matches(&created, &self.filters) {
                    self.testimonials.insert(0, created.clone());
                    self.total += 1;
                }
                info!(testimonial_id = %created.id, "testimonial submitted");
                self.notify(
                    NotificationLevel::Success,
                    "Terima kasih! Testimoni Anda berhasil dikirim.".to_string(),
                );
                Ok(created)
            }
            Err(error) => {
                self.notify(NotificationLevel::Error, error.user_message());
                Err(error)
            }
        }
    }

    pub fn flag(&mut self, id: &TestimonialId, reason: &str) -> Result<FlagReceipt, ApiError> {
        match self.gateway.flag_testimonial(id, reason) {
            Ok(receipt) => {
                self.notify(
                    NotificationLevel::Success,
                    "Laporan Anda telah diterima.".to_string(),
                );
                Ok(receipt.value)
            }
            Err(error) => {
                self.notify(NotificationLevel::Error, error.user_message());
                Err(error)
            }
        }
    }

    /// Loads a single testimonial, substituting a placeholder when it cannot be fetched.
    pub fn testimonial_or_placeholder(&self, id: &TestimonialId) -> Testimonial {
        match self.gateway.get_testimonial_by_id(id) {
            Ok(found) => found.value,
            Err(error) => {
                warn!(testimonial_id = %id, error = %error, "serving placeholder testimonial");
                Testimonial::placeholder(id.clone())
            }
        }
    }

    pub fn stats(&self, query: &StatsQuery) -> Result<Sourced<TestimonialStats>, ApiError> {
        self.gateway.get_testimonial_stats(query)
    }

    pub fn trends(&self, query: &TrendsQuery) -> Result<Sourced<Vec<TrendPoint>>, ApiError> {
        self.gateway.get_testimonial_trends(query)
    }

    /// Returns whether the testimonial is now expanded.
    pub fn toggle_expanded(&mut self, id: &TestimonialId) -> bool {
        let expanded = if self.expanded.remove(id) {
            false
        } else {
            self.expanded.insert(id.clone());
            true
        };
        self.persist();
        expanded
    }

    fn find_mut(&mut self, id: &TestimonialId) -> Option<&mut Testimonial> {
        self.testimonials
            .iter_mut()
            .find(|testimonial| &testimonial.id == id)
    }

    fn notify(&mut self, level: NotificationLevel, message: String) {
        self.notifications.push(Notification { level, message });
    }

    /// Persistence failures never block interaction; they are logged.
    fn persist(&self) {
        let state = PersistedTestimonialState {
            filters: self.filters.clone(),
            liked: self.liked.clone(),
            expanded: self.expanded.clone(),
        };
        if let Err(error) = save_versioned(
            self.storage.as_ref(),
            TESTIMONIAL_NAMESPACE,
            TESTIMONIAL_STATE_VERSION,
            &state,
        ) {
            warn!(error = %error, "failed to persist testimonial store state");
        }
    }
}
