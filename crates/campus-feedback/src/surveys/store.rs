use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::debug;
use uuid::Uuid;

use super::domain::{Answer, ResponseId, SurveyFeedback, SurveyResponse};
use crate::directory::ServiceId;
use crate::state::{load_versioned, save_versioned, StateError, StateStorage};

pub const SURVEY_NAMESPACE: &str = "survey-responses";
const SURVEY_STATE_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SurveyStoreError {
    #[error("survey response {0} not found")]
    ResponseNotFound(ResponseId),
    #[error("feedback already recorded for survey response {0}")]
    FeedbackAlreadyAttached(ResponseId),
    #[error(transparent)]
    State(#[from] StateError),
}

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SurveyState {
    #[serde(default)]
    responses: Vec<SurveyResponse>,
    #[serde(default)]
    completed_services: BTreeSet<ServiceId>,
}

/// Version 0 persisted a bare array of responses.
fn migrate_survey_state(from_version: u32, state: Value) -> Result<Value, String> {
    match (from_version, state) {
        (0, Value::Array(responses)) => {
            let completed: BTreeSet<String> = responses
                .iter()
                .filter_map(|response| response.get("serviceId"))
                .map(|id| match id {
                    Value::String(text) => text.clone(),
                    other => other.to_string(),
                })
                .collect();
            Ok(json!({ "responses": responses, "completedServices": completed }))
        }
        (0, object @ Value::Object(_)) => Ok(object),
        (version, _) => Err(format!("no migration path from version {version}")),
    }
}

/// Survey answers per service, persisted after every change.
pub struct SurveyResponseStore<S: ?Sized> {
    storage: Arc<S>,
    state: SurveyState,
}

impl<S> SurveyResponseStore<S>
where
    S: StateStorage + ?Sized,
{
    pub fn open(storage: Arc<S>) -> Result<Self, SurveyStoreError> {
        let state = load_versioned(
            storage.as_ref(),
            SURVEY_NAMESPACE,
            SURVEY_STATE_VERSION,
            migrate_survey_state,
        )?
        .unwrap_or_default();
        Ok(Self { storage, state })
    }

    /// Records a completed survey and marks its service as done.
    pub fn save_response(
        &mut self,
        service_id: ServiceId,
        answers: Vec<Answer>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<SurveyResponse, SurveyStoreError> {
        let response = SurveyResponse {
            id: ResponseId(format!("resp-{}", Uuid::new_v4().simple())),
            service_id: service_id.clone(),
            answers,
            completed_at: completed_at.unwrap_or_else(Utc::now),
            feedback: None,
        };

        let mut next = self.state.clone();
        next.responses.push(response.clone());
        next.completed_services.insert(service_id);
        self.commit(next)?;
        debug!(response_id = %response.id, service_id = %response.service_id, "survey response saved");
        Ok(response)
    }

    pub fn responses(&self) -> &[SurveyResponse] {
        &self.state.responses
    }

    pub fn responses_for_service(&self, service_id: &ServiceId) -> Vec<&SurveyResponse> {
        self.state
            .responses
            .iter()
            .filter(|response| &response.service_id == service_id)
            .collect()
    }

    pub fn latest_for_service(&self, service_id: &ServiceId) -> Option<&SurveyResponse> {
        self.state
            .responses
            .iter()
            .filter(|response| &response.service_id == service_id)
            .max_by_key(|response| response.completed_at)
    }

    pub fn is_completed(&self, service_id: &ServiceId) -> bool {
        self.state.completed_services.contains(service_id)
    }

    pub fn completed_services(&self) -> impl Iterator<Item = &ServiceId> {
        self.state.completed_services.iter()
    }

    pub fn attach_feedback(
        &mut self,
        response_id: &ResponseId,
        feedback: SurveyFeedback,
    ) -> Result<SurveyResponse, SurveyStoreError> {
        let mut next = self.state.clone();
        let response = next
            .responses
            .iter_mut()
            .find(|response| &response.id == response_id)
            .ok_or_else(|| SurveyStoreError::ResponseNotFound(response_id.clone()))?;

        if response.feedback.is_some() {
            return Err(SurveyStoreError::FeedbackAlreadyAttached(response_id.clone()));
        }
        response.feedback = Some(feedback);
        let updated = response.clone();

        self.commit(next)?;
        Ok(updated)
    }

    /// Drops every response and completion mark.
    pub fn reset(&mut self) -> Result<(), SurveyStoreError> {
        self.state = SurveyState::default();
        self.storage.remove(SURVEY_NAMESPACE)?;
        Ok(())
    }

    /// Writes `next` and only then makes it the in-memory state.
    fn commit(&mut self, next: SurveyState) -> Result<(), StateError> {
        save_versioned(
            self.storage.as_ref(),
            SURVEY_NAMESPACE,
            SURVEY_STATE_VERSION,
            &next,
        )?;
        self.state = next;
        Ok(())
    }
}
