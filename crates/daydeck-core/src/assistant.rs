//! AI meeting-time suggestions.
//!
//! The assistant is an opaque remote function from free-form notes to a
//! suggested date, time and explanation. Requests are not retried or
//! cancelled; every failure is reported as one `AssistantError`.

use std::future::Future;
use std::time::Duration;

use chrono::{Duration as ChronoDuration, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, warn};

use crate::error::{AssistantError, Result, ValidationError};
use crate::models::calendar::DEFAULT_EVENT_MINUTES;
use crate::models::{ClockTime, EventDraft};
use crate::storage::Config;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeetingRequest {
    pub notes: String,
    /// Date the suggestion must not precede.
    pub today: NaiveDate,
}

impl MeetingRequest {
    pub fn new(notes: impl Into<String>) -> Self {
        Self {
            notes: notes.into(),
            today: Utc::now().date_naive(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.notes.trim().is_empty() {
            return Err(ValidationError::Required(
                "Please enter some notes to analyze.",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingSuggestion {
    /// `YYYY-MM-DD`
    pub suggested_date: String,
    /// `HH:MM`, 24-hour
    pub suggested_time: String,
    pub reasoning: String,
}

impl MeetingSuggestion {
    pub fn date(&self) -> Result<NaiveDate, AssistantError> {
        NaiveDate::parse_from_str(self.suggested_date.trim(), "%Y-%m-%d").map_err(|_| {
            AssistantError::MalformedResponse(format!(
                "suggested date '{}' is not YYYY-MM-DD",
                self.suggested_date
            ))
        })
    }

    pub fn time(&self) -> Result<NaiveTime, AssistantError> {
        let time: ClockTime = self.suggested_time.trim().parse().map_err(|_| {
            AssistantError::MalformedResponse(format!(
                "suggested time '{}' is not HH:MM",
                self.suggested_time
            ))
        })?;
        NaiveTime::from_hms_opt(time.hour().into(), time.minute().into(), 0).ok_or_else(|| {
            AssistantError::MalformedResponse(format!("suggested time '{time}' out of range"))
        })
    }

    pub fn starts_at(&self) -> Result<NaiveDateTime, AssistantError> {
        Ok(self.date()?.and_time(self.time()?))
    }

    /// One-hour event draft at the suggested slot.
    pub fn to_event_draft(&self, title: impl Into<String>) -> Result<EventDraft, AssistantError> {
        let start = self.starts_at()?;
        let end = start + ChronoDuration::minutes(DEFAULT_EVENT_MINUTES);
        Ok(EventDraft::new(title, start, end).with_description(self.reasoning.clone()))
    }
}

pub trait MeetingAssistant: Send + Sync {
    fn suggest(
        &self,
        request: &MeetingRequest,
    ) -> impl Future<Output = Result<MeetingSuggestion>> + Send;
}

/// Gemini `generateContent` client.
pub struct GeminiAssistant {
    client: Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl GeminiAssistant {
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, AssistantError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Client configured from `config.assistant`, authenticated with the key
    /// stored in user settings.
    pub fn from_config(config: &Config, api_key: impl Into<String>) -> Result<Self, AssistantError> {
        Self::new(
            config.assistant.endpoint.clone(),
            config.assistant.model.clone(),
            api_key,
            config.assistant_timeout(),
        )
    }

    fn url(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.endpoint, self.model)
    }

    fn prompt(request: &MeetingRequest) -> String {
        format!(
            "You are an AI assistant that analyzes notes and suggests the optimal date and time \
             for scheduling a meeting.\n\n\
             Consider the following notes:\n{}\n\n\
             Today is {}. Based on these notes, suggest a date and time for the meeting. \
             Return the date in YYYY-MM-DD format and the time in HH:MM format (24-hour clock). \
             Also, explain your reasoning for choosing the suggested date and time. \
             Make sure the time is in the future.",
            request.notes.trim(),
            request.today.format("%Y-%m-%d"),
        )
    }

    fn body(request: &MeetingRequest) -> serde_json::Value {
        json!({
            "contents": [{ "role": "user", "parts": [{ "text": Self::prompt(request) }] }],
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": {
                    "type": "OBJECT",
                    "properties": {
                        "suggestedDate": { "type": "STRING" },
                        "suggestedTime": { "type": "STRING" },
                        "reasoning": { "type": "STRING" }
                    },
                    "required": ["suggestedDate", "suggestedTime", "reasoning"]
                }
            }
        })
    }

    async fn call(&self, request: &MeetingRequest) -> Result<MeetingSuggestion, AssistantError> {
        if self.api_key.trim().is_empty() {
            return Err(AssistantError::MissingApiKey);
        }
        debug!(model = %self.model, "requesting meeting suggestion");
        let resp = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::body(request))
            .send()
            .await?;

        let status = resp.status();
        let payload: serde_json::Value = resp.json().await?;
        if let Some(err) = payload.get("error") {
            let message = err["message"].as_str().unwrap_or("unknown error");
            return Err(AssistantError::Request(format!("{status}: {message}")));
        }
        if !status.is_success() {
            return Err(AssistantError::Request(format!("HTTP {status}")));
        }

        let text = payload["candidates"][0]["content"]["parts"][0]["text"]
            .as_str()
            .ok_or_else(|| AssistantError::MalformedResponse("no candidate text".into()))?;
        let suggestion: MeetingSuggestion = serde_json::from_str(strip_fences(text))
            .map_err(|e| AssistantError::MalformedResponse(e.to_string()))?;
        suggestion.starts_at()?;
        Ok(suggestion)
    }
}

impl MeetingAssistant for GeminiAssistant {
    async fn suggest(&self, request: &MeetingRequest) -> Result<MeetingSuggestion> {
        request.validate()?;
        match self.call(request).await {
            Ok(suggestion) => Ok(suggestion),
            Err(e) => {
                warn!(error = %e, "meeting suggestion failed");
                Err(e.into())
            }
        }
    }
}

/// Model output occasionally arrives wrapped in a Markdown code fence.
fn strip_fences(text: &str) -> &str {
    let trimmed = text.trim();
    trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .and_then(|rest| rest.strip_suffix("```"))
        .map(str::trim)
        .unwrap_or(trimmed)
}
