use std::time::Duration as StdDuration;

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::{json, Value as JsonValue};
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{AppError, AppResult, IntentErrorCode};
use crate::models::client::Client;
use crate::models::intent::BookingIntent;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const DEFAULT_MODEL: &str = "gemini-2.5-flash-latest";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

// First attempt runs immediately; later attempts back off.
const BACKOFF_SCHEDULE_MS: [u64; 3] = [0, 500, 1500];

#[derive(Debug, Clone)]
pub struct IntentConfig {
    pub api_key: Option<String>,
    pub api_base_url: String,
    pub model: String,
    pub http_timeout: StdDuration,
}

impl IntentConfig {
    pub fn from_env() -> Self {
        Self {
            api_key: std::env::var("GREENCAL_GEMINI_API_KEY")
                .ok()
                .filter(|value| !value.is_empty()),
            api_base_url: std::env::var("GREENCAL_GEMINI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("GREENCAL_GEMINI_MODEL")
                .unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            http_timeout: StdDuration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Turns a free-text booking request into a structured [`BookingIntent`]
/// via the Gemini API. The rest of the crate works without it; a missing
/// key surfaces as a coded error the UI can show.
pub struct IntentService {
    config: IntentConfig,
    http: reqwest::Client,
}

impl IntentService {
    pub fn new(config: IntentConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()
            .map_err(|err| AppError::other(format!("failed to build http client: {err}")))?;

        Ok(Self { config, http })
    }

    pub async fn analyze_request(
        &self,
        user_prompt: &str,
        clients: &[Client],
        today: NaiveDate,
    ) -> AppResult<BookingIntent> {
        let trimmed = user_prompt.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("request text must not be empty"));
        }

        let api_key = self.config.api_key.as_deref().ok_or_else(|| {
            AppError::intent(IntentErrorCode::MissingApiKey, "Gemini API key not configured")
        })?;

        let correlation_id = Uuid::new_v4().to_string();
        let prompt = build_prompt(trimmed, clients, today);
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }],
            "generationConfig": { "responseMimeType": "application/json" }
        });
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.api_base_url, self.config.model
        );

        debug!(target: "app::intent", correlation_id = %correlation_id, "analyzing booking request");

        let mut last_error = None;

        for (attempt, delay_ms) in BACKOFF_SCHEDULE_MS.iter().enumerate() {
            if *delay_ms > 0 {
                sleep(StdDuration::from_millis(*delay_ms)).await;
            }

            let response = self
                .http
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&body)
                .send()
                .await;

            match response {
                Ok(response) if response.status().is_success() => {
                    let payload: JsonValue = response.json().await.map_err(|err| {
                        AppError::intent_with_details(
                            IntentErrorCode::InvalidResponse,
                            format!("intent response body unreadable: {err}"),
                            Some(correlation_id.as_str()),
                            None,
                        )
                    })?;
                    return parse_intent_payload(&payload, correlation_id.as_str());
                }
                Ok(response) => {
                    let (error, retryable) =
                        map_http_error(response.status(), correlation_id.as_str());
                    warn!(
                        target: "app::intent",
                        correlation_id = %correlation_id,
                        retryable,
                        "intent provider returned non-success status"
                    );

                    if !retryable || attempt == BACKOFF_SCHEDULE_MS.len() - 1 {
                        return Err(error);
                    }

                    last_error = Some(error);
                    continue;
                }
                Err(err) => {
                    let (error, retryable) = error_from_reqwest(err, correlation_id.as_str());
                    warn!(
                        target: "app::intent",
                        correlation_id = %correlation_id,
                        retryable,
                        "intent request error"
                    );

                    if !retryable || attempt == BACKOFF_SCHEDULE_MS.len() - 1 {
                        return Err(error);
                    }

                    last_error = Some(error);
                    continue;
                }
            }
        }

        if let Some(error) = last_error {
            Err(error)
        } else {
            Err(AppError::intent_with_details(
                IntentErrorCode::ProviderUnavailable,
                "intent request failed",
                Some(correlation_id.as_str()),
                None,
            ))
        }
    }
}

fn build_prompt(user_prompt: &str, clients: &[Client], today: NaiveDate) -> String {
    let roster = clients
        .iter()
        .map(|client| format!("{} (ID: {}, Area: {})", client.name, client.id, client.area))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"You are an assistant for a gardening scheduler app used in Israel (Hebrew language).
Current Clients: {roster}.

User Request (in Hebrew): "{user_prompt}"

Extract the scheduling intent into JSON.
Fields:
- intent: 'schedule' | 'query' | 'unknown'
- clientId: string (match strictly from list or null)
- date: string (YYYY-MM-DD, calculate 'next tuesday' etc relative to today {today})
- startTime: string (HH:mm)
- durationMinutes: number (default 60)
- instructions: string (Translate to Hebrew if not already)
- explanation: string (A short conversational confirmation in Hebrew)

Return ONLY valid JSON."#
    )
}

fn parse_intent_payload(payload: &JsonValue, correlation_id: &str) -> AppResult<BookingIntent> {
    let content = payload
        .pointer("/candidates/0/content/parts/0/text")
        .and_then(JsonValue::as_str)
        .ok_or_else(|| {
            AppError::intent_with_details(
                IntentErrorCode::InvalidResponse,
                "intent response missing content",
                Some(correlation_id),
                None,
            )
        })?;

    let cleaned = strip_code_fences(content);

    serde_json::from_str(&cleaned).map_err(|err| {
        AppError::intent_with_details(
            IntentErrorCode::InvalidResponse,
            format!("intent content is not valid JSON: {err}"),
            Some(correlation_id),
            Some(json!({ "reason": "invalid_json" })),
        )
    })
}

fn strip_code_fences(content: &str) -> String {
    let trimmed = content.trim();
    if trimmed.starts_with("```") {
        let without_prefix = trimmed
            .trim_start_matches("```json")
            .trim_start_matches("```JSON")
            .trim_start_matches("```");
        without_prefix.trim_end_matches("```").trim().to_string()
    } else {
        trimmed.to_string()
    }
}

fn map_http_error(status: StatusCode, correlation_id: &str) -> (AppError, bool) {
    match status {
        StatusCode::UNAUTHORIZED => (
            AppError::intent_with_details(
                IntentErrorCode::MissingApiKey,
                "Gemini API key invalid or unauthorized",
                Some(correlation_id),
                None,
            ),
            false,
        ),
        StatusCode::FORBIDDEN => (
            AppError::intent_with_details(
                IntentErrorCode::Forbidden,
                "Gemini API access denied",
                Some(correlation_id),
                None,
            ),
            false,
        ),
        StatusCode::TOO_MANY_REQUESTS => (
            AppError::intent_with_details(
                IntentErrorCode::RateLimited,
                "Gemini rate limit hit, retry later",
                Some(correlation_id),
                None,
            ),
            true,
        ),
        status if status.is_server_error() => (
            AppError::intent_with_details(
                IntentErrorCode::ProviderUnavailable,
                format!("Gemini temporarily unavailable (status {})", status.as_u16()),
                Some(correlation_id),
                None,
            ),
            true,
        ),
        StatusCode::BAD_REQUEST => (
            AppError::intent_with_details(
                IntentErrorCode::InvalidRequest,
                "Gemini rejected the request payload",
                Some(correlation_id),
                None,
            ),
            false,
        ),
        StatusCode::NOT_FOUND => (
            AppError::intent_with_details(
                IntentErrorCode::InvalidRequest,
                "Gemini endpoint not found",
                Some(correlation_id),
                None,
            ),
            false,
        ),
        status => (
            AppError::intent_with_details(
                IntentErrorCode::Unknown,
                format!("Gemini returned unexpected status {}", status.as_u16()),
                Some(correlation_id),
                None,
            ),
            false,
        ),
    }
}

fn error_from_reqwest(err: reqwest::Error, correlation_id: &str) -> (AppError, bool) {
    if err.is_timeout() {
        (
            AppError::intent_with_details(
                IntentErrorCode::HttpTimeout,
                "Gemini request timed out",
                Some(correlation_id),
                None,
            ),
            true,
        )
    } else if err.is_connect() {
        (
            AppError::intent_with_details(
                IntentErrorCode::ProviderUnavailable,
                "could not connect to Gemini",
                Some(correlation_id),
                None,
            ),
            true,
        )
    } else if let Some(status) = err.status() {
        map_http_error(status, correlation_id)
    } else {
        (
            AppError::intent_with_details(
                IntentErrorCode::Unknown,
                format!("Gemini request failed: {err}"),
                Some(correlation_id),
                None,
            ),
            false,
        )
    }
}
