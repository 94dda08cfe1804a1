//! Gemini structured-data extractor
//!
//! Sends one card's OCR text to Gemini with a fixed seven-field response
//! schema and parses the answer into a `ContactRecord`. Every failure path
//! (missing key, transport, status, missing candidates, bad JSON) ends in the
//! same fallback record.

use anyhow::{Context, Result};
use cardscan_core::models::EXTRACTION_SCHEMA;
use cardscan_core::{Config, ContactRecord};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Failed to reach Gemini API: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("Gemini API request failed: {status} - {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("Failed to parse Gemini API response: {0}")]
    InvalidResponse(#[source] reqwest::Error),

    #[error("Gemini API returned no candidates: {0}")]
    NoCandidates(String),

    #[error("Gemini candidate has no text part")]
    EmptyCandidate,

    #[error("Gemini did not return valid contact JSON: {0}")]
    InvalidPayload(#[from] serde_json::Error),
}

/// Why the fallback record was returned instead of a structured one.
#[derive(Debug)]
pub enum FallbackReason {
    MissingApiKey,
    Failed(ExtractionError),
}

/// Outcome of one extraction. Both variants carry a full-shape record.
#[derive(Debug)]
pub enum Extraction {
    Structured(ContactRecord),
    Fallback {
        record: ContactRecord,
        reason: FallbackReason,
    },
}

impl Extraction {
    pub fn is_fallback(&self) -> bool {
        matches!(self, Extraction::Fallback { .. })
    }

    pub fn record(&self) -> &ContactRecord {
        match self {
            Extraction::Structured(record) | Extraction::Fallback { record, .. } => record,
        }
    }

    pub fn into_record(self) -> ContactRecord {
        match self {
            Extraction::Structured(record) | Extraction::Fallback { record, .. } => record,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    response_schema: ResponseSchema,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ResponseSchema {
    #[serde(rename = "type")]
    schema_type: &'static str,
    properties: BTreeMap<&'static str, SchemaProperty>,
    property_ordering: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct SchemaProperty {
    #[serde(rename = "type")]
    property_type: &'static str,
    description: &'static str,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// Gemini-backed structured-data extractor
pub struct GeminiExtractor {
    http_client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl Debug for GeminiExtractor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("GeminiExtractor")
            .field("endpoint", &self.endpoint)
            .field("has_api_key", &self.api_key.is_some())
            .finish()
    }
}

impl GeminiExtractor {
    pub fn new(api_key: Option<String>, endpoint: impl Into<String>, timeout: Duration) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for Gemini API")?;

        Ok(Self {
            http_client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            config.gemini_api_key().map(str::to_string),
            config.gemini_api_url(),
            Duration::from_secs(config.gemini_timeout_secs()),
        )
    }

    /// Whether a credential is present; without one every call degrades to the fallback record.
    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Extract a contact, returning the fallback record on any failure.
    pub async fn extract_contact(&self, raw_text: &str) -> ContactRecord {
        self.extract(raw_text).await.into_record()
    }

    /// Extract a contact, keeping track of whether the fallback was used and why.
    pub async fn extract(&self, raw_text: &str) -> Extraction {
        let Some(api_key) = self.api_key.as_deref() else {
            tracing::info!("Skipping Gemini API call: key is missing");
            return Extraction::Fallback {
                record: ContactRecord::fallback(raw_text),
                reason: FallbackReason::MissingApiKey,
            };
        };

        tracing::info!(chars = raw_text.len(), "Querying Gemini API for structured data");

        match self.request_contact(api_key, raw_text).await {
            Ok(record) => {
                tracing::info!("Successfully extracted data via Gemini API");
                Extraction::Structured(record.with_raw_text(raw_text))
            }
            Err(e) => {
                tracing::warn!(error = %e, "Gemini extraction failed, using fallback record");
                Extraction::Fallback {
                    record: ContactRecord::fallback(raw_text),
                    reason: FallbackReason::Failed(e),
                }
            }
        }
    }

    async fn request_contact(
        &self,
        api_key: &str,
        raw_text: &str,
    ) -> Result<ContactRecord, ExtractionError> {
        let body = build_request(raw_text);

        let response = self
            .http_client
            .post(&self.endpoint)
            .query(&[("key", api_key)])
            .json(&body)
            .send()
            .await
            .map_err(ExtractionError::Transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(ExtractionError::Status { status, body });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(ExtractionError::InvalidResponse)?;

        let payload = first_candidate_text(parsed)?;
        Ok(serde_json::from_str(&payload)?)
    }
}

/// Instruction prompt with the card's OCR text embedded.
pub fn build_prompt(raw_text: &str) -> String {
    format!(
        "You are an expert business card transcription service.\n\
         Analyze the following raw OCR text from a business card and extract the requested fields.\n\
         If a field is missing, return an empty string ('').\n\
         RAW TEXT:\n\
         ---\n\
         {}\n\
         ---\n",
        raw_text
    )
}

fn response_schema() -> ResponseSchema {
    ResponseSchema {
        schema_type: "OBJECT",
        properties: EXTRACTION_SCHEMA
            .iter()
            .map(|field| {
                (
                    field.name,
                    SchemaProperty {
                        property_type: "STRING",
                        description: field.description,
                    },
                )
            })
            .collect(),
        property_ordering: EXTRACTION_SCHEMA.iter().map(|field| field.name).collect(),
    }
}

fn build_request(raw_text: &str) -> GenerateContentRequest {
    GenerateContentRequest {
        contents: vec![RequestContent {
            parts: vec![RequestPart {
                text: build_prompt(raw_text),
            }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            response_schema: response_schema(),
        },
    }
}

/// Text of the first part of the first candidate; later candidates are ignored.
fn first_candidate_text(response: GenerateContentResponse) -> Result<String, ExtractionError> {
    let Some(candidate) = response.candidates.into_iter().next() else {
        let message = response
            .error
            .and_then(|e| e.message)
            .unwrap_or_else(|| "Unknown API Error".to_string());
        return Err(ExtractionError::NoCandidates(message));
    };

    candidate
        .content
        .and_then(|content| content.parts.into_iter().next())
        .and_then(|part| part.text)
        .ok_or(ExtractionError::EmptyCandidate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    const RAW_TEXT: &str = "Jane Doe\n  Head of Sales\nACME Corp\n+1 555 0100\njane@acme.example";

    fn extractor(endpoint: String, api_key: Option<&str>) -> GeminiExtractor {
        GeminiExtractor::new(
            api_key.map(str::to_string),
            endpoint,
            Duration::from_secs(5),
        )
        .unwrap()
    }

    fn candidate_body(payload: &str) -> String {
        json!({
            "candidates": [
                {"content": {"parts": [{"text": payload}], "role": "model"}}
            ]
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_missing_key_skips_network_call() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/generate")
            .expect(0)
            .create_async()
            .await;

        let extraction = extractor(format!("{}/generate", server.url()), None)
            .extract(RAW_TEXT)
            .await;

        assert!(matches!(
            extraction,
            Extraction::Fallback {
                reason: FallbackReason::MissingApiKey,
                ..
            }
        ));
        let record = extraction.into_record();
        assert!(record.is_blank());
        assert_eq!(
            record.raw_text,
            "Jane Doe Head of Sales ACME Corp +1 555 0100 jane@acme.example"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_structured_response_is_parsed() {
        let mut server = mockito::Server::new_async().await;
        let payload = json!({
            "Name": "Jane Doe",
            "Designation": "Head of Sales",
            "Company": "ACME Corp",
            "Phone": "+1 555 0100",
            "Email": "jane@acme.example",
            "Website": "https://acme.example",
            "Address": "1 Main St, Springfield"
        })
        .to_string();
        let mock = server
            .mock("POST", "/generate")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJson(json!({
                "generationConfig": {
                    "responseMimeType": "application/json",
                    "responseSchema": {"type": "OBJECT"}
                }
            })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(candidate_body(&payload))
            .create_async()
            .await;

        let extraction = extractor(format!("{}/generate", server.url()), Some("test-key"))
            .extract(RAW_TEXT)
            .await;

        assert!(!extraction.is_fallback());
        let record = extraction.into_record();
        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.designation, "Head of Sales");
        assert_eq!(record.website, "https://acme.example");
        assert_eq!(record.address, "1 Main St, Springfield");
        assert!(record.raw_text.starts_with("Jane Doe Head of Sales"));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_missing_fields_default_to_empty() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(candidate_body(r#"{"Name": "Jane Doe"}"#))
            .create_async()
            .await;

        let record = extractor(format!("{}/generate", server.url()), Some("k"))
            .extract_contact(RAW_TEXT)
            .await;

        assert_eq!(record.name, "Jane Doe");
        assert_eq!(record.company, "");
        assert_eq!(record.phone, "");
    }

    #[tokio::test]
    async fn test_server_error_falls_back() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("internal")
            .create_async()
            .await;

        let extraction = extractor(format!("{}/generate", server.url()), Some("k"))
            .extract(RAW_TEXT)
            .await;

        match &extraction {
            Extraction::Fallback {
                reason: FallbackReason::Failed(ExtractionError::Status { status, .. }),
                ..
            } => assert_eq!(status.as_u16(), 500),
            other => panic!("Expected status fallback, got {:?}", other),
        }
        assert!(extraction.record().is_blank());
    }

    #[tokio::test]
    async fn test_no_candidates_falls_back() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"error": {"message": "quota exhausted"}}"#)
            .create_async()
            .await;

        let extraction = extractor(format!("{}/generate", server.url()), Some("k"))
            .extract(RAW_TEXT)
            .await;

        match extraction {
            Extraction::Fallback {
                reason: FallbackReason::Failed(ExtractionError::NoCandidates(message)),
                record,
            } => {
                assert_eq!(message, "quota exhausted");
                assert!(record.is_blank());
            }
            other => panic!("Expected no-candidates fallback, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_invalid_payload_falls_back() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/generate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(candidate_body("Sorry, I cannot help with that."))
            .create_async()
            .await;

        let extraction = extractor(format!("{}/generate", server.url()), Some("k"))
            .extract(RAW_TEXT)
            .await;

        assert!(matches!(
            extraction,
            Extraction::Fallback {
                reason: FallbackReason::Failed(ExtractionError::InvalidPayload(_)),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_first_candidate_wins() {
        let mut server = mockito::Server::new_async().await;
        let body = json!({
            "candidates": [
                {"content": {"parts": [{"text": r#"{"Name": "First"}"#}, {"text": r#"{"Name": "Part two"}"#}]}},
                {"content": {"parts": [{"text": r#"{"Name": "Second"}"#}]}}
            ]
        })
        .to_string();
        server
            .mock("POST", "/generate")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(body)
            .create_async()
            .await;

        let record = extractor(format!("{}/generate", server.url()), Some("k"))
            .extract_contact(RAW_TEXT)
            .await;

        assert_eq!(record.name, "First");
    }

    #[tokio::test]
    async fn test_transport_error_falls_back() {
        let extraction = extractor("http://127.0.0.1:1/generate".to_string(), Some("k"))
            .extract(RAW_TEXT)
            .await;

        assert!(matches!(
            extraction,
            Extraction::Fallback {
                reason: FallbackReason::Failed(ExtractionError::Transport(_)),
                ..
            }
        ));
    }

    #[test]
    fn test_prompt_embeds_raw_text() {
        let prompt = build_prompt("ACME\nJane");
        assert!(prompt.starts_with("You are an expert business card transcription service."));
        assert!(prompt.contains("---\nACME\nJane\n---"));
        assert!(prompt.contains("return an empty string ('')"));
    }

    #[test]
    fn test_request_shape() {
        let value = serde_json::to_value(build_request("text")).unwrap();
        let schema = &value["generationConfig"]["responseSchema"];
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(schema["properties"].as_object().unwrap().len(), 7);
        assert_eq!(schema["properties"]["Phone"]["type"], "STRING");
        assert_eq!(
            schema["propertyOrdering"],
            json!(["Name", "Designation", "Company", "Phone", "Email", "Website", "Address"])
        );
        assert_eq!(value["contents"][0]["parts"][0]["text"], build_prompt("text"));
    }
}
