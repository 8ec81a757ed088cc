//! services/api/src/adapters/review_llm.rs
//!
//! The two document review stages. Implements `ExtractionService` and `AdvisoryService`
//! from the `core` crate on top of OpenAI chat completions.

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use lexvault_core::{
    domain::{Advisory, Extraction, ExtractionDraft},
    ports::{AdvisoryService, ExtractionRequest, ExtractionService, PortError, PortResult},
};
use tracing::{debug, warn};

use super::llm::{complete, parse_json, Turn};

const EXTRACTION_INSTRUCTIONS: &str = r#"You are the LexVault Senior Analyst.
TASK: Stage 1, document review and summary findings.

GOALS:
1. Recovery review: if the content is unreadable or empty, say that the document lacks sufficient clarity for a thorough review, suggest a clearer submission, and set hasSubstantiveContent to false.
2. Narrative review: for informal documents, explain purpose and intent in plain language.
3. Formal review: for structured materials, identify key clauses and commitments.

TERMINOLOGY:
- Never use the words "Extraction", "AI", "Protocol", "Model" or "Prompt".
- Prefer "Review Findings", "Advisory" and "Professional Observations".

Respond with a single JSON object and nothing else, with exactly these keys:
{
  "title": string,                       // primary subject of the review
  "documentType": string,                // e.g. "Consultation Note", "Service Agreement"
  "hasSubstantiveContent": boolean,
  "extraction": {
    "clauses": [string],                 // specific citations or content explanations
    "rightsAndObligations": [string],    // intentions and primary responsibilities
    "commitments": [string],
    "timelines": [string],
    "ambiguities": [string]
  }
}"#;

const ADVISORY_INSTRUCTIONS: &str = r#"You are the LexVault Senior Analyst.
TASK: Stage 2, professional advisory and strategic insights.

GUIDELINES:
1. Acknowledge any information limitations present in the review findings.
2. Prefer "Based on the documented ..." phrasing.
3. Tone: authoritative, expert, confidential and protective.

Respond with a single JSON object and nothing else, with exactly these keys:
{
  "executiveSignals": [string],          // strategic takeaways for leadership
  "readersMiss": [string],               // subtle observations or common oversights
  "scenarios": [string],                 // likely professional outcomes
  "risks": { "level": string, "details": string, "flags": [string] },
  "leverage": [string],                  // suggestions for negotiation or clarification
  "signingReadiness": { "status": "Ready" | "Caution" | "Not Ready", "justification": string },
  "professionalQuestions": [string]
}"#;

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// Runs both review stages against an OpenAI-compatible chat model.
#[derive(Clone)]
pub struct OpenAiReviewAdapter {
    client: Client<OpenAIConfig>,
    extraction_model: String,
    advisory_model: String,
}

impl OpenAiReviewAdapter {
    pub fn new(client: Client<OpenAIConfig>, extraction_model: String, advisory_model: String) -> Self {
        Self {
            client,
            extraction_model,
            advisory_model,
        }
    }
}

fn extraction_prompt(request: &ExtractionRequest) -> String {
    let content = if request.content.trim().is_empty() {
        "[UNREADABLE OR EMPTY DOCUMENT]"
    } else {
        request.content.as_str()
    };
    format!(
        "DOCUMENT FOR REVIEW:\nFilename: {}\nNature: {}\nUser Objectives: {}\n\nDOCUMENT CONTENT:\n{}",
        request.filename,
        request.filetype,
        request
            .instructions
            .as_deref()
            .unwrap_or("Standard Professional Review"),
        content
    )
}

//=========================================================================================
// Trait Implementations
//=========================================================================================

#[async_trait]
impl ExtractionService for OpenAiReviewAdapter {
    async fn extract(&self, request: &ExtractionRequest) -> PortResult<ExtractionDraft> {
        let prompt = extraction_prompt(request);
        let raw = complete(
            &self.client,
            &self.extraction_model,
            EXTRACTION_INSTRUCTIONS,
            &[Turn::User(prompt)],
        )
        .await?;
        debug!(bytes = raw.len(), "Extraction response received");
        parse_json(&raw).inspect_err(|e| warn!("Rejected extraction response: {}", e))
    }
}

#[async_trait]
impl AdvisoryService for OpenAiReviewAdapter {
    async fn advise(&self, extraction: &Extraction) -> PortResult<Advisory> {
        let findings = serde_json::to_string(extraction)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let prompt = format!("REVIEW FINDINGS:\n{}\n\nMODE: PROFESSIONAL ADVISORY", findings);
        let raw = complete(
            &self.client,
            &self.advisory_model,
            ADVISORY_INSTRUCTIONS,
            &[Turn::User(prompt)],
        )
        .await?;
        debug!(bytes = raw.len(), "Advisory response received");
        parse_json(&raw).inspect_err(|e| warn!("Rejected advisory response: {}", e))
    }
}
