//! services/api/src/adapters/assistant_llm.rs
//!
//! Conversational adapters: the member support channel and the operator advisor.

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use lexvault_core::{
    domain::{AdvisoryExchange, PlatformStats, Speaker, SupportMessage},
    ports::{AdminAdvisoryService, PortResult, SupportService},
};

use super::llm::{complete, Turn};

const SUPPORT_INSTRUCTIONS: &str = "You are a Professional Support Analyst at LexVault. Assist users with platform navigation and security standards. Use a professional, helpful tone. Do not give legal advice.";

const ADVISOR_INSTRUCTIONS: &str = r#"You are the Lead Strategic Consultant for LexVault.
Your objective is to provide professional operational guidance to the platform owner.

GUIDELINES:
- Never use the words "AI", "bot", "assistant" or "chat".
- Use advisory headers such as "Recommendation", "Observation" or "Suggested Action".
- Ground your advice in the platform statistics provided below.
- Focus on retention, engagement, usability, feature prioritization and optimization.
- Tone: neutral, authoritative and enterprise-grade."#;

/// The support channel.
#[derive(Clone)]
pub struct OpenAiSupportAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiSupportAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn support_turns(history: &[SupportMessage], message: &str) -> Vec<Turn> {
    history
        .iter()
        .map(|m| match m.role {
            Speaker::User => Turn::User(m.content.clone()),
            Speaker::Assistant => Turn::Assistant(m.content.clone()),
        })
        .chain(std::iter::once(Turn::User(message.to_string())))
        .collect()
}

#[async_trait]
impl SupportService for OpenAiSupportAdapter {
    async fn support_reply(&self, history: &[SupportMessage], message: &str) -> PortResult<String> {
        complete(
            &self.client,
            &self.model,
            SUPPORT_INSTRUCTIONS,
            &support_turns(history, message),
        )
        .await
    }
}

/// The operator advisor.
#[derive(Clone)]
pub struct OpenAiAdvisorAdapter {
    client: Client<OpenAIConfig>,
    model: String,
}

impl OpenAiAdvisorAdapter {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }
}

fn advisor_context(stats: &PlatformStats) -> String {
    format!(
        "{}\n\nADVISORY CONTEXT:\n\
         APP: LexVault\n\
         PURPOSE: Secure professional document review and advisory insights.\n\
         USERS: Attorneys, Physicians, Engineers, Financial Analysts, Consultants.\n\
         PRICING: Free to use for all professional identities.\n\n\
         CURRENT PLATFORM METRICS:\n\
         - Total Registered Identities: {}\n\
         - Active Sessions (24h): {}\n\
         - Global Document Volume: {}",
        ADVISOR_INSTRUCTIONS, stats.total_users, stats.active_users_24h, stats.total_docs
    )
}

#[async_trait]
impl AdminAdvisoryService for OpenAiAdvisorAdapter {
    async fn admin_advisory(
        &self,
        query: &str,
        stats: &PlatformStats,
        history: &[AdvisoryExchange],
    ) -> PortResult<String> {
        let turns: Vec<Turn> = history
            .iter()
            .flat_map(|h| [Turn::User(h.query.clone()), Turn::Assistant(h.response.clone())])
            .chain(std::iter::once(Turn::User(query.to_string())))
            .collect();
        complete(&self.client, &self.model, &advisor_context(stats), &turns).await
    }
}
