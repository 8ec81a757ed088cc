//! services/api/src/adapters/mailer.rs
//!
//! Verification mail. The HTML body is drafted by the chat model (with a plain fallback
//! if that fails) and the dispatch is recorded through `tracing`; there is no outbound
//! transport in this service.

use async_openai::{config::OpenAIConfig, Client};
use async_trait::async_trait;
use lexvault_core::{
    domain::VerificationEmail,
    ports::{MailService, PortError, PortResult},
};
use tracing::{info, warn};

use super::llm::{complete, Turn};

const TEMPLATE_INSTRUCTIONS: &str = r#"Generate a professional, minimalist HTML email for LexVault.
Tone: enterprise-grade, confidential, non-technical. Audience: legal, medical and financial professionals.
Requirements:
- Clean white background with dark text.
- A disclaimer about zero-data retention.
- State that the code expires shortly.
- No mention of "AI" or "bot".
- A "no-reply@lexvault.com" style footer.
Return only the HTML."#;

#[derive(Clone)]
pub struct TemplatedMailer {
    client: Client<OpenAIConfig>,
    model: String,
}

impl TemplatedMailer {
    pub fn new(client: Client<OpenAIConfig>, model: String) -> Self {
        Self { client, model }
    }

    async fn render(&self, email: &VerificationEmail) -> String {
        let request = format!(
            "Subject: {}\nRecipient: {}\nSecurity Code: {}",
            email.subject, email.recipient_name, email.code
        );
        match complete(&self.client, &self.model, TEMPLATE_INSTRUCTIONS, &[Turn::User(request)]).await {
            Ok(html) if html.contains(&email.code) => html,
            Ok(_) => {
                warn!("Generated template omitted the code; using the plain template");
                fallback_body(&email.code)
            }
            Err(e) => {
                warn!("Template generation failed, using the plain template: {}", e);
                fallback_body(&email.code)
            }
        }
    }
}

fn fallback_body(code: &str) -> String {
    format!(
        "<p>Your LexVault verification code is: <strong>{}</strong></p>",
        code
    )
}

#[async_trait]
impl MailService for TemplatedMailer {
    async fn send_verification(&self, email: &VerificationEmail) -> PortResult<()> {
        if email.to.trim().is_empty() {
            return Err(PortError::Unexpected("Missing recipient address".to_string()));
        }
        let body = self.render(email).await;
        info!(
            to = %email.to,
            subject = %email.subject,
            body_bytes = body.len(),
            "Verification email dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fallback_body_contains_the_code() {
        assert!(fallback_body("482113").contains("<strong>482113</strong>"));
    }
}
