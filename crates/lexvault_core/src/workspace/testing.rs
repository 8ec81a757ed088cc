//! Fakes for the workspace ports, shared by the unit tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tokio::sync::Notify;

use super::{Workspace, WorkspaceServices};
use crate::domain::{
    Advisory, AdvisoryExchange, Extraction, ExtractionDraft, PlatformStats, ProfessionalRole,
    ReadinessStatus, RiskAssessment, SigningReadiness, SupportMessage, VerificationEmail,
};
use crate::policy::{AdminCredential, WorkspacePolicy};
use crate::ports::{
    AdminAdvisoryService, AdvisoryService, ExtractionRequest, ExtractionService, MailService,
    PortError, PortResult, SupportService,
};
use crate::secrets::hash_secret;
use crate::store::{MemoryStore, Store};

pub(crate) const ADMIN_EMAIL: &str = "owner@lexvault.test";
pub(crate) const ADMIN_PASSWORD: &str = "correct horse battery";

fn admin_hash() -> String {
    static HASH: OnceLock<String> = OnceLock::new();
    HASH.get_or_init(|| hash_secret(ADMIN_PASSWORD).unwrap()).clone()
}

pub(crate) fn sample_draft() -> ExtractionDraft {
    ExtractionDraft {
        title: "Master Services Agreement".to_string(),
        document_type: "Service Agreement".to_string(),
        has_substantive_content: true,
        extraction: Extraction {
            clauses: vec!["§4.2 Termination for convenience on 30 days notice".to_string()],
            rights_and_obligations: vec!["Vendor must maintain SOC 2 compliance".to_string()],
            commitments: vec!["Quarterly service reviews".to_string()],
            timelines: vec!["Initial term of 24 months".to_string()],
            ambiguities: vec!["\"Reasonable efforts\" is undefined".to_string()],
        },
    }
}

pub(crate) fn sample_advisory() -> Advisory {
    Advisory {
        executive_signals: vec!["Exit is cheap for the client".to_string()],
        readers_miss: vec!["Auto-renewal in schedule C".to_string()],
        scenarios: vec!["Early termination in year one".to_string()],
        risks: RiskAssessment {
            level: "Moderate".to_string(),
            details: "Liability cap excludes data breaches".to_string(),
            flags: vec!["Uncapped indemnity".to_string()],
        },
        leverage: vec!["Ask for a mutual termination right".to_string()],
        signing_readiness: SigningReadiness {
            status: ReadinessStatus::Caution,
            justification: "Indemnity terms need review".to_string(),
        },
        professional_questions: vec!["Who owns derived data?".to_string()],
    }
}

/// Holds a collaborator call open until the test releases it.
#[derive(Default)]
pub(crate) struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

#[derive(Default)]
pub(crate) struct FakeExtraction {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub draft: Mutex<Option<ExtractionDraft>>,
    pub last_request: Mutex<Option<ExtractionRequest>>,
    pub gate: Option<Arc<Gate>>,
}

impl FakeExtraction {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ExtractionService for FakeExtraction {
    async fn extract(&self, request: &ExtractionRequest) -> PortResult<ExtractionDraft> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_request.lock().unwrap() = Some(request.clone());
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("model unavailable".to_string()));
        }
        Ok(self
            .draft
            .lock()
            .unwrap()
            .clone()
            .unwrap_or_else(sample_draft))
    }
}

#[derive(Default)]
pub(crate) struct FakeAdvisory {
    pub calls: AtomicUsize,
    pub fail: AtomicBool,
    pub gate: Option<Arc<Gate>>,
}

impl FakeAdvisory {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl AdvisoryService for FakeAdvisory {
    async fn advise(&self, _extraction: &Extraction) -> PortResult<Advisory> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::MalformedResponse("missing field `risks`".to_string()));
        }
        Ok(sample_advisory())
    }
}

#[derive(Default)]
pub(crate) struct FakeSupport {
    pub fail: AtomicBool,
    pub history_lengths: Mutex<Vec<usize>>,
    pub gate: Option<Arc<Gate>>,
}

#[async_trait]
impl SupportService for FakeSupport {
    async fn support_reply(&self, history: &[SupportMessage], message: &str) -> PortResult<String> {
        self.history_lengths.lock().unwrap().push(history.len());
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("timeout".to_string()));
        }
        Ok(format!("Re: {}", message))
    }
}

#[derive(Default)]
pub(crate) struct FakeAdminAdvisor {
    pub last_stats: Mutex<Option<PlatformStats>>,
}

#[async_trait]
impl AdminAdvisoryService for FakeAdminAdvisor {
    async fn admin_advisory(
        &self,
        query: &str,
        stats: &PlatformStats,
        history: &[AdvisoryExchange],
    ) -> PortResult<String> {
        *self.last_stats.lock().unwrap() = Some(*stats);
        Ok(format!("Recommendation #{}: {}", history.len() + 1, query))
    }
}

#[derive(Default)]
pub(crate) struct FakeMail {
    pub fail: AtomicBool,
    pub sent: Mutex<Vec<VerificationEmail>>,
}

#[async_trait]
impl MailService for FakeMail {
    async fn send_verification(&self, email: &VerificationEmail) -> PortResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(PortError::Unexpected("smtp refused".to_string()));
        }
        self.sent.lock().unwrap().push(email.clone());
        Ok(())
    }
}

/// Wires fakes around a fresh in-memory store.
pub(crate) struct Harness {
    pub services: WorkspaceServices,
    pub extraction: Arc<FakeExtraction>,
    pub advisory: Arc<FakeAdvisory>,
    pub support: Arc<FakeSupport>,
    pub admin_advisor: Arc<FakeAdminAdvisor>,
    pub mail: Arc<FakeMail>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(
            WorkspacePolicy {
                admin: Some(AdminCredential {
                    email: ADMIN_EMAIL.to_string(),
                    password_hash: admin_hash(),
                }),
                ..WorkspacePolicy::default()
            },
            FakeExtraction::default(),
            FakeAdvisory::default(),
            FakeSupport::default(),
        )
    }

    pub fn with_policy(policy: WorkspacePolicy) -> Self {
        Self::build(
            policy,
            FakeExtraction::default(),
            FakeAdvisory::default(),
            FakeSupport::default(),
        )
    }

    /// Support replies block until the returned gate is released.
    pub fn gated_support() -> (Self, Arc<Gate>) {
        let gate = Arc::new(Gate::default());
        let harness = Self::build(
            WorkspacePolicy::default(),
            FakeExtraction::default(),
            FakeAdvisory::default(),
            FakeSupport {
                gate: Some(gate.clone()),
                ..Default::default()
            },
        );
        (harness, gate)
    }

    /// Extraction and advisory calls block until the returned gates are released.
    pub fn gated() -> (Self, Arc<Gate>, Arc<Gate>) {
        let extraction_gate = Arc::new(Gate::default());
        let advisory_gate = Arc::new(Gate::default());
        let harness = Self::build(
            WorkspacePolicy::default(),
            FakeExtraction {
                gate: Some(extraction_gate.clone()),
                ..Default::default()
            },
            FakeAdvisory {
                gate: Some(advisory_gate.clone()),
                ..Default::default()
            },
            FakeSupport::default(),
        );
        (harness, extraction_gate, advisory_gate)
    }

    fn build(
        policy: WorkspacePolicy,
        extraction: FakeExtraction,
        advisory: FakeAdvisory,
        support: FakeSupport,
    ) -> Self {
        let extraction = Arc::new(extraction);
        let advisory = Arc::new(advisory);
        let support = Arc::new(support);
        let admin_advisor = Arc::new(FakeAdminAdvisor::default());
        let mail = Arc::new(FakeMail::default());
        let services = WorkspaceServices {
            store: Store::new(Arc::new(MemoryStore::new())),
            extraction: extraction.clone(),
            advisory: advisory.clone(),
            support: support.clone(),
            admin_advisor: admin_advisor.clone(),
            mail: mail.clone(),
            policy: Arc::new(policy),
        };
        Self {
            services,
            extraction,
            advisory,
            support,
            admin_advisor,
            mail,
        }
    }

    pub fn store(&self) -> &Store {
        &self.services.store
    }

    pub fn workspace(&self) -> Workspace {
        Workspace::new(self.services.clone())
    }

    /// A fresh workspace signed up as `email`.
    pub async fn member(&self, email: &str) -> Workspace {
        let workspace = self.workspace();
        workspace
            .signup(email, "Ada Counsel", ProfessionalRole::Attorney, Some("Counsel LLP"))
            .await
            .unwrap();
        workspace
    }

    /// A fresh workspace logged in as the configured admin.
    pub async fn admin(&self) -> Workspace {
        let workspace = self.workspace();
        workspace
            .login(ADMIN_EMAIL, Some(ADMIN_PASSWORD))
            .await
            .unwrap();
        workspace
    }
}

/// A workspace with a member session and a loaded document.
pub(crate) async fn loaded(harness: &Harness) -> Workspace {
    let workspace = harness.member("ada@counsel.test").await;
    workspace
        .load_document("msa.txt", "text/plain", b"This Master Services Agreement ...".to_vec())
        .await
        .unwrap();
    workspace
}
