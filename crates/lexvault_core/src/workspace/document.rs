//! crates/lexvault_core/src/workspace/document.rs
//!
//! The document lifecycle: load, extraction (stage 1), approval, advisory (stage 2), wipe.

use chrono::Utc;
use tracing::{error, info, warn};

use super::{DocumentPhase, Feature, Stage, Workspace};
use crate::domain::{Brief, Document, NotificationKind};
use crate::error::{WorkspaceError, WorkspaceResult};
use crate::ports::ExtractionRequest;

const MSG_EMPTY_SUBMISSION: &str = "Submission rejected: No readable content detected.";
const MSG_STAGE1_COMPLETE: &str =
    "Review Stage 1 complete. Advisory insights pending verification.";
const MSG_INTERRUPTED: &str = "Review process interrupted due to system notification.";

impl Workspace {
    //=====================================================================================
    // Loading
    //=====================================================================================

    /// Makes `bytes` the active document, discarding any previous document and brief.
    pub async fn load_document(
        &self,
        name: &str,
        mime_type: &str,
        bytes: Vec<u8>,
    ) -> WorkspaceResult<Document> {
        let settings = self.settings().await?;
        let mut state = self.lock().await;
        state.member()?;

        if settings.maintenance_mode {
            return Err(WorkspaceError::Maintenance);
        }
        if bytes.is_empty() {
            warn!("Rejected empty document upload");
            self.notify(&mut state, NotificationKind::Security, MSG_EMPTY_SUBMISSION)
                .await;
            return Err(WorkspaceError::EmptyDocument);
        }

        let size = bytes.len() as u64;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        let document = Document::new(name.to_string(), mime_type.to_string(), size, content);

        state.document = Some(document.clone());
        state.brief = None;
        state.in_flight = None;
        state.generation += 1;

        info!(document_id = %document.id, pages = document.page_count, "Document loaded");
        self.notify(
            &mut state,
            NotificationKind::System,
            format!("Document \"{}\" ready for professional review.", document.name),
        )
        .await;
        Ok(document)
    }

    /// Optional reviewer objectives forwarded to the extraction stage. Blank clears them.
    pub async fn set_analysis_instructions(&self, instructions: Option<&str>) -> WorkspaceResult<()> {
        let mut state = self.lock().await;
        state.member()?;
        state.instructions = instructions
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .map(str::to_string);
        Ok(())
    }

    //=====================================================================================
    // Stage 1: Extraction
    //=====================================================================================

    /// Runs the extraction collaborator over the active document and stores the draft brief.
    ///
    /// Allowed while the document is loaded or awaiting approval (a re-run replaces the
    /// unapproved draft). A second call while one is outstanding fails with `Busy`; a
    /// response that arrives after the document was wiped or replaced fails with `Stale`.
    pub async fn run_stage1(&self) -> WorkspaceResult<Brief> {
        let (request, generation) = {
            let mut state = self.lock().await;
            state.member()?;
            if state.in_flight.is_some() {
                return Err(WorkspaceError::Busy);
            }
            let phase = state.phase();
            if !matches!(phase, DocumentPhase::Loaded | DocumentPhase::Stage1Complete) {
                return Err(WorkspaceError::InvalidPhase {
                    operation: "run the extraction review",
                    phase,
                });
            }
            let Some(document) = state.document.as_ref() else {
                return Err(WorkspaceError::InvalidPhase {
                    operation: "run the extraction review",
                    phase,
                });
            };
            let request = ExtractionRequest {
                content: document.content.clone(),
                filename: document.name.clone(),
                filetype: document.mime_type.clone(),
                instructions: state.instructions.clone(),
            };
            state.in_flight = Some(Stage::Extraction);
            (request, state.generation)
        };

        info!(filename = %request.filename, "Starting extraction stage");
        let result = self.services.extraction.extract(&request).await;

        let mut state = self.lock().await;
        if state.generation != generation {
            warn!("Discarding extraction response for a replaced document");
            return Err(WorkspaceError::Stale);
        }
        state.in_flight = None;

        let draft = match result {
            Ok(draft) => draft,
            Err(e) => {
                error!("Extraction stage failed: {}", e);
                self.notify(&mut state, NotificationKind::System, MSG_INTERRUPTED)
                    .await;
                return Err(WorkspaceError::Collaborator(e));
            }
        };

        let brief = Brief::from_draft(draft);
        if brief.is_total_failure() {
            warn!("Extraction produced no usable findings");
        }
        let user = self
            .update_user(&mut state, |user| user.docs_processed += 1)
            .await?;
        state.brief = Some(brief.clone());
        info!(user_id = %user.id, docs_processed = user.docs_processed, "Extraction stage complete");
        self.notify(&mut state, NotificationKind::System, MSG_STAGE1_COMPLETE)
            .await;
        Ok(brief)
    }

    //=====================================================================================
    // Approval & Stage 2: Advisory
    //=====================================================================================

    /// Approves the draft brief and, when the advisory feature is enabled, runs stage 2.
    ///
    /// Approval is irreversible and recorded once. Calling again after approval retries a
    /// failed advisory; once the advisory exists it returns the brief unchanged.
    pub async fn approve(&self) -> WorkspaceResult<Brief> {
        let advisory_enabled = Feature::Advisory.enabled_in(&self.settings().await?);
        let brief = {
            let mut state = self.lock().await;
            state.member()?;
            if state.in_flight.is_some() {
                return Err(WorkspaceError::Busy);
            }
            let phase = state.phase();
            let Some(brief) = state.brief.as_mut() else {
                return Err(WorkspaceError::InvalidPhase {
                    operation: "approve the brief",
                    phase,
                });
            };
            match phase {
                DocumentPhase::Stage1Complete => {
                    if brief.is_total_failure() {
                        return Err(WorkspaceError::TotalFailure);
                    }
                    brief.is_approved = true;
                    brief.approval_timestamp = Some(Utc::now());
                    info!("Brief approved");
                }
                DocumentPhase::Approved => {}
                _ => return Ok(brief.clone()),
            }
            brief.clone()
        };

        if advisory_enabled {
            self.run_stage2().await
        } else {
            Ok(brief)
        }
    }

    /// Runs the advisory collaborator over the approved extraction.
    pub async fn run_stage2(&self) -> WorkspaceResult<Brief> {
        self.require_feature(Feature::Advisory).await?;
        let (extraction, generation) = {
            let mut state = self.lock().await;
            state.member()?;
            if state.in_flight.is_some() {
                return Err(WorkspaceError::Busy);
            }
            let phase = state.phase();
            match (phase, state.brief.as_ref()) {
                (DocumentPhase::Approved, Some(brief)) => {
                    let extraction = brief.extraction.clone();
                    state.in_flight = Some(Stage::Advisory);
                    (extraction, state.generation)
                }
                (DocumentPhase::Stage2Complete, Some(brief)) => return Ok(brief.clone()),
                _ => {
                    return Err(WorkspaceError::InvalidPhase {
                        operation: "run the advisory review",
                        phase,
                    })
                }
            }
        };

        info!("Starting advisory stage");
        let result = self.services.advisory.advise(&extraction).await;

        let mut state = self.lock().await;
        if state.generation != generation {
            warn!("Discarding advisory response for a replaced document");
            return Err(WorkspaceError::Stale);
        }
        state.in_flight = None;

        match result {
            Ok(advisory) => {
                let Some(brief) = state.brief.as_mut() else {
                    return Err(WorkspaceError::Stale);
                };
                brief.advisory = Some(advisory);
                info!("Advisory stage complete");
                Ok(brief.clone())
            }
            Err(e) => {
                error!("Advisory stage failed: {}", e);
                self.notify(&mut state, NotificationKind::System, MSG_INTERRUPTED)
                    .await;
                Err(WorkspaceError::Collaborator(e))
            }
        }
    }

    //=====================================================================================
    // Wipe & Accessors
    //=====================================================================================

    /// Clears the document, brief and instructions. Any outstanding stage call is orphaned.
    pub async fn wipe(&self) {
        let mut state = self.lock().await;
        state.document = None;
        state.brief = None;
        state.instructions = None;
        state.in_flight = None;
        state.generation += 1;
    }

    pub async fn document(&self) -> Option<Document> {
        self.state.lock().await.document.clone()
    }

    pub async fn brief(&self) -> Option<Brief> {
        self.state.lock().await.brief.clone()
    }

    pub async fn analysis_instructions(&self) -> Option<String> {
        self.state.lock().await.instructions.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ExtractionDraft, FeatureFlags, SystemSettings};
    use crate::workspace::testing::{loaded, sample_draft, Harness};
    use crate::workspace::notifications::MSG_WORKSPACE_INITIALIZED;
    use std::sync::atomic::Ordering;
    use std::sync::Arc;

    fn messages(notifications: &[crate::domain::Notification]) -> Vec<(NotificationKind, String)> {
        notifications
            .iter()
            .map(|n| (n.kind, n.message.clone()))
            .collect()
    }

    #[tokio::test]
    async fn empty_file_is_rejected_without_readiness_notice() {
        let harness = Harness::new();
        let workspace = harness.member("ada@counsel.test").await;

        let err = workspace
            .load_document("blank.pdf", "application/pdf", Vec::new())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::EmptyDocument));
        assert_eq!(workspace.phase().await, DocumentPhase::Empty);

        let feed = messages(&workspace.notifications().await.unwrap());
        assert_eq!(
            feed,
            vec![
                (NotificationKind::Security, MSG_EMPTY_SUBMISSION.to_string()),
                (NotificationKind::System, MSG_WORKSPACE_INITIALIZED.to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn loading_estimates_pages_and_announces_readiness() {
        let harness = Harness::new();
        let workspace = harness.member("ada@counsel.test").await;
        let document = workspace
            .load_document("long.txt", "text/plain", "x".repeat(6001).into_bytes())
            .await
            .unwrap();

        assert_eq!(document.page_count, 3);
        assert_eq!(document.size, 6001);
        assert_eq!(workspace.phase().await, DocumentPhase::Loaded);
        let feed = workspace.notifications().await.unwrap();
        assert_eq!(feed[0].kind, NotificationKind::System);
        assert_eq!(feed[0].message, "Document \"long.txt\" ready for professional review.");
    }

    #[tokio::test]
    async fn maintenance_mode_blocks_uploads() {
        let harness = Harness::new();
        harness
            .store()
            .write_settings(&SystemSettings {
                maintenance_mode: true,
                ..SystemSettings::default()
            })
            .await
            .unwrap();
        let workspace = harness.member("ada@counsel.test").await;
        let err = workspace
            .load_document("msa.txt", "text/plain", b"terms".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(err, WorkspaceError::Maintenance));
    }

    #[tokio::test]
    async fn stage1_builds_the_brief_and_counts_usage_once() {
        let harness = Harness::new();
        let workspace = loaded(&harness).await;
        workspace
            .set_analysis_instructions(Some("  focus on termination  "))
            .await
            .unwrap();

        let brief = workspace.run_stage1().await.unwrap();
        assert_eq!(brief.title, "Master Services Agreement");
        assert!(!brief.is_approved);
        assert!(!brief.is_total_failure());
        assert_eq!(workspace.phase().await, DocumentPhase::Stage1Complete);

        let request = harness.extraction.last_request.lock().unwrap().clone().unwrap();
        assert_eq!(request.filename, "msa.txt");
        assert_eq!(request.filetype, "text/plain");
        assert_eq!(request.instructions.as_deref(), Some("focus on termination"));

        let user = harness.store().find_user("ada@counsel.test").await.unwrap().unwrap();
        assert_eq!(user.docs_processed, 1);
        assert_eq!(
            workspace.notifications().await.unwrap()[0].message,
            MSG_STAGE1_COMPLETE
        );
    }

    #[tokio::test]
    async fn stage1_failure_keeps_the_document_loaded() {
        let harness = Harness::new();
        let workspace = loaded(&harness).await;
        harness.extraction.fail.store(true, Ordering::SeqCst);

        let err = workspace.run_stage1().await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Collaborator(_)));
        assert_eq!(workspace.phase().await, DocumentPhase::Loaded);
        assert_eq!(workspace.notifications().await.unwrap()[0].message, MSG_INTERRUPTED);
        let user = harness.store().find_user("ada@counsel.test").await.unwrap().unwrap();
        assert_eq!(user.docs_processed, 0);

        harness.extraction.fail.store(false, Ordering::SeqCst);
        workspace.run_stage1().await.unwrap();
        assert_eq!(workspace.phase().await, DocumentPhase::Stage1Complete);
    }

    #[tokio::test]
    async fn approve_runs_stage2_once() {
        let harness = Harness::new();
        let workspace = loaded(&harness).await;
        workspace.run_stage1().await.unwrap();

        let first = workspace.approve().await.unwrap();
        assert!(first.is_approved);
        assert!(first.advisory.is_some());
        assert_eq!(workspace.phase().await, DocumentPhase::Stage2Complete);

        let second = workspace.approve().await.unwrap();
        assert_eq!(second.approval_timestamp, first.approval_timestamp);
        assert_eq!(harness.advisory.calls(), 1);
    }

    #[tokio::test]
    async fn stage2_failure_keeps_approval_and_can_be_retried() {
        let harness = Harness::new();
        let workspace = loaded(&harness).await;
        workspace.run_stage1().await.unwrap();
        harness.advisory.fail.store(true, Ordering::SeqCst);

        let err = workspace.approve().await.unwrap_err();
        assert!(matches!(err, WorkspaceError::Collaborator(_)));
        let brief = workspace.brief().await.unwrap();
        assert!(brief.is_approved);
        assert!(brief.advisory.is_none());
        assert_eq!(workspace.phase().await, DocumentPhase::Approved);

        harness.advisory.fail.store(false, Ordering::SeqCst);
        let brief = workspace.run_stage2().await.unwrap();
        assert!(brief.advisory.is_some());
        assert_eq!(harness.advisory.calls(), 2);
    }

    #[tokio::test]
    async fn totally_failed_brief_cannot_be_approved() {
        let harness = Harness::new();
        *harness.extraction.draft.lock().unwrap() = Some(ExtractionDraft {
            title: String::new(),
            has_substantive_content: false,
            extraction: Default::default(),
            ..sample_draft()
        });
        let workspace = loaded(&harness).await;

        let brief = workspace.run_stage1().await.unwrap();
        assert!(brief.is_total_failure());
        assert!(matches!(
            workspace.approve().await,
            Err(WorkspaceError::TotalFailure)
        ));
        assert_eq!(harness.advisory.calls(), 0);
    }

    #[tokio::test]
    async fn approval_without_advisory_feature_skips_stage2() {
        let harness = Harness::new();
        harness
            .store()
            .write_settings(&SystemSettings {
                features_enabled: FeatureFlags {
                    advisory: false,
                    ..FeatureFlags::default()
                },
                ..SystemSettings::default()
            })
            .await
            .unwrap();
        let workspace = loaded(&harness).await;
        workspace.run_stage1().await.unwrap();

        let brief = workspace.approve().await.unwrap();
        assert!(brief.is_approved);
        assert_eq!(workspace.phase().await, DocumentPhase::Approved);
        assert!(matches!(
            workspace.run_stage2().await,
            Err(WorkspaceError::FeatureDisabled(Feature::Advisory))
        ));
        assert_eq!(harness.advisory.calls(), 0);
    }

    #[tokio::test]
    async fn stages_enforce_phase_order() {
        let harness = Harness::new();
        let workspace = harness.member("ada@counsel.test").await;
        assert!(matches!(
            workspace.run_stage1().await,
            Err(WorkspaceError::InvalidPhase { phase: DocumentPhase::Empty, .. })
        ));

        workspace
            .load_document("msa.txt", "text/plain", b"terms".to_vec())
            .await
            .unwrap();
        assert!(matches!(
            workspace.approve().await,
            Err(WorkspaceError::InvalidPhase { phase: DocumentPhase::Loaded, .. })
        ));
        assert!(matches!(
            workspace.run_stage2().await,
            Err(WorkspaceError::InvalidPhase { phase: DocumentPhase::Loaded, .. })
        ));
    }

    #[tokio::test]
    async fn concurrent_stage1_is_rejected() {
        let (harness, extraction_gate, _) = Harness::gated();
        let workspace = Arc::new(loaded(&harness).await);

        let pending = tokio::spawn({
            let workspace = workspace.clone();
            async move { workspace.run_stage1().await }
        });
        extraction_gate.entered.notified().await;

        assert!(matches!(workspace.run_stage1().await, Err(WorkspaceError::Busy)));
        assert!(workspace.snapshot().await.unwrap().is_processing);

        extraction_gate.release.notify_one();
        pending.await.unwrap().unwrap();
        assert_eq!(harness.extraction.calls(), 1);
        assert_eq!(workspace.phase().await, DocumentPhase::Stage1Complete);
    }

    #[tokio::test]
    async fn wipe_discards_an_in_flight_extraction() {
        let (harness, extraction_gate, _) = Harness::gated();
        let workspace = Arc::new(loaded(&harness).await);

        let pending = tokio::spawn({
            let workspace = workspace.clone();
            async move { workspace.run_stage1().await }
        });
        extraction_gate.entered.notified().await;
        workspace.wipe().await;
        extraction_gate.release.notify_one();

        assert!(matches!(pending.await.unwrap(), Err(WorkspaceError::Stale)));
        assert_eq!(workspace.phase().await, DocumentPhase::Empty);
        assert!(workspace.brief().await.is_none());
        let user = harness.store().find_user("ada@counsel.test").await.unwrap().unwrap();
        assert_eq!(user.docs_processed, 0);
    }

    #[tokio::test]
    async fn stage1_leaves_no_brief_when_the_account_vanished_mid_review() {
        let (harness, extraction_gate, _) = Harness::gated();
        let workspace = Arc::new(loaded(&harness).await);

        let pending = tokio::spawn({
            let workspace = workspace.clone();
            async move { workspace.run_stage1().await }
        });
        extraction_gate.entered.notified().await;
        let mut users = harness.store().users().await.unwrap();
        users.remove("ada@counsel.test");
        harness.store().write_users(&users).await.unwrap();
        extraction_gate.release.notify_one();

        assert!(matches!(pending.await.unwrap(), Err(WorkspaceError::AccountNotFound)));
        assert!(workspace.brief().await.is_none());
        assert_eq!(workspace.phase().await, DocumentPhase::Loaded);
    }

    #[tokio::test]
    async fn replacing_the_document_discards_an_in_flight_advisory() {
        let (harness, extraction_gate, advisory_gate) = Harness::gated();
        let workspace = Arc::new(loaded(&harness).await);
        extraction_gate.release.notify_one();
        workspace.run_stage1().await.unwrap();

        let pending = tokio::spawn({
            let workspace = workspace.clone();
            async move { workspace.approve().await }
        });
        advisory_gate.entered.notified().await;
        workspace
            .load_document("amendment.txt", "text/plain", b"first amendment".to_vec())
            .await
            .unwrap();
        advisory_gate.release.notify_one();

        assert!(matches!(pending.await.unwrap(), Err(WorkspaceError::Stale)));
        assert_eq!(workspace.phase().await, DocumentPhase::Loaded);
        assert_eq!(workspace.document().await.unwrap().name, "amendment.txt");
    }

    #[tokio::test]
    async fn wipe_clears_instructions() {
        let harness = Harness::new();
        let workspace = loaded(&harness).await;
        workspace.set_analysis_instructions(Some("focus")).await.unwrap();
        workspace.wipe().await;
        assert_eq!(workspace.phase().await, DocumentPhase::Empty);
        assert!(workspace.analysis_instructions().await.is_none());
    }

    #[tokio::test]
    async fn admins_cannot_review_documents() {
        let harness = Harness::new();
        let admin = harness.admin().await;
        assert!(matches!(
            admin.load_document("msa.txt", "text/plain", b"terms".to_vec()).await,
            Err(WorkspaceError::MemberOnly)
        ));
    }
}
